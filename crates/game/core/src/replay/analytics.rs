//! Aggregates derived from the combat log. Nothing here feeds back into
//! the simulation.

use std::collections::BTreeMap;

use crate::state::{CombatLogEvent, LogKind, UnitId};

/// Per-unit totals.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceStats {
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub healing_done: f64,
    pub kills: u32,
    pub crits: u32,
    pub misses: u32,
    pub skills_used: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatAnalytics {
    pub units: BTreeMap<UnitId, SourceStats>,
    pub total_damage: f64,
    pub total_healing: f64,
    pub turns: u32,
}

impl CombatAnalytics {
    pub fn from_events(events: &[CombatLogEvent]) -> Self {
        let mut analytics = Self::default();
        for event in events {
            analytics.turns = analytics.turns.max(event.turn);
            let value = event.value.unwrap_or(0.0);
            match event.kind {
                LogKind::Damage => {
                    analytics.total_damage += value;
                    if let Some(source) = event.source {
                        analytics.entry(source).damage_dealt += value;
                    }
                    if let Some(target) = event.target {
                        analytics.entry(target).damage_taken += value;
                    }
                }
                LogKind::Heal => {
                    analytics.total_healing += value;
                    if let Some(source) = event.source {
                        analytics.entry(source).healing_done += value;
                    }
                }
                LogKind::Kill => {
                    if let Some(source) = event.source {
                        analytics.entry(source).kills += 1;
                    }
                }
                LogKind::Crit => {
                    if let Some(source) = event.source {
                        analytics.entry(source).crits += 1;
                    }
                }
                LogKind::Miss => {
                    if let Some(source) = event.source {
                        analytics.entry(source).misses += 1;
                    }
                }
                LogKind::SkillUse => {
                    if let (Some(source), Some(skill)) = (event.source, &event.skill) {
                        *analytics.entry(source).skills_used.entry(skill.clone()).or_default() += 1;
                    }
                }
                _ => {}
            }
        }
        analytics
    }

    fn entry(&mut self, unit: UnitId) -> &mut SourceStats {
        self.units.entry(unit).or_default()
    }

    pub fn get(&self, unit: UnitId) -> Option<&SourceStats> {
        self.units.get(&unit)
    }

    /// Highest damage dealt; ties go to the lower id.
    pub fn top_damage_dealer(&self) -> Option<UnitId> {
        self.units
            .iter()
            .filter(|(_, stats)| stats.damage_dealt > 0.0)
            .max_by(|a, b| a.1.damage_dealt.total_cmp(&b.1.damage_dealt).then_with(|| b.0.cmp(a.0)))
            .map(|(id, _)| *id)
    }

    /// Usage count of `skill` across every unit.
    pub fn skill_uses(&self, skill: &str) -> u32 {
        self.units.values().filter_map(|s| s.skills_used.get(skill)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CombatLog, LogEntry};

    fn log() -> CombatLog {
        let mut log = CombatLog::new();
        log.push(1, LogEntry::new(LogKind::SkillUse, "").source(UnitId(1)).skill(Some("strike")));
        log.push(1, LogEntry::new(LogKind::Damage, "").source(UnitId(1)).target(UnitId(2)).value(14.0));
        log.push(1, LogEntry::new(LogKind::Crit, "").source(UnitId(1)).target(UnitId(2)));
        log.push(2, LogEntry::new(LogKind::SkillUse, "").source(UnitId(2)).skill(Some("mend")));
        log.push(2, LogEntry::new(LogKind::Heal, "").source(UnitId(2)).target(UnitId(2)).value(9.0));
        log.push(3, LogEntry::new(LogKind::SkillUse, "").source(UnitId(1)).skill(Some("strike")));
        log.push(3, LogEntry::new(LogKind::Damage, "").source(UnitId(1)).target(UnitId(2)).value(20.0));
        log.push(3, LogEntry::new(LogKind::Kill, "").source(UnitId(1)).target(UnitId(2)));
        log
    }

    #[test]
    fn totals_per_source() {
        let analytics = CombatAnalytics::from_events(log().events());
        let attacker = analytics.get(UnitId(1)).unwrap();
        assert_eq!(attacker.damage_dealt, 34.0);
        assert_eq!(attacker.kills, 1);
        assert_eq!(attacker.crits, 1);
        assert_eq!(attacker.skills_used.get("strike"), Some(&2));

        let defender = analytics.get(UnitId(2)).unwrap();
        assert_eq!(defender.damage_taken, 34.0);
        assert_eq!(defender.healing_done, 9.0);

        assert_eq!(analytics.total_damage, 34.0);
        assert_eq!(analytics.turns, 3);
        assert_eq!(analytics.top_damage_dealer(), Some(UnitId(1)));
        assert_eq!(analytics.skill_uses("mend"), 1);
    }

    #[test]
    fn empty_log_has_no_leader() {
        let analytics = CombatAnalytics::from_events(&[]);
        assert_eq!(analytics.top_damage_dealer(), None);
        assert_eq!(analytics.total_damage, 0.0);
    }
}
