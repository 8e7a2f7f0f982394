//! Append-only combat event stream.

use super::types::UnitId;

/// Category of a [`CombatLogEvent`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogKind {
    Damage,
    Heal,
    Shield,
    StatusApply,
    StatusRemove,
    StatusTick,
    Move,
    Kill,
    Revive,
    Summon,
    Transform,
    TurnStart,
    TurnEnd,
    SkillUse,
    Miss,
    Crit,
    Combo,
    ChainTriggered,
    ChainRejected,
    ActionCancelled,
    OpFailed,
    Info,
}

/// One recorded event. `seq` is the deterministic timestamp.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLogEvent {
    pub seq: u64,
    pub turn: u32,
    pub kind: LogKind,
    pub source: Option<UnitId>,
    pub target: Option<UnitId>,
    pub value: Option<f64>,
    pub skill: Option<String>,
    pub status: Option<String>,
    pub text: String,
}

/// Builder for an event; the log fills in `seq` and `turn`.
#[derive(Clone, Debug)]
pub struct LogEntry {
    kind: LogKind,
    source: Option<UnitId>,
    target: Option<UnitId>,
    value: Option<f64>,
    skill: Option<String>,
    status: Option<String>,
    text: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            value: None,
            skill: None,
            status: None,
            text: text.into(),
        }
    }

    pub fn source(mut self, unit: UnitId) -> Self {
        self.source = Some(unit);
        self
    }

    pub fn target(mut self, unit: UnitId) -> Self {
        self.target = Some(unit);
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn skill(mut self, skill: Option<&str>) -> Self {
        self.skill = skill.map(str::to_owned);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLog {
    events: Vec<CombatLogEvent>,
    next_seq: u64,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<CombatLogEvent>) -> Self {
        let next_seq = events.last().map_or(0, |e| e.seq + 1);
        Self { events, next_seq }
    }

    pub fn push(&mut self, turn: u32, entry: LogEntry) -> &CombatLogEvent {
        tracing::trace!(
            target: "combat::log",
            seq = self.next_seq,
            kind = %entry.kind,
            text = %entry.text,
        );
        self.events.push(CombatLogEvent {
            seq: self.next_seq,
            turn,
            kind: entry.kind,
            source: entry.source,
            target: entry.target,
            value: entry.value,
            skill: entry.skill,
            status: entry.status,
            text: entry.text,
        });
        self.next_seq += 1;
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[CombatLogEvent] {
        &self.events
    }

    /// Events recorded at or after `seq`.
    pub fn since(&self, seq: u64) -> &[CombatLogEvent] {
        let start = self.events.partition_point(|e| e.seq < seq);
        &self.events[start..]
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
