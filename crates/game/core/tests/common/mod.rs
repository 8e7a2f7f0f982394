//! Content shared by the integration suites, built through the public API.
#![allow(dead_code)]

use std::sync::Arc;

use combat_core::action::{Magnitude, Op, Skill, SkillTag, TargetFilter, TargetingInfo};
use combat_core::env::{ModuleRegistry, Registries, UnitTemplate};
use combat_core::state::DisableFlags;
use combat_core::status::{StackingPolicy, StatusCategory, StatusDefinition, TriggerEvent};
use combat_core::{CombatSession, CombatSessionBuilder, DamageType, Position, Side, StatBlock, UnitSpec};

pub fn registries() -> Arc<Registries> {
    let skills = [
        Skill::new("strike", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Melee)
            .with_op(Op::damage(Magnitude::Scaled(1.0), DamageType::Physical)),
        Skill::new("power_strike", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Melee)
            .with_op(Op::damage(Magnitude::Scaled(1.5), DamageType::Physical)),
        Skill::new("smite", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_tag(SkillTag::Offensive)
            .with_op(Op::damage(Magnitude::Scaled(1.5), DamageType::True)),
        Skill::new("hasten", TargetingInfo::self_only()).with_op(Op::apply_status("haste", 3)),
        Skill::new("ignite", TargetingInfo::single(3).with_filter(TargetFilter::Enemy))
            .with_cost(0)
            .with_op(Op::apply_status_with("burn", 3, Magnitude::Flat(10.0))),
        Skill::new("bash", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_op(Op::apply_status("stun", 1)),
        Skill::new("heavy_bash", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_op(Op::apply_status("stun", 2)),
        Skill::new("chill", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_op(Op::apply_status("freeze", 1)),
        Skill::new("lullaby", TargetingInfo::single(1).with_filter(TargetFilter::Enemy))
            .with_op(Op::apply_status("sleep", 2)),
    ]
    .into_iter()
    .collect();

    let statuses = [
        StatusDefinition::new("haste", StatusCategory::Buff)
            .with_exclusive("slow")
            .with_initiative_multiplier(1.5),
        StatusDefinition::new("slow", StatusCategory::Debuff).with_initiative_multiplier(0.5),
        StatusDefinition::new("burn", StatusCategory::Debuff)
            .with_stacking(StackingPolicy::Stacks { max: 5 })
            .with_trigger(
                TriggerEvent::OnTick,
                vec![Op::raw_damage(Magnitude::StatusValueTimesStacks, DamageType::Fire)],
            ),
        StatusDefinition::new("stun", StatusCategory::Control).with_disables(DisableFlags::STUNNED),
        StatusDefinition::new("freeze", StatusCategory::Control).with_disables(DisableFlags::FROZEN),
        StatusDefinition::new("sleep", StatusCategory::Control)
            .with_disables(DisableFlags::SLEEPING)
            .breaks_on_damage(),
    ]
    .into_iter()
    .collect();

    let templates = [
        UnitTemplate::builder("knight")
            .stats(StatBlock {
                spd: 20.0,
                ..StatBlock::default()
            })
            .skill("strike")
            .skill("power_strike")
            .skill("smite")
            .skill("hasten")
            .skill("ignite")
            .skill("bash")
            .skill("heavy_bash")
            .skill("chill")
            .skill("lullaby")
            .build(),
        UnitTemplate::builder("squire")
            .stats(StatBlock {
                def: 5.0,
                ..StatBlock::default()
            })
            .skill("strike")
            .build(),
        UnitTemplate::builder("slowed_squire")
            .stats(StatBlock {
                def: 5.0,
                ..StatBlock::default()
            })
            .skill("strike")
            .skill("hasten")
            .status("slow")
            .build(),
        UnitTemplate::builder("duelist")
            .stats(StatBlock {
                crit: 0.5,
                ..StatBlock::default()
            })
            .skill("strike")
            .build(),
    ]
    .into_iter()
    .collect();

    Arc::new(Registries {
        skills,
        statuses,
        modules: ModuleRegistry::new(),
        templates,
    })
}

/// Routes engine logs to the test harness; filter with `RUST_LOG=combat=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `left` at (0,0) for the player, `right` at (1,0) for the opponent.
pub fn duel_builder(left: &str, right: &str) -> CombatSessionBuilder {
    init_tracing();
    CombatSession::builder(registries())
        .unit(UnitSpec::new(left, Side::Player, Position::new(0, 0)))
        .unit(UnitSpec::new(right, Side::Opponent, Position::new(1, 0)))
}

pub fn duel(left: &str, right: &str) -> CombatSession {
    match duel_builder(left, right).build() {
        Ok(session) => session,
        Err(err) => panic!("fixture session failed: {err}"),
    }
}
