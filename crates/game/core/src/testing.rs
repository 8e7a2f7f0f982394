//! Shared fixtures for unit and integration tests.
//!
//! Compiled for the crate's own tests and, behind the `testing` feature, for
//! downstream test suites. Nothing here is used by the engine itself.

use crate::action::{ChainTrigger, Magnitude, Op, ReactionTarget, Skill, SkillTag, TargetFilter, TargetingInfo};
use crate::combat::DamageType;
use crate::config::CombatConfig;
use crate::env::{
    CombatEnv, FixedRng, ModuleDefinition, ModulePassive, ModuleRegistry, PassiveHook, RangeMovement,
    Registries, SkillRegistry, StatusRegistry, TemplateRegistry, UnitTemplate,
};
use crate::state::{CombatState, DisableFlags, Grid, Position, Side, Unit, UnitId};
use crate::stats::{Bonus, StatBlock, StatKind, StatModifier, recompute_all};
use crate::status::{StackingPolicy, StatusCategory, StatusDefinition, TriggerEvent};

/// A level-1 player unit with default stats and no skills.
pub fn unit_at(id: UnitId, position: Position) -> Unit {
    let template = UnitTemplate::builder("dummy").build();
    Unit::from_template(id, &template, Side::Player, 1, position, 0.0)
}

pub fn sample_statuses() -> StatusRegistry {
    use StatusCategory::*;
    [
        StatusDefinition::new("slow", Debuff)
            .with_exclusive("haste")
            .with_initiative_multiplier(0.5),
        StatusDefinition::new("haste", Buff).with_initiative_multiplier(1.5),
        StatusDefinition::new("burn", Debuff)
            .with_stacking(StackingPolicy::Stacks { max: 5 })
            .with_trigger(
                TriggerEvent::OnTick,
                vec![Op::raw_damage(Magnitude::StatusValueTimesStacks, DamageType::Fire)],
            ),
        StatusDefinition::new("poison", Debuff).with_trigger(
            TriggerEvent::OnTick,
            vec![Op::raw_damage(Magnitude::StatusValue, DamageType::True)],
        ),
        StatusDefinition::new("regen", Buff)
            .with_stacking(StackingPolicy::ExtendDuration)
            .with_trigger(TriggerEvent::OnTurnStart, vec![Op::heal(Magnitude::StatusValue)]),
        StatusDefinition::new("stun", Control).with_disables(DisableFlags::STUNNED),
        StatusDefinition::new("stun_immunity", Buff),
        StatusDefinition::new("freeze", Control).with_disables(DisableFlags::FROZEN),
        StatusDefinition::new("sleep", Control)
            .with_disables(DisableFlags::SLEEPING)
            .breaks_on_damage(),
        StatusDefinition::new("silence", Control).with_disables(DisableFlags::SILENCED),
        StatusDefinition::new("root", Control).with_disables(DisableFlags::ROOTED),
        StatusDefinition::new("charm", Control).with_disables(DisableFlags::CHARMED),
        StatusDefinition::new("paralysis", Debuff).with_fail_chance(0.5),
        StatusDefinition::new("fury", Buff)
            .with_stacking(StackingPolicy::Stacks { max: 5 })
            .with_modifier(StatModifier::new(StatKind::Atk, Bonus::Flat(2.0))),
        StatusDefinition::new("fire_ward", Buff).with_resistance(DamageType::Fire, 0.5),
        StatusDefinition::new("rally_aura", Aura)
            .with_aura(2, TargetFilter::Ally)
            .with_modifier(StatModifier::new(StatKind::Atk, Bonus::Increased(0.25))),
        StatusDefinition::new("thorns", Buff).persistent().with_trigger(
            TriggerEvent::OnHit,
            vec![Op::damage(Magnitude::Flat(5.0), DamageType::True)],
        ),
        StatusDefinition::new("riposte", Buff).with_counter("strike"),
    ]
    .into_iter()
    .collect()
}

pub fn sample_skills() -> SkillRegistry {
    [
        Skill::new("strike", TargetingInfo::single(1))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Melee)
            .with_op(Op::damage(Magnitude::Scaled(1.0), DamageType::Physical)),
        Skill::new(
            "mend",
            TargetingInfo::single(3).with_filter(TargetFilter::Ally).allow_self(),
        )
        .with_tag(SkillTag::Support)
        .with_op(Op::heal(Magnitude::Flat(20.0))),
        Skill::new("blink", TargetingInfo::tile(3))
            .with_tag(SkillTag::Movement)
            .with_op(Op::Teleport),
        Skill::new("fireball", TargetingInfo::area(4, 1))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Ranged)
            .with_cooldown(2)
            .with_op(Op::Aoe {
                radius: 1,
                filter: Some(TargetFilter::Enemy),
            })
            .with_op(Op::damage(Magnitude::Scaled(1.2), DamageType::Fire))
            .with_op(Op::apply_status_with("burn", 2, Magnitude::Flat(3.0))),
        Skill::new("cleave", TargetingInfo::single(1))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Melee)
            .with_op(Op::damage(Magnitude::Scaled(1.0), DamageType::Physical))
            .with_reaction(ChainTrigger::OnKill, "strike", ReactionTarget::NearestEnemy),
        Skill::new("ricochet", TargetingInfo::single(4))
            .with_tag(SkillTag::Offensive)
            .with_tag(SkillTag::Ranged)
            .with_op(Op::damage(Magnitude::Flat(1.0), DamageType::True))
            .with_op(Op::Trigger {
                skill: "ricochet".into(),
                target: ReactionTarget::PrimaryTarget,
            }),
        Skill::new("jab", TargetingInfo::single(1))
            .with_tag(SkillTag::Offensive)
            .with_cost(0)
            .quickcast()
            .with_op(Op::damage(Magnitude::Scaled(0.5), DamageType::Physical)),
        Skill::new("heavy_blow", TargetingInfo::single(1))
            .with_tag(SkillTag::Offensive)
            .with_delay(50.0)
            .with_op(Op::damage(Magnitude::Scaled(2.0), DamageType::Physical)),
        Skill::new("call_wisp", TargetingInfo::tile(2)).with_op(Op::Summon {
            template: "wisp".into(),
            level: None,
            duration: Some(2),
        }),
    ]
    .into_iter()
    .collect()
}

pub fn sample_templates() -> TemplateRegistry {
    [
        UnitTemplate::builder("soldier").skill("strike").skill("mend").build(),
        UnitTemplate::builder("wisp")
            .stats(StatBlock {
                max_hp: 30.0,
                hp: 30.0,
                atk: 4.0,
                spd: 15.0,
                ..StatBlock::default()
            })
            .skill("strike")
            .build(),
        UnitTemplate::builder("golem")
            .stats(StatBlock {
                max_hp: 200.0,
                hp: 200.0,
                atk: 14.0,
                def: 20.0,
                spd: 5.0,
                ..StatBlock::default()
            })
            .resistance(DamageType::Physical, 0.2)
            .skill("strike")
            .build(),
        UnitTemplate::builder("banner_bearer").skill("strike").status("rally_aura").build(),
    ]
    .into_iter()
    .collect()
}

pub fn sample_modules() -> ModuleRegistry {
    [
        ModuleDefinition {
            id: "vampire_fang".into(),
            stat_modifiers: vec![StatModifier::new(StatKind::Lifesteal, Bonus::Flat(0.5))],
            passives: Vec::new(),
        },
        ModuleDefinition {
            id: "battle_focus".into(),
            stat_modifiers: Vec::new(),
            passives: vec![ModulePassive {
                hook: PassiveHook::PostAction,
                ops: vec![Op::apply_status("fury", 2)],
            }],
        },
    ]
    .into_iter()
    .collect()
}

pub fn sample_registries() -> Registries {
    Registries {
        skills: sample_skills(),
        statuses: sample_statuses(),
        modules: sample_modules(),
        templates: sample_templates(),
    }
}

/// A board plus every collaborator an [`crate::action::OpRunner`] needs.
///
/// Draws default to `FixedRng(u32::MAX)`, so no crit, evasion or chance
/// roll succeeds unless a test swaps the generator.
pub struct TestWorld {
    pub state: CombatState,
    pub registries: Registries,
    pub config: CombatConfig,
    pub movement: RangeMovement,
    pub rng: FixedRng,
}

impl TestWorld {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: CombatState::new(Grid::new(width, height), 7),
            registries: sample_registries(),
            config: CombatConfig::default(),
            movement: RangeMovement,
            rng: FixedRng(u32::MAX),
        }
    }

    /// Spawns a ready-to-act unit that knows every sample skill.
    pub fn add(&mut self, id: UnitId, side: Side, position: Position) -> &mut Unit {
        let mut unit = unit_at(id, position);
        unit.side = side;
        unit.skills = self.registries.skills.ids().map(str::to_owned).collect();
        unit.runtime.action_points = self.config.action_points;
        unit.runtime.initiative = self.config.base_threshold;
        if let Err(err) = self.state.spawn(unit) {
            panic!("fixture unit {id} cannot be placed: {err}");
        }
        recompute_all(
            &mut self.state.units,
            &self.registries.statuses,
            &self.registries.modules,
        );
        self.state
            .unit_mut(id)
            .unwrap_or_else(|| panic!("fixture unit {id} vanished"))
    }

    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(&self.registries, &self.config, &self.movement, &self.rng)
    }

    /// Mutable state alongside a read-only environment.
    pub fn split(&mut self) -> (&mut CombatState, CombatEnv<'_>) {
        let env = CombatEnv::new(&self.registries, &self.config, &self.movement, &self.rng);
        (&mut self.state, env)
    }
}
