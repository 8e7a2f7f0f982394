//! Registry loaders: skills, statuses, modules and unit templates.
//!
//! Each RON file holds one catalog struct, e.g. `(skills: [ ... ])`. Ids must
//! be unique within a catalog; references across catalogs are checked by
//! [`validate_references`] once every table is loaded.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::action::{Condition, Op, Skill};
use combat_core::env::{
    ModuleDefinition, ModuleRegistry, Registries, Registry, RegistryEntry, SkillRegistry, StatusRegistry,
    TemplateRegistry, UnitTemplate,
};
use combat_core::status::StatusDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Builds a registry, rejecting empty and duplicate ids.
fn build_registry<T: RegistryEntry>(entries: Vec<T>, kind: &str) -> LoadResult<Registry<T>> {
    let mut seen = BTreeSet::new();
    for entry in &entries {
        if entry.id().is_empty() {
            anyhow::bail!("{} with an empty id", kind);
        }
        if !seen.insert(entry.id()) {
            anyhow::bail!("Duplicate {} id: {}", kind, entry.id());
        }
    }
    Ok(entries.into_iter().collect())
}

fn with_path<T>(path: &Path, result: LoadResult<T>) -> LoadResult<T> {
    result.map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<Skill>,
}

pub struct SkillLoader;

impl SkillLoader {
    pub fn load(path: &Path) -> LoadResult<SkillRegistry> {
        let content = read_file(path)?;
        with_path(path, Self::parse(&content))
    }

    pub fn parse(content: &str) -> LoadResult<SkillRegistry> {
        let catalog: SkillCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;
        build_registry(catalog.skills, "skill")
    }
}

// ============================================================================
// Statuses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCatalog {
    pub statuses: Vec<StatusDefinition>,
}

pub struct StatusLoader;

impl StatusLoader {
    pub fn load(path: &Path) -> LoadResult<StatusRegistry> {
        let content = read_file(path)?;
        with_path(path, Self::parse(&content))
    }

    pub fn parse(content: &str) -> LoadResult<StatusRegistry> {
        let catalog: StatusCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse status catalog RON: {}", e))?;
        for status in &catalog.statuses {
            if !(0.0..=1.0).contains(&status.action_fail_chance) {
                anyhow::bail!("Status {} has action_fail_chance outside [0, 1]", status.id);
            }
            if status.initiative_multiplier < 0.0 {
                anyhow::bail!("Status {} has a negative initiative_multiplier", status.id);
            }
        }
        build_registry(catalog.statuses, "status")
    }
}

// ============================================================================
// Modules
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCatalog {
    pub modules: Vec<ModuleDefinition>,
}

pub struct ModuleLoader;

impl ModuleLoader {
    pub fn load(path: &Path) -> LoadResult<ModuleRegistry> {
        let content = read_file(path)?;
        with_path(path, Self::parse(&content))
    }

    pub fn parse(content: &str) -> LoadResult<ModuleRegistry> {
        let catalog: ModuleCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse module catalog RON: {}", e))?;
        build_registry(catalog.modules, "module")
    }
}

// ============================================================================
// Unit Templates
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<UnitTemplate>,
}

pub struct TemplateLoader;

impl TemplateLoader {
    pub fn load(path: &Path) -> LoadResult<TemplateRegistry> {
        let content = read_file(path)?;
        with_path(path, Self::parse(&content))
    }

    /// Templates without a `type_tag` take their id as tag.
    pub fn parse(content: &str) -> LoadResult<TemplateRegistry> {
        let mut catalog: TemplateCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse template catalog RON: {}", e))?;
        for template in &mut catalog.templates {
            if template.type_tag.is_empty() {
                template.type_tag = template.id.clone();
            }
        }
        build_registry(catalog.templates, "template")
    }
}

// ============================================================================
// Cross-references
// ============================================================================

enum Reference<'a> {
    Skill(&'a str),
    Status(&'a str),
    Module(&'a str),
    Template(&'a str),
}

fn collect_condition<'a>(condition: &'a Condition, out: &mut Vec<Reference<'a>>) {
    match condition {
        Condition::TargetHasStatus(id) | Condition::SourceHasStatus(id) => out.push(Reference::Status(id)),
        Condition::All(all) | Condition::Any(all) => all.iter().for_each(|c| collect_condition(c, out)),
        Condition::Not(inner) => collect_condition(inner, out),
        _ => {}
    }
}

fn collect_ops<'a>(ops: &'a [Op], out: &mut Vec<Reference<'a>>) {
    for op in ops {
        match op {
            Op::ApplyStatus { status, .. } => out.push(Reference::Status(status)),
            Op::Convert { into, .. } => out.push(Reference::Status(into)),
            Op::Cleanse { status: Some(status), .. } => out.push(Reference::Status(status)),
            Op::Trigger { skill, .. } => out.push(Reference::Skill(skill)),
            Op::Summon { template, .. } | Op::Transform { template, .. } => {
                out.push(Reference::Template(template))
            }
            Op::Delayed { ops, .. } => collect_ops(ops, out),
            Op::Conditional {
                condition,
                then,
                otherwise,
            } => {
                collect_condition(condition, out);
                collect_ops(then, out);
                collect_ops(otherwise, out);
            }
            _ => {}
        }
    }
}

/// Checks that every id named by a definition exists in its registry.
///
/// All dangling references are reported together.
pub fn validate_references(registries: &Registries) -> LoadResult<()> {
    let mut missing = Vec::new();
    let mut check = |owner: String, refs: Vec<Reference<'_>>| {
        for reference in refs {
            let (kind, id, known) = match reference {
                Reference::Skill(id) => ("skill", id, registries.skills.contains(id)),
                Reference::Status(id) => ("status", id, registries.statuses.contains(id)),
                Reference::Module(id) => ("module", id, registries.modules.contains(id)),
                Reference::Template(id) => ("template", id, registries.templates.contains(id)),
            };
            if !known {
                missing.push(format!("{owner} references unknown {kind} {id}"));
            }
        }
    };

    for skill in registries.skills.iter() {
        let mut refs: Vec<Reference<'_>> = skill.reactions.iter().map(|r| Reference::Skill(&r.skill)).collect();
        collect_ops(&skill.ops, &mut refs);
        check(format!("skill {}", skill.id), refs);
    }

    for status in registries.statuses.iter() {
        let mut refs = Vec::new();
        if let Some(counter) = &status.counter_skill {
            refs.push(Reference::Skill(counter));
        }
        refs.extend(status.exclusive_with.iter().map(|id| Reference::Status(id)));
        for ops in status.triggers.values() {
            collect_ops(ops, &mut refs);
        }
        check(format!("status {}", status.id), refs);
    }

    for module in registries.modules.iter() {
        let mut refs = Vec::new();
        for passive in &module.passives {
            collect_ops(&passive.ops, &mut refs);
        }
        check(format!("module {}", module.id), refs);
    }

    for template in registries.templates.iter() {
        let mut refs: Vec<Reference<'_>> = template.skills.iter().map(|id| Reference::Skill(id)).collect();
        refs.extend(template.statuses.iter().map(|id| Reference::Status(id)));
        refs.extend(template.modules.iter().map(|id| Reference::Module(id)));
        check(format!("template {}", template.id), refs);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Dangling content references:\n  {}", missing.join("\n  "))
    }
}
