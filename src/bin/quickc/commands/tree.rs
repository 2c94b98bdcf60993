//! `quickc tree` command

use std::collections::HashSet;

use anyhow::Result;

use crate::cli::TreeArgs;
use quickc::core::{UnitPath, Variant};
use quickc::ops::evaluate;
use quickc::resolver::UnitRegistry;
use quickc::util::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext) -> Result<()> {
    let project = ctx.load_project()?;
    let name = project.name();
    let session = evaluate(project, Variant::from_release(args.release), &[])?;
    let registry = session.registry();

    println!("{}", name);
    let mut seen = HashSet::new();
    for unit in registry.dependencies(&UnitPath::root()) {
        print_tree(registry, unit, 1, &mut seen);
    }

    Ok(())
}

fn print_tree(registry: &UnitRegistry, unit: &UnitPath, depth: usize, seen: &mut HashSet<UnitPath>) {
    let is_duplicate = !seen.insert(unit.clone());

    let prefix = format!("{}├── ", "│   ".repeat(depth - 1));
    let kind = registry
        .get(unit)
        .and_then(|e| e.kind)
        .map(|k| format!(" [{}]", k))
        .unwrap_or_default();
    let dup_marker = if is_duplicate { " (*)" } else { "" };

    println!("{}{}{}{}", prefix, unit, kind, dup_marker);

    // Don't recurse into units already shown
    if is_duplicate {
        return;
    }
    for dep in registry.dependencies(unit) {
        print_tree(registry, dep, depth + 1, seen);
    }
}
