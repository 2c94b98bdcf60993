//! `quickc settings` command

use anyhow::{bail, Result};

use crate::cli::SettingsArgs;
use quickc::core::{UnitPath, Variant};
use quickc::ops::evaluate;
use quickc::util::GlobalContext;

pub fn execute(args: SettingsArgs, ctx: &GlobalContext) -> Result<()> {
    let project = ctx.load_project()?;
    let variant = Variant::from_release(args.release);

    let units: Vec<String> = args.unit.iter().cloned().collect();
    let session = evaluate(project, variant, &units)?;
    let manifest = session.manifest();

    match args.unit {
        None => println!("{}", manifest.to_json()?),
        Some(spec) => {
            let Some(unit) = session.registry().dependencies(&UnitPath::root()).first() else {
                bail!("unit `{}` was not evaluated", spec);
            };
            let Some(record) = manifest.get(unit) else {
                bail!("unit `{}` was not evaluated", spec);
            };
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }

    Ok(())
}
