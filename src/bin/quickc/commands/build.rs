//! `quickc build` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::BuildArgs;
use quickc::ops::{build, BuildOptions};
use quickc::util::shell::Shell;
use quickc::util::GlobalContext;

pub fn execute(args: BuildArgs, ctx: &GlobalContext, shell: Arc<Shell>) -> Result<()> {
    let project = ctx.load_project()?;
    let config = ctx.effective_config(&project);

    // Jobs: CLI > config > None (one per CPU)
    let jobs = args.jobs.or(config.build.jobs);

    let opts = BuildOptions {
        release: args.release,
        units: args.units,
        jobs,
        plan_only: args.plan,
        manifest_out: args.manifest_out,
    };

    let result = build(project, &config, shell, &opts)?;

    if opts.plan_only {
        println!("{}", serde_json::to_string_pretty(&result.plan)?);
    }

    Ok(())
}
