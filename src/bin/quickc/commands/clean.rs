//! `quickc clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use quickc::ops::{clean, CleanOptions};
use quickc::util::fs::relative_path;
use quickc::util::shell::{Shell, Status};
use quickc::util::GlobalContext;

pub fn execute(args: CleanArgs, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let project = ctx.load_project()?;
    let opts = CleanOptions {
        release: args.release,
        all: args.all,
    };

    for dir in clean(&project, &opts)? {
        shell.status(Status::Removed, relative_path(project.root(), &dir).display());
    }

    Ok(())
}
