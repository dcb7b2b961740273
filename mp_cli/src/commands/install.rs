use console::style;

use mp_core::{Error, FileId, ReleaseChannel};
use mp_io::{ResolveOpts, find_remote_mod};

use super::Env;
use crate::display;

pub async fn run(
    env: &Env,
    mod_name: &str,
    file: Option<FileId>,
    min_channel: ReleaseChannel,
) -> Result<(), Error> {
    let manager = env.manager()?;
    let _lock = manager.store().lock()?;
    let mut profile = manager.store().load()?;

    let target = find_remote_mod(manager.catalog(), mod_name).await?;

    let opts = ResolveOpts {
        requested_file: file,
        min_channel,
    };
    let plan = manager.plan_install(&profile, target.id, &opts).await?;

    if plan.is_empty() {
        println!(
            "{} '{}' is already installed and up to date",
            style("Nothing to do:").green(),
            target.slug
        );
        return Ok(());
    }

    display::print_plan(&plan);

    let bar = display::spinner(&format!("installing {}", target.slug));
    let report = manager.execute(&mut profile, plan).await?;
    bar.finish_and_clear();

    display::print_report(&report);
    match report.to_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
