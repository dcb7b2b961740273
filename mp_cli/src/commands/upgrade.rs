use console::style;

use mp_core::{Error, ReleaseChannel};
use mp_io::{ResolveOpts, find_installed};

use super::Env;
use crate::display;

pub async fn run(
    env: &Env,
    mod_name: Option<&str>,
    min_channel: ReleaseChannel,
) -> Result<(), Error> {
    let manager = env.manager()?;
    let _lock = manager.store().lock()?;
    let mut profile = manager.store().load()?;

    let opts = ResolveOpts {
        requested_file: None,
        min_channel,
    };

    let plan = match mod_name {
        Some(name) if name != "all" => {
            let target = find_installed(&profile, name)?;
            manager.plan_upgrade_one(&profile, target, &opts).await?
        }
        _ => manager.plan_upgrade_all(&profile, &opts).await?,
    };

    if plan.is_empty() {
        println!("{} everything is up to date", style("Nothing to do:").green());
        return Ok(());
    }

    display::print_plan(&plan);

    let bar = display::spinner("upgrading");
    let report = manager.execute(&mut profile, plan).await?;
    bar.finish_and_clear();

    display::print_report(&report);
    match report.to_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
