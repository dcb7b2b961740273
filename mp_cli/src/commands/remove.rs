use mp_core::Error;
use mp_io::find_installed;

use super::Env;
use crate::display;

pub async fn run(env: &Env, mod_name: &str, force: bool) -> Result<(), Error> {
    let manager = env.manager()?;
    let _lock = manager.store().lock()?;
    let mut profile = manager.store().load()?;

    let target = find_installed(&profile, mod_name)?;
    let plan = manager.plan_removal(&profile, target, force)?;

    display::print_plan(&plan);

    let report = manager.execute(&mut profile, plan).await?;
    display::print_report(&report);
    match report.to_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
