use console::style;

use mp_core::Error;

use super::Env;

pub fn run(env: &Env, game_version: &str) -> Result<(), Error> {
    let store = env.store();
    let _lock = store.lock()?;
    store.init(game_version)?;

    println!(
        "{} profile for Minecraft {} at {}",
        style("Created").green().bold(),
        game_version,
        env.pack.display()
    );
    Ok(())
}
