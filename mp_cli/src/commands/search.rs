use console::style;

use mp_core::Error;
use mp_io::search_mods;

use super::Env;

pub async fn run(env: &Env, query: &str) -> Result<(), Error> {
    let catalog = env.catalog()?;
    let hits = search_mods(&catalog, query).await?;

    if hits.is_empty() {
        println!("No mods matching '{query}'");
        return Ok(());
    }

    for hit in hits {
        println!("{} - {}", style(&hit.slug).bold(), hit.summary);
    }

    Ok(())
}
