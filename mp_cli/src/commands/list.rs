use console::style;

use mp_core::Error;

use super::Env;

pub fn run(env: &Env, json: bool) -> Result<(), Error> {
    let store = env.store();
    let profile = store.load()?;

    if json {
        let doc = profile.to_document();
        let body = serde_json::to_string_pretty(&doc.mods).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to serialize mod list: {e}"),
        })?;
        println!("{body}");
        return Ok(());
    }

    if profile.mods.is_empty() {
        println!("No mods installed for Minecraft {}", profile.game_version);
        return Ok(());
    }

    println!(
        "{}",
        style(format!(
            "{} mod(s) installed for Minecraft {}:",
            profile.mods.len(),
            profile.game_version
        ))
        .bold()
    );
    for rec in profile.mods.values() {
        let origin = if rec.direct {
            String::new()
        } else {
            format!(
                " {}",
                style(format!("(dependency of {:?})", rec.dependents)).dim()
            )
        };
        println!("  {} {}{}", rec.slug, rec.version_label, origin);
    }

    Ok(())
}
