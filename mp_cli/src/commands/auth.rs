use console::style;

use mp_core::Error;

use super::Env;

pub async fn run(env: &Env, user: &str, password: &str) -> Result<(), Error> {
    let catalog = env.catalog()?;
    let token = catalog.authenticate(user, password).await?;
    token.save(&env.token_file)?;

    println!(
        "{} session token stored at {}",
        style("Authenticated:").green().bold(),
        env.token_file.display()
    );
    Ok(())
}
