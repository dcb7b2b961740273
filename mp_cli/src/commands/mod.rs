//! Command implementations.

pub mod auth;
pub mod install;
pub mod list;
pub mod new;
pub mod remove;
pub mod search;
pub mod upgrade;

use std::path::PathBuf;
use std::sync::Arc;

use mp_core::Error;
use mp_io::{ApiClient, HttpTransfer, Manager, ProfileStore, Token};

/// Paths and endpoints shared by every command.
pub struct Env {
    pub pack: PathBuf,
    pub mods_dir: PathBuf,
    pub api_url: String,
    pub token_file: PathBuf,
}

impl Env {
    pub fn new(
        pack: PathBuf,
        mods_dir: PathBuf,
        api_url: String,
        token_file: Option<PathBuf>,
    ) -> Self {
        let token_file = token_file.unwrap_or_else(|| {
            pack.parent()
                .map(|dir| dir.join("token.json"))
                .unwrap_or_else(|| PathBuf::from("token.json"))
        });

        Self {
            pack,
            mods_dir,
            api_url,
            token_file,
        }
    }

    /// Catalog client, authenticated when a stored token exists.
    pub fn catalog(&self) -> Result<ApiClient, Error> {
        let client = ApiClient::with_base_url(self.api_url.clone());
        Ok(match Token::load(&self.token_file)? {
            Some(token) => client.with_token(&token),
            None => client,
        })
    }

    /// The engine wired against the real catalog and transfer. The caller
    /// is responsible for holding the profile lock across its use.
    pub fn manager(&self) -> Result<Manager, Error> {
        Ok(Manager::new(
            Arc::new(self.catalog()?),
            Arc::new(HttpTransfer::new()),
            ProfileStore::new(&self.pack),
            self.mods_dir.clone(),
        ))
    }

    pub fn store(&self) -> ProfileStore {
        ProfileStore::new(&self.pack)
    }
}
