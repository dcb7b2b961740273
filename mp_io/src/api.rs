//! HTTP implementation of the catalog client against the Curse REST proxy.
//!
//! Responses are validated and adapted into the engine's fixed-shape types
//! at this boundary: unknown release channels, unparseable dates or ids fail
//! fast with `MetadataCorrupt` instead of leaking malformed data into
//! resolution. Only required-type dependency entries are kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use mp_core::{Dependency, Error, File, FileId, Mod, ModId, ReleaseChannel, sort_by_preference};

use crate::auth::Token;
use crate::catalog::CatalogClient;

/// Default catalog proxy endpoint.
pub const DEFAULT_BASE_URL: &str = "https://curse-rest-proxy.azurewebsites.net/api";

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    auth_header: Option<String>,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("modpacker/0.1")
            .pool_max_idle_per_host(20)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url,
            client,
            auth_header: None,
        }
    }

    /// Attach a stored session token to every request.
    pub fn with_token(mut self, token: &Token) -> Self {
        self.auth_header = Some(token.header_value());
        self
    }

    /// Log into the proxy and obtain a session token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Token, Error> {
        let url = format!("{}/authenticate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| Error::NetworkFailure {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::NetworkFailure {
                message: format!("authentication failed: HTTP {}", response.status()),
            });
        }

        let body: AuthResponse = response.json().await.map_err(|e| Error::NetworkFailure {
            message: format!("failed to read authentication response: {e}"),
        })?;

        Ok(Token {
            user_id: body.session.user_id,
            token: body.session.token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, Error> {
        let mut request = self.client.get(url);
        if let Some(ref header) = self.auth_header {
            request = request.header("Authorization", header.as_str());
        }

        let response = request.send().await.map_err(|e| Error::NetworkFailure {
            message: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                what: what.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(Error::NetworkFailure {
                message: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| Error::NetworkFailure {
            message: format!("failed to read response body: {e}"),
        })?;

        serde_json::from_str(&body).map_err(|e| Error::MetadataCorrupt {
            message: format!("malformed catalog response for {what}: {e}"),
        })
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogClient for ApiClient {
    async fn get_mod(&self, mod_id: ModId) -> Result<Mod, Error> {
        let url = format!("{}/addon/{}", self.base_url, mod_id);
        let response: ModResponse = self.get_json(&url, &format!("mod {mod_id}")).await?;
        Ok(response.into_mod())
    }

    async fn get_files_for(&self, mod_id: ModId, game_version: &str) -> Result<Vec<File>, Error> {
        let url = format!("{}/addon/{}/files", self.base_url, mod_id);
        let response: FilesResponse = self.get_json(&url, &format!("mod {mod_id}")).await?;

        let mut files = Vec::new();
        for raw in response.files {
            let file = raw.into_file(mod_id)?;
            if file.supports(game_version) {
                files.push(file);
            }
        }
        sort_by_preference(&mut files);

        Ok(files)
    }

    async fn get_file(&self, file_id: FileId) -> Result<File, Error> {
        let url = format!("{}/file/{}", self.base_url, file_id);
        let response: FileResponse = self.get_json(&url, &format!("file {file_id}")).await?;
        let mod_id = response.add_on_id.ok_or_else(|| Error::MetadataCorrupt {
            message: format!("file {file_id} carries no mod identifier"),
        })?;
        response.into_file(mod_id)
    }

    async fn search(&self, text: &str) -> Result<Vec<Mod>, Error> {
        let url = format!("{}/addon/search?q={}", self.base_url, urlencode(text));
        let response: Vec<ModResponse> = self.get_json(&url, "search results").await?;
        Ok(response.into_iter().map(ModResponse::into_mod).collect())
    }
}

/// Percent-encode the characters that matter in a query value.
fn urlencode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Derive a slug from a display name when the catalog entry has none.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

// Proxy wire format.

#[derive(Debug, Deserialize)]
struct AuthResponse {
    session: AuthSession,
}

#[derive(Debug, Deserialize)]
struct AuthSession {
    user_id: u64,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ModResponse {
    id: ModId,
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl ModResponse {
    fn into_mod(self) -> Mod {
        let slug = self
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&self.name));
        Mod {
            id: self.id,
            slug,
            name: self.name,
            summary: self.summary,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: Vec<FileResponse>,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    id: FileId,
    #[serde(default)]
    add_on_id: Option<ModId>,
    file_name_on_disk: String,
    #[serde(default)]
    display_name: Option<String>,
    file_date: String,
    release_type: String,
    game_version: Vec<String>,
    download_url: String,
    #[serde(default)]
    dependencies: Vec<DependencyResponse>,
}

#[derive(Debug, Deserialize)]
struct DependencyResponse {
    add_on_id: ModId,
    #[serde(default)]
    file_id: Option<FileId>,
    #[serde(rename = "type")]
    kind: String,
}

impl FileResponse {
    fn into_file(self, mod_id: ModId) -> Result<File, Error> {
        let date = DateTime::parse_from_rfc3339(&self.file_date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| Error::MetadataCorrupt {
                message: format!("file {}: invalid date '{}': {e}", self.id, self.file_date),
            })?;

        let release =
            ReleaseChannel::from_label(&self.release_type).ok_or_else(|| Error::MetadataCorrupt {
                message: format!(
                    "file {}: unknown release type '{}'",
                    self.id, self.release_type
                ),
            })?;

        let dependencies = self
            .dependencies
            .into_iter()
            .filter(|d| d.kind.eq_ignore_ascii_case("required"))
            .map(|d| Dependency {
                mod_id: d.add_on_id,
                file_id: d.file_id,
            })
            .collect();

        Ok(File {
            id: self.id,
            mod_id,
            display_name: self
                .display_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| self.file_name_on_disk.clone()),
            file_name: self.file_name_on_disk,
            date,
            release,
            game_versions: self.game_version.into_iter().collect(),
            dependencies,
            url: self.download_url,
        })
    }
}
