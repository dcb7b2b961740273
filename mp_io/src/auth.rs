//! Authorization token storage for the catalog proxy.
//!
//! The resolution engine never reads this; only the API client attaches the
//! token to its requests, and only the `auth` command writes it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use mp_core::Error;

/// A proxy session token, sent as `Authorization: Token {user_id}:{token}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub user_id: u64,
    pub token: String,
}

impl Token {
    /// Header value for authenticated proxy requests.
    pub fn header_value(&self) -> String {
        format!("Token {}:{}", self.user_id, self.token)
    }

    /// Load stored credentials. `Ok(None)` when no token has been saved.
    pub fn load(path: &Path) -> Result<Option<Self>, Error> {
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::MetadataCorrupt {
                    message: format!("failed to read token file: {e}"),
                });
            }
        };

        let token = serde_json::from_str(&body).map_err(|e| Error::MetadataCorrupt {
            message: format!("invalid token file: {e}"),
        })?;

        Ok(Some(token))
    }

    /// Store credentials for future invocations.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::MetadataCorrupt {
                message: format!("failed to create token directory: {e}"),
            })?;
        }

        let body = serde_json::to_string_pretty(self).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to serialize token: {e}"),
        })?;

        fs::write(path, body).map_err(|e| Error::MetadataCorrupt {
            message: format!("failed to write token file: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token.json");

        let token = Token {
            user_id: 42,
            token: "s3cret".to_string(),
        };
        token.save(&path).unwrap();

        let loaded = Token::load(&path).unwrap().unwrap();
        assert_eq!(loaded, token);
        assert_eq!(loaded.header_value(), "Token 42:s3cret");
    }

    #[test]
    fn missing_token_file_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let loaded = Token::load(&tmp.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_token_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token.json");
        fs::write(&path, "{not json").unwrap();

        let err = Token::load(&path).unwrap_err();
        assert!(matches!(err, Error::MetadataCorrupt { .. }));
    }
}
