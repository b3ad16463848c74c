use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuthError;

const KEYRING_USER: &str = "id-token";
const TOKEN_ENV_VAR: &str = "FINSIGHT_AUTH__TOKEN";
const CREDENTIALS_FILE_NAME: &str = "credentials";

/// Where a loaded token came from (for status display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Keyring,
    Env,
    File,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyring => "keyring",
            Self::Env => "env",
            Self::File => "file",
        })
    }
}

/// Persisted ID token storage.
///
/// Load priority: keyring → `FINSIGHT_AUTH__TOKEN` env → credentials file.
/// Writes go to the keyring, falling back to a `0600` file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    keyring_service: Option<String>,
    read_env: bool,
    credentials_path: PathBuf,
}

impl TokenStore {
    /// Store using the OS keychain under `keyring_service`, with the
    /// credentials file at `credentials_file` or `~/.finsight/credentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if no override is given and the
    /// home directory cannot be resolved.
    pub fn new(
        keyring_service: &str,
        credentials_file: Option<PathBuf>,
    ) -> Result<Self, AuthError> {
        let credentials_path = match credentials_file {
            Some(path) => path,
            None => default_credentials_path()?,
        };
        Ok(Self {
            keyring_service: Some(keyring_service.to_string()),
            read_env: true,
            credentials_path,
        })
    }

    /// File-only store: no keyring, no env var. Used in tests and headless
    /// environments without a secret service.
    #[must_use]
    pub fn file_only(path: impl Into<PathBuf>) -> Self {
        Self {
            keyring_service: None,
            read_env: false,
            credentials_path: path.into(),
        }
    }

    #[must_use]
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Persist a token. Falls back to file if the keyring is unavailable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if both keyring and file storage fail.
    pub fn store(&self, jwt: &str) -> Result<(), AuthError> {
        let Some(service) = &self.keyring_service else {
            return self.store_file(jwt);
        };
        match keyring::Entry::new(service, KEYRING_USER) {
            Ok(entry) => match entry.set_password(jwt) {
                Ok(()) => Ok(()),
                Err(error) => {
                    tracing::warn!(%error, "keyring store failed; falling back to file");
                    self.store_file(jwt)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "keyring unavailable; falling back to file");
                self.store_file(jwt)
            }
        }
    }

    /// Load the stored token along with the tier it came from.
    #[must_use]
    pub fn load(&self) -> Option<(String, TokenSource)> {
        if let Some(service) = &self.keyring_service
            && let Ok(entry) = keyring::Entry::new(service, KEYRING_USER)
            && let Ok(token) = entry.get_password()
            && !token.trim().is_empty()
        {
            return Some((token, TokenSource::Keyring));
        }

        if self.read_env
            && let Ok(token) = std::env::var(TOKEN_ENV_VAR)
            && !token.trim().is_empty()
        {
            return Some((token, TokenSource::Env));
        }

        self.load_file().map(|token| (token, TokenSource::File))
    }

    /// Delete stored credentials from keyring and file.
    ///
    /// A token supplied through the env var cannot be removed and keeps
    /// being loaded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the credentials file cannot be removed.
    pub fn delete(&self) -> Result<(), AuthError> {
        if let Some(service) = &self.keyring_service
            && let Ok(entry) = keyring::Entry::new(service, KEYRING_USER)
        {
            // may not exist
            let _ = entry.delete_credential();
        }

        let path = &self.credentials_path;
        if path.exists() {
            fs::remove_file(path).map_err(|e| {
                AuthError::TokenStoreError(format!("failed to delete {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    fn store_file(&self, jwt: &str) -> Result<(), AuthError> {
        let path = &self.credentials_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::TokenStoreError(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(path, jwt)
            .map_err(|e| AuthError::TokenStoreError(format!("write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStoreError(format!("chmod {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    fn load_file(&self) -> Option<String> {
        fs::read_to_string(&self.credentials_path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

fn default_credentials_path() -> Result<PathBuf, AuthError> {
    dirs::home_dir()
        .map(|h| h.join(".finsight").join(CREDENTIALS_FILE_NAME))
        .ok_or_else(|| {
            AuthError::TokenStoreError("home directory not found; cannot store credentials".into())
        })
}
