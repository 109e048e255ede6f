use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Environment variable overriding `user.name`.
pub const AUTHOR_NAME_ENV: &str = "KIT_AUTHOR_NAME";
/// Environment variable overriding `user.email`.
pub const AUTHOR_EMAIL_ENV: &str = "KIT_AUTHOR_EMAIL";

/// Repository configuration, stored as TOML in `<metadata dir>/config.toml`.
///
/// ```toml
/// [core]
/// compression_level = 6
///
/// [user]
/// name = "Ada Lovelace"
/// email = "ada@example.com"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub core: CoreConfig,
    pub user: UserConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// zlib level (0-9) for newly written objects.
    pub compression_level: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

/// Identity stamped on new commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "kit".into(),
            email: "kit@localhost".into(),
        }
    }
}

impl RepoConfig {
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load `config.toml` from the metadata directory, falling back to
    /// defaults when the file does not exist, then apply environment
    /// overrides.
    pub fn load(metadata_dir: &Path) -> SdkResult<Self> {
        let path = metadata_dir.join(Self::FILE_NAME);
        let config = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|e| SdkError::Config {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(SdkError::io(path, e)),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate().map_err(|reason| SdkError::Config { path, reason })?;
        Ok(config)
    }

    /// Apply `KIT_AUTHOR_*` overrides using `lookup` to read variables.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup(AUTHOR_NAME_ENV) {
            self.user.name = name;
        }
        if let Some(email) = lookup(AUTHOR_EMAIL_ENV) {
            self.user.email = email;
        }
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.core.compression_level > 9 {
            return Err(format!(
                "core.compression_level must be 0-9, got {}",
                self.core.compression_level
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RepoConfig::default();
        assert_eq!(c.core.compression_level, 6);
        assert_eq!(c.user.name, "kit");
        assert_eq!(c.user.email, "kit@localhost");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(c.core, CoreConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(RepoConfig::FILE_NAME),
            "[core]\ncompression_level = 1\n",
        )
        .unwrap();
        let c = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(c.core.compression_level, 1);
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(RepoConfig::FILE_NAME),
            "[core]\ncompression_level = 12\n",
        )
        .unwrap();
        assert!(matches!(
            RepoConfig::load(dir.path()),
            Err(SdkError::Config { .. })
        ));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RepoConfig::FILE_NAME), "[core\n").unwrap();
        assert!(matches!(
            RepoConfig::load(dir.path()),
            Err(SdkError::Config { .. })
        ));
    }

    #[test]
    fn overrides_replace_user() {
        let c = RepoConfig::default().with_overrides(|key| match key {
            AUTHOR_NAME_ENV => Some("Grace".into()),
            _ => None,
        });
        assert_eq!(c.user.name, "Grace");
        assert_eq!(c.user.email, "kit@localhost");
    }
}
