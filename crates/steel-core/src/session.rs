//! Local config and settings store (`~/.steel-cli/`)
//!
//! Reading never fails: a missing or unparseable file means "not logged
//! in" or "no settings".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "STEEL_CONFIG_DIR";

const CONFIG_DIR_NAME: &str = ".steel-cli";
const CONFIG_FILE: &str = "config.json";
const SETTINGS_FILE: &str = "settings.json";

/// Stored API credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub api_key: String,
    pub name: String,
}

/// Which API instance commands talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instance {
    #[default]
    Cloud,
    Local,
}

impl Instance {
    pub fn id(&self) -> &'static str {
        match self {
            Instance::Cloud => "cloud",
            Instance::Local => "local",
        }
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub instance: Instance,
}

impl Credential {
    /// The key with everything after the first seven characters hidden
    pub fn masked_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(7).collect();
        format!("{}...", prefix)
    }
}

/// Handle on the config directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$STEEL_CONFIG_DIR`, else `~/.steel-cli`
    pub fn from_env() -> Self {
        let dir = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Stored credential, or `None` when not logged in
    pub fn get_api_key(&self) -> Option<Credential> {
        Self::read_json::<Credential>(&self.config_path())
            .filter(|c| !c.api_key.is_empty() && !c.name.is_empty())
    }

    /// Store a credential, keeping unrelated keys of the config file
    pub fn set_api_key(&self, credential: &Credential) -> Result<()> {
        let path = self.config_path();
        let mut config = Self::read_json::<serde_json::Value>(&path)
            .filter(|v| v.is_object())
            .unwrap_or_else(|| serde_json::json!({}));
        if let Some(obj) = config.as_object_mut() {
            obj.insert("apiKey".into(), credential.api_key.clone().into());
            obj.insert("name".into(), credential.name.clone().into());
        }
        self.write_json(&path, &config)
    }

    /// Remove the credential, keeping other keys.
    ///
    /// Returns `false` if there was no readable config to clear.
    pub fn logout(&self) -> Result<bool> {
        let path = self.config_path();
        let Some(mut config) = Self::read_json::<serde_json::Value>(&path) else {
            return Ok(false);
        };
        let Some(obj) = config.as_object_mut() else {
            return Ok(false);
        };
        obj.remove("apiKey");
        obj.remove("name");
        self.write_json(&path, &config)?;
        Ok(true)
    }

    pub fn get_settings(&self) -> Option<Settings> {
        Self::read_json(&self.settings_path())
    }

    pub fn set_settings(&self, settings: &Settings) -> Result<()> {
        self.write_json(&self.settings_path(), settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("steel"));
        (dir, store)
    }

    #[test]
    fn test_missing_config_is_not_logged_in() {
        let (_dir, store) = store();
        assert_eq!(store.get_api_key(), None);
        assert_eq!(store.get_settings(), None);
    }

    #[test]
    fn test_unparseable_config_is_not_logged_in() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.config_path(), "{not json").unwrap();
        assert_eq!(store.get_api_key(), None);

        std::fs::write(store.config_path(), r#"{"apiKey": "", "name": "me"}"#).unwrap();
        assert_eq!(store.get_api_key(), None);
    }

    #[test]
    fn test_credential_roundtrip_and_logout() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.config_path(), r#"{"theme": "dark"}"#).unwrap();

        let credential = Credential {
            api_key: "ste-123".into(),
            name: "default".into(),
        };
        store.set_api_key(&credential).unwrap();
        assert_eq!(store.get_api_key(), Some(credential));

        assert!(store.logout().unwrap());
        assert_eq!(store.get_api_key(), None);
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.config_path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
    }

    #[test]
    fn test_logout_without_config() {
        let (_dir, store) = store();
        assert!(!store.logout().unwrap());
    }

    #[test]
    fn test_settings_roundtrip() {
        let (_dir, store) = store();
        store
            .set_settings(&Settings {
                instance: Instance::Local,
            })
            .unwrap();
        let raw = std::fs::read_to_string(store.settings_path()).unwrap();
        assert!(raw.contains("\"local\""));
        assert_eq!(store.get_settings().unwrap().instance, Instance::Local);
    }

    #[test]
    fn test_masked_key() {
        let credential = Credential {
            api_key: "ste-abcdefghijkl".into(),
            name: "ada".into(),
        };
        assert_eq!(credential.masked_key(), "ste-abc...");
    }
}
