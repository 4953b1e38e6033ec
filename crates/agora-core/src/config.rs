//! Configuration provider interface and the settings the core reads at
//! startup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use agora_content::ContentLimits;

use crate::error::{CoreError, CoreResult};

/// Key holding the next post identifier to issue.
pub const LAST_POST_ID_KEY: &str = "last_post_id";
/// Key holding the maximum title length, in characters.
pub const MAX_TITLE_LENGTH_KEY: &str = "post_max_title_length";
/// Key holding the maximum body length, in characters.
pub const MAX_CONTENT_LENGTH_KEY: &str = "post_max_content_length";

/// Where the core reads its settings from and persists the identifier
/// allocator at shutdown.
pub trait ConfigProvider: Send + Sync {
    /// Raw string value for `key`, or `None` if unset.
    fn get_preference(&self, key: &str) -> Option<String>;

    /// Persist the next post identifier to issue.
    fn save_last_id(&mut self, id: u64) -> CoreResult<()>;
}

// ---------------------------------------------------------------------------
// CoreConfig
// ---------------------------------------------------------------------------

/// Parsed startup settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// First identifier the allocator will issue.
    pub next_post_id: u64,
    pub limits: ContentLimits,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            next_post_id: 0,
            limits: ContentLimits::default(),
        }
    }
}

impl CoreConfig {
    /// Read and validate settings from a provider.
    ///
    /// Every key is required. The stored identifier must be a non-negative
    /// integer; the limits must be non-negative integers.
    pub fn from_provider(provider: &dyn ConfigProvider) -> CoreResult<Self> {
        let next_post_id = parse_non_negative(provider, LAST_POST_ID_KEY)?;
        let max_title_len = parse_non_negative(provider, MAX_TITLE_LENGTH_KEY)?;
        let max_content_len = parse_non_negative(provider, MAX_CONTENT_LENGTH_KEY)?;
        Ok(Self {
            next_post_id,
            limits: ContentLimits {
                max_title_len: to_usize(MAX_TITLE_LENGTH_KEY, max_title_len)?,
                max_content_len: to_usize(MAX_CONTENT_LENGTH_KEY, max_content_len)?,
            },
        })
    }
}

fn parse_non_negative(provider: &dyn ConfigProvider, key: &str) -> CoreResult<u64> {
    let raw = provider
        .get_preference(key)
        .ok_or_else(|| CoreError::invalid_config(key, "missing"))?;
    let trimmed = raw.trim();
    if let Some(magnitude) = trimmed.strip_prefix('-') {
        if magnitude.parse::<u64>().is_ok_and(|m| m > 0) {
            return Err(CoreError::invalid_config(key, format!("negative: {trimmed}")));
        }
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| CoreError::invalid_config(key, format!("not a number: {raw:?}")))
}

fn to_usize(key: &str, value: u64) -> CoreResult<usize> {
    usize::try_from(value).map_err(|_| CoreError::invalid_config(key, "out of range"))
}

// ---------------------------------------------------------------------------
// MemoryConfig
// ---------------------------------------------------------------------------

/// Map-backed provider for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfig {
    values: HashMap<String, String>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider holding the default settings.
    pub fn with_defaults() -> Self {
        let defaults = CoreConfig::default();
        Self::new()
            .with(LAST_POST_ID_KEY, defaults.next_post_id.to_string())
            .with(MAX_TITLE_LENGTH_KEY, defaults.limits.max_title_len.to_string())
            .with(MAX_CONTENT_LENGTH_KEY, defaults.limits.max_content_len.to_string())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

impl ConfigProvider for MemoryConfig {
    fn get_preference(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn save_last_id(&mut self, id: u64) -> CoreResult<()> {
        self.set(LAST_POST_ID_KEY, id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TomlConfig
// ---------------------------------------------------------------------------

/// Provider backed by a flat TOML file.
///
/// ```toml
/// last_post_id = 0
/// post_max_title_length = 20
/// post_max_content_length = 500
/// ```
///
/// Values may be integers, strings, floats or booleans; they are handed out
/// in their string form. [`ConfigProvider::save_last_id`] rewrites the file.
#[derive(Clone, Debug)]
pub struct TomlConfig {
    path: PathBuf,
    table: toml::Table,
}

impl TomlConfig {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)?;
        let table = text
            .parse::<toml::Table>()
            .map_err(|e| CoreError::ConfigFile(format!("{}: {e}", path.display())))?;
        Ok(Self { path, table })
    }

    /// Create a file holding the default settings.
    pub fn create_default(path: impl AsRef<Path>) -> CoreResult<Self> {
        let defaults = CoreConfig::default();
        let mut table = toml::Table::new();
        table.insert(LAST_POST_ID_KEY.into(), toml::Value::Integer(0));
        table.insert(
            MAX_TITLE_LENGTH_KEY.into(),
            toml::Value::Integer(defaults.limits.max_title_len as i64),
        );
        table.insert(
            MAX_CONTENT_LENGTH_KEY.into(),
            toml::Value::Integer(defaults.limits.max_content_len as i64),
        );
        let config = Self {
            path: path.as_ref().to_path_buf(),
            table,
        };
        config.write()?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> CoreResult<()> {
        let text = toml::to_string(&self.table)
            .map_err(|e| CoreError::ConfigFile(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn get_preference(&self, key: &str) -> Option<String> {
        match self.table.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn save_last_id(&mut self, id: u64) -> CoreResult<()> {
        // TOML integers are signed 64-bit; larger ids are kept as strings.
        let value = match i64::try_from(id) {
            Ok(v) => toml::Value::Integer(v),
            Err(_) => toml::Value::String(id.to_string()),
        };
        self.table.insert(LAST_POST_ID_KEY.into(), value);
        self.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_key(err: CoreError) -> String {
        match err {
            CoreError::ConfigurationInvalid { key, .. } => key,
            other => panic!("expected ConfigurationInvalid, got {other:?}"),
        }
    }

    #[test]
    fn defaults_parse() {
        let config = CoreConfig::from_provider(&MemoryConfig::with_defaults()).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn missing_last_id_is_invalid() {
        let mut provider = MemoryConfig::with_defaults();
        provider.remove(LAST_POST_ID_KEY);
        let err = CoreConfig::from_provider(&provider).unwrap_err();
        assert_eq!(invalid_key(err), LAST_POST_ID_KEY);
    }

    #[test]
    fn non_numeric_last_id_is_invalid() {
        let provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "twelve");
        let err = CoreConfig::from_provider(&provider).unwrap_err();
        assert_eq!(invalid_key(err), LAST_POST_ID_KEY);
    }

    #[test]
    fn negative_last_id_is_invalid() {
        let provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "-3");
        let err = CoreConfig::from_provider(&provider).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn ids_above_i64_max_are_accepted() {
        let big = u64::MAX.to_string();
        let provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, big);
        assert_eq!(CoreConfig::from_provider(&provider).unwrap().next_post_id, u64::MAX);

        let past_u64 =
            MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "18446744073709551616");
        let err = CoreConfig::from_provider(&past_u64).unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn negative_beyond_i64_and_bare_minus() {
        let bare = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "-");
        assert!(CoreConfig::from_provider(&bare)
            .unwrap_err()
            .to_string()
            .contains("not a number"));

        let huge_negative =
            MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "-9223372036854775809");
        assert!(CoreConfig::from_provider(&huge_negative)
            .unwrap_err()
            .to_string()
            .contains("negative"));
    }

    #[test]
    fn toml_keeps_large_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.toml");
        let mut provider = TomlConfig::create_default(&path).unwrap();
        let big = i64::MAX as u64 + 10;
        provider.save_last_id(big).unwrap();

        let reloaded = TomlConfig::load(&path).unwrap();
        assert_eq!(CoreConfig::from_provider(&reloaded).unwrap().next_post_id, big);
    }

    #[test]
    fn bad_limit_is_invalid() {
        let provider = MemoryConfig::with_defaults().with(MAX_TITLE_LENGTH_KEY, "-1");
        let err = CoreConfig::from_provider(&provider).unwrap_err();
        assert_eq!(invalid_key(err), MAX_TITLE_LENGTH_KEY);
    }

    #[test]
    fn whitespace_is_tolerated() {
        let provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, " 17 ");
        assert_eq!(CoreConfig::from_provider(&provider).unwrap().next_post_id, 17);
    }

    #[test]
    fn memory_save_last_id() {
        let mut provider = MemoryConfig::with_defaults();
        provider.save_last_id(99).unwrap();
        assert_eq!(provider.get_preference(LAST_POST_ID_KEY).as_deref(), Some("99"));
    }

    #[test]
    fn toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.toml");
        fs::write(
            &path,
            "last_post_id = 5\npost_max_title_length = \"30\"\npost_max_content_length = 200\n",
        )
        .unwrap();

        let mut provider = TomlConfig::load(&path).unwrap();
        let config = CoreConfig::from_provider(&provider).unwrap();
        assert_eq!(config.next_post_id, 5);
        assert_eq!(config.limits, ContentLimits::new(30, 200));

        provider.save_last_id(12).unwrap();
        let reloaded = TomlConfig::load(&path).unwrap();
        assert_eq!(reloaded.get_preference(LAST_POST_ID_KEY).as_deref(), Some("12"));
        assert_eq!(reloaded.get_preference(MAX_TITLE_LENGTH_KEY).as_deref(), Some("30"));
    }

    #[test]
    fn toml_create_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");
        TomlConfig::create_default(&path).unwrap();
        let provider = TomlConfig::load(&path).unwrap();
        assert_eq!(CoreConfig::from_provider(&provider).unwrap(), CoreConfig::default());
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "last_post_id = = 3").unwrap();
        assert!(matches!(TomlConfig::load(&path), Err(CoreError::ConfigFile(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TomlConfig::load(dir.path().join("nope.toml")),
            Err(CoreError::Io(_))
        ));
    }
}
