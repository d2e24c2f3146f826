//! Config module.
//! Loads one flat `[section]` of key/value settings from an INI file.
//! Parsing goes through `rust-ini` with quote and escape handling off, so values stay raw strings.
//! Entries of a `[DEFAULT]` section fill in keys the named section leaves out.
//! Key lookups ignore ASCII case, the way INI readers conventionally treat option names.

use anyhow::{Context, Result, anyhow};
use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Section whose entries every other section falls back to.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Where a section was read from, for error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Origin {
    File(PathBuf),
    Inline,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Inline => write!(f, "<inline>"),
        }
    }
}

/// A single named section of device settings.
#[derive(Clone, Debug)]
pub struct Section {
    name: String,
    origin: Origin,
    entries: BTreeMap<String, String>,
}

/// Quotes and backslashes are part of the value (passwords, tokens).
fn raw_values() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

impl Section {
    /// Reads the INI file at `path` and extracts section `name`.
    /// Fails if the file cannot be read or parsed, or the section is absent.
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let ini = Ini::load_from_file_opt(path, raw_values())
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_ini(&ini, name, Origin::File(path.to_path_buf()))
    }

    /// Same as [`Section::load`] but parses in-memory INI text.
    pub fn from_ini_str(text: &str, name: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(text, raw_values())
            .context("Failed to parse inline INI settings")?;

        Self::from_ini(&ini, name, Origin::Inline)
    }

    fn from_ini(ini: &Ini, name: &str, origin: Origin) -> Result<Self> {
        let section = ini
            .section(Some(name))
            .ok_or_else(|| anyhow!("Section [{}] not found in {}", name, origin))?;

        let mut entries = BTreeMap::new();
        if name != DEFAULT_SECTION {
            if let Some(defaults) = ini.section(Some(DEFAULT_SECTION)) {
                for (key, value) in defaults.iter() {
                    entries.insert(key.to_ascii_lowercase(), value.to_string());
                }
            }
        }
        for (key, value) in section.iter() {
            entries.insert(key.to_ascii_lowercase(), value.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            origin,
            entries,
        })
    }

    /// Returns the value for `key`, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| {
                anyhow!(
                    "Missing key `{}` in section [{}] of {}",
                    key,
                    self.name,
                    self.origin
                )
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
