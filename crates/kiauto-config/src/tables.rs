//! Literal substitution and measurement tables.
//!
//! KiCad builds several dialogs without mnemonic accelerators, so the
//! automation can't reach some controls from the keyboard. The interposer
//! injects a `_` into known labels on the way to GTK. Matching is by exact
//! equality, first match wins; any upstream wording change silently turns an
//! entry into a no-op.
//!
//! The same file carries the fixed strings Pango lays out while measuring
//! fonts, which are dropped from the trace.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ConfigError, ENV_TABLES};

/// Accelerator marker GTK understands in mnemonic labels
pub const MNEMONIC_MARKER: u8 = b'_';

/// One literal rewrite: `pattern` is replaced by `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// The replacement must be the pattern with exactly one marker inserted.
    pub fn check(&self) -> Result<(), &'static str> {
        let pattern = self.pattern.as_bytes();
        let replacement = self.replacement.as_bytes();
        if pattern.is_empty() {
            return Err("empty pattern");
        }
        if replacement.len() != pattern.len() + 1 {
            return Err("replacement must be one character longer than the pattern");
        }
        let split = pattern
            .iter()
            .zip(replacement)
            .take_while(|(a, b)| a == b)
            .count();
        if replacement[split] != MNEMONIC_MARKER || replacement[split + 1..] != pattern[split..] {
            return Err("replacement must only insert one `_`");
        }
        Ok(())
    }
}

/// Ordered literal table for one call site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewriteTable(Vec<Substitution>);

impl RewriteTable {
    pub fn new(entries: Vec<Substitution>) -> Self {
        Self(entries)
    }

    /// First entry whose pattern equals `text` byte for byte
    pub fn lookup(&self, text: &[u8]) -> Option<&Substitution> {
        self.0.iter().find(|s| s.pattern.as_bytes() == text)
    }

    pub fn entries(&self) -> &[Substitution] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn retain_valid(&mut self, site: &'static str) {
        self.0.retain(|s| match s.check() {
            Ok(()) => true,
            Err(reason) => {
                warn!(site, pattern = %s.pattern, reason, "Dropping invalid substitution");
                false
            }
        });
    }
}

impl From<&[(&str, &str)]> for RewriteTable {
    fn from(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(p, r)| Substitution::new(*p, *r))
                .collect(),
        )
    }
}

/// Per call site tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteTables {
    /// `gtk_label_set_text`
    pub label_set_text: RewriteTable,
    /// `gtk_button_set_label`
    pub button_set_label: RewriteTable,
    /// `gtk_check_button_new_with_label`
    pub check_button_new_with_label: RewriteTable,
    /// `gtk_radio_button_new_with_label`
    pub radio_button_new_with_label: RewriteTable,
}

impl Default for RewriteTables {
    fn default() -> Self {
        Self {
            label_set_text: RewriteTable::from(
                &[
                    // DRC dialog
                    (
                        "Report all errors for tracks (slower)",
                        "_Report all errors for tracks (slower)",
                    ),
                    (
                        "Report all track errors (slower)",
                        "Report all _track errors (slower)",
                    ),
                    (
                        "Refill all zones before performing DRC",
                        "Refill all _zones before performing DRC",
                    ),
                    (
                        "Test for parity between PCB and schematic",
                        "Test for _parity between PCB and schematic",
                    ),
                    // Plot dialog
                    ("Plot footprint values", "Plot footprint _values"),
                    ("Plot reference designators", "Plot _reference designators"),
                    (
                        "Exclude PCB edge layer from other layers",
                        "_Exclude PCB edge layer from other layers",
                    ),
                    ("Use drill/place file origin", "Use drill/place file _origin"),
                    ("Generate Gerber job file", "Generate Gerber _job file"),
                    (
                        "Subtract soldermask from silkscreen",
                        "Subtract soldermask from _silkscreen",
                    ),
                    (
                        "Use extended X2 format (recommended)",
                        "Use extended X_2 format (recommended)",
                    ),
                    ("Include netlist attributes", "Include _netlist attributes"),
                    (
                        "Disable aperture macros (not recommended)",
                        "Disable aperture _macros (not recommended)",
                    ),
                ][..],
            ),
            button_set_label: RewriteTable::from(
                &[
                    ("Run DRC", "_Run DRC"),
                    ("Generate Drill Files...", "_Generate Drill Files..."),
                    ("Plot", "_Plot"),
                ][..],
            ),
            check_button_new_with_label: RewriteTable::from(
                &[
                    ("Plot border and title block", "Plot _border and title block"),
                    ("Print border and title block", "Print _border and title block"),
                    ("Print background color", "Print background _color"),
                ][..],
            ),
            radio_button_new_with_label: RewriteTable::from(
                &[
                    ("Black and white", "_Black and white"),
                    ("Color", "_Color"),
                ][..],
            ),
        }
    }
}

impl RewriteTables {
    /// All tables with the name they are configured under
    pub fn sites(&self) -> [(&'static str, &RewriteTable); 4] {
        [
            ("label_set_text", &self.label_set_text),
            ("button_set_label", &self.button_set_label),
            ("check_button_new_with_label", &self.check_button_new_with_label),
            ("radio_button_new_with_label", &self.radio_button_new_with_label),
        ]
    }

    fn sites_mut(&mut self) -> [(&'static str, &mut RewriteTable); 4] {
        [
            ("label_set_text", &mut self.label_set_text),
            ("button_set_label", &mut self.button_set_label),
            ("check_button_new_with_label", &mut self.check_button_new_with_label),
            ("radio_button_new_with_label", &mut self.radio_button_new_with_label),
        ]
    }
}

/// Strings Pango lays out to measure fonts; never worth a trace line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PangoTable {
    pub ignored: Vec<String>,
}

impl Default for PangoTable {
    fn default() -> Self {
        Self {
            ignored: vec![
                "g".to_string(),
                "...".to_string(),
                "ABCDEFHXfgkj".to_string(),
                // Bullet glyphs used by password entries and list markers
                "\u{2022}".to_string(),
                "\u{25CF}".to_string(),
            ],
        }
    }
}

impl PangoTable {
    pub fn is_ignored(&self, text: &[u8]) -> bool {
        self.ignored.iter().any(|p| p.as_bytes() == text)
    }
}

/// Everything the call sites look up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterposerTables {
    pub pango: PangoTable,
    pub rewrite: RewriteTables,
}

impl InterposerTables {
    /// Parse a tables file. Sections left out keep their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Tables from `KIAUTO_INTERPOSER_TABLES`, or the defaults.
    /// Invalid substitutions are dropped.
    pub fn from_env() -> Self {
        let mut tables = match std::env::var_os(ENV_TABLES) {
            Some(path) => {
                let path = Path::new(&path);
                match Self::load(path) {
                    Ok(tables) => {
                        debug!(path = %path.display(), "Loaded interposer tables");
                        tables
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Unreadable tables, using defaults");
                        Self::default()
                    }
                }
            }
            None => Self::default(),
        };
        tables.retain_valid();
        tables
    }

    /// Every substitution that breaks the one-marker rule
    pub fn problems(&self) -> Vec<ConfigError> {
        self.rewrite
            .sites()
            .into_iter()
            .flat_map(|(site, table)| {
                table.entries().iter().filter_map(move |s| {
                    s.check()
                        .err()
                        .map(|reason| ConfigError::InvalidSubstitution {
                            site,
                            pattern: s.pattern.clone(),
                            replacement: s.replacement.clone(),
                            reason,
                        })
                })
            })
            .collect()
    }

    pub fn retain_valid(&mut self) {
        for (site, table) in self.rewrite.sites_mut() {
            table.retain_valid(site);
        }
    }

    /// Generate the default tables as TOML
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}
