//! Config schema: generator options and batch policy.

use std::collections::BTreeMap;

use {
    canon_formats::{Format, FormatConfig},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    /// Options applied to every target format.
    pub defaults: FormatConfig,
    /// Per-format overrides keyed by format tag, merged over `defaults`.
    pub formats: BTreeMap<String, FormatConfig>,
    pub batch: BatchConfig,
}

impl CanonConfig {
    /// Effective generator options for `format`.
    #[must_use]
    pub fn options_for(&self, format: Format) -> FormatConfig {
        match self.formats.get(format.tag()) {
            Some(overrides) => self.defaults.merged_with(overrides),
            None => self.defaults.clone(),
        }
    }

    /// Re-key `formats` by canonical tag so `[formats.Kiro]` reaches Kiro.
    /// Tables naming the same format are merged in key order; unknown names
    /// are kept as written.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let mut formats: BTreeMap<String, FormatConfig> = BTreeMap::new();
        for (name, options) in std::mem::take(&mut self.formats) {
            let key = name
                .parse::<Format>()
                .map_or(name, |format| format.tag().to_string());
            match formats.remove(&key) {
                Some(existing) => {
                    formats.insert(key, existing.merged_with(&options));
                },
                None => {
                    formats.insert(key, options);
                },
            }
        }
        self.formats = formats;
        self
    }
}

/// Batch conversion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Files converted at the same time. Must be at least 1.
    pub concurrency: usize,
    /// Stop scheduling new files after the first failure.
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fail_fast: false,
        }
    }
}
