use serde::{Deserialize, Serialize};

/// Kiro steering inclusion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InclusionMode {
    Always,
    FileMatch,
    Manual,
}

impl InclusionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::FileMatch => "fileMatch",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for InclusionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InclusionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "always" => Ok(Self::Always),
            "fileMatch" | "file_match" | "filematch" => Ok(Self::FileMatch),
            "manual" => Ok(Self::Manual),
            other => Err(format!(
                "unknown inclusion mode '{other}' (expected always, fileMatch or manual)"
            )),
        }
    }
}

/// Generator options. Each format reads the fields that apply to it and
/// ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Path scoping: Cursor `globs`, Copilot `applyTo`.
    pub globs: Vec<String>,
    /// Cursor `alwaysApply`.
    pub always_apply: Option<bool>,
    /// Kiro `inclusion`. Mandatory for Kiro output.
    pub inclusion: Option<InclusionMode>,
    /// Kiro `fileMatchPattern`. Mandatory when `inclusion = fileMatch`.
    pub file_match_pattern: Option<String>,
    /// Claude `model`.
    pub model: Option<String>,
}

impl FormatConfig {
    /// Field-by-field merge: values set in `overrides` win.
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        Self {
            globs: if overrides.globs.is_empty() {
                self.globs.clone()
            } else {
                overrides.globs.clone()
            },
            always_apply: overrides.always_apply.or(self.always_apply),
            inclusion: overrides.inclusion.or(self.inclusion),
            file_match_pattern: overrides
                .file_match_pattern
                .clone()
                .or_else(|| self.file_match_pattern.clone()),
            model: overrides.model.clone().or_else(|| self.model.clone()),
        }
    }

    /// Non-blank glob patterns, trimmed.
    pub fn scoped_globs(&self) -> impl Iterator<Item = &str> {
        self.globs
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("always", InclusionMode::Always)]
    #[case("fileMatch", InclusionMode::FileMatch)]
    #[case("file_match", InclusionMode::FileMatch)]
    #[case("manual", InclusionMode::Manual)]
    fn parses_inclusion_modes(#[case] raw: &str, #[case] expected: InclusionMode) {
        assert_eq!(raw.parse::<InclusionMode>().unwrap(), expected);
    }

    #[test]
    fn inclusion_serializes_camel_case() {
        let raw = serde_json::to_string(&InclusionMode::FileMatch).unwrap();
        assert_eq!(raw, "\"fileMatch\"");
    }

    #[test]
    fn merge_prefers_overrides_per_field() {
        let defaults = FormatConfig {
            globs: vec!["**/*.rs".into()],
            model: Some("sonnet".into()),
            ..Default::default()
        };
        let overrides = FormatConfig {
            inclusion: Some(InclusionMode::Manual),
            model: Some("opus".into()),
            ..Default::default()
        };
        let merged = defaults.merged_with(&overrides);
        assert_eq!(merged.globs, vec!["**/*.rs"]);
        assert_eq!(merged.inclusion, Some(InclusionMode::Manual));
        assert_eq!(merged.model.as_deref(), Some("opus"));
    }

    #[test]
    fn blank_globs_are_not_scoping() {
        let cfg = FormatConfig {
            globs: vec!["  ".into(), " src/** ".into()],
            ..Default::default()
        };
        assert_eq!(cfg.scoped_globs().collect::<Vec<_>>(), vec!["src/**"]);
    }
}
