//! Configuration validation.
//!
//! Detects unknown/misspelled fields and format tables, type errors, and
//! option combinations that make a target format refuse to render.

use std::path::{Path, PathBuf};

use {
    canon_formats::{Format, FormatConfig, InclusionMode},
    serde_json::{Map, Value},
};

use crate::{loader, schema::CanonConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "unknown-format", "type-error",
    /// "requirement", "ignored-option", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "formats.kiro.inclusion"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["defaults", "formats", "batch"];
const OPTION_KEYS: &[&str] = &[
    "globs",
    "always_apply",
    "inclusion",
    "file_match_pattern",
    "model",
];
const BATCH_KEYS: &[&str] = &["concurrency", "fail_fast"];

/// Option keys each format reads.
fn applicable_options(format: Format) -> &'static [&'static str] {
    match format {
        Format::Claude => &["model"],
        Format::Cursor => &["globs", "always_apply"],
        Format::Copilot => &["globs"],
        Format::Kiro => &["inclusion", "file_match_pattern"],
        Format::AgentSkills => &[],
    }
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest candidate within `max_distance` edits.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let mut result = validate_str(&content, actual_path);
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "file-ref",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate config text without touching the file system. `path` only
/// selects the syntax by extension.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let value = match loader::parse_config_value(raw, path) {
        Ok(Value::Null) => Value::Object(Map::new()),
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("{} syntax error: {e}", loader::extension(path)),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields and format tables
    check_unknown_fields(&value, &mut diagnostics);

    // 3. Types, then semantics on the typed config
    match serde_json::from_value::<CanonConfig>(value) {
        Ok(config) => check_semantics(&config.normalized(), &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn unknown_keys(
    table: &Map<String, Value>,
    known: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        let (path, level) = if prefix.is_empty() {
            (key.clone(), "unknown field at top level")
        } else {
            (format!("{prefix}.{key}"), "unknown field")
        };
        let message = match suggest(key, known, 3) {
            Some(s) => format!("{level} (did you mean \"{s}\"?)"),
            None => level.to_string(),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_unknown_fields(value: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_object() else {
        return;
    };
    unknown_keys(root, TOP_LEVEL_KEYS, "", diagnostics);

    if let Some(defaults) = root.get("defaults").and_then(Value::as_object) {
        unknown_keys(defaults, OPTION_KEYS, "defaults", diagnostics);
    }
    if let Some(batch) = root.get("batch").and_then(Value::as_object) {
        unknown_keys(batch, BATCH_KEYS, "batch", diagnostics);
    }

    let Some(formats) = root.get("formats").and_then(Value::as_object) else {
        return;
    };
    let tags: Vec<&str> = Format::ALL.iter().map(|f| f.tag()).collect();
    for (name, table) in formats {
        let path = format!("formats.{name}");
        let Ok(format) = name.parse::<Format>() else {
            let message = match suggest(name, &tags, 3) {
                Some(s) => format!("unknown format (did you mean \"{s}\"?)"),
                None => format!("unknown format (expected one of: {})", tags.join(", ")),
            };
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "unknown-format",
                path,
                message,
            });
            continue;
        };
        if name != format.tag() {
            diagnostics.push(Diagnostic {
                severity: Severity::Info,
                category: "unknown-format",
                path: path.clone(),
                message: format!("read as \"{}\"", format.tag()),
            });
        }
        let Some(table) = table.as_object() else {
            continue;
        };
        unknown_keys(table, OPTION_KEYS, &path, diagnostics);

        let applicable = applicable_options(format);
        for key in table.keys() {
            if OPTION_KEYS.contains(&key.as_str()) && !applicable.contains(&key.as_str()) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Info,
                    category: "ignored-option",
                    path: format!("{path}.{key}"),
                    message: format!("option is ignored by {}", format.display_name()),
                });
            }
        }
    }
}

fn check_semantics(config: &CanonConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.batch.concurrency == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: "batch.concurrency".into(),
            message: "concurrency must be at least 1".into(),
        });
    }

    let kiro = config.options_for(Format::Kiro);
    let kiro_table = config.formats.get(Format::Kiro.tag());
    let path = match kiro_table {
        Some(table) if table.inclusion.is_some() || table.file_match_pattern.is_some() => {
            "formats.kiro"
        },
        _ => "defaults",
    };
    check_file_match(&kiro, path, diagnostics);

    if kiro_table.is_some() && kiro.inclusion.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "requirement",
            path: "formats.kiro.inclusion".into(),
            message: "Kiro output requires an inclusion mode (always, fileMatch or manual)".into(),
        });
    }
}

fn check_file_match(options: &FormatConfig, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let has_pattern = options
        .file_match_pattern
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    if options.inclusion == Some(InclusionMode::FileMatch) && !has_pattern {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "requirement",
            path: format!("{path}.file_match_pattern"),
            message: "inclusion = fileMatch requires file_match_pattern".into(),
        });
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn toml(raw: &str) -> ValidationResult {
        validate_str(raw, Path::new("canon.toml"))
    }

    fn find<'a>(result: &'a ValidationResult, path: &str) -> Option<&'a Diagnostic> {
        result.diagnostics.iter().find(|d| d.path == path)
    }

    #[rstest]
    #[case("", "", 0)]
    #[case("", "abc", 3)]
    #[case("kitten", "sitting", 3)]
    #[case("cursor", "curser", 1)]
    fn levenshtein_distances(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn suggest_ignores_distant_candidates() {
        assert_eq!(suggest("modle", OPTION_KEYS, 3), Some("model"));
        assert_eq!(suggest("zzzzzzzz", OPTION_KEYS, 3), None);
    }

    #[test]
    fn empty_config_is_valid() {
        let result = toml("");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn full_valid_config_no_diagnostics() {
        let result = toml(
            r#"
[defaults]
model = "sonnet"

[formats.kiro]
inclusion = "fileMatch"
file_match_pattern = "**/*.ts"

[formats.cursor]
globs = ["src/**"]
always_apply = false

[batch]
concurrency = 8
fail_fast = true
"#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = toml("[defualts]\nmodel = \"x\"\n");
        let d = find(&result, "defualts").unwrap();
        assert_eq!(d.category, "unknown-field");
        assert!(d.message.contains("did you mean \"defaults\""));
        assert!(result.has_errors());
    }

    #[test]
    fn unknown_option_key_inside_format_table() {
        let result = toml("[formats.kiro]\ninclusion = \"always\"\nfile_match_patern = \"x\"\n");
        let d = find(&result, "formats.kiro.file_match_patern").unwrap();
        assert!(d.message.contains("did you mean \"file_match_pattern\""));
    }

    #[test]
    fn misspelled_format_table() {
        let result = toml("[formats.cursr]\nglobs = []\n");
        let d = find(&result, "formats.cursr").unwrap();
        assert_eq!(d.category, "unknown-format");
        assert!(d.message.contains("did you mean \"cursor\""));
    }

    #[test]
    fn zero_concurrency_is_error() {
        let result = toml("[batch]\nconcurrency = 0\n");
        assert!(find(&result, "batch.concurrency").is_some());
        assert_eq!(result.count(Severity::Error), 1);
    }

    #[test]
    fn file_match_without_pattern_is_error() {
        let result = toml("[formats.kiro]\ninclusion = \"fileMatch\"\n");
        let d = find(&result, "formats.kiro.file_match_pattern").unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.category, "requirement");
    }

    #[test]
    fn pattern_from_defaults_satisfies_file_match() {
        let result = toml(
            "[defaults]\nfile_match_pattern = \"**/*.ts\"\n\n[formats.kiro]\ninclusion = \"fileMatch\"\n",
        );
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn file_match_in_defaults_without_pattern_is_error() {
        let result = toml("[defaults]\ninclusion = \"fileMatch\"\n");
        let d = find(&result, "defaults.file_match_pattern").unwrap();
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn non_canonical_format_tag_is_reported_and_applied() {
        let result = toml("[formats.Kiro]\nglobs = [\"x\"]\n");
        let d = find(&result, "formats.Kiro").unwrap();
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.message, "read as \"kiro\"");
        let d = find(&result, "formats.kiro.inclusion").unwrap();
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn kiro_table_without_inclusion_warns() {
        let result = toml("[formats.kiro]\nfile_match_pattern = \"*.md\"\n");
        let d = find(&result, "formats.kiro.inclusion").unwrap();
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn inapplicable_options_are_info() {
        let result = toml("[formats.copilot]\nglobs = [\"*.py\"]\nmodel = \"opus\"\n");
        let d = find(&result, "formats.copilot.model").unwrap();
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.message, "option is ignored by Copilot");
        assert!(!result.has_errors());
    }

    #[test]
    fn type_errors_are_reported() {
        let result = toml("[batch]\nconcurrency = \"many\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn syntax_errors_stop_validation() {
        let result = toml("[batch\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn yaml_configs_validate_too() {
        let result = validate_str("batch:\n  concurency: 2\n", Path::new("canon.yaml"));
        let d = find(&result, "batch.concurency").unwrap();
        assert!(d.message.contains("did you mean \"concurrency\""));
    }

    #[test]
    fn validates_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canon.toml");
        std::fs::write(&path, "[batch]\nconcurrency = 0\n").unwrap();
        let result = validate(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert!(result.has_errors());
    }
}
