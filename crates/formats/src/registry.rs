//! Closed registry of supported formats.
//!
//! Every [`Format`] variant maps to one [`FormatCodec`] through an exhaustive
//! `match`, so adding a format cannot compile until it has both a parser and
//! a generator.

use std::panic::{self, AssertUnwindSafe};

use {
    canon_model::CanonicalPackage,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    formats::{
        agent_skills::AgentSkillsCodec, claude::ClaudeCodec, copilot::CopilotCodec,
        cursor::CursorCodec, kiro::KiroCodec,
    },
    options::FormatConfig,
    parse::{ParseMetadata, minimal_package},
    quality::{self, ScorePolicy},
    render::Capabilities,
    result::{ConversionResult, Warning},
};

/// Parser + generator pair for one format.
pub trait FormatCodec: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Raw document → canonical package. Must not fail; degrade instead.
    fn parse(&self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage;

    /// Canonical package → rendered document.
    ///
    /// Returning `Err` is how a generator refuses (missing hard requirement,
    /// render failure); nothing partial is ever emitted.
    fn render(&self, pkg: &CanonicalPackage, options: &FormatConfig) -> Result<Rendered>;
}

/// Successful render before scoring.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub content: String,
    pub warnings: Vec<Warning>,
    pub policy: ScorePolicy,
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Claude,
    Cursor,
    Copilot,
    Kiro,
    AgentSkills,
}

impl Format {
    pub const ALL: [Self; 5] = [
        Self::Claude,
        Self::Cursor,
        Self::Copilot,
        Self::Kiro,
        Self::AgentSkills,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        self.capabilities().tag
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        self.capabilities().display
    }

    #[must_use]
    pub fn capabilities(self) -> Capabilities {
        self.codec().capabilities()
    }

    fn codec(self) -> &'static dyn FormatCodec {
        match self {
            Self::Claude => &ClaudeCodec,
            Self::Cursor => &CursorCodec,
            Self::Copilot => &CopilotCodec,
            Self::Kiro => &KiroCodec,
            Self::AgentSkills => &AgentSkillsCodec,
        }
    }

    /// Parse a raw document. Never fails; a parser panic yields the
    /// metadata-only package.
    #[must_use]
    pub fn parse(self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
        let codec = self.codec();
        panic::catch_unwind(AssertUnwindSafe(|| codec.parse(raw, meta))).unwrap_or_else(|payload| {
            warn!(
                format = self.tag(),
                id = %meta.id,
                reason = %panic_message(payload.as_ref()),
                "parser panicked, using minimal package"
            );
            minimal_package(self.tag(), meta)
        })
    }

    /// Render a package. Never fails; errors and panics become a
    /// zero-score [`ConversionResult`].
    #[must_use]
    pub fn generate(self, pkg: &CanonicalPackage, options: &FormatConfig) -> ConversionResult {
        let codec = self.codec();
        match panic::catch_unwind(AssertUnwindSafe(|| codec.render(pkg, options))) {
            Ok(Ok(rendered)) => {
                let warnings: Vec<String> =
                    rendered.warnings.iter().map(ToString::to_string).collect();
                let quality_score = quality::score(pkg, &warnings, rendered.policy);
                debug!(
                    format = self.tag(),
                    id = %pkg.id,
                    warnings = warnings.len(),
                    quality_score,
                    "generated"
                );
                ConversionResult {
                    content: rendered.content,
                    format: self.tag().to_string(),
                    lossy_conversion: quality::is_lossy(&warnings),
                    warnings,
                    quality_score,
                }
            },
            Ok(Err(error)) => {
                warn!(format = self.tag(), id = %pkg.id, %error, "conversion failed");
                ConversionResult::failed(self.tag(), error)
            },
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(format = self.tag(), id = %pkg.id, %reason, "generator panicked");
                ConversionResult::failed(self.tag(), reason)
            },
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.tag() == wanted)
            .ok_or_else(|| Error::unsupported(s.trim()))
    }
}

/// Parse `raw` as `from` and render it as `to`.
///
/// Unknown format tags are the only error; everything else is reported
/// inside the returned [`ConversionResult`].
pub fn convert(
    raw: &str,
    from: &str,
    to: &str,
    meta: &ParseMetadata,
    options: &FormatConfig,
) -> Result<ConversionResult> {
    let from: Format = from.parse()?;
    let to: Format = to.parse()?;
    let pkg = from.parse(raw, meta);
    Ok(to.generate(&pkg, options))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "generator panicked".to_string()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("claude", Format::Claude)]
    #[case("CURSOR", Format::Cursor)]
    #[case(" copilot ", Format::Copilot)]
    #[case("kiro", Format::Kiro)]
    #[case("agent-skills", Format::AgentSkills)]
    fn parses_known_tags(#[case] raw: &str, #[case] expected: Format) {
        assert_eq!(raw.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "windsurf".parse::<Format>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { ref format } if format == "windsurf"));
        assert_eq!(err.to_string(), "format not supported: 'windsurf'");
    }

    #[test]
    fn tags_round_trip_through_serde() {
        for format in Format::ALL {
            let raw = serde_json::to_string(&format).unwrap();
            assert_eq!(raw, format!("\"{}\"", format.tag()));
        }
    }

    #[test]
    fn convert_rejects_unknown_pairs_before_parsing() {
        let meta = ParseMetadata::new("x");
        let options = FormatConfig::default();
        assert!(matches!(
            convert("body", "claude", "nope", &meta, &options),
            Err(Error::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            convert("body", "nope", "claude", &meta, &options),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn convert_runs_parse_then_generate() {
        let result = convert(
            "---\nname: helper\ndescription: Helps\n---\n# Helper\n\nDo things.",
            "claude",
            "agent-skills",
            &ParseMetadata::new("helper"),
            &FormatConfig::default(),
        )
        .unwrap();
        assert_eq!(result.format, "agent-skills");
        assert_eq!(result.quality_score, 100);
        assert!(result.content.contains("Do things."));
    }
}
