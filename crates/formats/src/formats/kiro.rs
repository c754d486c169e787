//! Kiro steering files (`.kiro/steering/*.md`).
//!
//! Every steering file declares how it is pulled into context. Output is
//! refused unless the caller chose an inclusion mode, and `fileMatch` also
//! needs a pattern.

use {
    canon_model::{CanonicalPackage, Subtype},
    serde::Serialize,
};

use crate::{
    error::{Error, Result},
    frontmatter::extract,
    options::{FormatConfig, InclusionMode},
    parse::{FormatHints, ParseMetadata, build_package},
    quality::ScorePolicy,
    registry::{Format, FormatCodec, Rendered},
    render::{Capabilities, ToolsSupport, Warnings, render_body, with_frontmatter},
    result::ConversionResult,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    tag: "kiro",
    display: "Kiro",
    persona: false,
    tools: ToolsSupport::Markdown,
};

pub struct KiroCodec;

#[derive(Serialize)]
struct KiroFrontmatter<'a> {
    inclusion: InclusionMode,
    #[serde(rename = "fileMatchPattern", skip_serializing_if = "Option::is_none")]
    file_match_pattern: Option<&'a str>,
}

impl KiroCodec {
    fn frontmatter(options: &FormatConfig) -> Result<KiroFrontmatter<'_>> {
        let inclusion = options.inclusion.ok_or_else(|| {
            Error::missing(
                CAPABILITIES.display,
                "inclusion mode (always, fileMatch or manual)",
            )
        })?;
        let file_match_pattern = match inclusion {
            InclusionMode::FileMatch => Some(
                options
                    .file_match_pattern
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        Error::missing(
                            CAPABILITIES.display,
                            "fileMatchPattern when inclusion is fileMatch",
                        )
                    })?,
            ),
            InclusionMode::Always | InclusionMode::Manual => None,
        };
        Ok(KiroFrontmatter {
            inclusion,
            file_match_pattern,
        })
    }
}

impl FormatCodec for KiroCodec {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn parse(&self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
        build_package(CAPABILITIES.tag, meta, &extract(raw), FormatHints {
            default_subtype: Some(Subtype::Rule),
            ..Default::default()
        })
    }

    fn render(&self, pkg: &CanonicalPackage, options: &FormatConfig) -> Result<Rendered> {
        let frontmatter = Self::frontmatter(options)?;

        let mut warnings = Warnings::default();
        let body = render_body(pkg, &CAPABILITIES, &mut warnings)?;

        Ok(Rendered {
            content: with_frontmatter(&serde_yaml::to_string(&frontmatter)?, &body),
            warnings: warnings.into_vec(),
            policy: ScorePolicy::default(),
        })
    }
}

#[must_use]
pub fn from_kiro(raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
    Format::Kiro.parse(raw, meta)
}

#[must_use]
pub fn to_kiro(pkg: &CanonicalPackage, options: Option<&FormatConfig>) -> ConversionResult {
    let defaults = FormatConfig::default();
    Format::Kiro.generate(pkg, options.unwrap_or(&defaults))
}
