//! GitHub Copilot instructions: `.github/copilot-instructions.md` or
//! path-scoped `*.instructions.md` files with an `applyTo` glob list.

use {
    canon_model::{CanonicalPackage, Subtype},
    serde::Serialize,
};

use crate::{
    error::Result,
    frontmatter::extract,
    options::FormatConfig,
    parse::{FormatHints, ParseMetadata, build_package},
    quality::ScorePolicy,
    registry::{Format, FormatCodec, Rendered},
    render::{Capabilities, ToolsSupport, Warnings, render_body, with_frontmatter},
    result::ConversionResult,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    tag: "copilot",
    display: "Copilot",
    persona: false,
    tools: ToolsSupport::Markdown,
};

pub struct CopilotCodec;

#[derive(Serialize)]
struct CopilotFrontmatter {
    #[serde(rename = "applyTo")]
    apply_to: String,
}

impl FormatCodec for CopilotCodec {
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
        let globs: Vec<&str> = options.scoped_globs().collect();

        let mut warnings = Warnings::default();
        let body = render_body(pkg, &CAPABILITIES, &mut warnings)?;

        let content = if globs.is_empty() {
            body
        } else {
            let frontmatter = CopilotFrontmatter {
                apply_to: globs.join(","),
            };
            with_frontmatter(&serde_yaml::to_string(&frontmatter)?, &body)
        };

        Ok(Rendered {
            content,
            warnings: warnings.into_vec(),
            policy: ScorePolicy::default(),
        })
    }
}

#[must_use]
pub fn from_copilot(raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
    Format::Copilot.parse(raw, meta)
}

#[must_use]
pub fn to_copilot(pkg: &CanonicalPackage, options: Option<&FormatConfig>) -> ConversionResult {
    let defaults = FormatConfig::default();
    Format::Copilot.generate(pkg, options.unwrap_or(&defaults))
}
