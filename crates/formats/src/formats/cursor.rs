//! Cursor project rules (`.cursor/rules/*.mdc`).
//!
//! Frontmatter is only written for scoped rules: `globs` and/or
//! `alwaysApply: true`. An unscoped rule is plain markdown.

use {canon_model::CanonicalPackage, serde::Serialize};

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
    tag: "cursor",
    display: "Cursor",
    persona: false,
    tools: ToolsSupport::Markdown,
};

pub struct CursorCodec;

#[derive(Serialize)]
struct CursorFrontmatter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    globs: Option<String>,
    #[serde(rename = "alwaysApply")]
    always_apply: bool,
}

impl FormatCodec for CursorCodec {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn parse(&self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
        build_package(CAPABILITIES.tag, meta, &extract(raw), FormatHints {
            default_subtype: Some(canon_model::Subtype::Rule),
            ..Default::default()
        })
    }

    fn render(&self, pkg: &CanonicalPackage, options: &FormatConfig) -> Result<Rendered> {
        let globs: Vec<&str> = options.scoped_globs().collect();
        let always_apply = options.always_apply.unwrap_or(false);
        let scoped = !globs.is_empty() || always_apply;

        let mut warnings = Warnings::default();
        let body = render_body(pkg, &CAPABILITIES, &mut warnings)?;

        let content = if scoped {
            let description = pkg.effective_description().trim();
            let frontmatter = CursorFrontmatter {
                description: (!description.is_empty()).then_some(description),
                globs: (!globs.is_empty()).then(|| globs.join(",")),
                always_apply,
            };
            with_frontmatter(&serde_yaml::to_string(&frontmatter)?, &body)
        } else {
            body
        };

        Ok(Rendered {
            content,
            warnings: warnings.into_vec(),
            policy: ScorePolicy {
                description_slot: scoped,
            },
        })
    }
}

#[must_use]
pub fn from_cursor(raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
    Format::Cursor.parse(raw, meta)
}

#[must_use]
pub fn to_cursor(pkg: &CanonicalPackage, options: Option<&FormatConfig>) -> ConversionResult {
    let defaults = FormatConfig::default();
    Format::Cursor.generate(pkg, options.unwrap_or(&defaults))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        canon_model::{Section, Subtype},
    };

    const RULE: &str = "---\ndescription: Rust conventions\nglobs: \"**/*.rs\"\nalwaysApply: false\n---\n\n# Rust\n\nPrefer iterators.\n\n## Style\n\n- No unwrap in library code\n- Keep functions short\n";

    #[test]
    fn parses_rule_and_keeps_globs_as_extension() {
        let pkg = from_cursor(RULE, &ParseMetadata::new("rust"));
        assert_eq!(pkg.subtype, Subtype::Rule);
        assert_eq!(pkg.description, "Rust conventions");
        let ext = pkg.content.metadata().unwrap().extension("cursor").unwrap();
        assert_eq!(ext["globs"], "**/*.rs");
        assert_eq!(ext["alwaysApply"], false);
        assert!(
            pkg.content
                .sections
                .iter()
                .any(|s| matches!(s, Section::Rules(r) if r.items.len() == 2))
        );
    }

    #[test]
    fn unscoped_rule_has_no_frontmatter() {
        let pkg = from_cursor(RULE, &ParseMetadata::new("rust"));
        let result = to_cursor(&pkg, None);
        assert!(result.content.starts_with("# Rust\n\nPrefer iterators."));
        assert!(result.warnings.is_empty());
        assert_eq!(result.quality_score, 100);
    }

    #[test]
    fn scoped_rule_writes_globs_and_description() {
        let pkg = from_cursor(RULE, &ParseMetadata::new("rust"));
        let options = FormatConfig {
            globs: vec!["src/**/*.rs".into(), "tests/**/*.rs".into()],
            ..Default::default()
        };
        let result = to_cursor(&pkg, Some(&options));
        assert!(result.content.starts_with("---\ndescription: Rust conventions\n"));
        assert!(result.content.contains("globs: src/**/*.rs,tests/**/*.rs\n"));
        assert!(result.content.contains("alwaysApply: false\n---\n\n# Rust"));
    }

    #[test]
    fn always_apply_without_description_costs_points() {
        let pkg = from_cursor("Always be kind.", &ParseMetadata::new("kind"));
        let options = FormatConfig {
            always_apply: Some(true),
            ..Default::default()
        };
        let result = to_cursor(&pkg, Some(&options));
        assert!(result.content.starts_with("---\nalwaysApply: true\n---\n"));
        assert_eq!(result.quality_score, 95);
    }

    #[test]
    fn custom_cursor_sections_survive_own_format() {
        let mut pkg = from_cursor(RULE, &ParseMetadata::new("rust"));
        pkg.content.sections.push(Section::Custom(canon_model::CustomSection {
            editor_type: Some("cursor".into()),
            content: "@file ../docs/style.md".into(),
        }));
        let result = to_cursor(&pkg, None);
        assert!(result.content.contains("@file ../docs/style.md"));
        assert!(result.warnings.is_empty());
    }
}
