//! Agent Skills (`SKILL.md`): the open skill format with a required `name`
//! and `description` in frontmatter.
//!
//! Names are lowercase alphanumerics and single hyphens, at most 64
//! characters. `allowed-tools` is space-delimited in the standard; commas
//! are accepted on input.

use {
    canon_model::{CanonicalPackage, Subtype},
    serde::Serialize,
    serde_json::Value,
};

use crate::{
    body::split_list,
    error::Result,
    frontmatter::{Frontmatter, extract},
    options::FormatConfig,
    parse::{FormatHints, ParseMetadata, build_package},
    quality::ScorePolicy,
    registry::{Format, FormatCodec, Rendered},
    render::{Capabilities, ToolsSupport, Warnings, render_body, with_frontmatter},
    result::ConversionResult,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    tag: "agent-skills",
    display: "Agent Skills",
    persona: false,
    tools: ToolsSupport::Markdown,
};

/// Longest name accepted by skill loaders.
pub const MAX_NAME_LEN: usize = 64;

const FALLBACK_NAME: &str = "skill";

pub struct AgentSkillsCodec;

#[derive(Serialize)]
struct SkillFrontmatter<'a> {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl FormatCodec for AgentSkillsCodec {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn parse(&self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
        let doc = extract(raw);
        let tools = allowed_tools(&doc.frontmatter);
        build_package(CAPABILITIES.tag, meta, &doc, FormatHints {
            tools,
            subtype: None,
            default_subtype: Some(Subtype::Skill),
        })
    }

    fn render(&self, pkg: &CanonicalPackage, _options: &FormatConfig) -> Result<Rendered> {
        let description = pkg.effective_description().trim();
        let frontmatter = SkillFrontmatter {
            name: skill_name(pkg),
            description: (!description.is_empty()).then_some(description),
        };

        let mut warnings = Warnings::default();
        let body = render_body(pkg, &CAPABILITIES, &mut warnings)?;

        Ok(Rendered {
            content: with_frontmatter(&serde_yaml::to_string(&frontmatter)?, &body),
            warnings: warnings.into_vec(),
            policy: ScorePolicy {
                description_slot: true,
            },
        })
    }
}

fn allowed_tools(fm: &Frontmatter) -> Vec<String> {
    match fm.get("allowed-tools") {
        Some(Value::String(raw)) if raw.contains(',') => split_list(raw),
        Some(Value::String(raw)) => raw.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Package name (or id) reduced to a valid skill name.
#[must_use]
pub fn skill_name(pkg: &CanonicalPackage) -> String {
    [pkg.name.as_str(), pkg.id.as_str()]
        .into_iter()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_NAME_LEN);
    slug.trim_end_matches('-').to_string()
}

#[must_use]
pub fn from_agent_skills(raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
    Format::AgentSkills.parse(raw, meta)
}

#[must_use]
pub fn to_agent_skills(pkg: &CanonicalPackage, options: Option<&FormatConfig>) -> ConversionResult {
    let defaults = FormatConfig::default();
    Format::AgentSkills.generate(pkg, options.unwrap_or(&defaults))
}
