//! Claude agents, skills and slash commands: markdown with YAML frontmatter
//! carrying `name`, `description`, `tools` / `allowed-tools`, `model` and
//! `argument-hint`.

use {
    canon_model::{CanonicalPackage, Section, Subtype},
    serde::Serialize,
};

use crate::{
    error::Result,
    frontmatter::extract,
    options::FormatConfig,
    parse::{FormatHints, ParseMetadata, build_package, fm_list, fm_string},
    quality::ScorePolicy,
    registry::{Format, FormatCodec, Rendered},
    render::{Capabilities, ToolsSupport, Warnings, render_body, with_frontmatter},
    result::ConversionResult,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    tag: "claude",
    display: "Claude",
    persona: true,
    tools: ToolsSupport::Frontmatter,
};

pub struct ClaudeCodec;

#[derive(Serialize)]
struct ClaudeFrontmatter<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(rename = "argument-hint", skip_serializing_if = "Option::is_none")]
    argument_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<String>,
    #[serde(rename = "allowed-tools", skip_serializing_if = "Option::is_none")]
    allowed_tools: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

impl FormatCodec for ClaudeCodec {
    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn parse(&self, raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
        let doc = extract(raw);
        let fm = &doc.frontmatter;

        let mut tools = fm_list(fm, "tools");
        for tool in fm_list(fm, "allowed-tools") {
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }

        let subtype = if fm.contains_key("argument-hint") {
            Some(Subtype::Command)
        } else if fm.contains_key("tools") || fm.contains_key("model") {
            Some(Subtype::Agent)
        } else if fm.contains_key("allowed-tools") {
            Some(Subtype::Skill)
        } else {
            None
        };

        build_package(CAPABILITIES.tag, meta, &doc, FormatHints {
            tools,
            subtype,
            default_subtype: None,
        })
    }

    fn render(&self, pkg: &CanonicalPackage, options: &FormatConfig) -> Result<Rendered> {
        let ext = pkg
            .content
            .metadata()
            .and_then(|m| m.extension(CAPABILITIES.tag));

        let tools = pkg.content.sections.iter().find_map(|s| match s {
            Section::Tools(t) if !t.tools.is_empty() => Some(t.tools.join(", ")),
            _ => None,
        });
        // Agents declare `tools`; skills and commands declare `allowed-tools`.
        let (tools, allowed_tools) = match pkg.subtype {
            Subtype::Agent => (tools, None),
            _ => (None, tools),
        };

        let argument_hint = match pkg.subtype {
            Subtype::Command => ext.and_then(|e| fm_string(e, "argument-hint")),
            _ => None,
        };
        let description = pkg.effective_description().trim();

        let frontmatter = ClaudeFrontmatter {
            name: if pkg.name.trim().is_empty() {
                &pkg.id
            } else {
                pkg.name.trim()
            },
            description: (!description.is_empty()).then_some(description),
            argument_hint,
            tools,
            allowed_tools,
            model: options
                .model
                .clone()
                .or_else(|| ext.and_then(|e| fm_string(e, "model"))),
        };
        let yaml = serde_yaml::to_string(&frontmatter)?;

        let mut warnings = Warnings::default();
        let body = render_body(pkg, &CAPABILITIES, &mut warnings)?;

        Ok(Rendered {
            content: with_frontmatter(&yaml, &body),
            warnings: warnings.into_vec(),
            policy: ScorePolicy {
                description_slot: true,
            },
        })
    }
}

#[must_use]
pub fn from_claude(raw: &str, meta: &ParseMetadata) -> CanonicalPackage {
    Format::Claude.parse(raw, meta)
}

#[must_use]
pub fn to_claude(pkg: &CanonicalPackage, options: Option<&FormatConfig>) -> ConversionResult {
    let defaults = FormatConfig::default();
    Format::Claude.generate(pkg, options.unwrap_or(&defaults))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        canon_model::{PersonaSection, SectionKind},
    };

    const AGENT: &str = "---\nname: code-reviewer\ndescription: Reviews diffs\ntools: Read, Grep, Glob\nmodel: sonnet\n---\n\n# Code Reviewer\n\nReview the staged changes.\n\n## Persona\n\nYou are **Rex**, a meticulous reviewer.\n\n## Checklist\n\n1. Run the tests\n2. Read the diff\n";

    #[test]
    fn parses_agent_with_tools_and_persona() {
        let pkg = from_claude(AGENT, &ParseMetadata::new("code-reviewer"));
        assert_eq!(pkg.subtype, Subtype::Agent);
        assert_eq!(pkg.description, "Reviews diffs");
        assert_eq!(pkg.content.metadata().unwrap().title, "Code Reviewer");
        assert_eq!(pkg.content.kinds(), vec![
            SectionKind::Metadata,
            SectionKind::Instructions,
            SectionKind::Persona,
            SectionKind::Rules,
            SectionKind::Tools,
        ]);
        let Section::Tools(tools) = &pkg.content.sections[4] else {
            panic!("expected tools");
        };
        assert_eq!(tools.tools, vec!["Read", "Grep", "Glob"]);
        assert_eq!(pkg.metadata["model"], "sonnet");
    }

    #[test]
    fn regenerates_agent_frontmatter() {
        let pkg = from_claude(AGENT, &ParseMetadata::new("code-reviewer"));
        let result = to_claude(&pkg, None);
        assert_eq!(result.quality_score, 100);
        assert!(!result.lossy_conversion);
        assert!(result.content.starts_with("---\nname: code-reviewer\n"));
        assert!(result.content.contains("tools: Read, Grep, Glob\n"));
        assert!(result.content.contains("model: sonnet\n"));
        assert!(!result.content.contains("allowed-tools"));
        assert!(result.content.contains("You are **Rex**, a meticulous reviewer."));
        assert!(result.content.contains("1. Run the tests\n2. Read the diff"));
    }

    #[test]
    fn command_keeps_argument_hint() {
        let raw = "---\ndescription: Fix an issue\nargument-hint: \"[issue-number]\"\nallowed-tools: Bash(git:*)\n---\nFix issue $ARGUMENTS.";
        let pkg = from_claude(raw, &ParseMetadata::new("fix-issue"));
        assert_eq!(pkg.subtype, Subtype::Command);
        let result = to_claude(&pkg, None);
        assert!(result.content.contains("argument-hint: '[issue-number]'"));
        assert!(result.content.contains("allowed-tools: Bash(git:*)"));
        assert!(result.content.contains("name: fix-issue"));
    }

    #[test]
    fn options_model_overrides_parsed_model() {
        let pkg = from_claude(AGENT, &ParseMetadata::new("code-reviewer"));
        let options = FormatConfig {
            model: Some("opus".into()),
            ..Default::default()
        };
        let result = to_claude(&pkg, Some(&options));
        assert!(result.content.contains("model: opus\n"));
    }

    #[test]
    fn missing_description_costs_points() {
        let pkg = from_claude("Just do it.", &ParseMetadata::new("bare"));
        let result = to_claude(&pkg, None);
        assert_eq!(result.quality_score, 95);
        assert!(!result.lossy_conversion);
        assert!(!result.content.contains("description:"));
    }

    #[test]
    fn persona_is_native() {
        let mut pkg = from_claude(AGENT, &ParseMetadata::new("code-reviewer"));
        pkg.content.sections.retain(|s| s.kind() != SectionKind::Persona);
        pkg.content.sections.push(Section::Persona(PersonaSection {
            role: "a pair programmer".into(),
            ..Default::default()
        }));
        let result = to_claude(&pkg, None);
        assert!(result.warnings.is_empty());
        assert!(result.content.contains("## Persona\n\nYou are a pair programmer."));
    }
}
