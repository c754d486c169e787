//! Shared markdown rendering for generators.
//!
//! Each generator describes what its format can hold with [`Capabilities`];
//! this module walks the sections in stored order and records a [`Warning`]
//! for everything that does not fit.

use std::fmt::Write;

use canon_model::{
    CanonicalPackage, ContextSection, ExamplesSection, InstructionsSection, PersonaSection,
    RulesSection, Section, SectionKind, ToolsSection,
};

use crate::{
    body::{
        AVOID_LABEL, CONTEXT_PREFIX, INSTRUCTIONS_TITLE, PERSONA_HEADING, PREFERRED_LABEL,
        TOOLS_HEADING, first_heading,
    },
    error::Result,
    result::Warning,
};

/// How a format holds a `tools` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolsSupport {
    /// Native frontmatter field; nothing goes in the body.
    Frontmatter,
    /// No native field; rendered as a `## Tools` list and reported as lossy.
    Markdown,
}

/// What a target format can represent.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub tag: &'static str,
    pub display: &'static str,
    pub persona: bool,
    pub tools: ToolsSupport,
}

/// Ordered, de-duplicated warning list.
#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        if !self.0.contains(&warning) {
            self.0.push(warning);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}

/// Render every non-metadata section as markdown, preceded by a `# Title`
/// heading unless the first rendered block is instructions opening with that
/// same heading.
pub fn render_body(
    pkg: &CanonicalPackage,
    caps: &Capabilities,
    warnings: &mut Warnings,
) -> Result<String> {
    let mut blocks: Vec<String> = Vec::new();

    let leading = pkg
        .content
        .sections
        .iter()
        .position(|s| is_rendered(s, caps))
        .and_then(|i| match &pkg.content.sections[i] {
            Section::Instructions(ins) => Some((i, opens_with_title(ins, pkg.title()))),
            _ => None,
        });
    if !matches!(leading, Some((_, true))) {
        blocks.push(format!("# {}", pkg.title()));
    }

    for (i, section) in pkg.content.sections.iter().enumerate() {
        match section {
            Section::Metadata(_) => {},
            Section::Persona(persona) => {
                if caps.persona {
                    blocks.push(render_persona(persona)?);
                } else {
                    warnings.push(skipped(SectionKind::Persona, caps));
                }
            },
            Section::Instructions(ins) => {
                let leads = leading.is_some_and(|(at, _)| at == i);
                blocks.push(render_instructions(ins, leads));
            },
            Section::Rules(rules) => blocks.push(render_rules(rules)?),
            Section::Examples(examples) => blocks.push(render_examples(examples)?),
            Section::Tools(tools) => match caps.tools {
                ToolsSupport::Frontmatter => {},
                ToolsSupport::Markdown => {
                    blocks.push(render_tools(tools)?);
                    warnings.push(Warning::RenderedAsMarkdown {
                        kind: SectionKind::Tools,
                        format: caps.display,
                    });
                },
            },
            Section::Context(context) => blocks.push(render_context(context)),
            Section::Custom(custom) => match custom.editor_type.as_deref() {
                Some(editor) if editor != caps.tag => warnings.push(Warning::CustomSkipped {
                    editor_type: editor.to_string(),
                }),
                _ => blocks.push(custom.content.trim().to_string()),
            },
        }
    }

    let mut out = blocks
        .into_iter()
        .filter(|b| !b.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    Ok(out)
}

/// `---` delimited frontmatter followed by the body.
#[must_use]
pub fn with_frontmatter(yaml: &str, body: &str) -> String {
    format!("---\n{}\n---\n\n{body}", yaml.trim_end())
}

fn skipped(kind: SectionKind, caps: &Capabilities) -> Warning {
    Warning::SectionSkipped {
        kind,
        format: caps.display,
    }
}

fn render_persona(persona: &PersonaSection) -> Result<String> {
    let mut out = format!("## {PERSONA_HEADING}\n\n");
    let role = persona.role.trim().trim_end_matches('.');
    match persona.name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(name) => write!(out, "You are **{}**, {role}.", name.trim())?,
        None => write!(out, "You are {role}.")?,
    }
    if !persona.style.is_empty() {
        write!(out, "\n\n**Style:** {}", persona.style.join(", "))?;
    }
    if !persona.expertise.is_empty() {
        out.push_str("\n\n**Expertise:**");
        for area in &persona.expertise {
            write!(out, "\n- {area}")?;
        }
    }
    Ok(out)
}

/// Whether `section` produces a block for a format with `caps`.
fn is_rendered(section: &Section, caps: &Capabilities) -> bool {
    match section {
        Section::Metadata(_) => false,
        Section::Persona(_) => caps.persona,
        Section::Tools(_) => caps.tools == ToolsSupport::Markdown,
        Section::Custom(custom) => {
            custom.editor_type.as_deref().is_none_or(|e| e == caps.tag)
                && !custom.content.trim().is_empty()
        },
        Section::Instructions(_)
        | Section::Rules(_)
        | Section::Examples(_)
        | Section::Context(_) => true,
    }
}

fn opens_with_title(ins: &InstructionsSection, title: &str) -> bool {
    ins.content.trim_start().starts_with("# ")
        && first_heading(&ins.content).as_deref() == Some(title.trim())
}

/// Leading instructions follow the page title directly. Any other
/// instructions get their own `## ` heading so a stray `# ` line cannot end
/// up inside the previous section.
fn render_instructions(ins: &InstructionsSection, leading: bool) -> String {
    let content = ins.content.trim();
    let title = match ins.title.trim() {
        "" => INSTRUCTIONS_TITLE,
        title => title,
    };
    let bare = if leading {
        content.starts_with('#') || title == INSTRUCTIONS_TITLE
    } else {
        content.starts_with("## ")
    };
    if bare {
        return content.to_string();
    }
    format!("## {title}\n\n{content}")
}

fn render_rules(rules: &RulesSection) -> Result<String> {
    let mut out = format!("## {}\n", rules.title.trim());
    for (i, rule) in rules.items.iter().enumerate() {
        let indent = if rules.ordered {
            write!(out, "\n{}. {}", i + 1, rule.content.trim())?;
            "   "
        } else {
            write!(out, "\n- {}", rule.content.trim())?;
            "  "
        };
        if let Some(rationale) = rule.rationale.as_deref().filter(|r| !r.trim().is_empty()) {
            write!(out, "\n{indent}- *{}*", rationale.trim())?;
        } else {
            for example in &rule.examples {
                write!(out, "\n{indent}- `{}`", example.trim())?;
            }
        }
    }
    Ok(out)
}

fn render_examples(section: &ExamplesSection) -> Result<String> {
    let mut out = format!("## {}", section.title.trim());
    for example in &section.examples {
        let description = example.description.trim();
        let label = match (example.good, description.is_empty()) {
            (Some(true), true) => PREFERRED_LABEL.to_string(),
            (Some(true), false) => format!("{PREFERRED_LABEL}: {description}"),
            (Some(false), true) => AVOID_LABEL.to_string(),
            (Some(false), false) => format!("{AVOID_LABEL}: {description}"),
            (None, _) => description.to_string(),
        };
        let fence = fence_for(&example.code);
        let language = example.language.as_deref().unwrap_or_default();
        write!(out, "\n\n### {label}\n\n{fence}{language}\n{}\n{fence}", example.code)?;
    }
    Ok(out)
}

/// Three backticks, or one more than the longest backtick run in `code`.
fn fence_for(code: &str) -> String {
    let longest = code
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or_default();
    "`".repeat(longest.max(2) + 1)
}

fn render_tools(tools: &ToolsSection) -> Result<String> {
    let mut out = format!("## {TOOLS_HEADING}\n");
    for tool in &tools.tools {
        write!(out, "\n- {tool}")?;
    }
    Ok(out)
}

fn render_context(context: &ContextSection) -> String {
    let title = context.title.trim();
    let lower = title.to_ascii_lowercase();
    let heading = if lower.starts_with("context") || lower.starts_with("background") {
        title.to_string()
    } else {
        format!("{CONTEXT_PREFIX}{title}")
    };
    format!("## {heading}\n\n{}", context.content.trim())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        canon_model::{
            CanonicalContent, CustomSection, Example, MetadataSection, Rule, Subtype,
        },
        serde_json::Map,
    };

    const CAPS: Capabilities = Capabilities {
        tag: "test",
        display: "Test",
        persona: false,
        tools: ToolsSupport::Markdown,
    };

    fn pkg(sections: Vec<Section>) -> CanonicalPackage {
        let mut all = vec![Section::Metadata(MetadataSection {
            title: "Guide".into(),
            description: "d".into(),
            ..Default::default()
        })];
        all.extend(sections);
        CanonicalPackage {
            id: "guide".into(),
            version: "1.0.0".into(),
            name: "guide".into(),
            description: "d".into(),
            author: String::new(),
            tags: Vec::new(),
            format: "test".into(),
            subtype: Subtype::Rule,
            source_format: "test".into(),
            content: CanonicalContent::new(all),
            metadata: Map::new(),
        }
    }

    fn render(sections: Vec<Section>) -> (String, Vec<String>) {
        let mut warnings = Warnings::default();
        let out = render_body(&pkg(sections), &CAPS, &mut warnings).unwrap();
        (out, warnings.into_vec().iter().map(ToString::to_string).collect())
    }

    #[test]
    fn ordered_rules_are_numbered_with_rationale_sub_lines() {
        let mut first = Rule::new("Validate input");
        first.rationale = Some("Untrusted data".into());
        first.examples = vec!["ignored when rationale is set".into()];
        let mut second = Rule::new("Log errors");
        second.examples = vec!["warn!(%e)".into()];
        let (out, warnings) = render(vec![Section::Rules(RulesSection {
            title: "Safety".into(),
            items: vec![first, second],
            ordered: true,
        })]);
        assert!(warnings.is_empty());
        assert_eq!(
            out,
            "# Guide\n\n## Safety\n\n1. Validate input\n   - *Untrusted data*\n2. Log errors\n   - `warn!(%e)`\n"
        );
    }

    #[test]
    fn unordered_rules_use_bullets() {
        let (out, _) = render(vec![Section::Rules(RulesSection {
            title: "Style".into(),
            items: vec![Rule::new("a"), Rule::new("b")],
            ordered: false,
        })]);
        assert!(out.contains("## Style\n\n- a\n- b"));
    }

    #[test]
    fn examples_distinguish_preferred_and_avoid() {
        let (out, _) = render(vec![Section::Examples(ExamplesSection {
            title: "Examples".into(),
            examples: vec![
                Example {
                    description: "guard".into(),
                    code: "if !ok { return; }".into(),
                    language: Some("rust".into()),
                    good: Some(true),
                },
                Example {
                    description: "nest".into(),
                    code: "x".into(),
                    language: None,
                    good: Some(false),
                },
            ],
        })]);
        assert!(out.contains("### Preferred: guard\n\n```rust\nif !ok { return; }\n```"));
        assert!(out.contains("### Avoid: nest\n\n```\nx\n```"));
    }

    #[test]
    fn skipped_sections_warn_once_per_kind() {
        let persona = Section::Persona(PersonaSection {
            role: "a reviewer".into(),
            ..Default::default()
        });
        let (out, warnings) = render(vec![persona]);
        assert!(!out.contains("reviewer"));
        assert_eq!(warnings, vec!["Persona section skipped (not supported by Test)"]);
    }

    #[test]
    fn foreign_custom_sections_are_skipped() {
        let (out, warnings) = render(vec![
            Section::Custom(CustomSection {
                editor_type: Some("cursor".into()),
                content: "CURSOR ONLY".into(),
            }),
            Section::Custom(CustomSection {
                editor_type: Some("cursor".into()),
                content: "AGAIN".into(),
            }),
            Section::Custom(CustomSection {
                editor_type: None,
                content: "everyone".into(),
            }),
        ]);
        assert!(!out.contains("CURSOR ONLY"));
        assert!(out.contains("everyone"));
        assert_eq!(warnings, vec!["Custom cursor section skipped"]);
    }

    #[test]
    fn tools_fall_back_to_markdown() {
        let (out, warnings) = render(vec![Section::Tools(ToolsSection {
            tools: vec!["Read".into(), "Grep".into()],
        })]);
        assert!(out.contains("## Tools\n\n- Read\n- Grep"));
        assert_eq!(warnings, vec!["Tools section rendered as markdown (not supported by Test)"]);
    }

    #[test]
    fn title_heading_not_repeated() {
        let (out, _) = render(vec![Section::Instructions(InstructionsSection {
            title: "Instructions".into(),
            content: "# Guide\n\nBody".into(),
            priority: None,
        })]);
        assert_eq!(out, "# Guide\n\nBody\n");
    }

    #[test]
    fn other_heading_does_not_replace_title() {
        let mut caps = CAPS;
        caps.persona = true;
        let pkg = pkg(vec![
            Section::Persona(PersonaSection {
                role: "a helper".into(),
                ..Default::default()
            }),
            Section::Instructions(InstructionsSection {
                title: "Instructions".into(),
                content: "# Setup\n\nRun it.".into(),
                priority: None,
            }),
        ]);
        let mut warnings = Warnings::default();
        let out = render_body(&pkg, &caps, &mut warnings).unwrap();
        assert_eq!(
            out,
            "# Guide\n\n## Persona\n\nYou are a helper.\n\n## Instructions\n\n# Setup\n\nRun it.\n"
        );
    }

    #[test]
    fn skipped_section_does_not_hide_leading_instructions() {
        let (out, _) = render(vec![
            Section::Persona(PersonaSection {
                role: "a helper".into(),
                ..Default::default()
            }),
            Section::Instructions(InstructionsSection {
                title: "Instructions".into(),
                content: "# Guide\n\nBody".into(),
                priority: None,
            }),
        ]);
        assert_eq!(out, "# Guide\n\nBody\n");
    }

    #[test]
    fn context_titles_get_prefix() {
        let (out, _) = render(vec![Section::Context(ContextSection {
            title: "Repository".into(),
            content: "monorepo".into(),
        })]);
        assert!(out.contains("## Context: Repository\n\nmonorepo"));
    }

    #[test]
    fn fence_grows_past_embedded_backticks() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("```inner```"), "````");
    }
}
