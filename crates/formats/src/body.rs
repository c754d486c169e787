//! Markdown body → canonical sections.
//!
//! The body is cut at `## ` headings (never inside fenced code). Segments
//! whose shape matches a structured section become that section; everything
//! else is merged into a single `instructions` section. A body without any
//! structured segment becomes one `instructions` section holding the whole
//! trimmed text.

use canon_model::{
    ContextSection, Example, ExamplesSection, InstructionsSection, PersonaSection, Rule,
    RulesSection, Section, SectionKind, ToolsSection,
};

pub const INSTRUCTIONS_TITLE: &str = "Instructions";
pub const TOOLS_HEADING: &str = "Tools";
pub const PERSONA_HEADING: &str = "Persona";
pub const CONTEXT_PREFIX: &str = "Context: ";
pub const PREFERRED_LABEL: &str = "Preferred";
pub const AVOID_LABEL: &str = "Avoid";

/// Text of the first `# ` heading outside fenced code.
#[must_use]
pub fn first_heading(body: &str) -> Option<String> {
    let mut fence = FenceTracker::default();
    for line in body.lines() {
        if fence.update(line) {
            continue;
        }
        if let Some(text) = line.strip_prefix("# ") {
            let text = text.trim().trim_end_matches('#').trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Split a markdown body into canonical sections (metadata excluded).
#[must_use]
pub fn split_sections(body: &str) -> Vec<Section> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let (preamble, segments) = segment(trimmed);

    let mut taken: Vec<SectionKind> = Vec::new();
    let mut pieces: Vec<Piece> = Vec::new();
    let preamble_text = preamble.trim();
    if !preamble_text.is_empty() {
        pieces.push(Piece::Plain {
            heading: None,
            text: preamble_text.to_string(),
        });
    }
    for seg in &segments {
        match classify(seg) {
            Some(section) if !taken.contains(&section.kind()) => {
                taken.push(section.kind());
                pieces.push(Piece::Structured(section));
            },
            _ => pieces.push(Piece::Plain {
                heading: Some(seg.heading.clone()),
                text: seg.body.trim().to_string(),
            }),
        }
    }

    if taken.is_empty() {
        return vec![instructions(INSTRUCTIONS_TITLE, trimmed)];
    }

    let mut sections = Vec::new();
    let mut merged: Option<(usize, InstructionsSection)> = None;
    for piece in pieces {
        match piece {
            Piece::Structured(section) => sections.push(section),
            Piece::Plain { heading, text } => match merged.as_mut() {
                None => {
                    let title = heading.unwrap_or_else(|| INSTRUCTIONS_TITLE.to_string());
                    merged = Some((sections.len(), InstructionsSection {
                        title,
                        content: text,
                        priority: None,
                    }));
                },
                Some((_, existing)) => {
                    let chunk = match heading {
                        Some(heading) if text.is_empty() => format!("## {heading}"),
                        Some(heading) => format!("## {heading}\n\n{text}"),
                        None => text,
                    };
                    if existing.content.is_empty() {
                        existing.content = chunk;
                    } else {
                        existing.content = format!("{}\n\n{chunk}", existing.content);
                    }
                },
            },
        }
    }
    if let Some((pos, section)) = merged {
        sections.insert(pos, Section::Instructions(section));
    }
    sections
}

fn instructions(title: &str, content: &str) -> Section {
    Section::Instructions(InstructionsSection {
        title: title.to_string(),
        content: content.to_string(),
        priority: None,
    })
}

enum Piece {
    Plain {
        heading: Option<String>,
        text: String,
    },
    Structured(Section),
}

struct Segment {
    heading: String,
    body: String,
}

fn segment(body: &str) -> (String, Vec<Segment>) {
    let mut preamble = String::new();
    let mut segments: Vec<Segment> = Vec::new();
    let mut fence = FenceTracker::default();

    for line in body.lines() {
        let in_code = fence.update(line);
        if !in_code && let Some(heading) = line.strip_prefix("## ") {
            segments.push(Segment {
                heading: heading.trim().trim_end_matches('#').trim().to_string(),
                body: String::new(),
            });
            continue;
        }
        let target = match segments.last_mut() {
            Some(seg) => &mut seg.body,
            None => &mut preamble,
        };
        target.push_str(line);
        target.push('\n');
    }
    (preamble, segments)
}

/// A preamble that is nothing but the `# Title` line.
fn classify(seg: &Segment) -> Option<Section> {
    let heading = seg.heading.as_str();
    let lower = heading.to_ascii_lowercase();

    if heading.eq_ignore_ascii_case(TOOLS_HEADING) {
        return parse_tools(&seg.body).map(Section::Tools);
    }
    if heading.eq_ignore_ascii_case(PERSONA_HEADING) {
        return parse_persona(&seg.body).map(Section::Persona);
    }
    if lower.starts_with("context") || lower.starts_with("background") {
        let title = heading
            .strip_prefix(CONTEXT_PREFIX)
            .unwrap_or(heading)
            .trim()
            .to_string();
        return Some(Section::Context(ContextSection {
            title,
            content: seg.body.trim().to_string(),
        }));
    }
    if let Some(examples) = parse_examples(&seg.body) {
        return Some(Section::Examples(ExamplesSection {
            title: heading.to_string(),
            examples,
        }));
    }
    parse_rules(&seg.body).map(|(items, ordered)| {
        Section::Rules(RulesSection {
            title: heading.to_string(),
            items,
            ordered,
        })
    })
}

// ── List items ───────────────────────────────────────────────────────────────

/// `1. text` → `(true, "text")`, `- text` / `* text` / `+ text` → `(false, "text")`.
fn list_item(line: &str) -> Option<(bool, &str)> {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
    {
        return Some((false, rest.trim()));
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..]
        .strip_prefix(". ")
        .or_else(|| line[digits..].strip_prefix(") "))
        .map(|rest| (true, rest.trim()))
}

fn strip_wrapping<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let inner = text.strip_prefix(marker)?.strip_suffix(marker)?;
    (!inner.is_empty()).then_some(inner)
}

fn parse_rules(body: &str) -> Option<(Vec<Rule>, bool)> {
    let mut items: Vec<Rule> = Vec::new();
    let mut ordered = None;

    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            let rule = items.last_mut()?;
            let sub = line.trim();
            match list_item(sub) {
                Some((_, text)) => {
                    if let Some(rationale) = strip_wrapping(text, "*")
                        .filter(|r| !r.starts_with('*'))
                        .or_else(|| strip_wrapping(text, "_"))
                    {
                        rule.rationale = Some(rationale.trim().to_string());
                    } else {
                        let example = strip_wrapping(text, "`").unwrap_or(text);
                        rule.examples.push(example.to_string());
                    }
                },
                None => {
                    rule.content.push(' ');
                    rule.content.push_str(sub);
                },
            }
            continue;
        }
        let (numbered, text) = list_item(line)?;
        ordered.get_or_insert(numbered);
        items.push(Rule::new(text));
    }

    let ordered = ordered?;
    Some((items, ordered))
}

fn parse_tools(body: &str) -> Option<ToolsSection> {
    let mut tools = Vec::new();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let (_, text) = list_item(line.trim_start())?;
        let name = strip_wrapping(text, "`").unwrap_or(text).trim();
        if !name.is_empty() {
            tools.push(name.to_string());
        }
    }
    (!tools.is_empty()).then_some(ToolsSection { tools })
}

// ── Persona ──────────────────────────────────────────────────────────────────

fn parse_persona(body: &str) -> Option<PersonaSection> {
    let mut persona: Option<PersonaSection> = None;
    let mut style = Vec::new();
    let mut expertise = Vec::new();
    let mut in_expertise = false;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("You are ") {
            persona = Some(parse_identity(rest));
            in_expertise = false;
        } else if let Some(rest) = line.strip_prefix("**Style:**") {
            style = split_list(rest);
            in_expertise = false;
        } else if let Some(rest) = line.strip_prefix("**Expertise:**") {
            expertise = split_list(rest);
            in_expertise = true;
        } else if in_expertise && let Some((_, item)) = list_item(line) {
            expertise.push(item.to_string());
        } else {
            return None;
        }
    }

    persona.map(|p| PersonaSection {
        style,
        expertise,
        ..p
    })
}

fn parse_identity(rest: &str) -> PersonaSection {
    let rest = rest.trim().strip_suffix('.').unwrap_or(rest.trim());
    if let Some(named) = rest.strip_prefix("**")
        && let Some((name, role)) = named.split_once("**")
    {
        let role = role.trim_start_matches(',').trim();
        return PersonaSection {
            name: Some(name.trim().to_string()),
            role: role.to_string(),
            ..Default::default()
        };
    }
    PersonaSection {
        role: rest.to_string(),
        ..Default::default()
    }
}

/// Comma-separated list, blank entries dropped.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Examples ─────────────────────────────────────────────────────────────────

fn parse_examples(body: &str) -> Option<Vec<Example>> {
    let mut examples: Vec<Example> = Vec::new();
    let mut pending: Option<Example> = None;
    let mut lines = body.lines();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(label) = line.strip_prefix("### ") {
            if pending.is_some() {
                return None;
            }
            pending = Some(parse_example_label(label.trim()));
            continue;
        }
        let trimmed = line.trim_start();
        let ticks = trimmed.chars().take_while(|c| *c == '`').count();
        if ticks < 3 {
            return None;
        }
        let mut example = pending.take()?;
        let language = trimmed[ticks..].trim();
        example.language = (!language.is_empty()).then(|| language.to_string());

        let closing = &trimmed[..ticks];
        let mut code: Vec<&str> = Vec::new();
        let mut closed = false;
        for code_line in lines.by_ref() {
            if code_line.trim() == closing {
                closed = true;
                break;
            }
            code.push(code_line);
        }
        if !closed {
            return None;
        }
        example.code = code.join("\n");
        examples.push(example);
    }

    if pending.is_some() || examples.is_empty() {
        return None;
    }
    Some(examples)
}

fn parse_example_label(label: &str) -> Example {
    let (good, description) = if let Some(rest) = label.strip_prefix(PREFERRED_LABEL) {
        (Some(true), rest)
    } else if let Some(rest) = label.strip_prefix(AVOID_LABEL) {
        (Some(false), rest)
    } else {
        (None, label)
    };
    let description = if good.is_some() {
        description.trim_start_matches(':').trim()
    } else {
        description.trim()
    };
    Example {
        description: description.to_string(),
        code: String::new(),
        language: None,
        good,
    }
}

// ── Fences ───────────────────────────────────────────────────────────────────

/// Tracks whether the current line is inside a fenced code block.
#[derive(Default)]
struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed one line; returns `true` when the line belongs to a fence
    /// (including the delimiter lines themselves).
    fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let run = marker.map_or(0, |m| trimmed.chars().take_while(|c| *c == m).count());

        match (self.open, marker) {
            (Some((open, len)), Some(m)) if m == open && run >= len && trimmed[run..].trim().is_empty() => {
                self.open = None;
                true
            },
            (Some(_), _) => true,
            (None, Some(m)) if run >= 3 => {
                self.open = Some((m, run));
                true
            },
            (None, _) => false,
        }
    }
}
