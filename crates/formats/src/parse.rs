//! Shared parser pipeline: frontmatter + body → [`CanonicalPackage`].
//!
//! Per-format parsers only contribute what is unique to their format (tool
//! lists, subtype signals); everything else happens here.

use {
    canon_model::{
        CanonicalContent, CanonicalPackage, MetadataSection, Section, SectionKind, Subtype,
        ToolsSection,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    body::{first_heading, split_list, split_sections},
    frontmatter::{Extracted, Frontmatter},
};

/// Version assigned when neither the caller nor the document supplies one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Frontmatter keys mapped onto package fields; every other key is
/// format-specific and preserved verbatim.
const COMMON_KEYS: &[&str] = &["name", "title", "description", "version", "author", "tags", "icon"];

/// Lifecycle events whose mention marks a document as a hook.
const HOOK_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "UserPromptSubmit",
    "SessionStart",
    "SessionEnd",
    "SubagentStop",
    "PreCompact",
];

/// Event names that are also everyday words; they only count next to a
/// distinctive event or a `hooks` key.
const WEAK_HOOK_EVENTS: &[&str] = &["Notification", "Stop"];

/// Caller-supplied package identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMetadata {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub subtype: Option<Subtype>,
}

impl ParseMetadata {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = Some(subtype);
        self
    }
}

/// What a format parser adds on top of the shared pipeline.
#[derive(Debug, Clone, Default)]
pub struct FormatHints {
    /// Tools declared natively in frontmatter.
    pub tools: Vec<String>,
    /// Subtype implied by format-specific frontmatter.
    pub subtype: Option<Subtype>,
    /// Subtype every document of this format has when nothing else says so.
    pub default_subtype: Option<Subtype>,
}

/// Build a package from an extracted document.
#[must_use]
pub fn build_package(
    format: &str,
    meta: &ParseMetadata,
    doc: &Extracted,
    hints: FormatHints,
) -> CanonicalPackage {
    let fm = &doc.frontmatter;
    let title = fm_string(fm, "title")
        .or_else(|| first_heading(&doc.body))
        .or_else(|| fm_string(fm, "name"))
        .unwrap_or_else(|| meta.id.clone());
    let name = fm_string(fm, "name").unwrap_or_else(|| meta.id.clone());
    let description = fm_string(fm, "description").unwrap_or_default();
    let fm_version = fm_string(fm, "version");
    let fm_author = fm_string(fm, "author");
    let version = meta
        .version
        .clone()
        .or_else(|| fm_version.clone())
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let author = meta.author.clone().or(fm_author.clone()).unwrap_or_default();
    let tags = meta.tags.clone().unwrap_or_else(|| fm_list(fm, "tags"));

    let extras: Map<String, Value> = fm
        .iter()
        .filter(|(key, _)| !COMMON_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let mut extensions = Map::new();
    if !extras.is_empty() {
        extensions.insert(format.to_string(), Value::Object(extras.clone()));
    }

    let mut body_sections = split_sections(&doc.body);
    merge_native_tools(&mut body_sections, hints.tools);

    let subtype = meta
        .subtype
        .or(hints.subtype)
        .or_else(|| infer_subtype(&doc.body))
        .or(hints.default_subtype)
        .unwrap_or_default();
    debug!(format, id = %meta.id, %subtype, sections = body_sections.len() + 1, "parsed package");

    let mut sections = Vec::with_capacity(body_sections.len() + 1);
    sections.push(Section::Metadata(MetadataSection {
        title,
        description: description.clone(),
        version: fm_version,
        author: fm_author,
        icon: fm_string(fm, "icon"),
        extensions,
    }));
    sections.extend(body_sections);

    CanonicalPackage {
        id: meta.id.clone(),
        version,
        name,
        description,
        author,
        tags,
        format: format.to_string(),
        subtype,
        source_format: format.to_string(),
        content: CanonicalContent::new(sections),
        metadata: extras,
    }
}

/// Metadata-only package used when parsing cannot produce anything better.
#[must_use]
pub fn minimal_package(format: &str, meta: &ParseMetadata) -> CanonicalPackage {
    CanonicalPackage {
        id: meta.id.clone(),
        version: meta
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        name: meta.id.clone(),
        description: String::new(),
        author: meta.author.clone().unwrap_or_default(),
        tags: meta.tags.clone().unwrap_or_default(),
        format: format.to_string(),
        subtype: meta.subtype.unwrap_or_default(),
        source_format: format.to_string(),
        content: CanonicalContent::new(vec![Section::Metadata(MetadataSection {
            title: meta.id.clone(),
            ..Default::default()
        })]),
        metadata: Map::new(),
    }
}

/// Frontmatter tools go first; body-declared tools not already listed follow.
/// Without a body `## Tools` list the section is appended after the body.
fn merge_native_tools(sections: &mut Vec<Section>, native: Vec<String>) {
    if native.is_empty() {
        return;
    }
    if let Some(Section::Tools(existing)) = sections
        .iter_mut()
        .find(|s| s.kind() == SectionKind::Tools)
    {
        let mut tools = native;
        for tool in existing.tools.drain(..) {
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }
        existing.tools = tools;
        return;
    }
    sections.push(Section::Tools(ToolsSection { tools: native }));
}

/// Body-text subtype signals. `None` when nothing matches.
#[must_use]
pub fn infer_subtype(body: &str) -> Option<Subtype> {
    let mut weak = false;
    for word in body.split(|c: char| !c.is_ascii_alphanumeric()) {
        if HOOK_EVENTS.contains(&word) {
            return Some(Subtype::Hook);
        }
        weak |= WEAK_HOOK_EVENTS.contains(&word);
    }
    let hooks_key = body
        .lines()
        .any(|line| line.trim_start().trim_start_matches(['"', '\'']).starts_with("hooks"));
    (weak && hooks_key).then_some(Subtype::Hook)
}

// ── Frontmatter accessors ────────────────────────────────────────────────────

/// Scalar value as a trimmed, non-empty string.
#[must_use]
pub fn fm_string(fm: &Frontmatter, key: &str) -> Option<String> {
    let text = match fm.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// List value, or a comma-separated string, as strings.
#[must_use]
pub fn fm_list(fm: &Frontmatter, key: &str) -> Vec<String> {
    match fm.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => split_list(s),
        _ => Vec::new(),
    }
}

/// Boolean value; accepts `true`/`false` strings from the line parser.
#[must_use]
pub fn fm_bool(fm: &Frontmatter, key: &str) -> Option<bool> {
    match fm.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
