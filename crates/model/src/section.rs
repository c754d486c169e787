use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

// ── Section union ────────────────────────────────────────────────────────────

/// One semantically typed block of a canonical package.
///
/// Serialized as an internally tagged object: `{"type": "rules", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Section {
    Metadata(MetadataSection),
    Persona(PersonaSection),
    Instructions(InstructionsSection),
    Rules(RulesSection),
    Examples(ExamplesSection),
    Tools(ToolsSection),
    Context(ContextSection),
    Custom(CustomSection),
}

impl Section {
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Metadata(_) => SectionKind::Metadata,
            Self::Persona(_) => SectionKind::Persona,
            Self::Instructions(_) => SectionKind::Instructions,
            Self::Rules(_) => SectionKind::Rules,
            Self::Examples(_) => SectionKind::Examples,
            Self::Tools(_) => SectionKind::Tools,
            Self::Context(_) => SectionKind::Context,
            Self::Custom(_) => SectionKind::Custom,
        }
    }
}

/// Discriminant of a [`Section`], used for capability checks and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    Metadata,
    Persona,
    Instructions,
    Rules,
    Examples,
    Tools,
    Context,
    Custom,
}

impl SectionKind {
    /// `custom` is the only kind allowed to appear more than once per package.
    #[must_use]
    pub fn may_repeat(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata => write!(f, "Metadata"),
            Self::Persona => write!(f, "Persona"),
            Self::Instructions => write!(f, "Instructions"),
            Self::Rules => write!(f, "Rules"),
            Self::Examples => write!(f, "Examples"),
            Self::Tools => write!(f, "Tools"),
            Self::Context => write!(f, "Context"),
            Self::Custom => write!(f, "Custom"),
        }
    }
}

// ── Section payloads ─────────────────────────────────────────────────────────

/// Title block. Always the first section of a parsed package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSection {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Format-unique frontmatter keyed by format tag, e.g.
    /// `{"claude": {"allowed-tools": ["Read"]}}`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl MetadataSection {
    /// Format-specific fields recorded by the parser for `format`.
    #[must_use]
    pub fn extension(&self, format: &str) -> Option<&Map<String, Value>> {
        self.extensions.get(format).and_then(Value::as_object)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsSection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesSection {
    pub title: String,
    pub items: Vec<Rule>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ordered: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl Rule {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            rationale: None,
            examples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplesSection {
    pub title: String,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub description: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// `Some(true)` for a preferred example, `Some(false)` for one to avoid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsSection {
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSection {
    pub title: String,
    pub content: String,
}

/// Editor-specific content that only its own format renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_type: Option<String>,
    pub content: String,
}
