use {
    canon_common::Result,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::section::{MetadataSection, Section, SectionKind};

/// Value of [`CanonicalContent::format`].
pub const CANONICAL_FORMAT: &str = "canonical";
/// Value of [`CanonicalContent::version`].
pub const CANONICAL_VERSION: &str = "1.0";

// ── Subtype ──────────────────────────────────────────────────────────────────

/// What kind of assistant configuration a package describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    #[default]
    Skill,
    Agent,
    Rule,
    Command,
    Hook,
}

impl Subtype {
    pub const ALL: [Self; 5] = [
        Self::Skill,
        Self::Agent,
        Self::Rule,
        Self::Command,
        Self::Hook,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Agent => "agent",
            Self::Rule => "rule",
            Self::Command => "command",
            Self::Hook => "hook",
        }
    }
}

impl std::fmt::Display for Subtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Subtype {
    type Err = canon_common::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|subtype| subtype.as_str() == wanted)
            .ok_or_else(|| canon_common::Error::message(format!("unknown subtype '{s}'")))
    }
}

// ── Content ──────────────────────────────────────────────────────────────────

/// Ordered section list plus the canonical format marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalContent {
    pub format: String,
    pub version: String,
    pub sections: Vec<Section>,
}

impl CanonicalContent {
    /// Build content from sections, moving the metadata section to the front.
    #[must_use]
    pub fn new(mut sections: Vec<Section>) -> Self {
        if let Some(pos) = sections
            .iter()
            .position(|s| s.kind() == SectionKind::Metadata)
            && pos > 0
        {
            let meta = sections.remove(pos);
            sections.insert(0, meta);
        }
        Self {
            format: CANONICAL_FORMAT.to_string(),
            version: CANONICAL_VERSION.to_string(),
            sections,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&MetadataSection> {
        self.sections.iter().find_map(|s| match s {
            Section::Metadata(meta) => Some(meta),
            _ => None,
        })
    }

    /// Every section except `metadata`, in stored order.
    pub fn body_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| s.kind() != SectionKind::Metadata)
    }

    /// Distinct section kinds, in first-seen order.
    #[must_use]
    pub fn kinds(&self) -> Vec<SectionKind> {
        let mut kinds = Vec::new();
        for section in &self.sections {
            let kind = section.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Metadata first when present, and only `custom` repeats.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let metadata_first = match self.sections.iter().position(|s| s.kind() == SectionKind::Metadata) {
            Some(pos) => pos == 0,
            None => true,
        };
        let mut seen = Vec::new();
        for section in &self.sections {
            let kind = section.kind();
            if seen.contains(&kind) && !kind.may_repeat() {
                return false;
            }
            seen.push(kind);
        }
        metadata_first
    }
}

impl Default for CanonicalContent {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// ── Package ──────────────────────────────────────────────────────────────────

/// Format-neutral representation of one agent/skill/rule/command/hook document.
///
/// Generators only ever borrow a package, so one instance can feed any number
/// of concurrent conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPackage {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tag of the format the package was parsed from.
    pub format: String,
    #[serde(default)]
    pub subtype: Subtype,
    #[serde(default)]
    pub source_format: String,
    pub content: CanonicalContent,
    /// Pass-through copy of format-unique frontmatter keys.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl CanonicalPackage {
    /// Title from the metadata section, falling back to the package name and id.
    #[must_use]
    pub fn title(&self) -> &str {
        match self.content.metadata() {
            Some(meta) if !meta.title.trim().is_empty() => &meta.title,
            _ if !self.name.trim().is_empty() => &self.name,
            _ => &self.id,
        }
    }

    /// Description from the package, falling back to the metadata section.
    #[must_use]
    pub fn effective_description(&self) -> &str {
        if !self.description.trim().is_empty() {
            return &self.description;
        }
        self.content
            .metadata()
            .map(|m| m.description.as_str())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::section::{CustomSection, InstructionsSection, ToolsSection},
        rstest::rstest,
    };

    fn package(sections: Vec<Section>) -> CanonicalPackage {
        CanonicalPackage {
            id: "demo".into(),
            version: "1.0.0".into(),
            name: "demo".into(),
            description: String::new(),
            author: String::new(),
            tags: Vec::new(),
            format: "claude".into(),
            subtype: Subtype::Agent,
            source_format: "claude".into(),
            content: CanonicalContent::new(sections),
            metadata: Map::new(),
        }
    }

    fn meta(title: &str) -> Section {
        Section::Metadata(MetadataSection {
            title: title.into(),
            description: "desc".into(),
            ..Default::default()
        })
    }

    #[test]
    fn new_content_moves_metadata_first() {
        let content = CanonicalContent::new(vec![
            Section::Tools(ToolsSection {
                tools: vec!["Read".into()],
            }),
            meta("Title"),
        ]);
        assert_eq!(content.sections[0].kind(), SectionKind::Metadata);
        assert_eq!(content.format, CANONICAL_FORMAT);
        assert_eq!(content.version, CANONICAL_VERSION);
        assert!(content.is_well_formed());
    }

    #[test]
    fn duplicate_non_custom_sections_are_not_well_formed() {
        let tools = Section::Tools(ToolsSection::default());
        let content = CanonicalContent::new(vec![meta("T"), tools.clone(), tools]);
        assert!(!content.is_well_formed());

        let custom = Section::Custom(CustomSection::default());
        let content = CanonicalContent::new(vec![meta("T"), custom.clone(), custom]);
        assert!(content.is_well_formed());
    }

    #[test]
    fn json_round_trip_keeps_shape() {
        let pkg = package(vec![
            meta("Reviewer"),
            Section::Instructions(InstructionsSection {
                title: "Instructions".into(),
                content: "Review code".into(),
                priority: None,
            }),
        ]);
        let raw = pkg.to_json().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["content"]["format"], "canonical");
        assert_eq!(value["content"]["version"], "1.0");
        assert_eq!(value["content"]["sections"][0]["type"], "metadata");
        assert_eq!(value["sourceFormat"], "claude");
        assert_eq!(value["subtype"], "agent");
        assert_eq!(CanonicalPackage::from_json(&raw).unwrap(), pkg);
    }

    #[test]
    fn title_falls_back_to_name_then_id() {
        assert_eq!(package(vec![meta("Shown")]).title(), "Shown");
        assert_eq!(package(vec![meta("  ")]).title(), "demo");
        let mut pkg = package(Vec::new());
        pkg.name.clear();
        assert_eq!(pkg.title(), "demo");
    }

    #[test]
    fn description_falls_back_to_metadata_section() {
        let pkg = package(vec![meta("T")]);
        assert_eq!(pkg.effective_description(), "desc");
    }

    #[rstest]
    #[case("skill", Subtype::Skill)]
    #[case("Agent", Subtype::Agent)]
    #[case(" hook ", Subtype::Hook)]
    fn parses_subtypes(#[case] raw: &str, #[case] expected: Subtype) {
        assert_eq!(raw.parse::<Subtype>().unwrap(), expected);
    }

    #[test]
    fn unknown_subtype_is_an_error() {
        assert!("plugin".parse::<Subtype>().is_err());
    }
}
