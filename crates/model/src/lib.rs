//! Canonical data model shared by every format parser and generator.
//!
//! A [`CanonicalPackage`] is produced once by a parser and afterwards only
//! read. Its content is an ordered list of semantically typed [`Section`]s
//! that never carry target-format syntax.

pub mod package;
pub mod section;

pub use {
    package::{CANONICAL_FORMAT, CANONICAL_VERSION, CanonicalContent, CanonicalPackage, Subtype},
    section::{
        CustomSection, ContextSection, Example, ExamplesSection, InstructionsSection,
        MetadataSection, PersonaSection, Rule, RulesSection, Section, SectionKind, ToolsSection,
    },
};
