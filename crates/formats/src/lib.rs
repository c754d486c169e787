//! Conversion between AI assistant configuration formats.
//!
//! Every format has a parser (`from_*`) producing a [`CanonicalPackage`] and
//! a generator (`to_*`) rendering one back, reporting lost information as
//! warnings and a quality score. Parsers never fail; generators report
//! failure inside the returned [`ConversionResult`].

pub mod body;
pub mod error;
pub mod formats;
pub mod frontmatter;
pub mod options;
pub mod parse;
pub mod quality;
pub mod registry;
pub mod render;
pub mod result;

pub use canon_model::CanonicalPackage;

pub use {
    error::{Error, Result},
    formats::{
        agent_skills::{from_agent_skills, to_agent_skills},
        claude::{from_claude, to_claude},
        copilot::{from_copilot, to_copilot},
        cursor::{from_cursor, to_cursor},
        kiro::{from_kiro, to_kiro},
    },
    frontmatter::{Extracted, FrontmatterExtractor, extract},
    options::{FormatConfig, InclusionMode},
    parse::ParseMetadata,
    registry::{Format, FormatCodec, convert},
    result::ConversionResult,
};
