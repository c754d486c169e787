//! Conversion quality scoring.
//!
//! The lossy deduction is flat: one lossy warning or ten cost the same.
//! Downstream consumers rely on the resulting scale (100 → 90 for any lossy
//! conversion), so keep it per call rather than per section.

use canon_model::CanonicalPackage;

use crate::result::is_lossy_warning;

pub const BASE_SCORE: i32 = 100;
/// Deducted once per generation call when any lossy warning was raised.
pub const LOSSY_PENALTY: i32 = 10;
/// Deducted by formats with a description slot when the package has none.
pub const MISSING_DESCRIPTION_PENALTY: i32 = 5;

/// Format-specific deductions on top of the lossy penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScorePolicy {
    /// The rendered output has a description field that would be left blank.
    pub description_slot: bool,
}

/// Score a generation: `100`, minus the flat lossy penalty, minus any
/// format-specific deductions, clamped to `0..=100`.
#[must_use]
pub fn score(pkg: &CanonicalPackage, warnings: &[String], policy: ScorePolicy) -> u8 {
    let mut score = BASE_SCORE;
    if is_lossy(warnings) {
        score -= LOSSY_PENALTY;
    }
    if policy.description_slot && pkg.effective_description().trim().is_empty() {
        score -= MISSING_DESCRIPTION_PENALTY;
    }
    u8::try_from(score.clamp(0, BASE_SCORE)).unwrap_or_default()
}

/// `true` iff at least one lossy-class warning is present.
#[must_use]
pub fn is_lossy(warnings: &[String]) -> bool {
    warnings.iter().any(|w| is_lossy_warning(w))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        canon_model::{CanonicalContent, Subtype},
        serde_json::Map,
    };

    fn pkg(description: &str) -> CanonicalPackage {
        CanonicalPackage {
            id: "p".into(),
            version: "1.0.0".into(),
            name: "p".into(),
            description: description.into(),
            author: String::new(),
            tags: Vec::new(),
            format: "claude".into(),
            subtype: Subtype::Skill,
            source_format: "claude".into(),
            content: CanonicalContent::default(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn clean_conversion_scores_full() {
        assert_eq!(score(&pkg("d"), &[], ScorePolicy::default()), 100);
    }

    #[test]
    fn lossy_penalty_is_flat() {
        let one = vec!["Persona section skipped (not supported by Kiro)".to_string()];
        let many = vec![
            "Persona section skipped (not supported by Kiro)".to_string(),
            "Custom cursor section skipped".to_string(),
            "Tools section rendered as markdown (not supported by Kiro)".to_string(),
        ];
        assert_eq!(score(&pkg("d"), &one, ScorePolicy::default()), 90);
        assert_eq!(score(&pkg("d"), &many, ScorePolicy::default()), 90);
    }

    #[test]
    fn missing_description_only_counts_with_a_slot() {
        let with_slot = ScorePolicy {
            description_slot: true,
        };
        assert_eq!(score(&pkg(""), &[], with_slot), 95);
        assert_eq!(score(&pkg(""), &[], ScorePolicy::default()), 100);
        let lossy = vec!["Custom x section skipped".to_string()];
        assert_eq!(score(&pkg(" "), &lossy, with_slot), 85);
    }
}
