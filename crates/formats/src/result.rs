use {
    canon_model::SectionKind,
    serde::{Deserialize, Serialize},
};

/// Prefix of every warning that reports a failed generation.
pub const CONVERSION_ERROR_PREFIX: &str = "Conversion error:";

/// Output of a generator call. Failures are data, never panics or errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub content: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub lossy_conversion: bool,
    pub quality_score: u8,
}

impl ConversionResult {
    /// Failed generation: empty content, zero score, one error warning.
    #[must_use]
    pub fn failed(format: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            content: String::new(),
            format: format.to_string(),
            warnings: vec![Warning::ConversionError(reason.to_string()).to_string()],
            lossy_conversion: true,
            quality_score: 0,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.starts_with(CONVERSION_ERROR_PREFIX))
    }
}

/// Information lost while rendering into a target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The target cannot represent this section kind at all.
    SectionSkipped {
        kind: SectionKind,
        format: &'static str,
    },
    /// A custom section for another editor.
    CustomSkipped { editor_type: String },
    /// The target has no native slot, so the section became plain markdown.
    RenderedAsMarkdown {
        kind: SectionKind,
        format: &'static str,
    },
    ConversionError(String),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionSkipped { kind, format } => {
                write!(f, "{kind} section skipped (not supported by {format})")
            },
            Self::CustomSkipped { editor_type } => {
                write!(f, "Custom {editor_type} section skipped")
            },
            Self::RenderedAsMarkdown { kind, format } => {
                write!(f, "{kind} section rendered as markdown (not supported by {format})")
            },
            Self::ConversionError(reason) => write!(f, "{CONVERSION_ERROR_PREFIX} {reason}"),
        }
    }
}

/// Whether a rendered warning string belongs to the lossy class.
#[must_use]
pub fn is_lossy_warning(warning: &str) -> bool {
    warning.starts_with(CONVERSION_ERROR_PREFIX)
        || warning.contains("skipped")
        || warning.contains("not supported")
}
