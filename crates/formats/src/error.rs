#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("format not supported: '{format}'")]
    UnsupportedFormat { format: String },
    #[error("{format} format requires {requirement}")]
    MissingRequirement {
        format: &'static str,
        requirement: String,
    },
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Render(#[from] std::fmt::Error),
}

impl Error {
    #[must_use]
    pub fn unsupported(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    #[must_use]
    pub fn missing(format: &'static str, requirement: impl Into<String>) -> Self {
        Self::MissingRequirement {
            format,
            requirement: requirement.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
