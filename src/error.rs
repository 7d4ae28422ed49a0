pub type FreeUResult<T> = Result<T, FreeUError>;

#[derive(thiserror::Error, Debug)]
pub enum FreeUError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("shape error: {0}")]
    Shape(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FreeUError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FreeUError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(FreeUError::shape("x").to_string().contains("shape error:"));
        assert!(
            FreeUError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FreeUError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
