use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("`{value}` is not a valid month, expected YYYY-MM")]
    InvalidMonth { value: String },
    #[error("`{value}` is not a valid boolean flag")]
    InvalidFlag { value: String },
}

impl DomainError {
    pub fn invalid_month(value: impl Into<String>) -> Self {
        Self::InvalidMonth {
            value: value.into(),
        }
    }

    pub fn invalid_flag(value: impl Into<String>) -> Self {
        Self::InvalidFlag {
            value: value.into(),
        }
    }
}
