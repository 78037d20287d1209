use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A field failed its format, length or range check. The message names the field.
    #[error("{0}")]
    Validation(String),
}

impl ModelError {
    pub fn invalid(field: &str, constraint: impl std::fmt::Display) -> Self {
        Self::Validation(format!("{field} {constraint}"))
    }
}
