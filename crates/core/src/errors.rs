use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("unknown price label `{0}`")]
    UnknownPriceLabel(String),
    #[error("unknown quality grade `{0}`")]
    UnknownQualityGrade(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError};

    #[test]
    fn domain_error_converts_into_application_error() {
        let error: ApplicationError =
            DomainError::InvariantViolation("base price below zero".to_owned()).into();
        assert!(matches!(error, ApplicationError::Domain(_)));
    }

    #[test]
    fn persistence_error_keeps_its_message() {
        let error = ApplicationError::Persistence("database lock timeout".to_owned());
        assert_eq!(error.to_string(), "persistence failure: database lock timeout");
    }
}
