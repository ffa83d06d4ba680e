use thiserror::Error;

use crate::flag::FlagType;
use crate::parser::ParseOutcome;

/// Errors raised while registering, accessing or parsing flags and actions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("undefined flag: {0}")]
    UndefinedFlag(String),

    #[error("undefined action: {0}")]
    UndefinedAction(String),

    #[error("flag '{flag}' holds a {actual} value, not {expected}")]
    FlagType {
        flag: String,
        expected: FlagType,
        actual: FlagType,
    },

    /// A flag validator rejected a value. The flag keeps its previous value.
    #[error("invalid value for flag '{flag}': {message}")]
    FlagValidation { flag: String, message: String },

    /// An action's arguments validator rejected the collected positional arguments.
    #[error("invalid arguments for action '{action}': {message}")]
    ActionArgumentsValidation { action: String, message: String },

    /// Structural parse failure: unknown action or flag, misplaced token,
    /// missing parameters.
    #[error("{0}")]
    Failure(String),

    /// A flag value that does not coerce to the flag's type.
    #[error("{0}")]
    InvalidFlag(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Collapse the error onto the parse status it represents.
    ///
    /// Validation failures report `Failure`; match on the variant to tell them
    /// apart from structural errors.
    pub fn status(&self) -> ParseStatus {
        match self {
            Self::InvalidFlag(_) => ParseStatus::InvalidFlag,
            _ => ParseStatus::Failure,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::FlagValidation { .. } | Self::ActionArgumentsValidation { .. }
        )
    }
}

/// Flat result code of a parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Ok,
    Help,
    Version,
    Failure,
    InvalidFlag,
}

impl ParseStatus {
    pub fn of(result: &Result<ParseOutcome>) -> Self {
        match result {
            Ok(ParseOutcome::Ok) => Self::Ok,
            Ok(ParseOutcome::Help) => Self::Help,
            Ok(ParseOutcome::Version) => Self::Version,
            Err(err) => err.status(),
        }
    }
}

impl From<ParseOutcome> for ParseStatus {
    fn from(outcome: ParseOutcome) -> Self {
        Self::of(&Ok(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_errors_keep_their_own_status() {
        let err = Error::InvalidFlag("flag 'count' expects a value of type int".to_string());
        assert_eq!(err.status(), ParseStatus::InvalidFlag);
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_errors_report_failure_but_stay_distinguishable() {
        let err = Error::FlagValidation {
            flag: "ponies".to_string(),
            message: "too many".to_string(),
        };
        assert_eq!(err.status(), ParseStatus::Failure);
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid value for flag 'ponies': too many");
    }

    #[test]
    fn status_of_outcomes() {
        assert_eq!(ParseStatus::from(ParseOutcome::Help), ParseStatus::Help);
        assert_eq!(
            ParseStatus::of(&Err(Error::Failure("unknown action: x".to_string()))),
            ParseStatus::Failure
        );
    }
}
