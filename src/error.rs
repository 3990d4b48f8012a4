use crate::phases::SinglePhaseKind;
use thiserror::Error;

/// Errors raised by the traversal engine and the network tracing layer.
///
/// Callback traits return `anyhow::Result`, so these travel inside an
/// `anyhow::Error` and can be recovered with `downcast_ref::<TracingError>()`.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("Traversal '{0}' must be reset before reuse")]
    NotReset(String),

    #[error("Terminal {0} has no conducting equipment")]
    MissingEquipment(String),

    #[error("No start terminals were found, tracing cannot be performed")]
    NoStartTerminals,

    #[error("Unknown network object: {0}")]
    UnknownObject(String),

    #[error("Invalid network description: {0}")]
    InvalidNetwork(String),

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("Crossing phases on nominal phase {nominal}: already traced {existing}, attempted {attempted}")]
    CrossingPhases {
        nominal: SinglePhaseKind,
        existing: SinglePhaseKind,
        attempted: SinglePhaseKind,
    },

    #[error("{0} is not a valid nominal phase")]
    InvalidNominalPhase(SinglePhaseKind),
}

pub type TracingResult<T> = std::result::Result<T, TracingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TracingError::NotReset("feeder".into());
        assert_eq!(err.to_string(), "Traversal 'feeder' must be reset before reuse");

        let err = TracingError::MissingEquipment("t1".into());
        assert_eq!(err.to_string(), "Terminal t1 has no conducting equipment");
    }

    #[test]
    fn test_phase_error_converts() {
        let err: TracingError = PhaseError::InvalidNominalPhase(SinglePhaseKind::None).into();
        assert!(matches!(err, TracingError::Phase(PhaseError::InvalidNominalPhase(_))));
        assert_eq!(err.to_string(), "Phase error: NONE is not a valid nominal phase");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = TracingError::NoStartTerminals.into();
        assert!(matches!(
            err.downcast_ref::<TracingError>(),
            Some(TracingError::NoStartTerminals)
        ));
    }
}
