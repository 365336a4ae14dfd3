// /src/errors.rs
//! Every failure of a reconciliation pass, surfaced to the caller without retry
use crate::types::{CommandKind, Pass};
use thiserror::Error;

/// Boxed error coming back from a collaborator (data source or host view).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Duplicate section identifier '{identifier}' in the {pass} snapshot")]
    DuplicateSection { identifier: String, pass: Pass },

    #[error("Duplicate row identity key {key} in section '{section}' of the {pass} snapshot")]
    DuplicateRow { section: String, key: String, pass: Pass },

    #[error("Command {kind} for section '{section}' could not be resolved against its layout")]
    UnresolvedCommand { kind: CommandKind, section: String },

    #[error("Unknown animation key '{0}'")]
    UnknownAnimationKey(String),

    #[error("Data source failed while capturing the {pass} snapshot: {source}")]
    DataSource {
        pass: Pass,
        #[source]
        source: CollaboratorError,
    },

    #[error("Host rejected {primitive}: {source}")]
    Host {
        primitive: &'static str,
        #[source]
        source: CollaboratorError,
    },

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ReconcilerError {
    /// Caller-side mistakes: duplicate identities, inconsistent collaborator
    /// data, or bad animation configuration. These are always reported before
    /// any host primitive of the pass is dispatched.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ReconcilerError::DuplicateSection { .. }
                | ReconcilerError::DuplicateRow { .. }
                | ReconcilerError::UnresolvedCommand { .. }
                | ReconcilerError::UnknownAnimationKey(_)
                | ReconcilerError::SerdeError(_)
        )
    }

    pub(crate) fn host<E>(primitive: &'static str) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |err| ReconcilerError::Host {
            primitive,
            source: Box::new(err),
        }
    }

    pub(crate) fn data_source<E>(pass: Pass) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |err| ReconcilerError::DataSource {
            pass,
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("view is gone")]
    struct Gone;

    #[test]
    fn duplicate_identities_are_configuration_errors() {
        let err = ReconcilerError::DuplicateRow {
            section: "fruit".into(),
            key: "7".into(),
            pass: Pass::After,
        };
        assert!(err.is_configuration_error());
        assert_eq!(
            err.to_string(),
            "Duplicate row identity key 7 in section 'fruit' of the after snapshot"
        );
    }

    #[test]
    fn host_failures_keep_their_source() {
        let err = ReconcilerError::host("insert_rows")(Gone);
        assert!(!err.is_configuration_error());
        assert_eq!(err.to_string(), "Host rejected insert_rows: view is gone");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("view is gone"));
    }
}
