//! Failure taxonomy of the record-assembly engine
//!
//! Three kinds of condition end a job: a product or association that the
//! configuration names but the event does not carry (fatal only in strict
//! mode), a structurally impossible state in the upstream reconstruction
//! (always fatal), and a shutdown with nothing processed. Everything else
//! degrades to an explicit empty or unmatched value and processing
//! continues.

use thiserror::Error;

/// Result type of the record-assembly engine
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal conditions reported to the host framework
///
/// The host is expected to abort the job on any of these; there is no
/// partial-output recovery at this layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A non-empty product label failed to resolve under strict mode
    #[error("no product of {what} found under label '{label}'. \
             Set 'strict' to false to continue anyway")]
    MissingProduct {
        /// Description of the collection that was requested
        what: &'static str,
        /// The label it was requested under
        label: String,
    },

    /// A non-empty association label failed to resolve under strict mode
    #[error("no association from {from} to {to} found under label '{label}'. \
             Set 'strict' to false to continue anyway")]
    MissingAssociation {
        /// Source collection of the association
        from: &'static str,
        /// Target collection of the association
        to: &'static str,
        /// The label it was requested under
        label: String,
    },

    /// The upstream reconstruction broke its own structural contract
    ///
    /// Always fatal, independent of the strictness mode.
    #[error("reconstruction integrity violation: {0}")]
    IntegrityViolation(String),

    /// Shutdown was requested after zero processed events
    #[error("no events processed in this job, refusing to finalize an empty output")]
    NothingProcessed,
}

impl Error {
    /// Shorthand for building an integrity violation
    pub fn integrity(msg: impl Into<String>) -> Self {
        Error::IntegrityViolation(msg.into())
    }
}
