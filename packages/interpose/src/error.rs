use thiserror::Error;

use crate::MethodKey;

/// Errors that can occur when intercepting methods.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The method is already intercepted and the existing interception has not been restored.
    ///
    /// Stacking interceptions on the same method would make call counts and recorded
    /// arguments ambiguous, so only one interception per method may be active at a time.
    #[error("method {method} is already intercepted")]
    AlreadyIntercepted {
        /// The method that was already intercepted.
        method: MethodKey,
    },
}

/// A specialized `Result` type for interception operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
