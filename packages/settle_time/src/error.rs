use std::io;

use thiserror::Error;

/// Errors that can occur when profiling continuations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// There is no promise library to profile.
    #[error("no promise library is available to profile")]
    LibraryNotFound,

    /// The promise library does not resolve values into promises that share its prototype.
    ///
    /// Intercepting the prototype of such a library would not affect the promises it creates.
    #[error("the promise library does not create promises of its own type")]
    TypeMismatch,

    /// Some of the continuation registration slots are already intercepted by someone else.
    #[error("continuation registration is already intercepted")]
    AlreadyIntercepted(#[from] interpose::Error),

    /// Timing results could not be written or read.
    #[error("timing results file could not be accessed")]
    Io(#[from] io::Error),

    /// Timing results could not be converted to or from JSON.
    #[error("timing results could not be converted to or from JSON")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for profiling operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
