use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Problems with a settled value detected while handing it to a continuation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValueError {
    /// The value is not of the type the continuation takes.
    #[error("settled value is not of the expected type {expected}")]
    UnexpectedType {
        /// Name of the type the continuation expected.
        expected: &'static str,
    },

    /// A spread continuation received a different number of values than it has parameters.
    #[error("expected {expected} values to spread, received {actual}")]
    Arity {
        /// Number of parameters of the continuation.
        expected: usize,

        /// Number of values that were settled.
        actual: usize,
    },
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

/// The reason a promise was rejected.
///
/// Rejections are cheap to clone and can be inspected by downcasting to the error type they
/// were created from.
///
/// # Example
///
/// ```
/// use std::io;
///
/// use thenable::Rejection;
///
/// let rejection = Rejection::new(io::Error::new(io::ErrorKind::NotFound, "no such order"));
///
/// assert_eq!(rejection.message(), "no such order");
/// assert!(rejection.downcast_ref::<io::Error>().is_some());
/// ```
#[derive(Clone)]
pub struct Rejection {
    reason: Arc<dyn StdError + Send + Sync>,
}

impl Rejection {
    /// Creates a rejection caused by `error`.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            reason: Arc::new(error),
        }
    }

    /// Creates a rejection described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    pub(crate) fn unexpected_type<T>() -> Self {
        Self::new(ValueError::UnexpectedType {
            expected: type_name::<T>(),
        })
    }

    pub(crate) fn arity(expected: usize, actual: usize) -> Self {
        Self::new(ValueError::Arity { expected, actual })
    }

    /// Human-readable description of the reason.
    #[must_use]
    pub fn message(&self) -> String {
        self.reason.to_string()
    }

    /// The error that caused the rejection.
    #[must_use]
    pub fn reason(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.reason
    }

    /// The error that caused the rejection, if it is of type `E`.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.reason.downcast_ref::<E>()
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rejection").field(&self.reason).finish()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise rejected: {}", self.reason)
    }
}

impl StdError for Rejection {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.reason)
    }
}
