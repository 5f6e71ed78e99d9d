use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{Body, CallLog, ERR_POISONED_LOCK, Error, Interception, Method, Registry, Result};

/// One invocation of an intercepted method, as seen by the replacement function.
#[derive(Debug)]
pub struct Call<A> {
    ordinal: u64,
    args: A,
}

impl<A> Call<A> {
    pub(crate) fn new(ordinal: u64, args: A) -> Self {
        Self { ordinal, args }
    }

    /// Zero-based position of this call among all calls recorded by the interception,
    /// i.e. the call count minus one at the time of the call.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The arguments recorded for this call.
    #[must_use]
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Consumes the call, returning the recorded arguments.
    #[must_use]
    pub fn into_args(self) -> A {
        self.args
    }
}

/// Creates [`Interception`]s, refusing to stack two of them on the same method.
///
/// All clones of an interceptor share one [`Registry`], which lists the methods intercepted
/// through them. The method slot itself also refuses a second interception, so interceptors
/// with separate registries cannot stack on one slot either.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use interpose::{Error, Interceptor, Method, TargetId};
///
/// let len = Arc::new(Method::new(TargetId::next(), "len", |s: &String, (): ()| s.len()));
/// let interceptor = Interceptor::new();
///
/// let _first = interceptor.intercept(&len, |_: &String, _| 0).unwrap();
/// let second = interceptor.intercept(&len, |_: &String, _| 1);
///
/// assert!(matches!(second, Err(Error::AlreadyIntercepted { .. })));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Interceptor {
    registry: Arc<Registry>,
}

impl Interceptor {
    /// Creates an interceptor with a registry of its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interceptor that records its interceptions in an existing registry.
    #[must_use]
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry shared by this interceptor and its clones.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Replaces the body of `method` with a recording wrapper around `replacement`.
    ///
    /// Every call made through the method after this returns increments the call count of the
    /// returned [`Interception`], appends a clone of the arguments to its recorded arguments and
    /// then invokes `replacement` with the original receiver and a [`Call`] describing the
    /// invocation. The value `replacement` returns is the value of the call.
    ///
    /// The recorded arguments are kept until the interception is restored, so anything they
    /// own stays alive until then.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyIntercepted`] if the method already has an active interception,
    /// created through this interceptor or any other. The method and the registry are left
    /// untouched in that case.
    pub fn intercept<C, A, R, F>(
        &self,
        method: &Arc<Method<C, A, R>>,
        replacement: F,
    ) -> Result<Interception<C, A, R>>
    where
        C: 'static,
        A: Clone + Send + 'static,
        R: 'static,
        F: Fn(&C, Call<A>) -> R + Send + Sync + 'static,
    {
        let key = method.key();
        self.registry.register(key)?;

        if !method.claim() {
            self.registry.unregister(key);
            return Err(Error::AlreadyIntercepted { method: key });
        }

        let log = Arc::new(Mutex::new(CallLog::new()));
        let original = method.body();

        let wrapper: Body<C, A, R> = {
            let log = Arc::clone(&log);
            let original = Arc::clone(&original);

            Arc::new(move |receiver: &C, args: A| {
                let mut log = log.lock().expect(ERR_POISONED_LOCK);

                // A wrapper may outlive its interception if someone grabbed it mid-restore.
                if log.is_restored() {
                    drop(log);
                    return original(receiver, args);
                }

                let call = log.record(args);
                drop(log);

                replacement(receiver, call)
            })
        };

        method.replace(wrapper);

        debug!(method = %key, "method intercepted");

        Ok(Interception::new(
            Arc::clone(method),
            original,
            Arc::clone(&self.registry),
            log,
        ))
    }
}
