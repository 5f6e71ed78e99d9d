//! Handles of active interceptions.

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{Body, Call, ERR_POISONED_LOCK, Method, MethodKey, Registry};

/// Calls recorded by one interception.
#[derive(Debug)]
pub(crate) struct CallLog<A> {
    call_count: u64,
    calling_args: Vec<A>,
    restored: bool,
}

impl<A> CallLog<A> {
    pub(crate) fn new() -> Self {
        Self {
            call_count: 0,
            calling_args: Vec::new(),
            restored: false,
        }
    }

    pub(crate) fn is_restored(&self) -> bool {
        self.restored
    }

    fn clear(&mut self) {
        self.call_count = 0;
        self.calling_args.clear();
        self.restored = true;
    }
}

impl<A: Clone> CallLog<A> {
    /// Records one call, returning its description for the replacement function.
    pub(crate) fn record(&mut self, args: A) -> Call<A> {
        let ordinal = self.call_count;

        self.call_count = self
            .call_count
            .checked_add(1)
            .expect("call count overflows u64 - this indicates an unrealistic scenario");
        self.calling_args.push(args.clone());

        Call::new(ordinal, args)
    }
}

/// What is needed to undo an interception.
struct Installed<C, A, R> {
    method: Arc<Method<C, A, R>>,
    original: Body<C, A, R>,
    registry: Arc<Registry>,
}

/// An active interception of one method, created by
/// [`Interceptor::intercept()`][crate::Interceptor::intercept].
///
/// The handle exposes what the interception has recorded so far and puts the original method
/// body back in place when [`restore()`][Self::restore] is called or the handle is dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use interpose::{Interceptor, Method, TargetId};
///
/// let shout = Arc::new(Method::new(TargetId::next(), "shout", |(): &(), s: String| {
///     s.to_uppercase()
/// }));
///
/// let mut interception = Interceptor::new()
///     .intercept(&shout, |(): &(), call| call.into_args())
///     .unwrap();
///
/// assert_eq!(shout.call(&(), "quiet".to_string()), "quiet");
/// assert_eq!(interception.call_count(), 1);
///
/// interception.restore();
///
/// assert_eq!(shout.call(&(), "loud".to_string()), "LOUD");
/// assert_eq!(interception.call_count(), 0);
/// assert!(!interception.is_active());
/// ```
pub struct Interception<C, A, R> {
    key: MethodKey,
    log: Arc<Mutex<CallLog<A>>>,

    // None once restored.
    installed: Option<Installed<C, A, R>>,
}

impl<C, A, R> Interception<C, A, R> {
    pub(crate) fn new(
        method: Arc<Method<C, A, R>>,
        original: Body<C, A, R>,
        registry: Arc<Registry>,
        log: Arc<Mutex<CallLog<A>>>,
    ) -> Self {
        Self {
            key: method.key(),
            log,
            installed: Some(Installed {
                method,
                original,
                registry,
            }),
        }
    }

    /// The method this interception applies (or applied) to.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        self.key
    }

    /// Whether the interception is still installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.installed.is_some()
    }

    /// The number of calls made through the intercepted method since it was intercepted.
    ///
    /// Zero after the interception has been restored.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.log.lock().expect(ERR_POISONED_LOCK).call_count
    }

    /// Restores the original method body and forgets everything recorded.
    ///
    /// Calling this on an interception that is already restored does nothing.
    pub fn restore(&mut self) {
        let Some(installed) = self.installed.take() else {
            return;
        };

        // The slot stays claimed until the original is back, so nobody can install over it.
        installed.method.replace(installed.original);
        installed.method.release();
        installed.registry.unregister(self.key);
        self.log.lock().expect(ERR_POISONED_LOCK).clear();

        debug!(method = %self.key, "interception restored");
    }
}

impl<C, A: Clone, R> Interception<C, A, R> {
    /// The arguments of every call made through the intercepted method, in call order.
    ///
    /// Empty after the interception has been restored.
    #[must_use]
    pub fn calling_args(&self) -> Vec<A> {
        self.log
            .lock()
            .expect(ERR_POISONED_LOCK)
            .calling_args
            .clone()
    }
}

impl<C, A, R> Drop for Interception<C, A, R> {
    fn drop(&mut self) {
        self.restore();
    }
}

impl<C, A, R> fmt::Debug for Interception<C, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("key", &self.key)
            .field("active", &self.is_active())
            .field("call_count", &self.call_count())
            .finish_non_exhaustive()
    }
}
