//! Replaceable method slots and their identities.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwap;

/// The callable currently installed in a [`Method`] slot.
pub(crate) type Body<C, A, R> = Arc<dyn Fn(&C, A) -> R + Send + Sync>;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of an object whose methods can be intercepted.
///
/// Every call to [`TargetId::next()`] returns an identity that has never been handed out
/// before in this process, so two distinct objects never share one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocates a new unique target identity.
    #[must_use]
    pub fn next() -> Self {
        // Relaxed is enough, we only need uniqueness, not ordering with other memory.
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The `(target, method name)` pair that identifies one interceptable method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MethodKey {
    target: TargetId,
    name: &'static str,
}

impl MethodKey {
    /// Creates the key of the method `name` on the object identified by `target`.
    #[must_use]
    pub fn new(target: TargetId, name: &'static str) -> Self {
        Self { target, name }
    }

    /// The object that owns the method.
    #[must_use]
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// The name of the method.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.name)
    }
}

/// A named method slot whose body can be swapped at runtime.
///
/// `C` is the receiver the method is called on (the calling context), `A` is the argument list
/// and `R` the return type. Callers always go through [`call()`][Self::call], so whatever body
/// is installed at the time of the call is the one that runs.
///
/// A slot carries at most one interception at a time, whichever
/// [`Interceptor`][crate::Interceptor] installs it.
///
/// # Example
///
/// ```
/// use interpose::{Method, TargetId};
///
/// let double = Method::new(TargetId::next(), "double", |factor: &i32, value: i32| value * factor);
///
/// assert_eq!(double.call(&2, 21), 42);
/// assert_eq!(double.key().name(), "double");
/// ```
pub struct Method<C, A, R> {
    key: MethodKey,

    // Read on every registration, written only when an interception is installed or restored.
    body: ArcSwap<Body<C, A, R>>,

    // Set while an interception owns the slot.
    intercepted: AtomicBool,
}

impl<C, A, R> Method<C, A, R> {
    /// Creates a method slot named `name` on `target` with the given initial body.
    pub fn new<F>(target: TargetId, name: &'static str, body: F) -> Self
    where
        F: Fn(&C, A) -> R + Send + Sync + 'static,
    {
        let body: Body<C, A, R> = Arc::new(body);

        Self {
            key: MethodKey::new(target, name),
            body: ArcSwap::from_pointee(body),
            intercepted: AtomicBool::new(false),
        }
    }

    /// The identity of this method.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        self.key
    }

    /// Whether an interception currently owns the slot.
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        self.intercepted.load(Ordering::Acquire)
    }

    /// Takes ownership of the slot for one interception. Returns `false` if another
    /// interception already owns it.
    pub(crate) fn claim(&self) -> bool {
        self.intercepted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Gives up ownership taken by [`claim()`][Self::claim].
    pub(crate) fn release(&self) {
        self.intercepted.store(false, Ordering::Release);
    }

    /// Calls the currently installed body with `receiver` as the calling context.
    pub fn call(&self, receiver: &C, args: A) -> R {
        // No guard is held during the call, so a body may itself call into the slot.
        let body = self.body();
        body(receiver, args)
    }

    pub(crate) fn body(&self) -> Body<C, A, R> {
        let current = self.body.load();
        Arc::clone(&**current)
    }

    /// Installs `body`, returning the one it replaced.
    pub(crate) fn replace(&self, body: Body<C, A, R>) -> Body<C, A, R> {
        Arc::unwrap_or_clone(self.body.swap(Arc::new(body)))
    }
}

impl<C, A, R> fmt::Debug for Method<C, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
