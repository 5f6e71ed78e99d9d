use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use interpose::Interceptor;
use tokio::runtime::Handle;

use crate::{Promise, Prototype, RawPromise, Rejection, Settled, Settlement, Value, Values};

/// A promise library bound to a tokio runtime.
///
/// Every promise created through a `Runtime` (or derived from one that was) shares the same
/// [`Prototype`], so the continuation registration slots of that prototype apply to all of
/// them. Separate `Runtime` instances have separate prototypes, even when they spawn onto the
/// same tokio runtime.
///
/// Cloning a `Runtime` yields another handle to the same prototype.
///
/// # Example
///
/// ```
/// use thenable::Runtime;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runtime = Runtime::new(tokio::runtime::Handle::current());
///
/// let doubled = runtime.resolve(21).then("double", |n: i32| n * 2);
///
/// assert_eq!(doubled.await.unwrap(), 42);
/// # }
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    prototype: Arc<Prototype>,
    handle: Handle,
}

impl Runtime {
    /// Creates a promise library that spawns onto the tokio runtime behind `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self::with_interceptor(handle, Interceptor::new())
    }

    /// Creates a promise library whose prototype is guarded by `interceptor`.
    ///
    /// Hand the same interceptor (or clones of it) to everything else that intercepts
    /// methods, so that interceptions of this prototype's slots cannot be stacked.
    #[must_use]
    pub fn with_interceptor(handle: Handle, interceptor: Interceptor) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                prototype: Arc::new(Prototype::new(interceptor)),
                handle,
            }),
        }
    }

    /// Creates a promise library that spawns onto the tokio runtime of the caller.
    ///
    /// Returns `None` when called outside the context of a tokio runtime.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// The prototype shared by every promise of this runtime.
    #[must_use]
    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.inner.prototype
    }

    /// The tokio runtime promises are spawned onto.
    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// A promise fulfilled with `value`.
    pub fn resolve<T: Settled>(&self, value: T) -> Promise<T> {
        Promise::from_raw(self.resolve_raw(value.into_value()))
    }

    /// A promise rejected with `rejection`.
    pub fn reject<T: Settled>(&self, rejection: Rejection) -> Promise<T> {
        Promise::from_raw(self.reject_raw(rejection))
    }

    /// A promise settled by `work`, which starts running immediately.
    pub fn from_future<T, F>(&self, work: F) -> Promise<T>
    where
        T: Settled,
        F: Future<Output = Result<T, Rejection>> + Send + 'static,
    {
        Promise::from_raw(self.spawn_raw(async move { work.await.map(Settled::into_value) }))
    }

    /// A promise fulfilled with `value` once `duration` has elapsed.
    pub fn delay<T: Settled>(&self, duration: Duration, value: T) -> Promise<T> {
        self.from_future(async move {
            tokio::time::sleep(duration).await;
            Ok(value)
        })
    }

    /// A promise fulfilled with the values of all `promises` once every one of them is
    /// fulfilled, or rejected as soon as any of them is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use thenable::Runtime;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let runtime = Runtime::new(tokio::runtime::Handle::current());
    ///
    /// let sum = runtime
    ///     .join((runtime.resolve(3), runtime.resolve(4)))
    ///     .spread("sum", |a: i32, b: i32| a + b);
    ///
    /// assert_eq!(sum.await.unwrap(), 7);
    /// # }
    /// ```
    pub fn join<J: Join>(&self, promises: J) -> Promise<J::Output> {
        let members = promises
            .into_members()
            .into_iter()
            .map(Settled::into_value)
            .collect();

        Promise::from_raw(self.resolve_raw(Values::new(members).into_value()).all())
    }

    /// A type-erased promise fulfilled with `value`.
    pub fn resolve_raw(&self, value: Value) -> RawPromise {
        self.spawn_raw(async move { Ok(value) })
    }

    /// A type-erased promise rejected with `rejection`.
    pub fn reject_raw(&self, rejection: Rejection) -> RawPromise {
        self.spawn_raw(async move { Err(rejection) })
    }

    /// A type-erased promise settled by `work`, which starts running immediately.
    pub fn spawn_raw<F>(&self, work: F) -> RawPromise
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        RawPromise::spawn(self.clone(), work)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("prototype", &self.inner.prototype)
            .finish_non_exhaustive()
    }
}

/// A group of promises that [`Runtime::join()`] can wait for together.
///
/// Implemented for tuples of two to four [`Promise`]s, joining into a promise of the tuple of
/// their values.
pub trait Join {
    /// The value of the joined promise.
    type Output: Settled;

    /// The promises of the group, in order.
    fn into_members(self) -> Vec<RawPromise>;
}

macro_rules! join_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Settled),+> Join for ($(Promise<$name>,)+) {
            type Output = ($($name,)+);

            fn into_members(self) -> Vec<RawPromise> {
                vec![$(self.$index.into_raw()),+]
            }
        }
    };
}

join_tuple!(A: 0, B: 1);
join_tuple!(A: 0, B: 1, C: 2);
join_tuple!(A: 0, B: 1, C: 2, D: 3);
