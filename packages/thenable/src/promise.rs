use std::any::type_name;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture, Either};

use crate::value::{positional, typed};
use crate::{OnFulfilled, OnRejected, OnSpread, RawPromise, Rejection, Runtime, Settled, Value};

/// A promise of a value of type `T`.
///
/// This is a typed view over a [`RawPromise`]. Registering a continuation through any of the
/// methods here goes through the matching slot of the runtime's [`Prototype`][crate::Prototype],
/// exactly as registering it on the raw promise would.
///
/// If a value of some other type ever reaches a continuation (possible only when promises are
/// assembled from raw parts), the continuation is skipped and the promise it created is
/// rejected with [`ValueError::UnexpectedType`][crate::ValueError::UnexpectedType].
///
/// Awaiting a promise yields its value or its rejection.
pub struct Promise<T> {
    raw: RawPromise,
    _value: PhantomData<fn() -> T>,
}

impl<T: Settled> Promise<T> {
    /// Views a raw promise as a promise of `T`.
    #[must_use]
    pub fn from_raw(raw: RawPromise) -> Self {
        Self {
            raw,
            _value: PhantomData,
        }
    }

    /// The type-erased promise behind this one.
    #[must_use]
    pub fn raw(&self) -> &RawPromise {
        &self.raw
    }

    /// Converts into the type-erased promise behind this one.
    #[must_use]
    pub fn into_raw(self) -> RawPromise {
        self.raw
    }

    /// The runtime that created the promise.
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        self.raw.runtime()
    }

    /// Whether the promise has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.raw.is_settled()
    }

    /// Registers `body`, labelled `label`, to run with the value once the promise is fulfilled.
    ///
    /// A rejection skips `body` and rejects the returned promise in the same way.
    pub fn then<U, F>(&self, label: impl Into<Arc<str>>, body: F) -> Promise<U>
    where
        U: Settled,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_then(label, move |value| Ok(body(value)))
    }

    /// Like [`then()`][Self::then], for a `body` that may itself reject.
    pub fn try_then<U, F>(&self, label: impl Into<Arc<str>>, body: F) -> Promise<U>
    where
        U: Settled,
        F: Fn(T) -> Result<U, Rejection> + Send + Sync + 'static,
    {
        let on_fulfilled = OnFulfilled::from_fn(label, move |value: Value| {
            body(typed::<T>(&value)?).map(Settled::into_value)
        });

        Promise::from_raw(self.raw.then(on_fulfilled))
    }

    /// Like [`try_then()`][Self::try_then], for a `body` that continues asynchronously.
    ///
    /// The returned promise settles only when the future returned by `body` does.
    pub fn then_async<U, F, Fut>(&self, label: impl Into<Arc<str>>, body: F) -> Promise<U>
    where
        U: Settled,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, Rejection>> + Send + 'static,
    {
        let on_fulfilled =
            OnFulfilled::new(label, move |value: Value| match typed::<T>(&value) {
                Ok(input) => {
                    Either::Left(body(input).map(|result| result.map(Settled::into_value)))
                }
                Err(rejection) => Either::Right(future::ready(Err(rejection))),
            });

        Promise::from_raw(self.raw.then(on_fulfilled))
    }

    /// Registers `body`, labelled `label`, to recover a value from the rejection once the
    /// promise is rejected.
    ///
    /// A fulfilled value skips `body` and fulfills the returned promise with the same value.
    pub fn catch<F>(&self, label: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(Rejection) -> T + Send + Sync + 'static,
    {
        self.try_catch(label, move |rejection| Ok(body(rejection)))
    }

    /// Like [`catch()`][Self::catch], for a `body` that may reject again.
    pub fn try_catch<F>(&self, label: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(Rejection) -> Result<T, Rejection> + Send + Sync + 'static,
    {
        let on_rejected = OnRejected::from_fn(label, move |rejection: Rejection| {
            body(rejection).map(Settled::into_value)
        });

        Self::from_raw(self.raw.catch(on_rejected))
    }
}

macro_rules! spread_tuple {
    ($count:literal; $($name:ident : $index:tt),+) => {
        impl<$($name: Settled),+> Promise<($($name,)+)> {
            /// Registers `body`, labelled `label`, to run with the members of the value as
            /// separate arguments once the promise is fulfilled.
            ///
            /// Members that are promises themselves are settled first.
            pub fn spread<U, F>(&self, label: impl Into<Arc<str>>, body: F) -> Promise<U>
            where
                U: Settled,
                F: Fn($($name),+) -> U + Send + Sync + 'static,
            {
                let on_spread = OnSpread::from_fn(label, move |members: Vec<Value>| {
                    if members.len() != $count {
                        return Err(Rejection::arity($count, members.len()));
                    }

                    Ok(body($(positional::<$name>(&members, $index)?),+).into_value())
                });

                Promise::from_raw(self.raw.spread(on_spread))
            }
        }
    };
}

spread_tuple!(2; A: 0, B: 1);
spread_tuple!(3; A: 0, B: 1, C: 2);
spread_tuple!(4; A: 0, B: 1, C: 2, D: 3);

impl<T: Settled> IntoFuture for Promise<T> {
    type Output = Result<T, Rejection>;
    type IntoFuture = BoxFuture<'static, Result<T, Rejection>>;

    fn into_future(self) -> Self::IntoFuture {
        let settled = self.raw.settled();

        async move { typed::<T>(&settled.await?) }.boxed()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}
