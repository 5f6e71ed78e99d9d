//! Type-erased settled values.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::Rejection;

/// A settled value with its type erased.
///
/// Continuations are registered on the shared [`Prototype`][crate::Prototype] of all promises
/// regardless of what type the promise carries, so at that level every value looks the same.
pub type Value = Arc<dyn Any + Send + Sync>;

/// The outcome of a promise: a value, or the reason it was rejected.
pub type Settlement = Result<Value, Rejection>;

/// An ordered group of values that settle together.
///
/// Tuples are stored as `Values` so that a spread continuation can receive their members as
/// separate arguments. Members that are themselves [`RawPromise`][crate::RawPromise]s are
/// awaited by [`RawPromise::all()`][crate::RawPromise::all] before being handed out.
#[derive(Clone, Debug, Default)]
pub struct Values(Vec<Value>);

impl Values {
    /// Groups `values` in the given order.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// The number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The member at `index`, if there is one.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// The members as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Copies the members into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.clone()
    }
}

impl Settled for Values {}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// A type that promises can carry.
///
/// The default methods store the value as-is and recover it by downcasting, which is right
/// for almost every type. To let a type of your own travel through promises, an empty impl
/// is enough:
///
/// ```
/// use thenable::Settled;
///
/// #[derive(Clone)]
/// struct Order {
///     id: u64,
/// }
///
/// impl Settled for Order {}
/// ```
///
/// Tuples override both methods and are stored as [`Values`], one member per element.
pub trait Settled: Clone + Send + Sync + 'static {
    /// Erases the type of the value.
    fn into_value(self) -> Value {
        Arc::new(self)
    }

    /// Recovers a typed value, returning `None` if `value` does not hold one.
    fn from_value(value: &Value) -> Option<Self> {
        value.downcast_ref::<Self>().cloned()
    }
}

macro_rules! settled_as_is {
    ($($ty:ty),+ $(,)?) => {
        $(impl Settled for $ty {})+
    };
}

settled_as_is!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
    Duration,
);

impl<T: Settled> Settled for Vec<T> {}

impl<T: Settled> Settled for Option<T> {}

impl<T: Send + Sync + 'static> Settled for Arc<T> {}

macro_rules! settled_tuple {
    ($count:literal; $($name:ident : $index:tt),+) => {
        impl<$($name: Settled),+> Settled for ($($name,)+) {
            fn into_value(self) -> Value {
                Arc::new(Values::new(vec![$(self.$index.into_value()),+]))
            }

            fn from_value(value: &Value) -> Option<Self> {
                let values = value.downcast_ref::<Values>()?;

                if values.len() != $count {
                    return None;
                }

                Some(($($name::from_value(values.get($index)?)?,)+))
            }
        }
    };
}

settled_tuple!(2; A: 0, B: 1);
settled_tuple!(3; A: 0, B: 1, C: 2);
settled_tuple!(4; A: 0, B: 1, C: 2, D: 3);

/// Recovers the typed value at `index`, rejecting if it is missing or of another type.
pub(crate) fn positional<T: Settled>(values: &[Value], index: usize) -> Result<T, Rejection> {
    values
        .get(index)
        .and_then(T::from_value)
        .ok_or_else(Rejection::unexpected_type::<T>)
}

/// Recovers a typed value, rejecting if it is of another type.
pub(crate) fn typed<T: Settled>(value: &Value) -> Result<T, Rejection> {
    T::from_value(value).ok_or_else(Rejection::unexpected_type::<T>)
}
