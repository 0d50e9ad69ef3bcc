//! Field access for records.
//!
//! The engine never constructs or mutates records. It only asks them for
//! named field values through the [`Record`] trait, which is usually derived:
//!
//! ```ignore
//! use recordset::Record;
//!
//! #[derive(Record)]
//! struct Rune {
//!     name: String,
//!     #[record(rename = "lvl")]
//!     level: u8,
//!     #[record(skip)]
//!     lore: String,
//! }
//! ```

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::value::{Number, Timestamp, Value};

/// Trait for types that can be queried.
///
/// # Manual Implementation
///
/// ```
/// use recordset::{Record, Value};
///
/// struct Rune {
///     name: String,
///     level: u8,
/// }
///
/// impl Record for Rune {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::string(self.name.as_str()),
///             "level" => Value::from(self.level),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value of a field, or [`Value::None`] if the field doesn't
    /// exist or is not queryable.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns a plain accessor function over this record type.
    fn accessor<'a>(item: &'a Self, field: &str) -> Value<'a>
    where
        Self: Sized,
    {
        item.field_value(field)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}

/// Conversion of a field into a [`Value`], used by `#[derive(Record)]`.
///
/// Implement this for your own enums to make them queryable:
///
/// ```
/// use recordset::{AsValue, Value};
///
/// enum School {
///     Fire,
///     Frost,
/// }
///
/// impl AsValue for School {
///     fn as_value(&self) -> Value<'_> {
///         match self {
///             School::Fire => Value::Enum(0),
///             School::Frost => Value::Enum(1),
///         }
///     }
/// }
/// ```
pub trait AsValue {
    /// Returns the field as a value, borrowing where possible.
    fn as_value(&self) -> Value<'_>;
}

impl AsValue for str {
    fn as_value(&self) -> Value<'_> {
        Value::String(Cow::Borrowed(self))
    }
}

impl AsValue for String {
    fn as_value(&self) -> Value<'_> {
        Value::String(Cow::Borrowed(self.as_str()))
    }
}

impl AsValue for Cow<'_, str> {
    fn as_value(&self) -> Value<'_> {
        Value::String(Cow::Borrowed(self.as_ref()))
    }
}

impl AsValue for bool {
    fn as_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl AsValue for Timestamp {
    fn as_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

impl AsValue for Number {
    fn as_value(&self) -> Value<'_> {
        Value::Number(*self)
    }
}

impl AsValue for Value<'_> {
    fn as_value(&self) -> Value<'_> {
        self.reborrow()
    }
}

macro_rules! as_value_number {
    ($($source:ty),*) => {
        $(
            impl AsValue for $source {
                fn as_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

as_value_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: AsValue + ?Sized> AsValue for &T {
    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.as_value(),
            None => Value::None,
        }
    }
}

impl<T: AsValue> AsValue for [T] {
    fn as_value(&self) -> Value<'_> {
        Value::List(self.iter().map(AsValue::as_value).collect())
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_value(&self) -> Value<'_> {
        self.as_slice().as_value()
    }
}

/// Conversion of datetime types into a [`Timestamp`].
///
/// Used by `#[derive(Record)]` for fields marked `#[record(timestamp)]`.
///
/// ```
/// use recordset::{AsTimestamp, Timestamp};
///
/// struct MyDateTime(i64);
///
/// impl AsTimestamp for MyDateTime {
///     fn as_timestamp(&self) -> Timestamp {
///         Timestamp::from_millis(self.0)
///     }
/// }
/// ```
pub trait AsTimestamp {
    /// Converts this value to a [`Timestamp`] for comparison.
    fn as_timestamp(&self) -> Timestamp;

    /// Field value for this timestamp. Absent timestamps read as [`Value::None`].
    fn timestamp_value(&self) -> Value<'static> {
        Value::Timestamp(self.as_timestamp())
    }
}

impl AsTimestamp for Timestamp {
    fn as_timestamp(&self) -> Timestamp {
        *self
    }
}

impl AsTimestamp for i64 {
    fn as_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self)
    }
}

impl AsTimestamp for u64 {
    fn as_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(i64::try_from(*self).unwrap_or(i64::MAX))
    }
}

impl AsTimestamp for SystemTime {
    fn as_timestamp(&self) -> Timestamp {
        match self.duration_since(UNIX_EPOCH) {
            Ok(after) => Timestamp::from_millis(i64::try_from(after.as_millis()).unwrap_or(i64::MAX)),
            Err(before) => Timestamp::from_millis(
                -i64::try_from(before.duration().as_millis()).unwrap_or(i64::MAX),
            ),
        }
    }
}

impl<T: AsTimestamp> AsTimestamp for Option<T> {
    fn as_timestamp(&self) -> Timestamp {
        self.as_ref().map_or(Timestamp(0), AsTimestamp::as_timestamp)
    }

    fn timestamp_value(&self) -> Value<'static> {
        self.as_ref().map_or(Value::None, AsTimestamp::timestamp_value)
    }
}

// ============================================================================
// Dynamic records
// ============================================================================

/// JSON objects are records whose fields are their members.
///
/// Arrays read as lists and `null` as [`Value::None`]. Nested objects and
/// non-object documents expose no fields.
///
/// ```
/// use recordset::{Record, Value};
///
/// let rune = serde_json::json!({"name": "El", "lvl": 5});
/// assert_eq!(rune.field_value("name"), Value::from("El"));
/// assert_eq!(rune.field_value("missing"), Value::None);
/// ```
impl Record for serde_json::Value {
    fn field_value(&self, field: &str) -> Value<'_> {
        match self.get(field) {
            Some(member) if self.is_object() => json_value(member),
            _ => Value::None,
        }
    }
}

fn json_value(json: &serde_json::Value) -> Value<'_> {
    match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::I64(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::U64(u))
            } else {
                n.as_f64().map_or(Value::None, |f| Value::Number(Number::F64(f)))
            }
        }
        serde_json::Value::String(s) => Value::String(Cow::Borrowed(s.as_str())),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_value).collect()),
        serde_json::Value::Object(_) => Value::None,
    }
}
