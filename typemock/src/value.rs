// vim: tw=80
//! The dynamic values that flow through a mock.
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc
};

use downcast::{Any, downcast};

use crate::types::Class;

/// A user-defined object that can be passed to, or returned from, a mock.
///
/// The engine only needs to know the object's [`Class`], so that
/// [`TypeDescriptor::Class`](crate::TypeDescriptor::Class) and
/// [`instance_of`](crate::instance_of) can perform subclass checks.  The
/// concrete type can be recovered with [`Value::downcast_ref`].
pub trait Instance: Any + fmt::Debug + Send + Sync {
    fn class(&self) -> Class;
}
downcast!(dyn Instance);

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    /// Wide enough for every Rust integer up to 64 bits, signed or not
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn Instance>),
}

impl Value {
    /// Wrap a user object.
    pub fn object<I: Instance>(i: I) -> Self {
        Value::Object(Arc::new(i))
    }

    /// A short name of this value's runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Map(_) => "dict".to_string(),
            Value::Object(o) => o.class().name().to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    /// Borrow the concrete type of an `Object` value.
    pub fn downcast_ref<T: Instance>(&self) -> Option<&T> {
        match self {
            Value::Object(o) => o.downcast_ref::<T>().ok(),
            _ => None
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(l) => f.debug_list().entries(l).finish(),
            Value::Tuple(t) => {
                let mut dt = f.debug_tuple("");
                for v in t {
                    dt.field(v);
                }
                dt.finish()
            },
            Value::Map(m) => f.debug_map().entries(m).finish(),
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) |
            (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) =>
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            _ => false
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i128::from(i))
                }
            }
        )*
    }
}
value_from_int!{i8, i16, i32, i64, i128, u8, u16, u32, u64}

// Pointer-sized integers are at most 64 bits wide, so these never truncate.
impl From<isize> for Value {
    fn from(i: isize) -> Self {
        Value::Int(i as i128)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i128)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Value::None)
    }
}

impl<K: Into<String>, T: Into<Value>> From<BTreeMap<K, T>> for Value {
    fn from(m: BTreeMap<K, T>) -> Self {
        Value::Map(m.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, T: Into<Value>> From<HashMap<K, T>> for Value {
    fn from(m: HashMap<K, T>) -> Self {
        Value::Map(m.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<I: Instance> From<Arc<I>> for Value {
    fn from(i: Arc<I>) -> Self {
        Value::Object(i)
    }
}

impl From<Arc<dyn Instance>> for Value {
    fn from(i: Arc<dyn Instance>) -> Self {
        Value::Object(i)
    }
}

/// Conversion from a [`Value`] produced by a mock back into a Rust type.
///
/// On mismatch the original value is handed back so it can be reported.
pub trait FromValue: Sized {
    fn from_value(v: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    fn from_value(v: Value) -> Result<Self, Value> {
        Ok(v)
    }
}

impl FromValue for () {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::None => Ok(()),
            v => Err(v)
        }
    }
}

impl FromValue for bool {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Bool(b) => Ok(b),
            v => Err(v)
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(v: Value) -> Result<Self, Value> {
                    match v {
                        Value::Int(i) => <$t>::try_from(i)
                            .map_err(|_| Value::Int(i)),
                        v => Err(v)
                    }
                }
            }
        )*
    }
}
int_from_value!{i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize}

impl FromValue for f64 {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            v => Err(v)
        }
    }
}

impl FromValue for f32 {
    fn from_value(v: Value) -> Result<Self, Value> {
        f64::from_value(v).map(|x| x as f32)
    }
}

impl FromValue for String {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Str(s) => Ok(s),
            v => Err(v)
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::None => Ok(None),
            v => T::from_value(v).map(Some)
        }
    }
}

/// Convert every element, or return the whole original sequence.
fn collect_seq<T: FromValue>(items: Vec<Value>, rewrap: fn(Vec<Value>) -> Value)
    -> Result<Vec<T>, Value>
{
    if items.iter().any(|x| T::from_value(x.clone()).is_err()) {
        return Err(rewrap(items));
    }
    items.into_iter()
        .map(T::from_value)
        .collect()
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::List(l) => collect_seq(l, Value::List),
            Value::Tuple(t) => collect_seq(t, Value::Tuple),
            v => Err(v)
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Map(m) => {
                if m.values().any(|x| T::from_value(x.clone()).is_err()) {
                    return Err(Value::Map(m));
                }
                m.into_iter()
                    .map(|(k, x)| T::from_value(x).map(|t| (k, t)))
                    .collect()
            },
            v => Err(v)
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(v: Value) -> Result<Self, Value> {
        BTreeMap::<String, T>::from_value(v)
            .map(|m| m.into_iter().collect())
    }
}

impl FromValue for Arc<dyn Instance> {
    fn from_value(v: Value) -> Result<Self, Value> {
        match v {
            Value::Object(o) => Ok(o),
            v => Err(v)
        }
    }
}
