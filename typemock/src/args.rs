// vim: tw=80
//! Call arguments, and their canonical forms.
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc
};

use crate::{
    error::{Error, Result},
    matcher::Matcher,
    value::{Instance, Value}
};

/// One argument as supplied by the caller, or one entry of a registered
/// pattern.
#[derive(Clone)]
pub enum Arg {
    Value(Value),
    Matcher(Matcher),
    /// The contents of a variadic positional slot
    Tuple(Vec<Arg>),
    /// The contents of a variadic keyword slot
    Map(BTreeMap<String, Arg>),
}

impl Arg {
    /// Matcher-aware comparison against a concrete value.
    pub fn matches(&self, v: &Value) -> bool {
        match (self, v) {
            (Arg::Value(a), v) => a == v,
            (Arg::Matcher(m), v) => m.matches(v),
            (Arg::Tuple(args), Value::Tuple(vs)) =>
                args.len() == vs.len() &&
                    args.iter().zip(vs).all(|(a, v)| a.matches(v)),
            (Arg::Map(args), Value::Map(vs)) =>
                args.len() == vs.len() &&
                    args.iter().all(|(k, a)| {
                        vs.get(k).is_some_and(|v| a.matches(v))
                    }),
            _ => false
        }
    }

    /// Does this argument contain a matcher anywhere?
    pub fn has_matcher(&self) -> bool {
        match self {
            Arg::Value(_) => false,
            Arg::Matcher(_) => true,
            Arg::Tuple(args) => args.iter().any(Arg::has_matcher),
            Arg::Map(args) => args.values().any(Arg::has_matcher),
        }
    }

    /// Convert into a concrete value, or `None` if a matcher is present.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Matcher(_) => None,
            Arg::Tuple(args) => args.into_iter()
                .map(Arg::into_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Tuple),
            Arg::Map(args) => args.into_iter()
                .map(|(k, a)| a.into_value().map(|v| (k, v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Value::Map),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arg::Value(v) => fmt::Debug::fmt(v, f),
            Arg::Matcher(m) => fmt::Debug::fmt(m, f),
            Arg::Tuple(args) => {
                let mut dt = f.debug_tuple("");
                for a in args {
                    dt.field(a);
                }
                dt.finish()
            },
            Arg::Map(args) => f.debug_map().entries(args).finish(),
        }
    }
}

/// Anything that can be passed as an argument to a mocked member.
pub trait IntoArg {
    fn into_arg(self) -> Arg;
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

impl IntoArg for Matcher {
    fn into_arg(self) -> Arg {
        Arg::Matcher(self)
    }
}

macro_rules! into_arg_by_value {
    ($($t:ty),*) => {
        $(
            impl IntoArg for $t {
                fn into_arg(self) -> Arg {
                    Arg::Value(Value::from(self))
                }
            }
        )*
    }
}
into_arg_by_value!{Value, (), bool, i8, i16, i32, i64, i128, isize, u8, u16,
    u32, u64, usize, f32, f64, String, Arc<dyn Instance>}

impl<T: Into<Value>> IntoArg for Vec<T> {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::from(self))
    }
}

impl<T: Into<Value>> IntoArg for Option<T> {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::from(self))
    }
}

impl<K: Into<String>, T: Into<Value>> IntoArg for BTreeMap<K, T> {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::from(self))
    }
}

impl<K: Into<String>, T: Into<Value>> IntoArg for HashMap<K, T> {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::from(self))
    }
}

impl<I: Instance> IntoArg for Arc<I> {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::Object(self))
    }
}

/// References are passed by copying their referent.
impl<T> IntoArg for &T
    where T: ToOwned + ?Sized, T::Owned: IntoArg
{
    fn into_arg(self) -> Arg {
        self.to_owned().into_arg()
    }
}

/// The positional and keyword arguments of one call, in the order supplied.
///
/// Usually built with [`args!`](crate::args).
#[derive(Clone, Debug, Default)]
pub struct Args {
    positional: Vec<Arg>,
    keyword: Vec<(String, Arg)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg<A: IntoArg>(mut self, a: A) -> Self {
        self.positional.push(a.into_arg());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg<S: Into<String>, A: IntoArg>(mut self, name: S, a: A) -> Self
    {
        self.keyword.push((name.into(), a.into_arg()));
        self
    }

    pub fn positional(&self) -> &[Arg] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Arg)] {
        &self.keyword
    }

    pub(crate) fn into_parts(self) -> (Vec<Arg>, Vec<(String, Arg)>) {
        (self.positional, self.keyword)
    }
}

/// Build an [`Args`] from positional arguments followed by keyword
/// arguments.
///
/// # Examples
/// ```
/// # use typemock::*;
/// let a = args![1, "p", number = 2];
/// assert_eq!(a.positional().len(), 2);
/// assert_eq!(a.keyword()[0].0, "number");
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    (@acc $acc:expr;) => { $acc };
    (@acc $acc:expr; $name:ident = $val:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.kwarg(stringify!($name), $val); $($($rest)*)?)
    };
    (@acc $acc:expr; $val:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.arg($val); $($($rest)*)?)
    };
    ($($rest:tt)+) => {
        $crate::args!(@acc $crate::Args::new(); $($rest)+)
    };
}

/// A call as recorded in history: every formal parameter paired with the
/// value it was bound to, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalCall(Vec<(String, Value)>);

impl CanonicalCall {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        CanonicalCall(entries)
    }

    /// The value bound to the named parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.0
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for CanonicalCall {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        CanonicalCall(iter.into_iter()
            .map(|(s, v)| (s.into(), v.into()))
            .collect())
    }
}

impl fmt::Display for CanonicalCall {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (i, (n, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", n, v)?;
        }
        f.write_str(")")
    }
}

/// A canonicalized call that may contain matchers.
#[derive(Clone, Debug, Default)]
pub struct Pattern(Vec<(String, Arg)>);

impl Pattern {
    pub(crate) fn new(entries: Vec<(String, Arg)>) -> Self {
        Pattern(entries)
    }

    pub fn entries(&self) -> &[(String, Arg)] {
        &self.0
    }

    /// Elementwise, matcher-aware equality with a recorded call.
    pub fn matches(&self, call: &CanonicalCall) -> bool {
        self.0.len() == call.0.len() &&
            self.0.iter().zip(call.0.iter())
                .all(|((pn, a), (cn, v))| pn == cn && a.matches(v))
    }

    /// Convert into a concrete call.  Fails if any entry is a matcher.
    pub fn into_call(self, method: &str) -> Result<CanonicalCall> {
        let mut entries = Vec::with_capacity(self.0.len());
        for (name, arg) in self.0 {
            match arg.into_value() {
                Some(v) => entries.push((name, v)),
                None => return Err(Error::Mocking(format!(
                    "{}: matchers may only be used to set up or verify \
                    behaviour, not in a real call (argument `{}`)",
                    method, name)))
            }
        }
        Ok(CanonicalCall(entries))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (i, (n, a)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", n, a)?;
        }
        f.write_str(")")
    }
}
