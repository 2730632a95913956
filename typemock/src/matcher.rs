// vim: tw=80
//! Wildcard arguments for patterns registered during setup.
use std::{
    fmt,
    sync::{Arc, OnceLock}
};

use predicates::{
    prelude::*,
    reflection::PredicateReflection
};

use crate::{
    types::TypeDescriptor,
    value::Value
};

/// A wildcard that can stand in for a concrete argument while setting up
/// behaviour, or while verifying calls.
///
/// A matcher compares equal to every value satisfying its predicate.  The
/// comparison is one-sided: recorded calls never contain matchers.
#[derive(Clone)]
pub struct Matcher(Arc<dyn Predicate<Value> + Send + Sync>);

impl Matcher {
    pub fn new<P>(p: P) -> Self
        where P: Predicate<Value> + Send + Sync + 'static
    {
        Matcher(Arc::new(p))
    }

    pub fn matches(&self, v: &Value) -> bool {
        self.0.eval(v)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matches every value.
struct Anything;

impl Predicate<Value> for Anything {
    fn eval(&self, _: &Value) -> bool {
        true
    }
}

impl PredicateReflection for Anything {}

impl fmt::Display for Anything {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("anything")
    }
}

type ResolveFn = Box<dyn Fn() -> TypeDescriptor + Send + Sync>;

/// The expected type of an [`InstanceOf`], possibly not resolvable until
/// the first match.
enum TypeRef {
    Resolved(TypeDescriptor),
    Deferred {
        resolve: ResolveFn,
        cached: OnceLock<TypeDescriptor>,
    },
}

impl TypeRef {
    fn resolve(&self) -> &TypeDescriptor {
        match self {
            TypeRef::Resolved(t) => t,
            TypeRef::Deferred{resolve, cached} =>
                cached.get_or_init(|| resolve()),
        }
    }
}

struct InstanceOf(TypeRef);

impl Predicate<Value> for InstanceOf {
    fn eval(&self, v: &Value) -> bool {
        self.0.resolve().accepts(v)
    }
}

impl PredicateReflection for InstanceOf {}

impl fmt::Display for InstanceOf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            TypeRef::Resolved(t) => write!(f, "instance_of({})", t),
            TypeRef::Deferred{cached, ..} => match cached.get() {
                Some(t) => write!(f, "instance_of({})", t),
                None => f.write_str("instance_of(<deferred>)")
            }
        }
    }
}

/// A matcher that matches any value.
///
/// Type safety is still enforced on the concrete value at call time.
///
/// # Examples
/// ```
/// # use typemock::*;
/// assert!(anything().matches(&Value::Int(1)));
/// ```
pub fn anything() -> Matcher {
    Matcher::new(Anything)
}

/// A matcher for any value of the given type, including instances of
/// subclasses.
pub fn instance_of(expected: TypeDescriptor) -> Matcher {
    Matcher::new(InstanceOf(TypeRef::Resolved(expected)))
}

/// Like [`instance_of`], but the type is computed by `expected` the first
/// time the matcher is used, and remembered after that.  Useful for types
/// that refer to themselves.
pub fn instance_of_deferred<F>(expected: F) -> Matcher
    where F: Fn() -> TypeDescriptor + Send + Sync + 'static
{
    Matcher::new(InstanceOf(TypeRef::Deferred {
        resolve: Box::new(expected),
        cached: OnceLock::new()
    }))
}

/// A matcher built from any [`Predicate`], such as those in
/// [`predicate`](crate::predicate).
///
/// # Examples
/// ```
/// # use typemock::*;
/// let m = matching(predicate::function(|v: &Value| v.as_int() > Some(3)));
/// assert!(m.matches(&Value::Int(4)));
/// assert!(!m.matches(&Value::Int(2)));
/// ```
pub fn matching<P>(p: P) -> Matcher
    where P: Predicate<Value> + Send + Sync + 'static
{
    Matcher::new(p)
}
