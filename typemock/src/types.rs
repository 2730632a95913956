// vim: tw=80
//! Declared types, and the runtime check of values against them.
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc
};

use crate::value::{Instance, Value};

struct ClassInner {
    name: String,
    bases: Vec<Class>,
}

/// A nominal user type, with single or multiple inheritance.
///
/// Two classes are the same class if they have the same name.
#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

impl Class {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Class(Arc::new(ClassInner{name: name.into(), bases: Vec::new()}))
    }

    /// Create a class deriving from each of `bases`.
    pub fn with_bases<S, I>(name: S, bases: I) -> Self
        where S: Into<String>, I: IntoIterator<Item = Class>
    {
        let bases = bases.into_iter().collect();
        Class(Arc::new(ClassInner{name: name.into(), bases}))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn bases(&self) -> &[Class] {
        &self.0.bases
    }

    /// Is `self` the same class as `other`, or derived from it?
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self == other || self.0.bases.iter().any(|b| b.is_subclass_of(other))
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<class {}>", self.0.name)
    }
}

/// A declared type, as found in a method signature or attribute
/// declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDescriptor {
    /// Accepts every value.
    Any,
    /// The unit type; only `Value::None` satisfies it.
    None,
    Bool,
    Int,
    Float,
    Str,
    List(Box<TypeDescriptor>),
    Tuple(Vec<TypeDescriptor>),
    /// A string-keyed map with values of the given type.
    Map(Box<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
    Union(Vec<TypeDescriptor>),
    Class(Class),
}

impl TypeDescriptor {
    pub fn list(t: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(t))
    }

    pub fn map(t: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(t))
    }

    pub fn optional(t: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(t))
    }

    /// Does `value` satisfy this type?
    ///
    /// Objects satisfy a class type if their class is the declared class or
    /// one of its subclasses.  An `Int` satisfies `Float`.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDescriptor::Any, _) => true,
            (TypeDescriptor::None, Value::None) => true,
            (TypeDescriptor::Bool, Value::Bool(_)) => true,
            (TypeDescriptor::Int, Value::Int(_)) => true,
            (TypeDescriptor::Float, Value::Float(_) | Value::Int(_)) => true,
            (TypeDescriptor::Str, Value::Str(_)) => true,
            (TypeDescriptor::List(t), Value::List(items)) =>
                items.iter().all(|v| t.accepts(v)),
            (TypeDescriptor::Tuple(ts), Value::Tuple(items)) =>
                ts.len() == items.len() &&
                    ts.iter().zip(items).all(|(t, v)| t.accepts(v)),
            (TypeDescriptor::Map(t), Value::Map(m)) =>
                m.values().all(|v| t.accepts(v)),
            (TypeDescriptor::Optional(_), Value::None) => true,
            (TypeDescriptor::Optional(t), v) => t.accepts(v),
            (TypeDescriptor::Union(ts), v) => ts.iter().any(|t| t.accepts(v)),
            (TypeDescriptor::Class(c), Value::Object(o)) =>
                o.class().is_subclass_of(c),
            _ => false
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn join(f: &mut fmt::Formatter, ts: &[TypeDescriptor]) -> fmt::Result {
            for (i, t) in ts.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", t)?;
            }
            Ok(())
        }
        match self {
            TypeDescriptor::Any => f.write_str("Any"),
            TypeDescriptor::None => f.write_str("None"),
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::Int => f.write_str("int"),
            TypeDescriptor::Float => f.write_str("float"),
            TypeDescriptor::Str => f.write_str("str"),
            TypeDescriptor::List(t) => write!(f, "list[{}]", t),
            TypeDescriptor::Tuple(ts) => {
                f.write_str("tuple[")?;
                join(f, ts)?;
                f.write_str("]")
            },
            TypeDescriptor::Map(t) => write!(f, "dict[str, {}]", t),
            TypeDescriptor::Optional(t) => write!(f, "Optional[{}]", t),
            TypeDescriptor::Union(ts) => {
                f.write_str("Union[")?;
                join(f, ts)?;
                f.write_str("]")
            },
            TypeDescriptor::Class(c) => f.write_str(c.name()),
        }
    }
}

/// Rust types with a known [`TypeDescriptor`].
///
/// `#[mockable]` uses this to describe each parameter and return type of a
/// trait method.  Implement it for your own types to use them in mocked
/// signatures.
pub trait Typed {
    fn type_descriptor() -> TypeDescriptor;
}

macro_rules! typed {
    ($td:expr; $($t:ty),*) => {
        $(
            impl Typed for $t {
                fn type_descriptor() -> TypeDescriptor {
                    $td
                }
            }
        )*
    }
}
typed!{TypeDescriptor::Int; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64,
    usize}
typed!{TypeDescriptor::Float; f32, f64}
typed!{TypeDescriptor::Str; str, String}
typed!{TypeDescriptor::Bool; bool}
typed!{TypeDescriptor::None; ()}
typed!{TypeDescriptor::Any; Value}

impl<T: Typed + ?Sized> Typed for &T {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }
}

impl<T: Typed> Typed for [T] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::type_descriptor())
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::type_descriptor())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::type_descriptor())
    }
}

impl<T: Typed> Typed for BTreeMap<String, T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::type_descriptor())
    }
}

impl<T: Typed> Typed for HashMap<String, T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::type_descriptor())
    }
}

impl<I: Instance + Typed> Typed for Arc<I> {
    fn type_descriptor() -> TypeDescriptor {
        I::type_descriptor()
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[derive(Debug)]
    struct Dog;
    impl Instance for Dog {
        fn class(&self) -> Class {
            Class::with_bases("Dog", [Class::new("Animal")])
        }
    }

    #[test]
    fn subclass_instance_satisfies_base() {
        let animal = TypeDescriptor::Class(Class::new("Animal"));
        assert!(animal.accepts(&Value::object(Dog)));
        let cat = TypeDescriptor::Class(Class::new("Cat"));
        assert!(!cat.accepts(&Value::object(Dog)));
    }

    #[test]
    fn nested_containers() {
        let t = TypeDescriptor::map(TypeDescriptor::list(TypeDescriptor::Int));
        let mut good = BTreeMap::new();
        good.insert("a", vec![1, 2]);
        assert!(t.accepts(&Value::from(good)));
        let mut bad = BTreeMap::new();
        bad.insert("a", vec!["x"]);
        assert!(!t.accepts(&Value::from(bad)));
    }

    #[test]
    fn optional_accepts_none() {
        let t = TypeDescriptor::optional(TypeDescriptor::Str);
        assert!(t.accepts(&Value::None));
        assert!(t.accepts(&Value::from("x")));
        assert!(!t.accepts(&Value::Int(1)));
    }

    #[test]
    fn int_is_acceptable_float() {
        assert!(TypeDescriptor::Float.accepts(&Value::Int(1)));
        assert!(!TypeDescriptor::Int.accepts(&Value::Float(1.0)));
    }

    #[test]
    fn display() {
        let t = TypeDescriptor::Union(vec![
            TypeDescriptor::Int,
            TypeDescriptor::optional(TypeDescriptor::list(TypeDescriptor::Str))
        ]);
        assert_eq!(t.to_string(), "Union[int, Optional[list[str]]]");
    }
}
