// vim: tw=80
//! Describing a mock target, and turning that description into a
//! [`MockSpecification`].
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc
};

use crate::{
    error::{Error, Result},
    types::TypeDescriptor,
    value::Value
};

/// How a parameter binds arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// May be supplied by position or by keyword.
    PositionalOrKeyword,
    /// May only be supplied by keyword.
    KeywordOnly,
    /// Collects surplus positional arguments into a tuple.
    VarPositional,
    /// Collects surplus keyword arguments into a map.
    VarKeyword,
}

/// One formal parameter of a method.  The receiver is never described.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
    declared: Option<TypeDescriptor>,
}

impl Param {
    fn with_kind<S: Into<String>>(name: S, kind: ParamKind) -> Self {
        Param{name: name.into(), kind, default: None, declared: None}
    }

    /// A positional-or-keyword parameter.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Param::with_kind(name, ParamKind::PositionalOrKeyword)
    }

    pub fn keyword_only<S: Into<String>>(name: S) -> Self {
        Param::with_kind(name, ParamKind::KeywordOnly)
    }

    /// A `*args`-style parameter.  Its declared type applies to each
    /// element.
    pub fn var_positional<S: Into<String>>(name: S) -> Self {
        Param::with_kind(name, ParamKind::VarPositional)
    }

    /// A `**kwargs`-style parameter.  Its declared type applies to each
    /// value.
    pub fn var_keyword<S: Into<String>>(name: S) -> Self {
        Param::with_kind(name, ParamKind::VarKeyword)
    }

    pub fn typed(mut self, t: TypeDescriptor) -> Self {
        self.declared = Some(t);
        self
    }

    pub fn default<V: Into<Value>>(mut self, v: V) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn declared(&self) -> Option<&TypeDescriptor> {
        self.declared.as_ref()
    }

    fn is_variadic(&self) -> bool {
        matches!(self.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
    }
}

/// The signature of one method.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSpec {
    name: String,
    params: Vec<Param>,
    returns: Option<TypeDescriptor>,
    asynchronous: bool,
}

impl MethodSpec {
    pub fn new<S: Into<String>>(name: S) -> Self {
        MethodSpec {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            asynchronous: false
        }
    }

    pub fn param(mut self, p: Param) -> Self {
        self.params.push(p);
        self
    }

    pub fn returns(mut self, t: TypeDescriptor) -> Self {
        self.returns = Some(t);
        self
    }

    /// Mark the method as `async`.  Calls return a deferred invocation that
    /// must be awaited.
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.returns.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.asynchronous
    }

    fn check(&self, class: &str) -> Result<()> {
        let err = |msg: String| Err(Error::TypeIntrospection(
            format!("{}.{}: {}", class, self.name, msg)));
        let mut names = HashSet::new();
        let mut seen_default = false;
        let mut seen_var_positional = false;
        let mut seen_keyword_only = false;
        let mut seen_var_keyword = false;
        for p in self.params.iter() {
            if !names.insert(p.name.as_str()) {
                return err(format!("duplicate parameter `{}`", p.name));
            }
            if seen_var_keyword {
                return err(format!("parameter `{}` follows the variadic \
                    keyword parameter", p.name));
            }
            if p.is_variadic() && p.default.is_some() {
                return err(format!("variadic parameter `{}` can't have a \
                    default", p.name));
            }
            match p.kind {
                ParamKind::PositionalOrKeyword => {
                    if seen_keyword_only {
                        return err(format!("positional parameter `{}` \
                            follows a keyword-only parameter", p.name));
                    }
                    if seen_var_positional {
                        return err(format!("positional parameter `{}` \
                            follows the variadic positional parameter",
                            p.name));
                    }
                    if p.default.is_some() {
                        seen_default = true;
                    } else if seen_default {
                        return err(format!("non-default parameter `{}` \
                            follows a default parameter", p.name));
                    }
                },
                ParamKind::KeywordOnly => seen_keyword_only = true,
                ParamKind::VarPositional => {
                    if seen_var_positional {
                        return err("more than one variadic positional \
                            parameter".to_string());
                    }
                    if seen_keyword_only {
                        return err(format!("variadic positional parameter \
                            `{}` follows a keyword-only parameter", p.name));
                    }
                    seen_var_positional = true;
                },
                ParamKind::VarKeyword => seen_var_keyword = true,
            }
        }
        Ok(())
    }
}

/// A declared attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSpec {
    name: String,
    declared: Option<TypeDescriptor>,
}

impl AttributeSpec {
    pub fn new<S: Into<String>>(name: S) -> Self {
        AttributeSpec{name: name.into(), declared: None}
    }

    pub fn typed(mut self, t: TypeDescriptor) -> Self {
        self.declared = Some(t);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> Option<&TypeDescriptor> {
        self.declared.as_ref()
    }
}

/// The host-supplied description of a class: what reflection would tell us
/// about it.  It may be written by hand, or generated by
/// [`#[mockable]`](crate::mockable).
///
/// # Examples
/// ```
/// # use typemock::*;
/// let desc = ClassDescription::new("MyThing")
///     .method(MethodSpec::new("convert_int_to_str")
///         .param(Param::new("number").typed(TypeDescriptor::Int))
///         .returns(TypeDescriptor::Str))
///     .attribute(AttributeSpec::new("name").typed(TypeDescriptor::Str));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDescription {
    name: String,
    methods: Vec<MethodSpec>,
    attributes: Vec<AttributeSpec>,
}

impl ClassDescription {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ClassDescription {
            name: name.into(),
            methods: Vec::new(),
            attributes: Vec::new()
        }
    }

    pub fn method(mut self, m: MethodSpec) -> Self {
        self.methods.push(m);
        self
    }

    pub fn attribute(mut self, a: AttributeSpec) -> Self {
        self.attributes.push(a);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Something a caller asks to mock.
#[derive(Clone, Debug)]
pub enum Target {
    /// A class.
    Class(ClassDescription),
    /// An instance of a class.  Attributes that exist on the instance but
    /// aren't declared by the class are mocked too, without a declared type.
    Instance(ClassDescription, BTreeMap<String, Value>),
    /// A free function, by name.  Functions can't be mocked.
    Function(String),
}

impl From<ClassDescription> for Target {
    fn from(d: ClassDescription) -> Self {
        Target::Class(d)
    }
}

/// Types that know the description of the class they stand in for.
///
/// Implemented by the mock structs that [`#[mockable]`](crate::mockable)
/// generates.
pub trait Mockable {
    fn description() -> ClassDescription;
}

/// The immutable, validated shape of a mocked class.
#[derive(Clone, Debug)]
pub struct MockSpecification {
    name: String,
    methods: Vec<Arc<MethodSpec>>,
    attributes: Vec<Arc<AttributeSpec>>,
}

impl MockSpecification {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSpec> {
        self.methods.iter().map(|m| &**m)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().map(|a| &**a)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods().find(|m| m.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes().find(|a| a.name == name)
    }

    pub(crate) fn method_specs(&self) -> &[Arc<MethodSpec>] {
        &self.methods
    }

    pub(crate) fn attribute_specs(&self) -> &[Arc<AttributeSpec>] {
        &self.attributes
    }
}

/// Build the [`MockSpecification`] of a target.
///
/// Fails with [`Error::TypeIntrospection`] if the target is a function, or
/// if its description is malformed.
pub fn extract(target: Target) -> Result<MockSpecification> {
    let (desc, instance_attrs) = match target {
        Target::Class(desc) => (desc, BTreeMap::new()),
        Target::Instance(desc, attrs) => (desc, attrs),
        Target::Function(name) => {
            return Err(Error::TypeIntrospection(format!(
                "`{}` is a function, not a class or object", name)));
        }
    };
    let ClassDescription{name, methods, mut attributes} = desc;

    let mut members = HashSet::new();
    for member in methods.iter().map(MethodSpec::name)
        .chain(attributes.iter().map(AttributeSpec::name))
    {
        if !members.insert(member.to_string()) {
            return Err(Error::TypeIntrospection(format!(
                "{}: duplicate member `{}`", name, member)));
        }
    }
    for m in methods.iter() {
        m.check(&name)?;
    }
    for attr in instance_attrs.into_keys() {
        if !members.contains(&attr) {
            attributes.push(AttributeSpec::new(attr));
        }
    }

    Ok(MockSpecification {
        name,
        methods: methods.into_iter().map(Arc::new).collect(),
        attributes: attributes.into_iter().map(Arc::new).collect()
    })
}
