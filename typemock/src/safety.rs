// vim: tw=80
//! Type-safety checks, both at construction and at call time.
use crate::{
    description::{MockSpecification, ParamKind},
    error::{Error, MemberKind, MissingHint, Result},
    types::TypeDescriptor,
    value::Value
};

/// How strictly a mock enforces declared types.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TypeSafety {
    /// Every parameter, return type, and attribute must have a declared
    /// type, and every call is checked against them.
    #[default]
    Strict,
    /// Like `Strict`, but a method without a declared return type is taken
    /// to return `None`.
    NoReturnIsNoneReturn,
    /// No declared types are required, and nothing is checked.
    Relaxed,
}

/// Collect every member of `spec` that lacks a declared type.
///
/// Attributes come first, then each method's parameters and return type, in
/// declaration order.
pub fn missing_type_hints(spec: &MockSpecification, mode: TypeSafety)
    -> Vec<MissingHint>
{
    let mut missing = Vec::new();
    for attr in spec.attributes() {
        if attr.declared().is_none() {
            missing.push(MissingHint::new([attr.name()],
                                          MemberKind::Attribute));
        }
    }
    for method in spec.methods() {
        for param in method.params() {
            if param.declared().is_none() {
                missing.push(MissingHint::new([method.name(), param.name()],
                                              MemberKind::Arg));
            }
        }
        if mode != TypeSafety::NoReturnIsNoneReturn &&
            method.return_type().is_none()
        {
            missing.push(MissingHint::new([method.name()], MemberKind::Return));
        }
    }
    missing
}

/// Gate mock construction on complete type declarations.
///
/// Does nothing in `Relaxed` mode.  Otherwise every gap is reported in one
/// [`Error::MissingTypeHints`].
pub fn validate(spec: &MockSpecification, mode: TypeSafety) -> Result<()> {
    if mode == TypeSafety::Relaxed {
        return Ok(());
    }
    let hints = missing_type_hints(spec, mode);
    if hints.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingTypeHints{target: spec.name().to_string(), hints})
    }
}

/// Check one concrete value against a declared type.
///
/// `member` and `slot` only serve to build the error message.
pub(crate) fn check_value(
    mode: TypeSafety,
    member: &str,
    slot: &str,
    declared: Option<&TypeDescriptor>,
    value: &Value) -> Result<()>
{
    if mode == TypeSafety::Relaxed {
        return Ok(());
    }
    match declared {
        Some(t) if !t.accepts(value) => Err(Error::TypeSafety {
            method: member.to_string(),
            parameter: slot.to_string(),
            expected: t.to_string(),
            actual: format!("{:?} ({})", value, value.type_name()),
        }),
        _ => Ok(())
    }
}

/// Check a bound argument against its parameter.  For variadic parameters
/// the declared type applies to each element.
pub(crate) fn check_argument(
    mode: TypeSafety,
    method: &str,
    kind: ParamKind,
    name: &str,
    declared: Option<&TypeDescriptor>,
    value: &Value) -> Result<()>
{
    match (kind, value) {
        (ParamKind::VarPositional, Value::Tuple(items)) => {
            for item in items {
                check_value(mode, method, name, declared, item)?;
            }
            Ok(())
        },
        (ParamKind::VarKeyword, Value::Map(items)) => {
            for (k, item) in items {
                check_value(mode, method, &format!("{}[{:?}]", name, k),
                            declared, item)?;
            }
            Ok(())
        },
        _ => check_value(mode, method, name, declared, value)
    }
}

/// The return type a method is checked against: an absent declaration means
/// `None` in `NoReturnIsNoneReturn` mode, and "unchecked" otherwise.
pub(crate) fn effective_return_type(
    mode: TypeSafety,
    declared: Option<&TypeDescriptor>) -> Option<TypeDescriptor>
{
    match (declared, mode) {
        (Some(t), _) => Some(t.clone()),
        (None, TypeSafety::NoReturnIsNoneReturn) => Some(TypeDescriptor::None),
        (None, _) => None
    }
}
