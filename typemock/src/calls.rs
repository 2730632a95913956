// vim: tw=80
//! Read-only access to what a mock has recorded.
use crate::{
    args::{Args, CanonicalCall, Pattern},
    description::MethodSpec,
    error::{Error, Result},
    method::canonicalize,
    object::MockObject,
    value::Value
};

/// Entry point to the calls recorded by `mock`.
///
/// # Examples
/// ```
/// # use typemock::*;
/// let desc = ClassDescription::new("Store")
///     .method(MethodSpec::new("put")
///             .param(Param::new("key").typed(TypeDescriptor::Str))
///             .returns(TypeDescriptor::None));
/// let mock = tmock(desc, TypeSafety::Strict).unwrap();
/// setup_mock(&mock, |m| {
///     when(m.call("put", args![anything()])?)?.then_return(());
///     Ok(())
/// }).unwrap();
/// mock.call("put", args!["a"]).unwrap();
/// let info = calls(&mock).method("put").unwrap();
/// assert_eq!(info.call_count(), 1);
/// info.assert_called_once_with(args!["a"]).unwrap();
/// ```
pub fn calls(mock: &MockObject) -> Calls<'_> {
    Calls(mock)
}

#[derive(Debug)]
pub struct Calls<'a>(&'a MockObject);

impl<'a> Calls<'a> {
    /// Calls recorded for the named method.
    pub fn method(&self, name: &str) -> Result<CallInfo<'a>> {
        let state = self.0.method_state(name)?;
        let spec = self.0.specification().method(name)
            .ok_or_else(|| Error::NoBehaviourSpecified(name.to_string()))?;
        let history = state.borrow().history().to_vec();
        Ok(CallInfo{spec, history})
    }

    /// Reads and writes recorded for the named attribute.
    pub fn attribute(&self, name: &str) -> Result<AttributeInfo> {
        let state = self.0.attribute_state(name)?;
        let state = state.borrow();
        Ok(AttributeInfo {
            name: name.to_string(),
            get_count: state.reads(),
            set_values: state.writes().to_vec()
        })
    }
}

/// A snapshot of one method's call history.
#[derive(Clone, Debug)]
pub struct CallInfo<'a> {
    spec: &'a MethodSpec,
    history: Vec<CanonicalCall>,
}

impl CallInfo<'_> {
    fn name(&self) -> &str {
        self.spec.name()
    }

    fn expected(&self, args: Args) -> Result<Pattern> {
        canonicalize(self.spec, args)
    }

    pub fn call_count(&self) -> usize {
        self.history.len()
    }

    /// The arguments of the most recent call, if any.
    pub fn call_args(&self) -> Option<&CanonicalCall> {
        self.history.last()
    }

    pub fn call_args_list(&self) -> &[CanonicalCall] {
        &self.history
    }

    pub fn assert_called(&self) -> Result<()> {
        if self.history.is_empty() {
            return Err(Error::Verify(format!(
                "Expected '{}' to have been called, but it was not called.",
                self.name())));
        }
        Ok(())
    }

    pub fn assert_called_once(&self) -> Result<()> {
        if self.history.len() != 1 {
            return Err(Error::Verify(format!(
                "Expected '{}' to have been called once. Called {} times.",
                self.name(), self.history.len())));
        }
        Ok(())
    }

    pub fn assert_not_called(&self) -> Result<()> {
        if !self.history.is_empty() {
            return Err(Error::Verify(format!(
                "Expected '{}' to not have been called. Called {} times.",
                self.name(), self.history.len())));
        }
        Ok(())
    }

    /// Check the most recent call.  `args` are bound like those of a real
    /// call, and may contain matchers.
    pub fn assert_called_with(&self, args: Args) -> Result<()> {
        let expected = self.expected(args)?;
        match self.history.last() {
            None => Err(Error::Verify(format!(
                "Expected '{}' to have been called with {}. Not called.",
                self.name(), expected))),
            Some(actual) if !expected.matches(actual) => {
                Err(Error::Verify(format!(
                    "\nExpected call: {}{}\nActual call: {}{}",
                    self.name(), expected, self.name(), actual)))
            },
            Some(_) => Ok(())
        }
    }

    pub fn assert_called_once_with(&self, args: Args) -> Result<()> {
        self.assert_called_once()?;
        self.assert_called_with(args)
    }
}

/// A snapshot of one attribute's reads and writes.
#[derive(Clone, Debug)]
pub struct AttributeInfo {
    name: String,
    get_count: usize,
    set_values: Vec<Value>,
}

impl AttributeInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many reads were answered.
    pub fn get_count(&self) -> usize {
        self.get_count
    }

    /// Every value assigned, oldest first.
    pub fn set_values(&self) -> &[Value] {
        &self.set_values
    }
}
