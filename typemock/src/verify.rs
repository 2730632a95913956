// vim: tw=80
//! Count-based verification of recorded calls.
use crate::{
    args::Args,
    error::{Error, Result},
    method::canonicalize,
    object::MockObject
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Times {
    AtLeastOnce,
    Exactly(usize),
}

/// Begin verifying `mock`.  By default a member must have been used at least
/// once; see [`Verifier::exactly`].
///
/// # Examples
/// ```
/// # use typemock::*;
/// let desc = ClassDescription::new("Bell")
///     .method(MethodSpec::new("ring")
///             .param(Param::new("times").typed(TypeDescriptor::Int))
///             .returns(TypeDescriptor::None));
/// let mock = tmock(desc, TypeSafety::Strict).unwrap();
/// setup_mock(&mock, |m| {
///     when(m.call("ring", args![anything()])?)?.then_return(());
///     Ok(())
/// }).unwrap();
/// mock.call("ring", args![2]).unwrap();
/// mock.call("ring", args![3]).unwrap();
/// verify(&mock).call("ring", args![2]).unwrap();
/// verify(&mock).exactly(2).call("ring", args![anything()]).unwrap();
/// assert!(verify(&mock).exactly(1).call("ring", args![4]).is_err());
/// ```
pub fn verify(mock: &MockObject) -> Verifier<'_> {
    Verifier{mock, times: Times::AtLeastOnce}
}

#[derive(Debug)]
pub struct Verifier<'a> {
    mock: &'a MockObject,
    times: Times,
}

impl Verifier<'_> {
    /// Require exactly `n` uses, instead of at least one.
    pub fn exactly(mut self, n: usize) -> Self {
        self.times = Times::Exactly(n);
        self
    }

    fn check(&self, what: &str, count: usize) -> Result<()> {
        match self.times {
            Times::AtLeastOnce if count == 0 => Err(Error::Verify(format!(
                "Expected {} at least once. Not called.", what))),
            Times::Exactly(n) if n != count => Err(Error::Verify(format!(
                "Expected {} {} times. Called {} times.", what, n, count))),
            _ => Ok(())
        }
    }

    /// Verify calls of the named method that match `args`.  `args` may
    /// contain matchers.
    pub fn call(&self, name: &str, args: Args) -> Result<()> {
        let state = self.mock.method_state(name)?.borrow();
        let expected = canonicalize(state.spec(), args)?;
        let count = state.history().iter()
            .filter(|c| expected.matches(c))
            .count();
        self.check(&format!("{}{}", name, expected), count)
    }

    /// Verify reads of the named attribute.
    pub fn get(&self, name: &str) -> Result<()> {
        let reads = self.mock.attribute_state(name)?.borrow().reads();
        self.check(&format!("read of {}", name), reads)
    }
}
