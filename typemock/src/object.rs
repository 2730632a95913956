// vim: tw=80
//! The mock object itself, and the setup protocol.
use std::{
    cell::{Cell, RefCell},
    fmt,
    future::Future,
    ops::Deref,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll}
};

use tracing::{debug, trace};

use crate::{
    args::{Args, CanonicalCall, Pattern},
    description::{extract, MockSpecification, Target},
    error::{Error, Result},
    method::{MockAttributeState, MockMethodState},
    responder::Responder,
    safety::{self, TypeSafety},
    value::Value
};

const CONTEXT_CLOSED: &str = "Did not receive a response builder.  Are you \
    trying to specify behaviour outside of setup?";

const NOT_AWAITED: &str = "Did not receive a response builder.  Asynchronous \
    methods must be awaited when defining behaviour, for example \
    `when(mock.call(\"fetch\", args![])?.deferred()?.await?)`";

/// Whether invoking a member records behaviour or plays it back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Setup,
    Replay,
}

/// A substitute for an object of some described class.
///
/// In the [`Setup`](Phase::Setup) phase, invoking a member captures a
/// pattern to which behaviour can be attached with [`when`] or [`attr`].  In
/// the [`Replay`](Phase::Replay) phase, invoking a member checks its
/// arguments, runs the matching behaviour, and records the call.
///
/// A `MockObject` is `Send`, but not `Sync`.
pub struct MockObject {
    spec: Arc<MockSpecification>,
    type_safety: TypeSafety,
    phase: Cell<Phase>,
    methods: Vec<RefCell<MockMethodState>>,
    attributes: Vec<RefCell<MockAttributeState>>,
}

impl MockObject {
    /// Build a mock from an already-extracted specification.
    ///
    /// Fails with [`Error::MissingTypeHints`] if `type_safety` demands
    /// declarations that `spec` lacks.
    pub fn from_specification(spec: MockSpecification,
                              type_safety: TypeSafety) -> Result<Self>
    {
        safety::validate(&spec, type_safety)?;
        let methods = spec.method_specs().iter()
            .map(|m| RefCell::new(MockMethodState::new(m.clone())))
            .collect();
        let attributes = spec.attribute_specs().iter()
            .map(|a| RefCell::new(MockAttributeState::new(a.clone())))
            .collect();
        debug!(mock = spec.name(), ?type_safety, "created mock");
        Ok(MockObject {
            spec: Arc::new(spec),
            type_safety,
            phase: Cell::new(Phase::Replay),
            methods,
            attributes
        })
    }

    /// The name of the mocked class.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn specification(&self) -> &MockSpecification {
        &self.spec
    }

    pub fn type_safety(&self) -> TypeSafety {
        self.type_safety
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Open the mock for setup.
    ///
    /// Fails if it already is.
    pub fn enter_setup(&self) -> Result<()> {
        if self.phase.get() == Phase::Setup {
            return Err(Error::Mocking(format!(
                "{} is already open for setup", self.name())));
        }
        debug!(mock = self.name(), "entering setup");
        self.phase.set(Phase::Setup);
        Ok(())
    }

    /// Close setup and return to replay.  Closing twice is harmless.
    pub fn exit_setup(&self) {
        if self.phase.replace(Phase::Replay) == Phase::Setup {
            debug!(mock = self.name(), "leaving setup");
        }
    }

    /// Open the mock for setup until the returned guard is dropped.
    ///
    /// # Examples
    /// ```
    /// # use typemock::*;
    /// let desc = ClassDescription::new("Greeter")
    ///     .method(MethodSpec::new("greet")
    ///             .param(Param::new("name").typed(TypeDescriptor::Str))
    ///             .returns(TypeDescriptor::Str));
    /// let mock = tmock(desc, TypeSafety::Strict).unwrap();
    /// {
    ///     let m = mock.setup().unwrap();
    ///     when(m.call("greet", args!["bob"]).unwrap()).unwrap()
    ///         .then_return("hello bob");
    /// }
    /// let r = mock.call("greet", args!["bob"]).unwrap().into_value();
    /// assert_eq!(r.unwrap(), Value::from("hello bob"));
    /// ```
    pub fn setup(&self) -> Result<SetupGuard<'_>> {
        self.enter_setup()?;
        Ok(SetupGuard(self))
    }

    fn method_index(&self, name: &str) -> Result<usize> {
        self.spec.method_specs().iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| Error::NoBehaviourSpecified(format!(
                "{} has no method named {}", self.name(), name)))
    }

    fn attribute_index(&self, name: &str) -> Result<usize> {
        self.spec.attribute_specs().iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| Error::NoBehaviourSpecified(format!(
                "{} has no attribute named {}", self.name(), name)))
    }

    /// Invoke a method.
    ///
    /// Asynchronous methods do nothing until the returned
    /// [`Invocation::Deferred`] is awaited or resolved.
    pub fn call(&self, name: &str, args: Args) -> Result<Invocation<'_>> {
        let index = self.method_index(name)?;
        if self.spec.method_specs()[index].is_async() {
            Ok(Invocation::Deferred(DeferredCall {
                mock: self,
                index,
                args: Some(args)
            }))
        } else {
            self.invoke(index, args)
        }
    }

    fn invoke(&self, index: usize, args: Args) -> Result<Invocation<'_>> {
        let spec = &self.spec.method_specs()[index];
        let state = &self.methods[index];
        let pattern = state.borrow().canonicalize(args)?;
        match self.phase.get() {
            Phase::Setup => {
                trace!(method = spec.name(), %pattern, "captured call");
                Ok(Invocation::Capture(ResponseBuilder::method(self, index,
                                                               pattern)))
            },
            Phase::Replay => {
                let call = pattern.into_call(spec.name())?;
                self.check_arguments(index, &call)?;
                let returns = safety::effective_return_type(
                    self.type_safety, spec.return_type());
                let value = MockMethodState::dispatch(state, call, |v| {
                    safety::check_value(self.type_safety, spec.name(),
                                        "return", returns.as_ref(), v)
                })?;
                Ok(Invocation::Returned(value))
            }
        }
    }

    fn check_arguments(&self, index: usize, call: &CanonicalCall)
        -> Result<()>
    {
        let spec = &self.spec.method_specs()[index];
        for (param, (_, value)) in spec.params().iter().zip(call.entries()) {
            safety::check_argument(self.type_safety, spec.name(),
                                   param.kind(), param.name(),
                                   param.declared(), value)?;
        }
        Ok(())
    }

    /// Read an attribute.
    pub fn get_attr(&self, name: &str) -> Result<Invocation<'_>> {
        let index = self.attribute_index(name)?;
        let state = &self.attributes[index];
        match self.phase.get() {
            Phase::Setup => {
                trace!(attribute = name, "captured read");
                let builder = ResponseBuilder::attribute(self, index);
                Ok(Invocation::Capture(builder))
            },
            Phase::Replay => {
                let declared = self.spec.attribute_specs()[index].declared();
                let value = MockAttributeState::read(state, |v| {
                    safety::check_value(self.type_safety, name, "value",
                                        declared, v)
                })?;
                Ok(Invocation::Returned(value))
            }
        }
    }

    /// Write an attribute.  The value answers subsequent reads.
    ///
    /// Attributes can't be written during setup; use [`attr`] instead.
    pub fn set_attr<V: Into<Value>>(&self, name: &str, value: V) -> Result<()>
    {
        let index = self.attribute_index(name)?;
        if self.phase.get() == Phase::Setup {
            return Err(Error::Mocking(format!(
                "{}.{}: attributes can't be assigned during setup; use \
                attr() to define their behaviour", self.name(), name)));
        }
        let value = value.into();
        let declared = self.spec.attribute_specs()[index].declared();
        safety::check_value(self.type_safety, name, "value", declared,
                            &value)?;
        trace!(attribute = name, ?value, "assigned");
        self.attributes[index].borrow_mut().write(value);
        Ok(())
    }

    pub(crate) fn method_state(&self, name: &str)
        -> Result<&RefCell<MockMethodState>>
    {
        self.method_index(name).map(|i| &self.methods[i])
    }

    pub(crate) fn attribute_state(&self, name: &str)
        -> Result<&RefCell<MockAttributeState>>
    {
        self.attribute_index(name).map(|i| &self.attributes[i])
    }
}

impl fmt::Debug for MockObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MockObject")
            .field("name", &self.name())
            .field("type_safety", &self.type_safety)
            .field("phase", &self.phase.get())
            .finish()
    }
}

/// Keeps a [`MockObject`] open for setup.  Dropping it, even while
/// unwinding, returns the mock to replay.
#[derive(Debug)]
pub struct SetupGuard<'a>(&'a MockObject);

impl Deref for SetupGuard<'_> {
    type Target = MockObject;

    fn deref(&self) -> &MockObject {
        self.0
    }
}

impl Drop for SetupGuard<'_> {
    fn drop(&mut self) {
        self.0.exit_setup();
    }
}

/// The outcome of invoking a mocked member.
#[derive(Debug)]
pub enum Invocation<'a> {
    /// A value produced during replay
    Returned(Value),
    /// A pattern captured during setup, awaiting its behaviour
    Capture(ResponseBuilder<'a>),
    /// A not yet performed invocation of an asynchronous method
    Deferred(DeferredCall<'a>),
}

impl<'a> Invocation<'a> {
    /// The value produced during replay.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Invocation::Returned(v) => Ok(v),
            Invocation::Capture(_) => Err(Error::Mocking(
                "the mock is open for setup; close it before using it"
                .to_string())),
            Invocation::Deferred(d) => d.resolve()?.into_value()
        }
    }

    /// The pending invocation of an asynchronous method.
    pub fn deferred(self) -> Result<DeferredCall<'a>> {
        match self {
            Invocation::Deferred(d) => Ok(d),
            _ => Err(Error::Mocking(
                "only asynchronous methods can be awaited".to_string()))
        }
    }
}

/// An invocation of an asynchronous method.
///
/// Nothing is captured or dispatched until it is awaited, or resolved with
/// [`DeferredCall::resolve`].  Awaiting never suspends.
pub struct DeferredCall<'a> {
    mock: &'a MockObject,
    index: usize,
    args: Option<Args>,
}

impl<'a> DeferredCall<'a> {
    /// Perform the invocation now.
    pub fn resolve(mut self) -> Result<Invocation<'a>> {
        self.take()
    }

    fn take(&mut self) -> Result<Invocation<'a>> {
        match self.args.take() {
            Some(args) => self.mock.invoke(self.index, args),
            None => Err(Error::Mocking("DeferredCall polled after completion"
                                       .to_string()))
        }
    }
}

impl<'a> Future for DeferredCall<'a> {
    type Output = Result<Invocation<'a>>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>)
        -> Poll<Self::Output>
    {
        Poll::Ready(self.take())
    }
}

impl fmt::Debug for DeferredCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let spec = &self.mock.spec.method_specs()[self.index];
        f.debug_struct("DeferredCall")
            .field("method", &spec.name())
            .field("args", &self.args)
            .finish()
    }
}

enum Slot {
    Method(usize, Pattern),
    Attribute(usize),
}

/// Attaches behaviour to a captured invocation.
///
/// Each `then_*` method replaces whatever an earlier one on the same builder
/// chose.
///
/// # Panics
///
/// The `then_*` methods panic if the mock has left setup since the
/// invocation was captured.
pub struct ResponseBuilder<'a> {
    mock: &'a MockObject,
    slot: Slot,
    registered: Option<usize>,
}

impl<'a> ResponseBuilder<'a> {
    fn method(mock: &'a MockObject, index: usize, pattern: Pattern) -> Self {
        ResponseBuilder {
            mock,
            slot: Slot::Method(index, pattern),
            registered: None
        }
    }

    fn attribute(mock: &'a MockObject, index: usize) -> Self {
        ResponseBuilder{mock, slot: Slot::Attribute(index), registered: None}
    }

    fn member(&self) -> &str {
        match &self.slot {
            Slot::Method(i, _) => self.mock.spec.method_specs()[*i].name(),
            Slot::Attribute(i) => self.mock.spec.attribute_specs()[*i].name(),
        }
    }

    fn install(&mut self, responder: Responder) -> &mut Self {
        if self.mock.phase() != Phase::Setup {
            panic!("{}.{}: behaviour can only be defined during setup",
                   self.mock.name(), self.member());
        }
        match (&self.slot, self.registered) {
            (Slot::Method(m, _), Some(i)) =>
                self.mock.methods[*m].borrow_mut().set_responder(i, responder),
            (Slot::Method(m, pattern), None) => {
                let i = self.mock.methods[*m].borrow_mut()
                    .register_binding(pattern.clone(), responder);
                self.registered = Some(i);
            },
            (Slot::Attribute(a), Some(i)) =>
                self.mock.attributes[*a].borrow_mut()
                    .set_responder(i, responder),
            (Slot::Attribute(a), None) => {
                let i = self.mock.attributes[*a].borrow_mut()
                    .register_responder(responder);
                self.registered = Some(i);
            }
        }
        self
    }

    /// Always return `value`.
    pub fn then_return<V: Into<Value>>(&mut self, value: V) -> &mut Self {
        self.install(Responder::Basic(value.into()))
    }

    /// Return each of `values` in turn.  Once they run out, start over if
    /// `looping`, or fail otherwise.
    pub fn then_return_many<I, V>(&mut self, values: I, looping: bool)
        -> &mut Self
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        let values = values.into_iter().map(Into::into).collect();
        self.install(Responder::many(values, looping))
    }

    /// Always fail with `error`, as [`Error::Raised`].
    pub fn then_raise<E>(&mut self, error: E) -> &mut Self
        where E: std::error::Error + Send + Sync + 'static
    {
        self.install(Responder::Raise(Arc::new(error)))
    }

    /// Compute the result from the call's arguments.
    pub fn then_do<F, R>(&mut self, mut f: F) -> &mut Self
        where F: FnMut(&CanonicalCall) -> Result<R> + Send + 'static,
              R: Into<Value>
    {
        self.install(Responder::do_fn(move |call| f(call).map(Into::into)))
    }

    /// Like [`then_do`](Self::then_do), but for closures that aren't `Send`.
    /// The mock must then be used only on the thread that created the
    /// closure.
    pub fn then_do_st<F, R>(&mut self, mut f: F) -> &mut Self
        where F: FnMut(&CanonicalCall) -> Result<R> + 'static,
              R: Into<Value>
    {
        self.install(Responder::do_fn_st(move |call| f(call).map(Into::into)))
    }
}

impl fmt::Debug for ResponseBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.slot {
            Slot::Method(_, pattern) => write!(f, "ResponseBuilder({}{})",
                self.member(), pattern),
            Slot::Attribute(_) => write!(f, "ResponseBuilder({})",
                self.member())
        }
    }
}

fn builder<'a>(invocation: Invocation<'a>, what: &str)
    -> Result<ResponseBuilder<'a>>
{
    match invocation {
        Invocation::Capture(b) => Ok(b),
        Invocation::Deferred(_) => Err(Error::Mocking(NOT_AWAITED.to_string())),
        Invocation::Returned(v) => Err(Error::Mocking(format!(
            "{} {} returned {:?}", CONTEXT_CLOSED, what, v)))
    }
}

/// Start defining the behaviour of a method call captured during setup.
///
/// # Examples
/// ```
/// # use typemock::*;
/// let desc = ClassDescription::new("Counter")
///     .method(MethodSpec::new("next").returns(TypeDescriptor::Int));
/// let mock = tmock(desc, TypeSafety::Strict).unwrap();
/// setup_mock(&mock, |m| {
///     when(m.call("next", args![])?)?.then_return_many([1, 2], true);
///     Ok(())
/// }).unwrap();
/// for expected in [1, 2, 1] {
///     let v = mock.call("next", args![]).unwrap().into_value().unwrap();
///     assert_eq!(v, Value::Int(expected));
/// }
/// ```
pub fn when(invocation: Invocation<'_>) -> Result<ResponseBuilder<'_>> {
    builder(invocation, "The call")
}

/// Start defining the behaviour of an attribute read captured during setup.
pub fn attr(invocation: Invocation<'_>) -> Result<ResponseBuilder<'_>> {
    builder(invocation, "The attribute")
}

/// Create a mock of a class or object.
///
/// Fails with [`Error::Mocking`] for a bare function, and with
/// [`Error::MissingTypeHints`] if `type_safety` demands declarations the
/// target lacks.
pub fn tmock<T: Into<Target>>(target: T, type_safety: TypeSafety)
    -> Result<MockObject>
{
    let target = target.into();
    if let Target::Function(name) = &target {
        return Err(Error::Mocking(format!(
            "Cannot mock function {}.  Only objects and classes are supported",
            name)));
    }
    MockObject::from_specification(extract(target)?, type_safety)
}

/// Run `f` with `mock` open for setup.  The mock returns to replay however
/// `f` exits.
pub fn setup_mock<F, R>(mock: &MockObject, f: F) -> Result<R>
    where F: FnOnce(&MockObject) -> Result<R>
{
    let guard = mock.setup()?;
    f(&guard)
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{
        args,
        description::{AttributeSpec, ClassDescription, MethodSpec, Param},
        matcher::anything,
        types::TypeDescriptor
    };

    fn desc() -> ClassDescription {
        ClassDescription::new("Thing")
            .method(MethodSpec::new("f")
                    .param(Param::new("n").typed(TypeDescriptor::Int))
                    .returns(TypeDescriptor::Str))
            .method(MethodSpec::new("fetch")
                    .returns(TypeDescriptor::Int)
                    .asynchronous())
            .attribute(AttributeSpec::new("size").typed(TypeDescriptor::Int))
    }

    #[test]
    fn enter_twice() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        mock.enter_setup().unwrap();
        assert!(matches!(mock.enter_setup(), Err(Error::Mocking(_))));
        mock.exit_setup();
        mock.exit_setup();
        assert_eq!(mock.phase(), Phase::Replay);
    }

    #[test]
    fn guard_reverts_on_unwind() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = mock.setup().unwrap();
            panic!("oops");
        }));
        assert!(r.is_err());
        assert_eq!(mock.phase(), Phase::Replay);
    }

    #[test]
    fn last_then_wins() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        setup_mock(&mock, |m| {
            when(m.call("f", args![anything()])?)?
                .then_return("first")
                .then_return("second");
            Ok(())
        }).unwrap();
        let v = mock.call("f", args![1]).unwrap().into_value().unwrap();
        assert_eq!(v, Value::from("second"));
        assert_eq!(mock.method_state("f").unwrap().borrow().history().len(),
                   1);
    }

    #[test]
    fn return_value_is_checked() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        setup_mock(&mock, |m| {
            when(m.call("f", args![1])?)?.then_return(5);
            Ok(())
        }).unwrap();
        let r = mock.call("f", args![1]);
        assert!(matches!(r, Err(Error::TypeSafety{..})));
        assert!(mock.method_state("f").unwrap().borrow().history().is_empty());
    }

    #[test]
    #[should_panic(expected = "Thing.f: behaviour can only be defined during setup")]
    fn builder_outliving_setup() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        mock.enter_setup().unwrap();
        let mut b = when(mock.call("f", args![1]).unwrap()).unwrap();
        mock.exit_setup();
        b.then_return("late");
    }

    /// A builder that was already used can't change its behaviour after
    /// setup either
    #[test]
    fn registered_builder_outliving_setup() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        mock.enter_setup().unwrap();
        let mut b = when(mock.call("f", args![1]).unwrap()).unwrap();
        b.then_return("early");
        mock.exit_setup();
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            b.then_return("late");
        }));
        assert!(r.is_err());
        let v = mock.call("f", args![1]).unwrap().into_value().unwrap();
        assert_eq!(v, Value::from("early"));
        let e = mock.call("f", args![2]).unwrap_err();
        assert!(matches!(e, Error::NoBehaviourSpecified(_)));
    }

    #[test]
    fn attribute_builder_outliving_setup() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        mock.enter_setup().unwrap();
        let mut b = attr(mock.get_attr("size").unwrap()).unwrap();
        mock.exit_setup();
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            b.then_return(3);
        }));
        assert!(r.is_err());
        assert!(matches!(mock.get_attr("size"),
                         Err(Error::NoBehaviourSpecified(_))));
    }

    #[test]
    fn deferred_does_nothing_until_resolved() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        let d = mock.call("fetch", args![]).unwrap();
        assert!(matches!(d, Invocation::Deferred(_)));
        assert!(mock.method_state("fetch").unwrap().borrow().history()
                .is_empty());
    }

    #[test]
    fn when_rejects_unresolved_deferred() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        let _g = mock.setup().unwrap();
        let e = when(mock.call("fetch", args![]).unwrap()).unwrap_err();
        assert!(e.to_string().contains("must be awaited"));
    }

    #[test]
    fn attribute_cannot_be_set_during_setup() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        let _g = mock.setup().unwrap();
        assert!(matches!(mock.set_attr("size", 3), Err(Error::Mocking(_))));
    }

    #[test]
    fn unknown_member() {
        let mock = tmock(desc(), TypeSafety::Strict).unwrap();
        assert!(matches!(mock.call("g", args![]),
                         Err(Error::NoBehaviourSpecified(_))));
        assert!(matches!(mock.get_attr("g"),
                         Err(Error::NoBehaviourSpecified(_))));
    }

    #[test]
    fn function_target() {
        let r = tmock(Target::Function("helper".to_string()),
                      TypeSafety::Strict);
        assert!(matches!(r, Err(Error::Mocking(_))));
    }
}
