// vim: tw=80
//! A type-checked mock object library.
//!
//! Typemock creates stand-ins for classes and objects described by a
//! [`ClassDescription`].  Every parameter, return value, and attribute of the
//! description carries a declared type, and the mock enforces those types
//! whenever it is used.
//!
//! # Usage
//!
//! The basic idea is the same however a mock is created.
//! * Describe the target, either by hand with [`ClassDescription`] or by
//!   annotating a trait with [`#[mockable]`](mockable).
//! * Create the mock with [`tmock`].  In [`TypeSafety::Strict`] mode this
//!   fails unless every member of the description has a declared type.
//! * Open the mock for setup with [`setup_mock`] or [`MockObject::setup`].
//!   While it is open, invoking a member only captures the invocation.  Pass
//!   the capture to [`when`] or [`attr`] and choose what it should do.
//! * Close setup and hand the mock to the code under test.  Each call is
//!   checked against the declared types, answered by the most recently
//!   defined matching behaviour, and recorded.
//! * Inspect the recording with [`calls`] or [`verify`].
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Type safety`](#type-safety)
//! * [`Attributes`](#attributes)
//! * [`Async methods`](#async-methods)
//! * [`Checking calls`](#checking-calls)
//! * [`Mocking traits`](#mocking-traits)
//! * [`Logging`](#logging)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//! ```
//! use typemock::*;
//!
//! let desc = ClassDescription::new("Calculator")
//!     .method(MethodSpec::new("double")
//!             .param(Param::new("n").typed(TypeDescriptor::Int))
//!             .returns(TypeDescriptor::Int));
//! let mock = tmock(desc, TypeSafety::Strict).unwrap();
//! setup_mock(&mock, |m| {
//!     when(m.call("double", args![21])?)?.then_return(42);
//!     Ok(())
//! }).unwrap();
//! let v = mock.call("double", args![21]).unwrap().into_value().unwrap();
//! assert_eq!(v, Value::Int(42));
//! ```
//!
//! Calling a member for which no behaviour matches is an
//! [`Error::NoBehaviourSpecified`].
//!
//! ## Return values
//!
//! Each [`ResponseBuilder`] method picks one way to answer:
//! [`then_return`](ResponseBuilder::then_return) always returns the same
//! value, [`then_return_many`](ResponseBuilder::then_return_many) walks
//! through a list, optionally starting over at the end,
//! [`then_raise`](ResponseBuilder::then_raise) fails with a user-supplied
//! error, and [`then_do`](ResponseBuilder::then_do) computes the result from
//! the call's arguments.  Calling more than one of them on the same builder
//! keeps only the last.
//!
//! ```
//! # use typemock::*;
//! # let desc = ClassDescription::new("Calculator")
//! #     .method(MethodSpec::new("double")
//! #             .param(Param::new("n").typed(TypeDescriptor::Int))
//! #             .returns(TypeDescriptor::Int));
//! let mock = tmock(desc, TypeSafety::Strict).unwrap();
//! setup_mock(&mock, |m| {
//!     when(m.call("double", args![anything()])?)?.then_do(|call| {
//!         Ok(call.get("n").and_then(Value::as_int).unwrap_or(0) * 2)
//!     });
//!     Ok(())
//! }).unwrap();
//! let v = mock.call("double", args![4]).unwrap().into_value().unwrap();
//! assert_eq!(v, Value::Int(8));
//! ```
//!
//! ## Matching arguments
//!
//! Arguments are bound to their parameters the way an ordinary call binds
//! them, so `args![1, "x"]`, `args![1, b = "x"]`, and `args![b = "x", a = 1]`
//! are all the same call.  Omitted arguments take their declared defaults.
//! Any argument captured during setup may be a [`Matcher`] instead of a
//! value: [`anything`], [`instance_of`], [`instance_of_deferred`], or any
//! [`Predicate`] wrapped with [`matching`].
//!
//! When several behaviours match the same call, the one defined last wins.
//! So define catch-all behaviours first, and specific ones after.
//!
//! ```
//! # use typemock::*;
//! # let desc = ClassDescription::new("Calculator")
//! #     .method(MethodSpec::new("double")
//! #             .param(Param::new("n").typed(TypeDescriptor::Int))
//! #             .returns(TypeDescriptor::Int));
//! let mock = tmock(desc, TypeSafety::Strict).unwrap();
//! setup_mock(&mock, |m| {
//!     when(m.call("double", args![anything()])?)?.then_return(0);
//!     when(m.call("double", args![matching(predicate::function(
//!         |v: &Value| v.as_int().is_some_and(|n| n > 10)))])?)?
//!         .then_return(100);
//!     Ok(())
//! }).unwrap();
//! assert_eq!(mock.call("double", args![1]).unwrap().into_value().unwrap(),
//!            Value::Int(0));
//! assert_eq!(mock.call("double", args![11]).unwrap().into_value().unwrap(),
//!            Value::Int(100));
//! ```
//!
//! ## Type safety
//!
//! [`TypeSafety`] controls how strictly declared types are enforced.
//! `Strict`, the default, requires a declared type on every parameter,
//! return value, and attribute, and reports every gap at once in
//! [`Error::MissingTypeHints`].  `NoReturnIsNoneReturn` additionally
//! treats a method without a declared return type as returning
//! [`Value::None`].  `Relaxed` requires nothing and checks nothing.
//!
//! Outside of `Relaxed` mode, each argument of a call is checked against
//! its parameter's declared type before any behaviour runs, and each
//! returned value against the method's return type.  A mismatch is an
//! [`Error::TypeSafety`].
//!
//! ## Attributes
//!
//! Attribute reads are set up with [`attr`] and [`MockObject::get_attr`].
//! Assigning with [`MockObject::set_attr`] outside of setup records the
//! value, which then answers subsequent reads.
//!
//! ## Async methods
//!
//! Invoking an asynchronous method returns an [`Invocation::Deferred`] which
//! does nothing until it is awaited.  That includes setup: await the
//! invocation before passing it to [`when`].
//!
//! ```
//! # use typemock::*;
//! let desc = ClassDescription::new("Client")
//!     .method(MethodSpec::new("fetch")
//!             .returns(TypeDescriptor::Str)
//!             .asynchronous());
//! let mock = tmock(desc, TypeSafety::Strict).unwrap();
//! futures::executor::block_on(async {
//!     {
//!         let m = mock.setup()?;
//!         when(m.call("fetch", args![])?.deferred()?.await?)?
//!             .then_return("body");
//!     }
//!     let v = mock.call("fetch", args![])?.deferred()?.await?.into_value()?;
//!     assert_eq!(v, Value::from("body"));
//!     Ok::<(), Error>(())
//! }).unwrap();
//! ```
//!
//! ## Checking calls
//!
//! [`calls`] exposes each method's recorded calls, with assertions in the
//! style of `call_count`, `assert_called_once_with`, and so on.  [`verify`]
//! counts the recorded calls that match an expectation, which may itself
//! contain matchers.  Both report failure with an [`Error::Verify`] that
//! shows what was expected and what actually happened.
//!
//! ## Mocking traits
//!
//! [`#[mockable]`](mockable) derives a description from a trait, along with
//! a `Mock` struct that implements the trait by replaying through a
//! [`MockObject`].  Behaviour is still defined through the untyped API,
//! which the struct exposes by `Deref`.
//!
//! ```
//! # use typemock::*;
//! #[mockable]
//! trait Greeter {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! let mock = MockGreeter::new().unwrap();
//! setup_mock(&mock, |m| {
//!     when(m.call("greet", args!["Ann"])?)?.then_return("Hi, Ann");
//!     Ok(())
//! }).unwrap();
//! assert_eq!(mock.greet("Ann"), "Hi, Ann");
//! calls(&mock).method("greet").unwrap().assert_called_once().unwrap();
//! ```
//!
//! A typed method panics if the engine reports an error, much like an
//! unexpected call panics in other mock libraries.
//!
//! ## Logging
//!
//! Typemock emits [`tracing`](https://docs.rs/tracing) events: `debug` for
//! mock creation, phase changes, and unmatched calls; `trace` for every
//! capture and dispatch.  It never installs a subscriber.
//!
//! ## Crate features
//!
//! * `nightly` - Report problems in `#[mockable]` input with
//!   `proc_macro_diagnostic` instead of a panic.  Requires a nightly
//!   compiler.

mod args;
mod calls;
mod description;
mod error;
mod matcher;
mod method;
mod object;
mod responder;
mod safety;
mod types;
mod value;
mod verify;

pub use crate::{
    args::{Arg, Args, CanonicalCall, IntoArg, Pattern},
    calls::{AttributeInfo, CallInfo, Calls, calls},
    description::{
        AttributeSpec,
        ClassDescription,
        MethodSpec,
        MockSpecification,
        Mockable,
        Param,
        ParamKind,
        Target,
        extract
    },
    error::{Error, MemberKind, MissingHint, Result},
    matcher::{Matcher, anything, instance_of, instance_of_deferred, matching},
    object::{
        DeferredCall,
        Invocation,
        MockObject,
        Phase,
        ResponseBuilder,
        SetupGuard,
        attr,
        setup_mock,
        tmock,
        when
    },
    safety::{TypeSafety, missing_type_hints, validate},
    types::{Class, TypeDescriptor, Typed},
    value::{FromValue, Instance, Value},
    verify::{Verifier, verify}
};
pub use predicates::prelude::{Predicate, predicate};
pub use typemock_derive::mockable;

/// Support code for `#[mockable]`.  Not public API.
#[doc(hidden)]
pub mod __private {
    use super::*;

    fn finish<R: FromValue>(mock: &MockObject, method: &str,
                            result: Result<Value>) -> R
    {
        match result {
            Ok(v) => R::from_value(v).unwrap_or_else(|v| panic!(
                "Mock{}::{}: can't convert {:?} to the declared return type",
                mock.name(), method, v)),
            Err(e) => panic!("Mock{}::{}: {}", mock.name(), method, e)
        }
    }

    pub fn replay<R: FromValue>(mock: &MockObject, method: &str, args: Args)
        -> R
    {
        let result = mock.call(method, args)
            .and_then(Invocation::into_value);
        finish(mock, method, result)
    }

    pub async fn replay_async<R: FromValue>(mock: &MockObject, method: &str,
                                            args: Args) -> R
    {
        let result = match mock.call(method, args)
            .and_then(Invocation::deferred)
        {
            Ok(d) => d.await.and_then(Invocation::into_value),
            Err(e) => Err(e)
        };
        finish(mock, method, result)
    }
}
