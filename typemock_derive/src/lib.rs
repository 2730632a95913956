// vim: tw=80
//! Proc macros for use with typemock
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the [`typemock`](../typemock/index.html) crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::Span;

mod mockable;
use crate::mockable::do_mockable;

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &'static str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when typemock is built with the \"nightly\" feature.", msg);
        }
    }
}

/// Generate a mock identifier from the regular one: eg "Foo" => "MockFoo"
fn gen_mock_ident(ident: &syn::Ident) -> syn::Ident {
    syn::Ident::new(&format!("Mock{}", ident), ident.span())
}

/// Derive a typemock description, and a mock struct, from a trait.
///
/// For a trait `Foo`, this generates a struct `MockFoo` that
/// * has constructors `new` and `with_type_safety`, which fail just like
///   `typemock::tmock`,
/// * dereferences to a `typemock::MockObject`, through which its behaviour
///   is defined and its calls inspected,
/// * implements `typemock::Mockable`, describing every method of `Foo`, and
/// * implements `Foo` itself, replaying each call through the mock object.
///
/// Argument types must implement `IntoArg` and `Typed`, and return types
/// `FromValue` and `Typed`.  Static methods, generic methods, generic
/// traits, supertraits, and associated items are not supported.
///
/// # Examples
/// ```ignore
/// #[mockable]
/// trait Foo {
///     fn foo(&self, x: u32) -> i64;
///     async fn bar(&self, name: &str) -> Option<String>;
/// }
/// ```
#[proc_macro_attribute]
pub fn mockable(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: proc_macro2::TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_mockable(attrs.into(), input));
    output.into()
}
