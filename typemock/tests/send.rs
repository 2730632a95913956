// vim: tw=80
//! A mock can be moved to another thread, but not shared between threads
#![deny(warnings)]

use static_assertions::{assert_impl_all, assert_not_impl_any};
use std::thread;
use typemock::*;

assert_impl_all!(MockObject: Send);
assert_not_impl_any!(MockObject: Sync);
assert_impl_all!(Value: Send, Sync, Clone);
assert_impl_all!(Matcher: Send, Sync, Clone);
assert_impl_all!(Error: Send, Sync, std::error::Error);

#[test]
fn move_to_thread() {
    let desc = ClassDescription::new("Worker")
        .method(MethodSpec::new("work").returns(TypeDescriptor::Int));
    let mock = tmock(desc, TypeSafety::Strict).unwrap();
    setup_mock(&mock, |m| {
        when(m.call("work", args![])?)?.then_do(|_| Ok(7));
        Ok(())
    }).unwrap();
    let v = thread::spawn(move || {
        mock.call("work", args![]).unwrap().into_value().unwrap()
    }).join().unwrap();
    assert_eq!(v, Value::Int(7));
}
