// vim: tw=80
//! Asynchronous methods, whose invocation is deferred until awaited
#![deny(warnings)]

use futures::executor::block_on;
use typemock::*;

fn client() -> MockObject {
    let desc = ClassDescription::new("Client")
        .method(MethodSpec::new("get_an_async_result")
                .param(Param::new("id").typed(TypeDescriptor::Int))
                .returns(TypeDescriptor::Str)
                .asynchronous())
        .method(MethodSpec::new("close").returns(TypeDescriptor::None));
    tmock(desc, TypeSafety::Strict).unwrap()
}

#[test]
fn await_in_setup() {
    let mock = client();
    block_on(async {
        {
            let m = mock.setup()?;
            when(m.call("get_an_async_result", args![1])?.deferred()?.await?)?
                .then_return("result");
        }
        let inv = mock.call("get_an_async_result", args![1])?;
        let v = inv.deferred()?.await?.into_value()?;
        assert_eq!(v, Value::from("result"));
        Ok::<(), Error>(())
    }).unwrap();
}

/// Resolving explicitly is the same as awaiting
#[test]
fn resolve() {
    let mock = client();
    setup_mock(&mock, |m| {
        let d = m.call("get_an_async_result", args![anything()])?.deferred()?;
        when(d.resolve()?)?.then_return("resolved");
        Ok(())
    }).unwrap();
    let v = mock.call("get_an_async_result", args![7]).unwrap()
        .into_value()
        .unwrap();
    assert_eq!(v, Value::from("resolved"));
}

#[test]
fn not_awaited_in_setup() {
    let mock = client();
    let r = setup_mock(&mock, |m| {
        when(m.call("get_an_async_result", args![1])?).map(|_| ())
    });
    let e = r.unwrap_err();
    assert!(matches!(e, Error::Mocking(_)));
    assert!(e.to_string().contains("must be awaited"));
}

/// Nothing is recorded until the invocation is awaited
#[test]
fn lazy() {
    let mock = client();
    setup_mock(&mock, |m| {
        when(m.call("get_an_async_result", args![1])?.deferred()?
             .resolve()?)?
            .then_return("x");
        Ok(())
    }).unwrap();
    let inv = mock.call("get_an_async_result", args![1]).unwrap();
    calls(&mock).method("get_an_async_result").unwrap()
        .assert_not_called()
        .unwrap();
    let d = inv.deferred().unwrap();
    block_on(d).unwrap();
    calls(&mock).method("get_an_async_result").unwrap()
        .assert_called_once_with(args![1])
        .unwrap();
}

/// Type safety applies once the invocation is awaited
#[test]
fn type_checked() {
    let mock = client();
    let d = mock.call("get_an_async_result", args!["one"]).unwrap()
        .deferred()
        .unwrap();
    assert!(matches!(block_on(d), Err(Error::TypeSafety{..})));
}

#[test]
fn sync_method_is_not_deferred() {
    let mock = client();
    setup_mock(&mock, |m| {
        when(m.call("close", args![])?)?.then_return(());
        Ok(())
    }).unwrap();
    let inv = mock.call("close", args![]).unwrap();
    assert!(matches!(inv, Invocation::Returned(Value::None)));
    assert!(matches!(inv.deferred(), Err(Error::Mocking(_))));
}
