// vim: tw=80
//! Inspecting and asserting on recorded calls
#![deny(warnings)]

use typemock::*;

fn logger() -> MockObject {
    let desc = ClassDescription::new("Logger")
        .method(MethodSpec::new("log")
                .param(Param::new("level").typed(TypeDescriptor::Int))
                .param(Param::new("msg").typed(TypeDescriptor::Str))
                .returns(TypeDescriptor::None))
        .method(MethodSpec::new("flush").returns(TypeDescriptor::None));
    let mock = tmock(desc, TypeSafety::Strict).unwrap();
    setup_mock(&mock, |m| {
        when(m.call("log", args![anything(), anything()])?)?.then_return(());
        when(m.call("flush", args![])?)?.then_return(());
        Ok(())
    }).unwrap();
    mock
}

#[test]
fn never_called() {
    let mock = logger();
    let info = calls(&mock).method("log").unwrap();
    assert_eq!(info.call_count(), 0);
    assert!(info.call_args().is_none());
    assert!(info.call_args_list().is_empty());
    info.assert_not_called().unwrap();
    let e = info.assert_called().unwrap_err();
    assert_eq!(e.to_string(),
               "Expected 'log' to have been called, but it was not called.");
    let e = info.assert_called_with(args![1, "a"]).unwrap_err();
    assert!(matches!(e, Error::Verify(_)));
    assert!(e.to_string().ends_with("Not called."));
}

#[test]
fn call_args() {
    let mock = logger();
    mock.call("log", args![1, "first"]).unwrap();
    mock.call("log", args![msg = "second", level = 2]).unwrap();
    let info = calls(&mock).method("log").unwrap();
    assert_eq!(info.call_count(), 2);
    let expected: CanonicalCall = [("level", Value::Int(2)),
                                   ("msg", Value::from("second"))]
        .into_iter()
        .collect();
    assert_eq!(info.call_args(), Some(&expected));
    assert_eq!(info.call_args_list()[0].get("msg"),
               Some(&Value::from("first")));
}

mod assert_called_once {
    use super::*;

    #[test]
    fn ok() {
        let mock = logger();
        mock.call("flush", args![]).unwrap();
        calls(&mock).method("flush").unwrap().assert_called_once().unwrap();
    }

    #[test]
    fn twice() {
        let mock = logger();
        mock.call("flush", args![]).unwrap();
        mock.call("flush", args![]).unwrap();
        let e = calls(&mock).method("flush").unwrap()
            .assert_called_once()
            .unwrap_err();
        assert_eq!(e.to_string(),
                   "Expected 'flush' to have been called once. Called 2 times.");
    }
}

mod assert_called_with {
    use super::*;

    #[test]
    fn last_call_only() {
        let mock = logger();
        mock.call("log", args![1, "a"]).unwrap();
        mock.call("log", args![2, "b"]).unwrap();
        let info = calls(&mock).method("log").unwrap();
        info.assert_called_with(args![2, "b"]).unwrap();
        info.assert_called_with(args![level = 2, msg = "b"]).unwrap();
        assert!(info.assert_called_with(args![1, "a"]).is_err());
    }

    #[test]
    fn matchers() {
        let mock = logger();
        mock.call("log", args![3, "c"]).unwrap();
        calls(&mock).method("log").unwrap()
            .assert_called_with(args![anything(), "c"])
            .unwrap();
    }

    #[test]
    fn message() {
        let mock = logger();
        mock.call("log", args![1, "a"]).unwrap();
        let e = calls(&mock).method("log").unwrap()
            .assert_called_with(args![1, "b"])
            .unwrap_err();
        assert_eq!(e.to_string(), "\nExpected call: log(level=1, msg=\"b\")\
                                   \nActual call: log(level=1, msg=\"a\")");
    }

    #[test]
    fn bad_arguments() {
        let mock = logger();
        mock.call("log", args![1, "a"]).unwrap();
        let r = calls(&mock).method("log").unwrap()
            .assert_called_with(args![1]);
        assert!(matches!(r, Err(Error::ArgumentBinding(_))));
    }
}

mod assert_called_once_with {
    use super::*;

    #[test]
    fn ok() {
        let mock = logger();
        mock.call("log", args![1, "a"]).unwrap();
        calls(&mock).method("log").unwrap()
            .assert_called_once_with(args![1, "a"])
            .unwrap();
    }

    #[test]
    fn called_twice() {
        let mock = logger();
        mock.call("log", args![1, "a"]).unwrap();
        mock.call("log", args![1, "a"]).unwrap();
        let r = calls(&mock).method("log").unwrap()
            .assert_called_once_with(args![1, "a"]);
        assert!(matches!(r, Err(Error::Verify(_))));
    }
}

/// A snapshot doesn't see later calls
#[test]
fn snapshot() {
    let mock = logger();
    let info = calls(&mock).method("flush").unwrap();
    mock.call("flush", args![]).unwrap();
    assert_eq!(info.call_count(), 0);
    assert_eq!(calls(&mock).method("flush").unwrap().call_count(), 1);
}

#[test]
fn unknown_method() {
    let mock = logger();
    assert!(calls(&mock).method("rotate").is_err());
}
