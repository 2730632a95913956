// vim: tw=80
//! Counting recorded calls with `verify`
#![deny(warnings)]

use typemock::*;

fn counter() -> MockObject {
    let desc = ClassDescription::new("Counter")
        .attribute(AttributeSpec::new("value").typed(TypeDescriptor::Int))
        .method(MethodSpec::new("add")
                .param(Param::new("n").typed(TypeDescriptor::Int))
                .param(Param::new("label")
                       .typed(TypeDescriptor::Str)
                       .default(""))
                .returns(TypeDescriptor::None));
    let mock = tmock(desc, TypeSafety::Strict).unwrap();
    setup_mock(&mock, |m| {
        when(m.call("add", args![anything(), anything()])?)?.then_return(());
        attr(m.get_attr("value")?)?.then_return(0);
        Ok(())
    }).unwrap();
    mock
}

#[test]
fn at_least_once() {
    let mock = counter();
    mock.call("add", args![1]).unwrap();
    mock.call("add", args![1]).unwrap();
    verify(&mock).call("add", args![1]).unwrap();
    let e = verify(&mock).call("add", args![2]).unwrap_err();
    assert!(matches!(e, Error::Verify(_)));
    assert_eq!(e.to_string(),
               r#"Expected add(n=2, label="") at least once. Not called."#);
}

#[test]
fn exactly() {
    let mock = counter();
    mock.call("add", args![1]).unwrap();
    mock.call("add", args![1, label = "x"]).unwrap();
    verify(&mock).exactly(1).call("add", args![1]).unwrap();
    verify(&mock).exactly(2).call("add", args![1, anything()]).unwrap();
    verify(&mock).exactly(0).call("add", args![5]).unwrap();
    let e = verify(&mock).exactly(3).call("add", args![anything(), anything()])
        .unwrap_err();
    assert!(e.to_string().ends_with("3 times. Called 2 times."));
}

/// Expectations are bound like calls, so keyword forms and defaults count
#[test]
fn canonical() {
    let mock = counter();
    mock.call("add", args![n = 4, label = ""]).unwrap();
    verify(&mock).exactly(1).call("add", args![4]).unwrap();
}

#[test]
fn attribute_reads() {
    let mock = counter();
    let e = verify(&mock).get("value").unwrap_err();
    assert!(matches!(e, Error::Verify(_)));
    mock.get_attr("value").unwrap();
    mock.get_attr("value").unwrap();
    verify(&mock).get("value").unwrap();
    verify(&mock).exactly(2).get("value").unwrap();
    assert!(verify(&mock).exactly(1).get("value").is_err());
}

#[test]
fn unknown_member() {
    let mock = counter();
    assert!(verify(&mock).call("sub", args![1]).is_err());
    assert!(verify(&mock).get("total").is_err());
}
