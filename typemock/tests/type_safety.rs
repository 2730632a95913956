// vim: tw=80
//! Enforcement of declared types, at construction and at call time
#![deny(warnings)]

use typemock::*;

/// A class with one undeclared member of each kind
fn partly_typed() -> ClassDescription {
    ClassDescription::new("PartlyTyped")
        .attribute(AttributeSpec::new("untyped_attr"))
        .attribute(AttributeSpec::new("typed_attr").typed(TypeDescriptor::Int))
        .method(MethodSpec::new("untyped_arg")
                .param(Param::new("a"))
                .returns(TypeDescriptor::Int))
        .method(MethodSpec::new("untyped_return")
                .param(Param::new("a").typed(TypeDescriptor::Int)))
}

fn fully_typed() -> ClassDescription {
    ClassDescription::new("FullyTyped")
        .attribute(AttributeSpec::new("size").typed(TypeDescriptor::Int))
        .method(MethodSpec::new("count")
                .param(Param::new("items")
                       .typed(TypeDescriptor::list(TypeDescriptor::Str)))
                .returns(TypeDescriptor::Int))
        .method(MethodSpec::new("ratio")
                .param(Param::new("x").typed(TypeDescriptor::Float))
                .returns(TypeDescriptor::optional(TypeDescriptor::Float)))
}

mod construction {
    use super::*;

    #[test]
    fn strict_reports_every_gap() {
        let e = tmock(partly_typed(), TypeSafety::Strict).unwrap_err();
        assert!(matches!(e, Error::MissingTypeHints{..}));
        assert_eq!(e.missing_hints(), &[
            MissingHint::new(["untyped_attr"], MemberKind::Attribute),
            MissingHint::new(["untyped_arg", "a"], MemberKind::Arg),
            MissingHint::new(["untyped_return"], MemberKind::Return),
        ]);
    }

    #[test]
    fn no_return_is_none_return() {
        let e = tmock(partly_typed(), TypeSafety::NoReturnIsNoneReturn)
            .unwrap_err();
        assert_eq!(e.missing_hints().len(), 2);
        assert!(e.missing_hints().iter()
                .all(|h| h.member_kind != MemberKind::Return));
    }

    #[test]
    fn relaxed() {
        tmock(partly_typed(), TypeSafety::Relaxed).unwrap();
    }

    #[test]
    fn fully_typed_is_fine() {
        tmock(fully_typed(), TypeSafety::Strict).unwrap();
    }

    #[test]
    fn default_is_strict() {
        assert_eq!(TypeSafety::default(), TypeSafety::Strict);
    }

    #[test]
    fn missing_type_hints_without_mocking() {
        let spec = extract(partly_typed().into()).unwrap();
        assert_eq!(missing_type_hints(&spec, TypeSafety::Strict).len(), 3);
        assert!(validate(&spec, TypeSafety::Relaxed).is_ok());
    }

    /// Members of an instance that its class doesn't declare have no type
    #[test]
    fn undeclared_instance_attribute() {
        let target = Target::Instance(fully_typed(),
            [("extra".to_string(), Value::Int(1))].into_iter().collect());
        let e = tmock(target, TypeSafety::Strict).unwrap_err();
        assert_eq!(e.missing_hints(),
                   &[MissingHint::new(["extra"], MemberKind::Attribute)]);
    }
}

mod call_time {
    use super::*;

    fn mock(mode: TypeSafety) -> MockObject {
        let mock = tmock(fully_typed(), mode).unwrap();
        setup_mock(&mock, |m| {
            when(m.call("count", args![anything()])?)?.then_return(1);
            when(m.call("ratio", args![anything()])?)?.then_return(0.5);
            Ok(())
        }).unwrap();
        mock
    }

    #[test]
    fn bad_argument() {
        let m = mock(TypeSafety::Strict);
        let e = m.call("count", args![vec![1, 2]]).unwrap_err();
        assert!(matches!(e, Error::TypeSafety{..}));
        assert_eq!(e.to_string(),
                   "count: `items` expects list[str], got [1, 2] (list)");
    }

    /// Calls that fail type checks aren't recorded
    #[test]
    fn bad_argument_not_recorded() {
        let m = mock(TypeSafety::Strict);
        m.call("count", args![1]).unwrap_err();
        calls(&m).method("count").unwrap().assert_not_called().unwrap();
    }

    #[test]
    fn good_argument() {
        let m = mock(TypeSafety::Strict);
        let v = m.call("count", args![vec!["a", "b"]]).unwrap()
            .into_value().unwrap();
        assert_eq!(v, Value::Int(1));
    }

    #[test]
    fn int_is_acceptable_as_float() {
        let m = mock(TypeSafety::Strict);
        let v = m.call("ratio", args![2]).unwrap().into_value().unwrap();
        assert_eq!(v, Value::Float(0.5));
    }

    #[test]
    fn relaxed_checks_nothing() {
        let m = mock(TypeSafety::Relaxed);
        let v = m.call("count", args!["not a list"]).unwrap()
            .into_value().unwrap();
        assert_eq!(v, Value::Int(1));
    }

    #[test]
    fn bad_return() {
        let m = tmock(fully_typed(), TypeSafety::Strict).unwrap();
        setup_mock(&m, |m| {
            when(m.call("count", args![anything()])?)?.then_return("many");
            Ok(())
        }).unwrap();
        let e = m.call("count", args![Vec::<String>::new()]).unwrap_err();
        assert!(matches!(e, Error::TypeSafety{..}));
        calls(&m).method("count").unwrap().assert_not_called().unwrap();
    }

    #[test]
    fn optional_return() {
        let m = tmock(fully_typed(), TypeSafety::Strict).unwrap();
        setup_mock(&m, |m| {
            when(m.call("ratio", args![anything()])?)?.then_return(());
            Ok(())
        }).unwrap();
        let v = m.call("ratio", args![1.0]).unwrap().into_value().unwrap();
        assert!(v.is_none());
    }

    /// In this mode, a method without a declared return type must return
    /// None
    #[test]
    fn implied_none_return() {
        let desc = ClassDescription::new("Sink")
            .method(MethodSpec::new("put")
                    .param(Param::new("x").typed(TypeDescriptor::Int)));
        let m = tmock(desc, TypeSafety::NoReturnIsNoneReturn).unwrap();
        setup_mock(&m, |m| {
            when(m.call("put", args![1])?)?.then_return(());
            when(m.call("put", args![2])?)?.then_return(2);
            Ok(())
        }).unwrap();
        assert!(m.call("put", args![1]).is_ok());
        assert!(matches!(m.call("put", args![2]), Err(Error::TypeSafety{..})));
    }
}
