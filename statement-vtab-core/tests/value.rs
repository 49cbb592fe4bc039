#[cfg(test)]
mod tests {
    use statement_vtab_core::{AsValue, Value};

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Null, Value::Int64(None));
        assert_ne!(Value::Float64(Some(1.0)), Value::Null);
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
    }

    #[test]
    fn value_integers() {
        let val: Value = 127i8.into();
        assert_eq!(val, Value::Int64(Some(127)));
        assert_eq!(i8::try_from_value(val).unwrap(), 127);
        assert!(i8::try_from_value(Value::Int64(Some(128))).is_err());
        assert!(u32::try_from_value(Value::Int64(Some(-1))).is_err());
        assert_eq!(i64::try_from_value(Value::Int64(Some(i64::MIN))).unwrap(), i64::MIN);
        assert!(i32::try_from_value(Value::Varchar(Some("1".into()))).is_err());
        assert_eq!(bool::try_from_value(0i64.as_value()).unwrap(), false);
        assert_eq!(bool::try_from_value(5i64.as_value()).unwrap(), true);
    }

    #[test]
    fn value_text_and_blob() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert_eq!(String::try_from_value(12i64.as_value()).unwrap(), "12");
        let val: Value = b"\x01\xff".as_slice().into();
        assert_eq!(*Box::<[u8]>::try_from_value(val.clone()).unwrap(), [1u8, 255]);
    }

    #[test]
    fn value_option() {
        assert_eq!(None::<i64>.as_value(), Value::Int64(None));
        assert_eq!(Some(2.5f64).as_value(), Value::Float64(Some(2.5)));
        assert_eq!(Option::<String>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<f64>::try_from_value(Value::Int64(Some(3))).unwrap(),
            Some(3.0)
        );
    }
}
