use crate::Value;

/// Normalizes the statement arguments in place before they reach the driver.
///
/// String arguments are already reduced to plain [`Value::Varchar`] by
/// [`AsValue`](crate::AsValue); an empty string is replaced by [`Value::Null`].
/// Everything else is left as it is.
pub fn fix_args(args: &mut [Value]) {
    for arg in args.iter_mut() {
        if matches!(arg, Value::Varchar(Some(v)) if v.is_empty()) {
            *arg = Value::Null;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fix_args;
    use crate::{Value, args};
    use std::{borrow::Cow, sync::Arc};

    #[test]
    fn empty_strings_become_null() {
        let mut args = args![
            "",
            String::new(),
            Cow::<str>::Borrowed(""),
            Box::<str>::from(""),
            Arc::<str>::from(""),
        ];
        fix_args(&mut args);
        assert!(args.iter().all(|v| *v == Value::Null));
    }

    #[test]
    fn non_empty_strings_are_kept() {
        let mut args = args!["bob", String::from("alice"), Arc::<str>::from("x"), 'c'];
        fix_args(&mut args);
        assert_eq!(
            args,
            [
                Value::Varchar(Some("bob".into())),
                Value::Varchar(Some("alice".into())),
                Value::Varchar(Some("x".into())),
                Value::Varchar(Some("c".into())),
            ]
        );
    }

    #[test]
    fn other_kinds_pass_through() {
        let mut args = args![0, false, None::<String>, vec![0u8; 0], 1.5f64];
        let expected = args.clone();
        fix_args(&mut args);
        assert_eq!(args, expected);
        assert_eq!(args[2], Value::Varchar(None));
        assert_eq!(args[3], Value::Blob(Some([].into())));
    }
}
