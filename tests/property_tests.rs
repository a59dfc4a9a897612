/// Property-based tests using proptest
/// Covers invariants of the field rules and the schema engine for all inputs.
use chrono::{Datelike, Utc};
use proptest::prelude::*;
use serde_json::json;

use rust_scoring_api::fields::{FieldKind, FieldSpec};
use rust_scoring_api::schema::RequestSchema;

fn phone_spec() -> FieldSpec {
    FieldSpec::new("phone", FieldKind::Phone, false, true)
}

fn birthday_spec() -> FieldSpec {
    FieldSpec::new("birthday", FieldKind::Birthday, false, true)
}

proptest! {
    #[test]
    fn phone_accepts_exactly_eleven_digits_leading_seven(rest in "[0-9]{10}") {
        let phone = format!("7{rest}");
        prop_assert!(phone_spec().parse_validate(&json!(phone)).is_ok());
    }

    #[test]
    fn phone_rejects_other_leading_digits(lead in 0u32..=9, rest in "[0-9]{10}") {
        prop_assume!(lead != 7);
        let phone = format!("{lead}{rest}");
        prop_assert!(phone_spec().parse_validate(&json!(phone)).is_err());
    }

    #[test]
    fn phone_rejects_other_lengths(digits in "[0-9]{1,20}") {
        let phone = format!("7{digits}");
        prop_assume!(phone.len() != 11);
        prop_assert!(phone_spec().parse_validate(&json!(phone)).is_err());
    }

    #[test]
    fn phone_validation_never_panics(raw in "\\PC*") {
        let _ = phone_spec().parse_validate(&json!(raw));
    }

    #[test]
    fn birthday_boundary_is_strict(age in 0i32..=120) {
        let year = Utc::now().year() - age;
        let raw = json!(format!("15.06.{year:04}"));
        let result = birthday_spec().parse_validate(&raw);
        if age < 70 {
            prop_assert!(result.is_ok(), "age {} should pass", age);
        } else {
            prop_assert!(result.is_err(), "age {} should be rejected", age);
        }
    }

    #[test]
    fn date_validation_never_panics(raw in "\\PC*") {
        let _ = FieldSpec::new("date", FieldKind::Date, false, true)
            .parse_validate(&json!(raw));
    }

    #[test]
    fn clean_is_idempotent_for_arbitrary_bodies(
        login in prop::option::of("[a-z0-9]{0,8}"),
        token in prop::option::of("[a-f0-9]{0,16}"),
        method in prop::option::of("[a-z_]{0,12}"),
    ) {
        let mut raw = serde_json::Map::new();
        if let Some(login) = login {
            raw.insert("login".to_string(), json!(login));
        }
        if let Some(token) = token {
            raw.insert("token".to_string(), json!(token));
        }
        if let Some(method) = method {
            raw.insert("method".to_string(), json!(method));
        }

        let fields = vec![
            FieldSpec::new("login", FieldKind::Char, true, true),
            FieldSpec::new("token", FieldKind::Char, true, true),
            FieldSpec::new("method", FieldKind::Char, true, false),
        ];

        let mut schema = RequestSchema::new(fields, raw);
        schema.clean();
        let first_errors = schema.errors().to_vec();
        let first_login = schema.value("login").clone();

        schema.clean();
        prop_assert_eq!(schema.errors(), first_errors.as_slice());
        prop_assert_eq!(schema.value("login"), &first_login);
    }
}
