use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

/// Parsed, normalized value held by a request schema slot.
///
/// `Absent` is the explicit sentinel assigned to optional fields that were
/// omitted from the raw payload (or submitted empty on a nullable field);
/// downstream code never has to distinguish "missing key" from "empty value".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Field was not supplied (optional fields only).
    Absent,
    /// Textual value (char, email, phone, normalized gender).
    Str(String),
    /// Structured map (the `arguments` envelope field).
    Map(serde_json::Map<String, Value>),
    /// Calendar date (date and birthday fields).
    Date(NaiveDate),
    /// List of client identifiers.
    Ids(Vec<i64>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[i64]> {
        match self {
            FieldValue::Ids(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Validation rule applied by a field specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any textual value; no implicit coercion from numbers or booleans.
    Char,
    /// A JSON object (the method arguments envelope).
    Arguments,
    /// Char rule plus a mandatory `@` separator.
    ///
    /// Deliberately permissive: a substring check, not an RFC address parse.
    Email,
    /// String or integer rendering to exactly 11 decimal digits, leading `7`.
    Phone,
    /// `DD.MM.YYYY` calendar date.
    Date,
    /// Date rule plus an age-under-70 constraint at validation time.
    Birthday,
    /// Exactly one of the integers 0, 1 or 2; normalized to its string form.
    Gender,
    /// Non-heterogeneous list of integers (floats and booleans rejected).
    ClientIds,
}

/// A typed, stateless, self-validating field specification.
///
/// Specifications carry only their declaration (`required`/`nullable` flags
/// and the type rule); all per-request state lives in the owning
/// [`RequestSchema`](crate::schema::RequestSchema) instance. A specification
/// is constructed once per schema definition and never mutated, so it is
/// trivially reentrant across concurrent requests.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            name,
            kind,
            required,
            nullable,
        }
    }

    /// Parses and validates a raw JSON value against this specification.
    ///
    /// Returns the normalized value, or a message describing the violated
    /// constraint. The owning schema prefixes the message with the field name.
    pub fn parse_validate(&self, raw: &Value) -> Result<FieldValue, String> {
        match self.kind {
            FieldKind::Char => parse_char(raw),
            FieldKind::Arguments => parse_arguments(raw),
            FieldKind::Email => parse_email(raw),
            FieldKind::Phone => parse_phone(raw),
            FieldKind::Date => parse_date(raw),
            FieldKind::Birthday => parse_birthday(raw),
            FieldKind::Gender => parse_gender(raw),
            FieldKind::ClientIds => parse_client_ids(raw),
        }
    }
}

/// Whether a raw JSON value counts as "empty" for the required/nullable check.
///
/// Numbers are never empty: `0` is a meaningful gender value.
pub fn is_empty_raw(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}

fn parse_char(raw: &Value) -> Result<FieldValue, String> {
    match raw {
        Value::String(s) => Ok(FieldValue::Str(s.clone())),
        _ => Err("must be a string".to_string()),
    }
}

fn parse_arguments(raw: &Value) -> Result<FieldValue, String> {
    match raw {
        Value::Object(m) => Ok(FieldValue::Map(m.clone())),
        _ => Err("must be an object".to_string()),
    }
}

fn parse_email(raw: &Value) -> Result<FieldValue, String> {
    match raw {
        Value::String(s) if s.contains('@') => Ok(FieldValue::Str(s.clone())),
        Value::String(_) => Err("must contain '@'".to_string()),
        _ => Err("must be a string".to_string()),
    }
}

fn parse_phone(raw: &Value) -> Result<FieldValue, String> {
    let digits = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => return Err("must be a string or an integer".to_string()),
    };
    if digits.len() == 11 && digits.starts_with('7') && digits.chars().all(|c| c.is_ascii_digit())
    {
        Ok(FieldValue::Str(digits))
    } else {
        Err("must be 11 digits starting with 7".to_string())
    }
}

fn parse_date(raw: &Value) -> Result<FieldValue, String> {
    let text = match raw {
        Value::String(s) => s,
        _ => return Err("must be a string in DD.MM.YYYY format".to_string()),
    };
    let parsed = NaiveDate::parse_from_str(text, "%d.%m.%Y")
        .map_err(|_| "must be a valid date in DD.MM.YYYY format".to_string())?;
    // chrono accepts single-digit days and months; re-rendering pins the
    // two-digit-day, two-digit-month, four-digit-year shape.
    if parsed.format("%d.%m.%Y").to_string() != *text {
        return Err("must be a valid date in DD.MM.YYYY format".to_string());
    }
    Ok(FieldValue::Date(parsed))
}

fn parse_birthday(raw: &Value) -> Result<FieldValue, String> {
    match parse_date(raw)? {
        // Strict pass condition: year + 70 must exceed the current year, so
        // an exact age of 70 is rejected.
        FieldValue::Date(date) if date.year() + 70 <= Utc::now().year() => {
            Err("age must be less than 70".to_string())
        }
        value => Ok(value),
    }
}

fn parse_gender(raw: &Value) -> Result<FieldValue, String> {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(g @ 0..=2) => Ok(FieldValue::Str(g.to_string())),
            _ => Err("must be 0, 1 or 2".to_string()),
        },
        _ => Err("must be 0, 1 or 2".to_string()),
    }
}

fn parse_client_ids(raw: &Value) -> Result<FieldValue, String> {
    let items = match raw {
        Value::Array(items) => items,
        _ => return Err("must be a list of integers".to_string()),
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        // `as_i64` alone would admit booleans rendered elsewhere; serde_json
        // keeps booleans out of Number, so the match covers both exclusions.
        match item {
            Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_i64() {
                Some(id) => ids.push(id),
                None => return Err("must be a list of integers".to_string()),
            },
            _ => return Err("must be a list of integers".to_string()),
        }
    }
    Ok(FieldValue::Ids(ids))
}
