use std::collections::HashMap;

use serde_json::Value;

use crate::fields::{is_empty_raw, FieldSpec, FieldValue};

/// A per-request instance of a named, ordered set of field specifications.
///
/// Constructed fresh from the raw JSON map of each incoming request,
/// validated once, and discarded with the response; nothing here survives
/// across requests. Field specifications themselves stay immutable — all
/// mutable state (parsed value slots and the error list) lives on this
/// instance, addressed by field name.
#[derive(Debug)]
pub struct RequestSchema {
    fields: Vec<FieldSpec>,
    raw: serde_json::Map<String, Value>,
    values: HashMap<&'static str, FieldValue>,
    errors: Vec<String>,
    cleaned: bool,
}

impl RequestSchema {
    pub fn new(fields: Vec<FieldSpec>, raw: serde_json::Map<String, Value>) -> Self {
        Self {
            fields,
            raw,
            values: HashMap::new(),
            errors: Vec::new(),
            cleaned: false,
        }
    }

    /// Parses every declared field in declaration order, collecting errors.
    ///
    /// Idempotent: the second and later invocations are no-ops, so the error
    /// list and value slots never change once populated.
    pub fn clean(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        for spec in &self.fields {
            match self.raw.get(spec.name) {
                None => {
                    if spec.required {
                        self.errors.push(format!("field {}: is required", spec.name));
                    } else {
                        self.values.insert(spec.name, FieldValue::Absent);
                    }
                }
                Some(raw) if is_empty_raw(raw) => {
                    if spec.nullable {
                        // An empty submitted value on a nullable field is
                        // indistinguishable from an omitted one downstream.
                        self.values.insert(spec.name, FieldValue::Absent);
                    } else {
                        self.errors
                            .push(format!("field {}: must not be empty", spec.name));
                    }
                }
                Some(raw) => match spec.parse_validate(raw) {
                    Ok(value) => {
                        self.values.insert(spec.name, value);
                    }
                    Err(message) => {
                        self.errors.push(format!("field {}: {}", spec.name, message));
                    }
                },
            }
        }
    }

    /// Runs [`clean`](Self::clean) at most once and reports overall validity.
    pub fn is_valid(&mut self) -> bool {
        self.clean();
        self.errors.is_empty()
    }

    /// Appends a cross-field (business rule) error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn errors_as_text(&self) -> String {
        self.errors.join(", ")
    }

    /// The parsed slot for a declared field; `Absent` for fields whose parse
    /// failed or which were never declared.
    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&FieldValue::Absent)
    }

    /// Convenience accessor for string-valued slots.
    pub fn str_value(&self, name: &str) -> Option<String> {
        self.value(name).as_str().map(str::to_string)
    }
}
