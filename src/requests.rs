use chrono::NaiveDate;
use serde_json::Value;

use crate::auth::ADMIN_LOGIN;
use crate::fields::{FieldKind, FieldSpec};
use crate::schema::RequestSchema;

/// Declaration list for the method envelope schema.
///
/// Schemas are registered as plain ordered lists of specifications; the list
/// is rebuilt per request, which keeps the specs themselves stateless.
fn method_request_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("account", FieldKind::Char, false, true),
        FieldSpec::new("login", FieldKind::Char, true, true),
        FieldSpec::new("token", FieldKind::Char, true, true),
        FieldSpec::new("arguments", FieldKind::Arguments, true, true),
        FieldSpec::new("method", FieldKind::Char, true, false),
    ]
}

fn online_score_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("first_name", FieldKind::Char, false, true),
        FieldSpec::new("last_name", FieldKind::Char, false, true),
        FieldSpec::new("email", FieldKind::Email, false, true),
        FieldSpec::new("phone", FieldKind::Phone, false, true),
        FieldSpec::new("birthday", FieldKind::Birthday, false, true),
        FieldSpec::new("gender", FieldKind::Gender, false, true),
    ]
}

fn clients_interests_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("client_ids", FieldKind::ClientIds, true, false),
        FieldSpec::new("date", FieldKind::Date, false, true),
    ]
}

/// The outer request envelope: account/login/token/method/arguments.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    pub account: Option<String>,
    pub login: String,
    pub token: String,
    pub method: String,
    pub arguments: serde_json::Map<String, Value>,
}

impl MethodRequest {
    /// Validates the raw request body against the envelope schema.
    ///
    /// Returns the joined error text on failure; the dispatcher maps it to an
    /// invalid-request response.
    pub fn parse(body: &Value) -> Result<Self, String> {
        let raw = body
            .as_object()
            .cloned()
            .ok_or_else(|| "request body must be a JSON object".to_string())?;

        let mut schema = RequestSchema::new(method_request_fields(), raw);
        if !schema.is_valid() {
            return Err(schema.errors_as_text());
        }

        Ok(Self {
            account: schema.str_value("account"),
            // Required-but-nullable fields resolve to the absent sentinel
            // when submitted empty; treat that as the empty string.
            login: schema.str_value("login").unwrap_or_default(),
            token: schema.str_value("token").unwrap_or_default(),
            method: schema.str_value("method").unwrap_or_default(),
            arguments: schema
                .value("arguments")
                .as_map()
                .cloned()
                .unwrap_or_default(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.login == ADMIN_LOGIN
    }
}

/// Validated arguments of the `online_score` method.
#[derive(Debug, Clone)]
pub struct OnlineScoreArgs {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Normalized to its string rendering ("0", "1" or "2").
    pub gender: Option<String>,
}

impl OnlineScoreArgs {
    /// Validates the argument map, including the cross-field pair rule.
    ///
    /// The pair rule runs only after every individual field parsed cleanly;
    /// a field-level failure short-circuits before the cross-field check.
    pub fn parse(arguments: &serde_json::Map<String, Value>) -> Result<Self, String> {
        let mut schema = RequestSchema::new(online_score_fields(), arguments.clone());
        if !schema.is_valid() {
            return Err(schema.errors_as_text());
        }

        let args = Self {
            first_name: schema.str_value("first_name"),
            last_name: schema.str_value("last_name"),
            email: schema.str_value("email"),
            phone: schema.str_value("phone"),
            birthday: schema.value("birthday").as_date(),
            gender: schema.str_value("gender"),
        };

        if !args.has_complete_pair() {
            schema.add_error(
                "at least one pair of first_name/last_name, phone/email \
                 or gender/birthday is required",
            );
            return Err(schema.errors_as_text());
        }

        Ok(args)
    }

    fn has_complete_pair(&self) -> bool {
        (self.first_name.is_some() && self.last_name.is_some())
            || (self.phone.is_some() && self.email.is_some())
            || (self.gender.is_some() && self.birthday.is_some())
    }

    /// Names of the supplied fields, for the diagnostic context of a response.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut has = Vec::new();
        if self.first_name.is_some() {
            has.push("first_name");
        }
        if self.last_name.is_some() {
            has.push("last_name");
        }
        if self.email.is_some() {
            has.push("email");
        }
        if self.phone.is_some() {
            has.push("phone");
        }
        if self.birthday.is_some() {
            has.push("birthday");
        }
        if self.gender.is_some() {
            has.push("gender");
        }
        has
    }
}

/// Validated arguments of the `clients_interests` method.
#[derive(Debug, Clone)]
pub struct ClientsInterestsArgs {
    pub client_ids: Vec<i64>,
    pub date: Option<NaiveDate>,
}

impl ClientsInterestsArgs {
    pub fn parse(arguments: &serde_json::Map<String, Value>) -> Result<Self, String> {
        let mut schema = RequestSchema::new(clients_interests_fields(), arguments.clone());
        if !schema.is_valid() {
            return Err(schema.errors_as_text());
        }

        Ok(Self {
            client_ids: schema
                .value("client_ids")
                .as_ids()
                .map(<[i64]>::to_vec)
                .unwrap_or_default(),
            date: schema.value("date").as_date(),
        })
    }
}
