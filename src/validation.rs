//! Field rules shared by the author and post forms.
//!
//! Input arrives as a loosely typed JSON object. Strings are trimmed and
//! blank strings count as null before any rule runs. Each rule records its
//! own message in a [`ValidationErrors`] bag so a single pass reports every
//! failing field.

use axum::{
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

pub const MAX_STRING_LENGTH: usize = 255;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    )
    .expect("email pattern is valid");
}

/// Field-level messages, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn len(&self) -> usize {
        self.fields.iter().map(|(_, messages)| messages.len()).sum()
    }

    /// First message, plus a count of the rest.
    pub fn summary(&self) -> String {
        let first = self
            .fields
            .first()
            .and_then(|(_, messages)| messages.first())
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());

        match self.len().saturating_sub(1) {
            0 => first,
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// A field after trimming and blank-to-null conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Null,
    Text(String),
    Other(Value),
}

/// Raw form submission, sent either as a JSON object or URL-encoded.
#[derive(Debug, Clone, Default)]
pub struct FormInput(Map<String, Value>);

impl FormInput {
    /// URL-encoded pairs as string fields; a repeated key keeps its last value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        )
    }

    pub fn field(&self, name: &str) -> FieldValue {
        match self.0.get(name) {
            None => FieldValue::Absent,
            Some(Value::Null) => FieldValue::Null,
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(trimmed.to_string())
                }
            }
            Some(other) => FieldValue::Other(other.clone()),
        }
    }
}

#[cfg(test)]
impl From<Value> for FormInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }
}

fn is_url_encoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S: Send + Sync> FromRequest<S> for FormInput {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_url_encoded(&req) {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::from_pairs(pairs))
        } else {
            let Json(fields) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(fields))
        }
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

pub fn required_message(field: &str) -> String {
    format!("The {} field is required.", label(field))
}

pub fn unique_message(field: &str) -> String {
    format!("The {} has already been taken.", label(field))
}

pub fn exists_message(field: &str) -> String {
    format!("The selected {} is invalid.", label(field))
}

/// `required|max:255`, or unbounded when `max` is `None`.
pub fn required_string(
    errors: &mut ValidationErrors,
    input: &FormInput,
    field: &str,
    max: Option<usize>,
) -> Option<String> {
    match input.field(field) {
        FieldValue::Absent | FieldValue::Null => {
            errors.add(field, required_message(field));
            None
        }
        FieldValue::Text(text) => check_max(errors, field, text, max),
        FieldValue::Other(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}

fn check_max(
    errors: &mut ValidationErrors,
    field: &str,
    text: String,
    max: Option<usize>,
) -> Option<String> {
    match max {
        Some(limit) if text.chars().count() > limit => {
            errors.add(
                field,
                format!(
                    "The {} field must not be greater than {limit} characters.",
                    label(field)
                ),
            );
            None
        }
        _ => Some(text),
    }
}

/// `nullable|string`. Outer `None` means the field was not submitted.
pub fn nullable_string(
    errors: &mut ValidationErrors,
    input: &FormInput,
    field: &str,
) -> Option<Option<String>> {
    match input.field(field) {
        FieldValue::Absent => None,
        FieldValue::Null => Some(None),
        FieldValue::Text(text) => Some(Some(text)),
        FieldValue::Other(_) => {
            errors.add(field, format!("The {} field must be a string.", label(field)));
            None
        }
    }
}

/// `required|email`
pub fn required_email(
    errors: &mut ValidationErrors,
    input: &FormInput,
    field: &str,
) -> Option<String> {
    let email = required_string(errors, input, field, None)?;
    if EMAIL.is_match(&email) {
        Some(email)
    } else {
        errors.add(
            field,
            format!("The {} field must be a valid email address.", label(field)),
        );
        None
    }
}

/// `boolean`. `None` when the field was not submitted or failed.
pub fn boolean(errors: &mut ValidationErrors, input: &FormInput, field: &str) -> Option<bool> {
    let parsed = match input.field(field) {
        FieldValue::Absent => return None,
        FieldValue::Null => None,
        FieldValue::Text(text) => match text.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        FieldValue::Other(Value::Bool(flag)) => Some(flag),
        FieldValue::Other(Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        FieldValue::Other(_) => None,
    };

    if parsed.is_none() {
        errors.add(
            field,
            format!("The {} field must be true or false.", label(field)),
        );
    }
    parsed
}

/// `required` for an id column; accepts integers and numeric strings.
/// Existence is checked against the store by the caller.
pub fn required_id(errors: &mut ValidationErrors, input: &FormInput, field: &str) -> Option<i32> {
    let parsed = match input.field(field) {
        FieldValue::Absent | FieldValue::Null => {
            errors.add(field, required_message(field));
            return None;
        }
        FieldValue::Text(text) => text.parse::<i32>().ok(),
        FieldValue::Other(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        FieldValue::Other(_) => None,
    };

    if parsed.is_none() {
        errors.add(field, exists_message(field));
    }
    parsed
}
