//! Field validation for request bodies.
//!
//! A [`FieldRules`] set holds one [`FieldRule`] per field. Evaluation never
//! stops at the first failing field: every rule runs, and the report lists
//! both the violations and the fields that passed.

use serde::Serialize;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::error::CoreError;

/// A single field-level rule violation.
///
/// Serialized as `{"path": ..., "msg": ...}`, the shape clients of the
/// validation endpoint expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    #[serde(rename = "path")]
    pub field: String,
    #[serde(rename = "msg")]
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Present, not null, and not an empty string.
    Required,
    MinLength(usize),
    OneOf(&'static [&'static str]),
    Email,
    Lowercase,
    /// At least `min_len` characters with one lowercase letter, one
    /// uppercase letter, one digit and one symbol.
    StrongPassword { min_len: usize },
    /// Equal to the value of another body field.
    MatchesField(&'static str),
}

impl Check {
    fn passes(&self, value: Option<&Value>, body: &Map<String, Value>) -> bool {
        let present = value.filter(|v| !v.is_null());
        match self {
            Check::Required => match present {
                None => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            },
            Check::MinLength(min) => text_of(present).is_some_and(|s| s.chars().count() >= *min),
            Check::OneOf(allowed) => text_of(present).is_some_and(|s| allowed.contains(&s.as_str())),
            Check::Email => match present {
                Some(Value::String(s)) => s.validate_email(),
                _ => false,
            },
            Check::Lowercase => text_of(present).is_some_and(|s| s == s.to_lowercase()),
            Check::StrongPassword { min_len } => {
                text_of(present).is_some_and(|s| is_strong_password(&s, *min_len))
            }
            Check::MatchesField(other) => {
                present.is_some() && present == body.get(*other).filter(|v| !v.is_null())
            }
        }
    }
}

/// String form of a scalar body value. Numbers and booleans are checked
/// by their textual form; arrays and objects have none.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_strong_password(s: &str, min_len: usize) -> bool {
    s.chars().count() >= min_len
        && s.chars().any(|c| c.is_lowercase())
        && s.chars().any(|c| c.is_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Ordered checks for one field. The first failing check produces the
/// field's violation.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    optional: bool,
    checks: Vec<(Check, &'static str)>,
}

impl FieldRule {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            optional: false,
            checks: Vec::new(),
        }
    }

    /// Skip every check when the field is absent or null.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn check(mut self, check: Check, message: &'static str) -> Self {
        self.checks.push((check, message));
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Option<FieldViolation> {
        let value = body.get(self.field);
        if self.optional && value.map_or(true, Value::is_null) {
            return None;
        }
        self.checks
            .iter()
            .find(|(check, _)| !check.passes(value, body))
            .map(|(_, message)| FieldViolation::new(self.field, *message))
    }
}

/// Outcome of evaluating a rule set against one body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FieldViolation>,
    pub successes: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert into a result, keeping the passing fields on success.
    pub fn into_result(self) -> Result<Vec<String>, CoreError> {
        if self.errors.is_empty() {
            Ok(self.successes)
        } else {
            Err(CoreError::ValidationFailed {
                errors: self.errors,
                successes: self.successes,
            })
        }
    }
}

/// The validators declared for one write action of an entity type.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<FieldRule>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, body: &Map<String, Value>) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            match rule.evaluate(body) {
                Some(violation) => report.errors.push(violation),
                None => report.successes.push(rule.field.to_string()),
            }
        }
        report
    }

    /// Evaluate and fail with [`CoreError::ValidationFailed`] when any rule
    /// is violated.
    pub fn validate(&self, body: &Map<String, Value>) -> Result<Vec<String>, CoreError> {
        self.evaluate(body).into_result()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test body must be an object"),
        }
    }

    fn registration() -> FieldRules {
        FieldRules::new()
            .rule(
                FieldRule::new("email")
                    .check(Check::Required, "email missing")
                    .check(Check::Email, "email invalid"),
            )
            .rule(
                FieldRule::new("login")
                    .check(Check::Required, "login missing")
                    .check(Check::MinLength(4), "login short")
                    .check(Check::Lowercase, "login case"),
            )
            .rule(
                FieldRule::new("fullName")
                    .optional()
                    .check(Check::MinLength(3), "name short"),
            )
            .rule(
                FieldRule::new("password")
                    .check(Check::StrongPassword { min_len: 5 }, "weak"),
            )
            .rule(
                FieldRule::new("password_confirm")
                    .check(Check::Required, "confirm missing")
                    .check(Check::MatchesField("password"), "mismatch"),
            )
    }

    #[test]
    fn valid_body_lists_every_field_as_success() {
        let report = registration().evaluate(&body(json!({
            "email": "ann@example.com",
            "login": "annie",
            "password": "Ab1!x",
            "password_confirm": "Ab1!x",
        })));
        assert!(report.is_valid());
        assert_eq!(
            report.successes,
            vec!["email", "login", "fullName", "password", "password_confirm"]
        );
    }

    #[test]
    fn collects_all_failures_not_just_the_first() {
        let report = registration().evaluate(&body(json!({
            "email": "not-an-email",
            "login": "Ab",
            "fullName": "Jo",
            "password": "weak",
            "password_confirm": "other",
        })));
        let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["email", "login", "fullName", "password", "password_confirm"]
        );
        assert!(report.successes.is_empty());
    }

    #[test]
    fn first_failing_check_wins_per_field() {
        let report = registration().evaluate(&body(json!({"login": ""})));
        let login = report.errors.iter().find(|e| e.field == "login").unwrap();
        assert_eq!(login.message, "login missing");
    }

    #[test]
    fn optional_field_skips_when_absent_but_checks_when_present() {
        let rules = FieldRules::new().rule(
            FieldRule::new("fullName")
                .optional()
                .check(Check::MinLength(3), "short"),
        );
        assert!(rules.evaluate(&body(json!({}))).is_valid());
        assert!(rules.evaluate(&body(json!({"fullName": null}))).is_valid());
        assert!(!rules.evaluate(&body(json!({"fullName": "Al"}))).is_valid());
    }

    #[test]
    fn one_of_restricts_values() {
        let rules = FieldRules::new().rule(
            FieldRule::new("status").check(Check::OneOf(&["active", "inactive"]), "bad status"),
        );
        assert!(rules.evaluate(&body(json!({"status": "active"}))).is_valid());
        assert!(!rules.evaluate(&body(json!({"status": "draft"}))).is_valid());
    }

    #[test]
    fn strong_password_requires_every_class() {
        assert!(is_strong_password("Ab1!x", 5));
        assert!(!is_strong_password("Ab1!", 5));
        assert!(!is_strong_password("ab1!x", 5));
        assert!(!is_strong_password("Abc!x", 5));
        assert!(!is_strong_password("Ab1xx", 5));
    }

    #[test]
    fn validate_returns_structured_failure() {
        let err = registration().validate(&body(json!({}))).unwrap_err();
        assert_matches!(err, CoreError::ValidationFailed { ref errors, ref successes } => {
            assert_eq!(errors.len(), 4);
            assert_eq!(successes, &vec!["fullName".to_string()]);
        });
    }

    #[test]
    fn violation_serializes_as_path_and_msg() {
        let json = serde_json::to_value(FieldViolation::new("title", "required")).unwrap();
        assert_eq!(json, json!({"path": "title", "msg": "required"}));
    }
}
