//! Field validation for record forms.
//!
//! Every rule except `Required` lets an empty value (missing, null or `""`)
//! through, so optional fields only need the rules that apply when they are
//! filled in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::record::Record;

#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    NumberRange { min: f64, max: f64 },
    Positive,
    NonNegative,
    Pattern { regex: Regex, message: String },
}

impl Rule {
    /// A rule requiring string values to match `pattern`.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Rule::Pattern {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    /// Check one value. Returns the user-facing message on failure.
    pub fn check(&self, value: Option<&Value>) -> Option<String> {
        if let Rule::Required = self {
            return is_blank(value).then(|| "This field is required".to_string());
        }
        if is_empty(value) {
            return None;
        }
        let value = value?;

        match self {
            Rule::Required => None,
            Rule::Email => {
                let valid = value.as_str().is_some_and(|s| email_regex().is_match(s));
                (!valid).then(|| "Please enter a valid email address".to_string())
            }
            Rule::MinLength(min) => {
                length(value).filter(|len| len < min).map(|_| format!("Must be at least {min} characters"))
            }
            Rule::MaxLength(max) => {
                length(value).filter(|len| len > max).map(|_| format!("Must be no more than {max} characters"))
            }
            Rule::NumberRange { min, max } => match number(value) {
                None => Some("Please enter a valid number".to_string()),
                Some(n) if n < *min || n > *max => Some(format!("Must be between {min} and {max}")),
                Some(_) => None,
            },
            Rule::Positive => match number(value) {
                Some(n) if n > 0.0 => None,
                _ => Some("Must be a positive number".to_string()),
            },
            Rule::NonNegative => match number(value) {
                Some(n) if n >= 0.0 => None,
                _ => Some("Must be a non-negative number".to_string()),
            },
            Rule::Pattern { regex, message } => {
                let valid = value.as_str().is_some_and(|s| regex.is_match(s));
                (!valid).then(|| message.clone())
            }
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        other => is_empty(other),
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Per-field message of every failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Ordered rules for each field of a form.
#[derive(Debug, Clone, Default)]
pub struct FormRules {
    fields: Vec<(String, Vec<Rule>)>,
}

impl FormRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((name.into(), rules.into_iter().collect()));
        self
    }

    /// Messages for every failing field; only the first failing rule of a
    /// field is reported.
    pub fn check(&self, record: &Record) -> ValidationErrors {
        let mut errors = BTreeMap::new();
        for (field, rules) in &self.fields {
            let value = record.get(field);
            if let Some(message) = rules.iter().find_map(|rule| rule.check(value)) {
                errors.insert(field.clone(), message);
            }
        }
        ValidationErrors(errors)
    }

    pub fn validate(&self, record: &Record) -> Result<(), ValidationErrors> {
        let errors = self.check(record);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
