//! Fluent field validation over `FormValues`
//!
//! Every rule runs even after an earlier one failed, so a field can carry
//! several messages; the form shows the first. Nothing short-circuits across
//! fields either: one pass reports every failing path.

use regex::Regex;

use super::{Choice, FieldValue, FormValues};
use crate::errors::FieldErrors;

/// Root path used when a schema rejects the form as a whole
pub const FORM_PATH: &str = "_form";

pub struct Validator<'a> {
    values: &'a FormValues,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    pub fn new(values: &'a FormValues) -> Self {
        Self {
            values,
            errors: FieldErrors::new(),
        }
    }

    pub fn values(&self) -> &'a FormValues {
        self.values
    }

    pub fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.add(path, message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Required text. An absent field reads as the empty string.
    pub fn text<'v>(&'v mut self, path: &'static str) -> TextRule<'v, 'a> {
        let value = self.read_text(path).or_else(|| Some(String::new()));
        TextRule::new(self, path, value)
    }

    /// Optional text. Rules are skipped when the field is absent.
    pub fn optional_text<'v>(&'v mut self, path: &'static str) -> TextRule<'v, 'a> {
        let value = self.read_text(path);
        TextRule::new(self, path, value)
    }

    /// Required number, coerced from text. Blank coerces to zero.
    pub fn number<'v>(&'v mut self, path: &'static str, nan_message: &str) -> NumberRule<'v, 'a> {
        let raw = self.read_text(path).unwrap_or_default();
        let value = self.coerce_number(path, &raw, nan_message);
        NumberRule::new(self, path, value)
    }

    pub fn optional_number<'v>(
        &'v mut self,
        path: &'static str,
        nan_message: &str,
    ) -> NumberRule<'v, 'a> {
        let value = match self.read_text(path) {
            Some(raw) => self.coerce_number(path, &raw, nan_message),
            None => None,
        };
        NumberRule::new(self, path, value)
    }

    /// Required choice among a closed set of values
    pub fn choice<C: Choice>(&mut self, path: &'static str, message: &str) -> Option<C> {
        let raw = self.read_text(path).unwrap_or_default();
        self.parse_choice(path, &raw, message)
    }

    /// Optional choice; absent yields `None` without an error
    pub fn optional_choice<C: Choice>(&mut self, path: &'static str, message: &str) -> Option<C> {
        match self.read_text(path) {
            Some(raw) => self.parse_choice(path, &raw, message),
            None => None,
        }
    }

    /// Choice that falls back to the type's default when absent or blank
    pub fn choice_or_default<C: Choice>(&mut self, path: &'static str, message: &str) -> Option<C> {
        match self.read_text(path) {
            Some(raw) if !raw.is_empty() => self.parse_choice(path, &raw, message),
            _ => Some(C::default()),
        }
    }

    /// Boolean flag; absent reads as false
    pub fn flag(&mut self, path: &'static str) -> bool {
        self.optional_flag(path).unwrap_or(false)
    }

    pub fn optional_flag(&mut self, path: &'static str) -> Option<bool> {
        match self.values.get(path)? {
            FieldValue::Bool(flag) => Some(*flag),
            FieldValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(true),
                "false" | "off" | "no" | "0" | "" => Some(false),
                _ => {
                    self.error(path, "Expected true or false");
                    None
                }
            },
            FieldValue::List(_) => {
                self.error(path, "Expected true or false");
                None
            }
        }
    }

    /// Required list of identifiers; absent reads as empty
    pub fn list<'v>(&'v mut self, path: &'static str) -> ListRule<'v, 'a> {
        let items = self.read_list(path).or_else(|| Some(Vec::new()));
        ListRule::new(self, path, items)
    }

    pub fn optional_list<'v>(&'v mut self, path: &'static str) -> ListRule<'v, 'a> {
        let items = self.read_list(path);
        ListRule::new(self, path, items)
    }

    /// Build the payload, or return every recorded error
    pub fn finish<T>(mut self, build: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        match build() {
            Some(payload) => Ok(payload),
            None => {
                self.errors.add(FORM_PATH, "Form is incomplete");
                Err(self.errors)
            }
        }
    }

    fn read_text(&mut self, path: &str) -> Option<String> {
        match self.values.get(path)? {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Bool(flag) => Some(flag.to_string()),
            FieldValue::List(_) => {
                self.error(path, "Expected a single value");
                None
            }
        }
    }

    fn read_list(&mut self, path: &str) -> Option<Vec<String>> {
        match self.values.get(path)? {
            FieldValue::List(items) => Some(items.clone()),
            // Comma separated text, as typed on the command line
            FieldValue::Text(text) => Some(
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            FieldValue::Bool(_) => {
                self.error(path, "Expected a list");
                None
            }
        }
    }

    fn coerce_number(&mut self, path: &str, raw: &str, nan_message: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(0.0);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                self.error(path, nan_message);
                None
            }
        }
    }

    fn parse_choice<C: Choice>(&mut self, path: &str, raw: &str, message: &str) -> Option<C> {
        let parsed = C::parse(raw);
        if parsed.is_none() {
            self.error(path, message);
        }
        parsed
    }
}

pub struct TextRule<'v, 'a> {
    validator: &'v mut Validator<'a>,
    path: &'static str,
    value: Option<String>,
    failed: bool,
    blank_as_absent: bool,
}

impl<'v, 'a> TextRule<'v, 'a> {
    fn new(validator: &'v mut Validator<'a>, path: &'static str, value: Option<String>) -> Self {
        Self {
            validator,
            path,
            value,
            failed: false,
            blank_as_absent: false,
        }
    }

    /// Treat an empty value as if the field were absent (skips later rules)
    pub fn blank_as_absent(mut self) -> Self {
        if self.value.as_deref().is_some_and(|v| v.is_empty()) {
            self.value = None;
        }
        self.blank_as_absent = true;
        self
    }

    pub fn min_len(self, min: usize, message: &str) -> Self {
        self.check(|v| v.chars().count() >= min, message)
    }

    pub fn max_len(self, max: usize, message: &str) -> Self {
        self.check(|v| v.chars().count() <= max, message)
    }

    pub fn matches(self, pattern: &Regex, message: &str) -> Self {
        self.check(|v| pattern.is_match(v), message)
    }

    pub fn check(mut self, rule: impl FnOnce(&str) -> bool, message: &str) -> Self {
        if let Some(value) = self.value.as_deref() {
            if !rule(value) {
                self.validator.error(self.path, message);
                self.failed = true;
            }
        }
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.value = self.value.map(|v| v.to_uppercase());
        self
    }

    /// The value when every rule passed; `None` when absent or invalid
    pub fn finish(self) -> Option<String> {
        if self.failed {
            None
        } else {
            self.value
        }
    }
}

pub struct NumberRule<'v, 'a> {
    validator: &'v mut Validator<'a>,
    path: &'static str,
    value: Option<f64>,
    failed: bool,
}

impl<'v, 'a> NumberRule<'v, 'a> {
    fn new(validator: &'v mut Validator<'a>, path: &'static str, value: Option<f64>) -> Self {
        Self {
            validator,
            path,
            value,
            failed: false,
        }
    }

    pub fn integer(self, message: &str) -> Self {
        self.check(|n| n.fract() == 0.0, message)
    }

    pub fn min(self, min: f64, message: &str) -> Self {
        self.check(|n| n >= min, message)
    }

    pub fn max(self, max: f64, message: &str) -> Self {
        self.check(|n| n <= max, message)
    }

    pub fn check(mut self, rule: impl FnOnce(f64) -> bool, message: &str) -> Self {
        if let Some(n) = self.value {
            if !rule(n) {
                self.validator.error(self.path, message);
                self.failed = true;
            }
        }
        self
    }

    pub fn finish(self) -> Option<f64> {
        if self.failed {
            None
        } else {
            self.value
        }
    }
}

pub struct ListRule<'v, 'a> {
    validator: &'v mut Validator<'a>,
    path: &'static str,
    items: Option<Vec<String>>,
    failed: bool,
}

impl<'v, 'a> ListRule<'v, 'a> {
    fn new(
        validator: &'v mut Validator<'a>,
        path: &'static str,
        items: Option<Vec<String>>,
    ) -> Self {
        Self {
            validator,
            path,
            items,
            failed: false,
        }
    }

    pub fn min_items(mut self, min: usize, message: &str) -> Self {
        if self.items.as_ref().is_some_and(|items| items.len() < min) {
            self.validator.error(self.path, message);
            self.failed = true;
        }
        self
    }

    pub fn max_items(mut self, max: usize, message: &str) -> Self {
        if self.items.as_ref().is_some_and(|items| items.len() > max) {
            self.validator.error(self.path, message);
            self.failed = true;
        }
        self
    }

    pub fn finish(self) -> Option<Vec<String>> {
        if self.failed {
            None
        } else {
            self.items
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_failing_rule_is_recorded() {
        let values = FormValues::new().with_text("password", "short");
        let mut v = Validator::new(&values);
        let password = v
            .text("password")
            .min_len(8, "too short")
            .check(|p| p.chars().any(|c| c.is_ascii_digit()), "needs digit")
            .finish();
        let result = v.finish(|| password);

        let errors = result.unwrap_err();
        assert_eq!(errors.messages("password"), ["too short", "needs digit"]);
    }

    #[test]
    fn test_absent_required_text_fails_min_len() {
        let values = FormValues::new();
        let mut v = Validator::new(&values);
        let name = v.text("name").min_len(1, "Name is required").finish();
        assert!(name.is_none());
        let errors = v.finish(|| name).unwrap_err();
        assert_eq!(errors.first("name"), Some("Name is required"));
    }

    #[test]
    fn test_optional_text_skips_rules_when_absent() {
        let values = FormValues::new();
        let mut v = Validator::new(&values);
        let name = v.optional_text("name").min_len(1, "Name is required").finish();
        assert!(name.is_none());
        assert!(!v.has_errors());
    }

    #[test]
    fn test_blank_number_coerces_to_zero() {
        let values = FormValues::new().with_text("port", "");
        let mut v = Validator::new(&values);
        let port = v
            .number("port", "Port must be a number")
            .min(1.0, "Port must be at least 1")
            .finish();
        assert!(port.is_none());
        let errors = v.finish(|| port).unwrap_err();
        assert_eq!(errors.first("port"), Some("Port must be at least 1"));
    }

    #[test]
    fn test_list_reads_comma_separated_text() {
        let values = FormValues::new().with_text("agents", "a1, a2,,a3");
        let mut v = Validator::new(&values);
        let agents = v.list("agents").min_items(1, "At least one").finish();
        assert_eq!(agents.unwrap(), vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_flag_coerces_text() {
        let values = FormValues::new()
            .with_text("anycast", "true")
            .with_text("broken", "maybe");
        let mut v = Validator::new(&values);
        assert!(v.flag("anycast"));
        assert!(!v.flag("missing"));
        assert!(!v.flag("broken"));
        assert!(v.has_errors());
    }
}
