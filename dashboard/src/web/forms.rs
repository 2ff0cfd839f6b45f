//! Form parsing and field-level validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";

/// Field name → messages, in a stable order for rendering.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(())` when no field failed.
    pub fn finish(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in errors.field_errors() {
            for e in errs {
                out.add(&field, describe(e));
            }
        }
        out
    }
}

fn describe(e: &ValidationError) -> String {
    if let Some(ref message) = e.message {
        return message.to_string();
    }
    let max = e.params.get("max");
    let len = e
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .map(|v| v.chars().count());
    match (e.code.as_ref(), max, len) {
        ("length", Some(max), Some(len)) => {
            format!("Ensure this value has at most {max} characters (it has {len}).")
        }
        ("length", Some(max), None) => format!("Ensure this value has at most {max} characters."),
        (code, _, _) => format!("Enter a valid value ({code})."),
    }
}

/// Run the declarative field rules of `form` into a fresh error set.
pub fn field_errors<T: Validate>(form: &T) -> FormErrors {
    form.validate().err().map(FormErrors::from).unwrap_or_default()
}

/// Required text: trimmed and non-empty.
pub fn required_text(errors: &mut FormErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    Some(value.to_string())
}

/// Optional text: blank becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

// ---------- login ----------

/// Raw login submission. Both fields are optional so a missing field becomes
/// a validation error instead of a rejected request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(max = 150))]
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Check the submission and return the trimmed username and raw password.
    pub fn clean(&self) -> Result<Credentials, FormErrors> {
        let mut errors = field_errors(self);
        let username = required_text(&mut errors, "username", self.username.as_deref());
        // Passwords are taken verbatim, whitespace included.
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => Some(p.to_string()),
            _ => {
                errors.add("password", REQUIRED);
                None
            }
        };
        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => {
                Ok(Credentials { username, password })
            }
            _ => Err(errors),
        }
    }

    /// What the re-rendered form shows: the username only, never the password.
    pub fn echo(&self) -> LoginFormEcho {
        LoginFormEcho {
            username: self.username.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LoginFormEcho {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: Option<&str>, password: Option<&str>) -> LoginForm {
        LoginForm {
            username: username.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn valid_login_form() {
        let creds = form(Some("  alice "), Some(" pw ")).clean().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, " pw ");
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = form(None, Some("")).clean().unwrap_err();
        assert_eq!(errors.field("username"), [REQUIRED.to_string()]);
        assert_eq!(errors.field("password"), [REQUIRED.to_string()]);
    }

    #[test]
    fn username_length_is_capped() {
        let long = "a".repeat(151);
        let errors = form(Some(&long), Some("pw")).clean().unwrap_err();
        assert_eq!(
            errors.field("username"),
            ["Ensure this value has at most 150 characters (it has 151).".to_string()]
        );
        assert!(errors.field("password").is_empty());

        let max = "a".repeat(150);
        assert!(form(Some(&max), Some("pw")).clean().is_ok());
    }

    #[test]
    fn echo_never_contains_password() {
        let echo = form(Some("alice"), Some("secret")).echo();
        let json = serde_json::to_string(&echo).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("alice"));
    }

    #[test]
    fn validation_errors_keep_field_and_message() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "email",
            ValidationError::new("email").with_message("Enter a valid email address.".into()),
        );
        let mut length = ValidationError::new("length");
        length.add_param("max".into(), &5);
        length.add_param("value".into(), &"abcdefg");
        errors.add("grade", length);

        let errors = FormErrors::from(errors);
        assert_eq!(errors.field("email"), ["Enter a valid email address.".to_string()]);
        assert_eq!(
            errors.field("grade"),
            ["Ensure this value has at most 5 characters (it has 7).".to_string()]
        );
    }
}
