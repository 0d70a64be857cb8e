use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::error::AppError;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").ok());
static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 50;
const EMAIL_MAX_CHARS: usize = 255;
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 100;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|regex| regex.is_match(email))
}

/// Collects field-level problems so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn username(&mut self, value: &str) -> &mut Self {
        let len = value.chars().count();
        if len < USERNAME_MIN_CHARS {
            self.push("username", "Username must be at least 3 characters");
        }
        if len > USERNAME_MAX_CHARS {
            self.push("username", "Username must be at most 50 characters");
        }
        let allowed = USERNAME_RE
            .as_ref()
            .is_some_and(|regex| regex.is_match(value));
        if len > 0 && !allowed {
            self.push(
                "username",
                "Username can only contain letters, numbers, and underscores",
            );
        }
        self
    }

    pub fn email(&mut self, value: &str) -> &mut Self {
        if value.is_empty() {
            self.push("email", "Email is required");
            return self;
        }
        if !is_valid_email(value) {
            self.push("email", "Invalid email format");
        }
        if value.chars().count() > EMAIL_MAX_CHARS {
            self.push("email", "Email is too long");
        }
        self
    }

    pub fn new_password(&mut self, value: &str) -> &mut Self {
        let len = value.chars().count();
        if len < PASSWORD_MIN_CHARS {
            self.push("password", "Password must be at least 8 characters");
        }
        if len > PASSWORD_MAX_CHARS {
            self.push("password", "Password is too long");
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.is_empty() {
            self.push(field, message);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(AppError::validation(std::mem::take(&mut self.errors)))
    }
}
