//! Validated user input.
//!
//! Each form checks its own field constraints and reports every failing
//! field at once. Constraints that need storage (unique usernames, existing
//! categories) are checked by the service.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DomainError, FieldErrors};

pub const TITLE_MAX_LEN: usize = 256;
pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;
/// Posts may not be dated further back than this.
pub const MAX_POST_AGE_YEARS: u32 = 200;

const REQUIRED: &str = "This field is required.";

fn check_required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    }
}

fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Ensure this value has at most {max} characters."));
    }
}

/// Reject publication dates more than [`MAX_POST_AGE_YEARS`] full years ago.
pub fn check_post_age(pub_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DomainError> {
    match now.years_since(pub_date) {
        Some(years) if years > MAX_POST_AGE_YEARS => Err(DomainError::field(
            "pub_date",
            "A post cannot be older than 200 years.",
        )),
        _ => Ok(()),
    }
}

/// Letters, digits and `@ . + - _`, like the usual username policy.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Latin letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Post create/edit form. The author is never part of the form.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

impl PostForm {
    pub fn validate(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();

        let mut errors = FieldErrors::new();
        check_required(&mut errors, "title", &self.title);
        check_max_len(&mut errors, "title", &self.title, TITLE_MAX_LEN);
        check_required(&mut errors, "text", &self.text);
        if check_post_age(self.pub_date, now).is_err() {
            errors.add("pub_date", "A post cannot be older than 200 years.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.text = self.text.trim().to_string();

        let mut errors = FieldErrors::new();
        check_required(&mut errors, "text", &self.text);
        errors.into_result()
    }
}

/// Profile edit form. Email and names may be blank.
#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();

        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        if !self.email.is_empty() {
            check_email(&mut errors, &self.email);
        }
        check_max_len(&mut errors, "first_name", &self.first_name, USERNAME_MAX_LEN);
        check_max_len(&mut errors, "last_name", &self.last_name, USERNAME_MAX_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&mut self) -> Result<(), DomainError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();

        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email);
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        errors.into_result()
    }
}

fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if !is_valid_username(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    check_max_len(errors, "username", username, USERNAME_MAX_LEN);
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
    check_max_len(errors, "email", email, EMAIL_MAX_LEN);
}
