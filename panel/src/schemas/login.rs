use serde::Serialize;

use super::validator::Validator;
use super::{FieldKind, FieldSpec, FormValues, Schema};
use crate::constants::limits::{LOGIN_PASSWORD_MIN_LEN, PASSWORD_MAX_LEN, USERNAME_MAX_LEN};
use crate::errors::FieldErrors;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", "Username", FieldKind::Text).required(),
    FieldSpec::new("password", "Password", FieldKind::Password).required(),
];

pub struct LoginSchema;

impl LoginSchema {
    fn validate(values: &FormValues) -> Result<LoginRequest, FieldErrors> {
        let mut v = Validator::new(values);

        let username = v
            .text("username")
            .min_len(1, "Username is required")
            .max_len(USERNAME_MAX_LEN, "Username must be less than 50 characters")
            .finish();
        let password = v
            .text("password")
            .min_len(1, "Password is required")
            .min_len(LOGIN_PASSWORD_MIN_LEN, "Password must be at least 6 characters")
            .max_len(PASSWORD_MAX_LEN, "Password must be less than 100 characters")
            .finish();

        v.finish(|| {
            Some(LoginRequest {
                username: username?,
                password: password?,
            })
        })
    }
}

/// Login has no update form; both validators apply the same rules
impl Schema for LoginSchema {
    type Create = LoginRequest;
    type Update = LoginRequest;

    const ENTITY: &'static str = "Session";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("username", "")
            .with_text("password", "")
    }

    fn validate_create(values: &FormValues) -> Result<LoginRequest, FieldErrors> {
        Self::validate(values)
    }

    fn validate_update(values: &FormValues) -> Result<LoginRequest, FieldErrors> {
        Self::validate(values)
    }
}
