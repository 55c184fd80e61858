use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patterns::{HAS_DIGIT, HAS_LOWERCASE, HAS_UPPERCASE, IDENTIFIER};
use super::validator::{TextRule, Validator};
use super::{FieldKind, FieldSpec, FormValues, Record, Schema};
use crate::constants::limits::{
    PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use crate::errors::FieldErrors;

choice_enum! {
    UserRole default User {
        User => "user",
        Admin => "admin",
    }
}

pub const USER_ROLES: &[&str] = UserRole::NAMES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Partial update; a blank password leaves the current one untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Fields the backend accepts but never returns
pub const WRITE_ONLY_FIELDS: &[&str] = &["password"];

const USERNAME_TOO_SHORT: &str = "Username must be at least 3 characters";
const USERNAME_TOO_LONG: &str = "Username must be less than 50 characters";
const USERNAME_PATTERN: &str =
    "Username can only contain letters, numbers, hyphens, and underscores";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
const PASSWORD_TOO_LONG: &str = "Password must be less than 100 characters";
const PASSWORD_UPPERCASE: &str = "Password must contain at least one uppercase letter";
const PASSWORD_LOWERCASE: &str = "Password must contain at least one lowercase letter";
const PASSWORD_DIGIT: &str = "Password must contain at least one number";
const ROLE_INVALID: &str = "Role must be either user or admin";

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", "Username", FieldKind::Text)
        .required()
        .placeholder("Enter username")
        .describe("3-50 characters, letters, numbers, hyphens, underscores"),
    FieldSpec::new("password", "Password", FieldKind::Password)
        .required()
        .placeholder("Enter password")
        .describe("Min 8 characters, must include uppercase, lowercase, and number"),
    FieldSpec::new("role", "Role", FieldKind::Select(USER_ROLES))
        .describe("Admin users have full access to all features"),
];

pub struct UserSchema;

impl UserSchema {
    fn username_rules<'v, 'a>(rule: TextRule<'v, 'a>) -> TextRule<'v, 'a> {
        rule.min_len(USERNAME_MIN_LEN, USERNAME_TOO_SHORT)
            .max_len(USERNAME_MAX_LEN, USERNAME_TOO_LONG)
            .matches(&IDENTIFIER, USERNAME_PATTERN)
    }

    fn password_rules<'v, 'a>(rule: TextRule<'v, 'a>) -> TextRule<'v, 'a> {
        rule.min_len(PASSWORD_MIN_LEN, PASSWORD_TOO_SHORT)
            .max_len(PASSWORD_MAX_LEN, PASSWORD_TOO_LONG)
            .matches(&HAS_UPPERCASE, PASSWORD_UPPERCASE)
            .matches(&HAS_LOWERCASE, PASSWORD_LOWERCASE)
            .matches(&HAS_DIGIT, PASSWORD_DIGIT)
    }
}

impl Schema for UserSchema {
    type Create = CreateUser;
    type Update = UpdateUser;

    const ENTITY: &'static str = "User";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("username", "")
            .with_text("password", "")
            .with_text("role", UserRole::User.to_string())
    }

    fn validate_create(values: &FormValues) -> Result<CreateUser, FieldErrors> {
        let mut v = Validator::new(values);

        let username = Self::username_rules(v.text("username")).finish();
        let password = Self::password_rules(v.text("password")).finish();
        let role = v.choice_or_default::<UserRole>("role", ROLE_INVALID);
        let api_key = v.optional_text("apiKey").blank_as_absent().finish();

        v.finish(|| {
            Some(CreateUser {
                username: username?,
                password: password?,
                role: role?,
                api_key,
            })
        })
    }

    fn validate_update(values: &FormValues) -> Result<UpdateUser, FieldErrors> {
        let mut v = Validator::new(values);

        let username = Self::username_rules(v.optional_text("username")).finish();
        let password = Self::password_rules(v.optional_text("password").blank_as_absent()).finish();
        let role = v.optional_choice::<UserRole>("role", ROLE_INVALID);
        let api_key = v.optional_text("apiKey").blank_as_absent().finish();

        v.finish(|| {
            Some(UpdateUser {
                username,
                password,
                role,
                api_key,
            })
        })
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }

    /// The password is never pre-filled
    fn to_form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("username", self.username.clone())
            .with_text("password", "")
            .with_text("role", self.role.to_string())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user_with_password(password: &str) -> FormValues {
        UserSchema::defaults()
            .with_text("username", "operator_1")
            .with_text("password", password)
    }

    #[rstest]
    #[case("Secret123", None)]
    #[case("secret123", Some(PASSWORD_UPPERCASE))]
    #[case("SECRET123", Some(PASSWORD_LOWERCASE))]
    #[case("SecretPass", Some(PASSWORD_DIGIT))]
    #[case("Se1", Some(PASSWORD_TOO_SHORT))]
    fn test_password_rules(#[case] password: &str, #[case] expected: Option<&str>) {
        let result = UserSchema::validate_create(&user_with_password(password));
        match expected {
            None => assert_eq!(result.unwrap().role, UserRole::User),
            Some(message) => assert_eq!(result.unwrap_err().first("password"), Some(message)),
        }
    }

    #[test]
    fn test_password_longer_than_limit_is_rejected() {
        let long = format!("Aa1{}", "x".repeat(98));
        let errors = UserSchema::validate_create(&user_with_password(&long)).unwrap_err();
        assert_eq!(errors.first("password"), Some(PASSWORD_TOO_LONG));
    }

    #[test]
    fn test_username_rules() {
        let values = user_with_password("Secret123").with_text("username", "ab");
        let errors = UserSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first("username"), Some(USERNAME_TOO_SHORT));

        let values = user_with_password("Secret123").with_text("username", "bad name!");
        let errors = UserSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first("username"), Some(USERNAME_PATTERN));
    }

    #[test]
    fn test_blank_password_is_omitted_on_update() {
        let values = FormValues::new()
            .with_text("username", "operator_1")
            .with_text("password", "")
            .with_text("role", "admin");
        let update = UserSchema::validate_update(&values).unwrap();
        assert!(update.password.is_none());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"username": "operator_1", "role": "admin"})
        );
    }

    #[test]
    fn test_non_blank_password_is_validated_on_update() {
        let values = FormValues::new().with_text("password", "weak");
        let errors = UserSchema::validate_update(&values).unwrap_err();
        assert_eq!(errors.first("password"), Some(PASSWORD_TOO_SHORT));
    }

    #[test]
    fn test_edit_form_never_prefills_password() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "username": "root",
            "role": "admin",
            "apiKey": "k-123"
        }))
        .unwrap();
        assert!(user.is_admin());
        assert_eq!(user.to_form_values().text("password"), Some(""));
    }
}
