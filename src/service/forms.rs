use crate::constants::PASSKEYS;
use crate::proctor::machine::Violation;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

#[derive(Validate, Serialize, Deserialize, Debug)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Name is required"))]
    #[validate(length(max = 32, message = "Name is too long"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[validate(length(max = 32, message = "Password must be at most 32 characters"))]
    #[validate(custom = "validate_password")]
    pub password: String,
}

#[derive(Validate, Serialize, Deserialize, Debug)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(custom = "validate_passkey")]
    pub passkey: Option<String>,
}

#[derive(Validate, Serialize, Deserialize, Debug)]
pub struct ParticipantForm {
    #[validate(length(min = 1, message = "Name is required"))]
    #[validate(length(max = 32, message = "Name is too long"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Validate, Deserialize, Debug)]
pub struct StartSessionBody {
    #[validate(length(min = 1, max = 32, message = "Language is required"))]
    pub lang: String,
    #[serde(default)]
    pub lockdown_supported: bool,
}

#[derive(Deserialize, Debug)]
pub struct CodeBody {
    pub code: String,
}

#[derive(Deserialize, Debug)]
pub struct SignalBody {
    pub signal: Violation,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProblemQuery {
    pub difficulty: Option<String>,
}

pub fn validate_password(s: &str) -> Result<(), ValidationError> {
    if s.contains(char::is_whitespace) {
        return Err(ValidationError {
            code: Cow::from("white_space"),
            message: Some(Cow::from("Password must not contain whitespace")),
            params: Default::default(),
        });
    }
    Ok(())
}

fn validate_passkey(s: &str) -> Result<(), ValidationError> {
    if !PASSKEYS.contains(&s) {
        return Err(ValidationError {
            code: Cow::from("passkey"),
            message: Some(Cow::from("Invalid passkey")),
            params: Default::default(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error::Error;

    #[test]
    fn register_form_rules() {
        let ok = RegisterForm {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterForm {
            name: "".into(),
            email: "jane".into(),
            password: "has space".into(),
        };
        let err: Error = bad.validate().unwrap_err().into();
        assert_eq!(
            err.error,
            "Email is invalid , Name is required , Password must not contain whitespace"
        );
    }

    #[test]
    fn passkey_is_optional_but_checked() {
        let mut lf = LoginForm {
            email: "jane@example.com".into(),
            password: "secret1".into(),
            passkey: None,
        };
        assert!(lf.validate().is_ok());
        lf.passkey = Some("medium".into());
        assert!(lf.validate().is_ok());
        lf.passkey = Some("expert".into());
        assert!(lf.validate().is_err());
    }
}
