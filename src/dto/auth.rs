use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{is_email, within},
    error::{AppResult, ValidationErrors},
    models::Role,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// `client` (default) or `seller`; admins are created from the admin panel.
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        validate_identity(
            &mut errors,
            &self.first_name,
            &self.last_name,
            &self.email,
            Some(&self.password),
        );
        errors.check(
            !matches!(self.role, Some(Role::Admin)),
            "role",
            "must be client or seller",
        );
        errors.into_result()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.email.trim().is_empty(), "email", "is required");
        errors.check(!self.password.is_empty(), "password", "is required");
        errors.into_result()
    }
}

/// What the session remembers about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: Role,
    pub first_name: String,
}

pub(crate) fn validate_identity(
    errors: &mut ValidationErrors,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: Option<&str>,
) {
    errors.check(
        within(first_name, 1, 100),
        "first_name",
        "must be 1 to 100 characters",
    );
    errors.check(
        within(last_name, 1, 100),
        "last_name",
        "must be 1 to 100 characters",
    );
    errors.check(is_email(email.trim()), "email", "must be a valid email");
    if let Some(password) = password {
        errors.check(
            password.chars().count() >= 8,
            "password",
            "must be at least 8 characters",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn register() -> RegisterRequest {
        RegisterRequest {
            first_name: "Ana".into(),
            last_name: "Lopes".into(),
            email: "ana@example.com".into(),
            password: "correct horse".into(),
            role: None,
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(register().validate().is_ok());
    }

    #[test]
    fn rejects_every_bad_field_at_once() {
        let req = RegisterRequest {
            first_name: " ".into(),
            last_name: String::new(),
            email: "nope".into(),
            password: "short".into(),
            role: Some(Role::Admin),
        };
        let Err(AppError::Validation(errors)) = req.validate() else {
            panic!("expected validation error");
        };
        for field in ["first_name", "last_name", "email", "password", "role"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn seller_can_self_register() {
        let mut req = register();
        req.role = Some(Role::Seller);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn login_requires_both_fields() {
        let req = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }
}
