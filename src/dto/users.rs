use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{auth::validate_identity, is_email, within},
    error::{AppError, AppResult, ValidationErrors},
    models::{Role, User},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        validate_identity(
            &mut errors,
            &self.first_name,
            &self.last_name,
            &self.email,
            Some(&self.password),
        );
        errors.into_result()
    }
}

/// Role is fixed at creation and cannot be changed here.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
        {
            return Err(AppError::BadRequest("nothing to update".into()));
        }
        let mut errors = ValidationErrors::new();
        if let Some(first_name) = &self.first_name {
            errors.check(
                within(first_name, 1, 100),
                "first_name",
                "must be 1 to 100 characters",
            );
        }
        if let Some(last_name) = &self.last_name {
            errors.check(
                within(last_name, 1, 100),
                "last_name",
                "must be 1 to 100 characters",
            );
        }
        if let Some(email) = &self.email {
            errors.check(is_email(email.trim()), "email", "must be a valid email");
        }
        if let Some(password) = &self.password {
            errors.check(
                password.chars().count() >= 8,
                "password",
                "must be at least 8 characters",
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_rejected() {
        let req = UpdateUserRequest::default();
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn partial_update_checks_present_fields() {
        let req = UpdateUserRequest {
            email: Some("broken".into()),
            ..Default::default()
        };
        let Err(AppError::Validation(errors)) = req.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.has("email"));
        assert!(!errors.has("first_name"));
    }

    #[test]
    fn role_field_is_refused() {
        let parsed: Result<UpdateUserRequest, _> =
            serde_json::from_str(r#"{"first_name":"Bo","role":"admin"}"#);
        assert!(parsed.is_err());
    }
}
