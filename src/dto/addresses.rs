use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::within,
    error::{AppResult, ValidationErrors},
    models::Address,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressInput {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl AddressInput {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        self.collect_errors(&mut errors);
        errors.into_result()
    }

    pub(crate) fn collect_errors(&self, errors: &mut ValidationErrors) {
        errors.check(
            within(&self.full_name, 1, 200),
            "full_name",
            "must be 1 to 200 characters",
        );
        errors.check(within(&self.street, 1, 255), "street", "is required");
        errors.check(within(&self.city, 1, 100), "city", "is required");
        errors.check(
            within(&self.postal_code, 1, 20),
            "postal_code",
            "is required",
        );
        errors.check(within(&self.country, 1, 100), "country", "is required");
        if let Some(phone) = &self.phone {
            errors.check(within(phone, 3, 50), "phone", "must be 3 to 50 characters");
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}
