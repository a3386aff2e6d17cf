//! Registration and login DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_membership::{NewUser, User};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 120, message = "must be between 3 and 120 characters"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    pub company_name: Option<String>,
    #[validate(length(equal = 3, message = "must be a three-letter code"))]
    pub default_currency: Option<String>,
}

impl From<RegisterRequest> for NewUser {
    fn from(request: RegisterRequest) -> Self {
        NewUser {
            email: request.email,
            password: request.password,
            company_name: request.company_name,
            default_currency: request.default_currency,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}
