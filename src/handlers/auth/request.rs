//! Authentication request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::constants::MAX_PASSWORD_LENGTH;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = MAX_PASSWORD_LENGTH))]
    pub password: String,
}
