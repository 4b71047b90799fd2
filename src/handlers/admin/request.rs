//! Admin registry request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Grant admin rights to a user, by uid or by the email of an existing profile
#[derive(Debug, Deserialize, Validate)]
pub struct GrantAdminRequest {
    pub uid: Option<Uuid>,

    #[validate(email)]
    pub email: Option<String>,
}
