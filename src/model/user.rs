//! Wire shapes of the users API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateDto {
    #[validate(
        required(message = "Login is required."),
        length(min = 1, message = "Login must not be empty.")
    )]
    pub login: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Body of `PUT /api/users/{user_id}`.
///
/// `id` never comes from the body, the route parameter is assigned to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateDto {
    #[serde(skip)]
    pub id: Uuid,
    #[validate(required, length(min = 1))]
    pub login: Option<String>,
    #[validate(required, length(min = 1))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1))]
    pub last_name: Option<String>,
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub login: String,
    pub full_name: String,
}
