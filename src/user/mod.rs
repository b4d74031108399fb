mod mapper;
mod memory;
mod postgres;
mod repository;

pub use mapper::*;
pub use memory::*;
pub use postgres::*;
pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User as saved on storage.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct UserEntity {
    pub id: Uuid,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserEntity {
    /// Whether `login` only holds letters or digits.
    pub fn is_valid_login(login: &str) -> bool {
        login.chars().all(char::is_alphanumeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_login() {
        assert!(UserEntity::is_valid_login("abc123"));
        assert!(UserEntity::is_valid_login("Jöhn42"));
        assert!(!UserEntity::is_valid_login("abc-123"));
        assert!(!UserEntity::is_valid_login("john doe"));
    }
}
