//! Conversions between wire shapes and [`UserEntity`].

use crate::model::user::{UserCreateDto, UserDto, UserUpdateDto};

use super::UserEntity;

/// Port for object-to-object mapping of users.
pub trait EntityMapper: Send + Sync {
    fn create_to_entity(&self, dto: UserCreateDto) -> UserEntity;
    fn update_to_entity(&self, dto: UserUpdateDto) -> UserEntity;
    fn entity_to_dto(&self, user: &UserEntity) -> UserDto;
}

/// Default [`EntityMapper`], backed by the `From` conversions below.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserMapper;

impl EntityMapper for UserMapper {
    fn create_to_entity(&self, dto: UserCreateDto) -> UserEntity {
        dto.into()
    }

    fn update_to_entity(&self, dto: UserUpdateDto) -> UserEntity {
        dto.into()
    }

    fn entity_to_dto(&self, user: &UserEntity) -> UserDto {
        user.into()
    }
}

impl From<UserCreateDto> for UserEntity {
    fn from(dto: UserCreateDto) -> Self {
        Self {
            id: uuid::Uuid::nil(),
            login: dto.login.unwrap_or_default(),
            first_name: dto.first_name.unwrap_or_default(),
            last_name: dto.last_name.unwrap_or_default(),
        }
    }
}

impl From<UserUpdateDto> for UserEntity {
    fn from(dto: UserUpdateDto) -> Self {
        Self {
            id: dto.id,
            login: dto.login.unwrap_or_default(),
            first_name: dto.first_name.unwrap_or_default(),
            last_name: dto.last_name.unwrap_or_default(),
        }
    }
}

impl From<&UserEntity> for UserDto {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            full_name: format!("{} {}", user.last_name, user.first_name)
                .trim()
                .to_owned(),
        }
    }
}
