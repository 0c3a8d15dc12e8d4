use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::UserResponse;
use sea_orm::{DatabaseConnection, EntityTrait};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = self.get_user_by_id(user_id).await?;
        Ok(UserResponse::from(user))
    }

    /// 管理端口径：调用者必须是 master_admin
    pub async fn ensure_admin(&self, user_id: i64) -> AppResult<users::Model> {
        let user = self.get_user_by_id(user_id).await?;
        if user.role != UserRole::MasterAdmin {
            return Err(AppError::PermissionDenied);
        }
        Ok(user)
    }
}
