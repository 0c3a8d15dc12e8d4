use crate::entities::{SubscriptionTier, UserRole, user_entity as users};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "maria@example.com")]
    pub email: String,
    #[schema(example = "maria")]
    pub username: String,
    #[schema(example = "Password123")]
    pub password: String,
    /// 可选的推荐码，注册时绑定推荐关系
    #[schema(example = "SF7K2QWP")]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "maria@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub tier: SubscriptionTier,
    /// 可提现余额（centavos）
    pub real_money_balance: i64,
    /// 提现保留中金额（centavos）
    pub pending_withdrawal: i64,
    /// real_money_balance - pending_withdrawal
    pub available_balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            tier: user.tier,
            real_money_balance: user.real_money_balance,
            pending_withdrawal: user.pending_withdrawal,
            available_balance: user.real_money_balance - user.pending_withdrawal,
            total_earned: user.total_earned,
            total_withdrawn: user.total_withdrawn,
            referral_code: user.referral_code,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_balance_subtracts_hold() {
        let user = users::Model {
            id: 1,
            email: "maria@example.com".to_string(),
            username: "maria".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Student,
            tier: SubscriptionTier::Free,
            real_money_balance: 3_000,
            pending_withdrawal: 2_000,
            total_earned: 5_000,
            total_withdrawn: 0,
            referrer_id: None,
            referral_code: Some("SF7K2QWP".to_string()),
            created_at: None,
            updated_at: None,
        };

        let response = UserResponse::from(user);
        assert_eq!(response.available_balance, 1_000);
        assert_eq!(response.real_money_balance, 3_000);
        assert_eq!(response.pending_withdrawal, 2_000);
    }
}
