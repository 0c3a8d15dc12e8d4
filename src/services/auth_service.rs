use crate::entities::{SubscriptionTier, UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::services::ReferralRewardService;
use crate::utils::{JwtService, hash_password, validate_email, validate_password, verify_password};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    referral_reward_service: ReferralRewardService,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        referral_reward_service: ReferralRewardService,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            referral_reward_service,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        // 校验输入
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        if request.username.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }

        // 邮箱唯一
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Email already registered".to_string(),
            ));
        }

        // 解析推荐码（无效码直接报错，而不是静默忽略）
        let referrer = match &request.referral_code {
            Some(code) => Some(
                self.referral_reward_service
                    .find_referrer_by_code(code)
                    .await?,
            ),
            None => None,
        };

        let password_hash = hash_password(&request.password)?;

        // 新用户自带推荐码
        let own_code = self.referral_reward_service.allocate_code().await?;

        let user = users::ActiveModel {
            email: Set(request.email.clone()),
            username: Set(request.username.clone()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Student),
            tier: Set(SubscriptionTier::Free),
            real_money_balance: Set(0),
            pending_withdrawal: Set(0),
            total_earned: Set(0),
            total_withdrawn: Set(0),
            referrer_id: Set(referrer.as_ref().map(|r| r.id)),
            referral_code: Set(Some(own_code)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        // 注册即推进推荐漏斗（注册奖励在内部幂等发放）
        if let (Some(referrer), Some(code)) = (&referrer, &request.referral_code) {
            self.referral_reward_service
                .handle_signup(referrer.id, code, user.id)
                .await?;
        }

        log::info!("User {} registered ({})", user.id, user.email);

        self.build_auth_response(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(request.email.clone()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        let is_valid = verify_password(&request.password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        self.build_auth_response(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.email)?;
        let expires_in = self.jwt_service.get_access_token_expires_in();

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in,
        })
    }

    fn build_auth_response(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.email)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, &user.email)?;
        let expires_in = self.jwt_service.get_access_token_expires_in();

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in,
        })
    }
}
