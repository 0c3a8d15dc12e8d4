pub mod auth;
pub mod earning;
pub mod event;
pub mod referral;
pub mod user;
pub mod withdrawal;

pub use auth::auth_config;
pub use earning::earning_config;
pub use event::event_config;
pub use referral::referral_config;
pub use user::user_config;
pub use withdrawal::withdrawal_config;

use crate::error::AppError;
use actix_web::{HttpMessage, HttpRequest};

/// 取认证中间件写入请求扩展的用户ID
pub(crate) fn current_user_id(req: &HttpRequest) -> Result<i64, AppError> {
    req.extensions()
        .get::<i64>()
        .copied()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
