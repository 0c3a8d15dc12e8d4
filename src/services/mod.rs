pub mod auth_service;
pub mod content_reward_service;
pub mod earning_service;
pub mod referral_reward_service;
pub mod user_service;
pub mod withdrawal_service;

pub use auth_service::*;
pub use content_reward_service::*;
pub use earning_service::*;
pub use referral_reward_service::*;
pub use user_service::*;
pub use withdrawal_service::*;
