pub mod earnings;
pub mod referrals;
pub mod users;
pub mod withdrawals;

pub use earnings as earning_entity;
pub use referrals as referral_entity;
pub use users as user_entity;
pub use withdrawals as withdrawal_entity;

pub use earnings::{EarningSource, EarningStatus};
pub use referrals::ReferralStatus;
pub use users::{SubscriptionTier, UserRole};
pub use withdrawals::{PaymentMethod, PixKeyType, WithdrawalStatus};
