use crate::entities::{ReferralStatus, referral_entity as referrals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralCodeResponse {
    #[schema(example = "SF7K2QWP")]
    pub referral_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralResponse {
    pub id: i64,
    pub referrer_id: i64,
    pub referee_id: Option<i64>,
    pub status: ReferralStatus,
    pub signed_up_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<referrals::Model> for ReferralResponse {
    fn from(r: referrals::Model) -> Self {
        Self {
            id: r.id,
            referrer_id: r.referrer_id,
            referee_id: r.referee_id,
            status: r.status,
            signed_up_at: r.signed_up_at,
            converted_at: r.converted_at,
            completed_at: r.completed_at,
            created_at: r.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 推荐漏斗统计：各阶段数量与奖励累计
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralStatsResponse {
    pub referral_code: Option<String>,
    pub total_referrals: i64,
    pub signed_up: i64,
    pub converted: i64,
    pub completed_3_months: i64,
    pub rewarded: i64,
    /// 已入账的推荐奖励（approved + paid，centavos）
    pub total_reward_earned: i64,
    /// 等待审批的推荐奖励（centavos）
    pub pending_reward_amount: i64,
}
