use crate::entities::{EarningSource, EarningStatus, SubscriptionTier, earning_entity as earnings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordEarningRequest {
    /// 金额（centavos，必须为正）
    #[schema(example = 500)]
    pub amount: i64,
    pub source: EarningSource,
    pub related_type: Option<String>,
    pub related_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EarningQuery {
    pub status: Option<EarningStatus>,
    pub source: Option<EarningSource>,
    /// "YYYY-MM"
    pub monthly_period: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EarningResponse {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub source: EarningSource,
    pub status: EarningStatus,
    pub tier_at_time: SubscriptionTier,
    pub monthly_period: String,
    pub related_type: Option<String>,
    pub related_id: Option<String>,
    pub description: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<earnings::Model> for EarningResponse {
    fn from(e: earnings::Model) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            amount: e.amount,
            source: e.source,
            status: e.status,
            tier_at_time: e.tier_at_time,
            monthly_period: e.monthly_period,
            related_type: e.related_type,
            related_id: e.related_id,
            description: e.description,
            reviewed_at: e.reviewed_at,
            rejection_reason: e.rejection_reason,
            created_at: e.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CanEarnQuery {
    /// 预检金额（centavos）
    pub amount: i64,
}

/// can_earn 的判定结果：当前月累计、上限与剩余额度
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CanEarnResult {
    pub can_earn: bool,
    pub current_earnings: i64,
    pub cap: i64,
    pub remaining: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlyCapStatus {
    pub period: String,
    pub earned: i64,
    pub cap: i64,
    pub remaining: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourceBreakdown {
    pub source: EarningSource,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EarningStatsResponse {
    /// 历史累计（approved + paid）
    pub total_earned: i64,
    /// 等待审批的 referral 收益
    pub pending_amount: i64,
    pub current_month: MonthlyCapStatus,
    pub by_source: Vec<SourceBreakdown>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectEarningRequest {
    #[schema(example = "Referral did not pass fraud review")]
    pub reason: String,
}
