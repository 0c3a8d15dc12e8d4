use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "referral_status")]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "signed_up")]
    SignedUp,
    #[sea_orm(string_value = "converted")]
    Converted,
    #[sea_orm(string_value = "completed_3_months")]
    Completed3Months,
    #[sea_orm(string_value = "rewarded")]
    Rewarded,
}

impl std::fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferralStatus::Pending => write!(f, "pending"),
            ReferralStatus::SignedUp => write!(f, "signed_up"),
            ReferralStatus::Converted => write!(f, "converted"),
            ReferralStatus::Completed3Months => write!(f, "completed_3_months"),
            ReferralStatus::Rewarded => write!(f, "rewarded"),
        }
    }
}

/// 推荐漏斗：每个被推荐人一行，随生命周期推进触发推荐人收益
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub referrer_id: i64,
    pub referee_id: Option<i64>,
    /// 注册时使用的推荐码（即推荐人 users.referral_code）
    pub referral_code: String,
    pub status: ReferralStatus,
    pub signed_up_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
