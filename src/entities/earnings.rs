use crate::entities::users::SubscriptionTier;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "earning_source")]
#[serde(rename_all = "snake_case")]
pub enum EarningSource {
    #[sea_orm(string_value = "referral")]
    Referral,
    #[sea_orm(string_value = "content_creation")]
    ContentCreation,
    #[sea_orm(string_value = "mission")]
    Mission,
    #[sea_orm(string_value = "streak")]
    Streak,
    #[sea_orm(string_value = "achievement")]
    Achievement,
    #[sea_orm(string_value = "daily_login")]
    DailyLogin,
    #[sea_orm(string_value = "challenge")]
    Challenge,
}

impl std::fmt::Display for EarningSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EarningSource::Referral => write!(f, "referral"),
            EarningSource::ContentCreation => write!(f, "content_creation"),
            EarningSource::Mission => write!(f, "mission"),
            EarningSource::Streak => write!(f, "streak"),
            EarningSource::Achievement => write!(f, "achievement"),
            EarningSource::DailyLogin => write!(f, "daily_login"),
            EarningSource::Challenge => write!(f, "challenge"),
        }
    }
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "earning_status")]
#[serde(rename_all = "snake_case")]
pub enum EarningStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl std::fmt::Display for EarningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EarningStatus::Pending => write!(f, "pending"),
            EarningStatus::Approved => write!(f, "approved"),
            EarningStatus::Rejected => write!(f, "rejected"),
            EarningStatus::Paid => write!(f, "paid"),
        }
    }
}

/// 收益台账行：一旦写入金额与来源不再修改，仅状态可变
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "earnings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// 金额（centavos，> 0）
    pub amount: i64,
    pub source: EarningSource,
    pub status: EarningStatus,
    /// 创建时用户所处的订阅档位快照
    pub tier_at_time: SubscriptionTier,
    /// 计入月度上限的 "YYYY-MM" 桶
    pub monthly_period: String,
    pub related_type: Option<String>,
    pub related_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Json>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
