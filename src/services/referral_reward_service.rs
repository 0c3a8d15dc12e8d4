use crate::entities::{
    EarningSource, EarningStatus, ReferralStatus, earning_entity as earnings,
    referral_entity as referrals, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{ReferralResponse, ReferralStatsResponse};
use crate::services::EarningService;
use crate::utils::generate_referral_code;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

/// 推荐奖励表（centavos），全部计给推荐人
pub const REFERRAL_SIGNUP_REWARD: i64 = 500;
pub const REFERRAL_CONVERSION_REWARD: i64 = 2_000;
pub const REFERRAL_RETENTION_REWARD: i64 = 3_000;

/// 转化后满多少天算留存达标
pub const RETENTION_DAYS: i64 = 90;

/// 推荐生命周期 -> 收益台账的适配层
///
/// 每个阶段的奖励以 (source, related_type, related_id) 去重，至多发放一次。
/// referral 来源的收益统一走 pending，由管理员审批后才入余额。
#[derive(Clone)]
pub struct ReferralRewardService {
    pool: DatabaseConnection,
    earning_service: EarningService,
}

impl ReferralRewardService {
    pub fn new(pool: DatabaseConnection, earning_service: EarningService) -> Self {
        Self {
            pool,
            earning_service,
        }
    }

    /// 分配一个未被占用的推荐码（唯一索引兜底，冲突重试）
    pub async fn allocate_code(&self) -> AppResult<String> {
        for _ in 0..5 {
            let code = generate_referral_code();
            let taken = users::Entity::find()
                .filter(users::Column::ReferralCode.eq(code.clone()))
                .count(&self.pool)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
        }
        Err(AppError::InternalError(
            "Failed to allocate a unique referral code".to_string(),
        ))
    }

    /// 读取（必要时补发）用户的推荐码
    pub async fn get_or_create_code(&self, user_id: i64) -> AppResult<String> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(code) = user.referral_code.clone() {
            return Ok(code);
        }

        let code = self.allocate_code().await?;
        let mut am = user.into_active_model();
        am.referral_code = Set(Some(code.clone()));
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;

        Ok(code)
    }

    /// 按推荐码查推荐人
    pub async fn find_referrer_by_code(&self, code: &str) -> AppResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::ReferralCode.eq(code))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::ValidationError("Referral code not found".to_string()))
    }

    /// 注册阶段：建立漏斗记录并给推荐人发注册奖励
    pub async fn handle_signup(
        &self,
        referrer_id: i64,
        referral_code: &str,
        referee_id: i64,
    ) -> AppResult<ReferralResponse> {
        if referrer_id == referee_id {
            return Err(AppError::ValidationError(
                "Users cannot refer themselves".to_string(),
            ));
        }

        // 一个被推荐人只进一次漏斗
        let existing = referrals::Entity::find()
            .filter(referrals::Column::RefereeId.eq(referee_id))
            .one(&self.pool)
            .await?;
        if let Some(existing) = existing {
            return Ok(existing.into());
        }

        let referral = referrals::ActiveModel {
            referrer_id: Set(referrer_id),
            referee_id: Set(Some(referee_id)),
            referral_code: Set(referral_code.to_string()),
            status: Set(ReferralStatus::SignedUp),
            signed_up_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.grant_stage_reward(
            &referral,
            REFERRAL_SIGNUP_REWARD,
            "referral_signup",
            format!("Referral {} signed up", referee_id),
        )
        .await?;

        log::info!(
            "Referral {}: user {} signed up via code {} from referrer {}",
            referral.id,
            referee_id,
            referral_code,
            referrer_id
        );

        Ok(referral.into())
    }

    /// 转化阶段：被推荐人购买订阅（由订阅侧回调/管理员确认）
    pub async fn handle_conversion(&self, referral_id: i64) -> AppResult<ReferralResponse> {
        let txn = self.pool.begin().await?;

        let referral = referrals::Entity::find_by_id(referral_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Referral not found".to_string()))?;

        if referral.status != ReferralStatus::SignedUp {
            return Err(AppError::InvalidState(format!(
                "Referral {} is {}, only signed_up referrals can convert",
                referral_id, referral.status
            )));
        }

        let mut am = referral.into_active_model();
        am.status = Set(ReferralStatus::Converted);
        am.converted_at = Set(Some(Utc::now()));
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        txn.commit().await?;

        self.grant_stage_reward(
            &updated,
            REFERRAL_CONVERSION_REWARD,
            "referral_conversion",
            format!("Referral {} converted to a paid plan", referral_id),
        )
        .await?;

        log::info!("Referral {} converted", referral_id);

        Ok(updated.into())
    }

    /// 留存扫描：转化满 90 天的推荐推进到 completed_3_months 并发留存奖励
    ///
    /// 奖励成功入账后推进到 rewarded；触顶被丢弃的留在 completed_3_months，
    /// 漏斗状态如实反映奖励未发出。返回推进的行数。
    pub async fn run_retention_sweep(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);

        let due = referrals::Entity::find()
            .filter(referrals::Column::Status.eq(ReferralStatus::Converted))
            .filter(referrals::Column::ConvertedAt.lte(cutoff))
            .all(&self.pool)
            .await?;

        let mut advanced = 0u64;

        for referral in due {
            let txn = self.pool.begin().await?;

            let Some(locked) = referrals::Entity::find_by_id(referral.id)
                .lock_exclusive()
                .one(&txn)
                .await?
            else {
                continue;
            };
            if locked.status != ReferralStatus::Converted {
                continue;
            }

            let mut am = locked.into_active_model();
            am.status = Set(ReferralStatus::Completed3Months);
            am.completed_at = Set(Some(Utc::now()));
            am.updated_at = Set(Some(Utc::now()));
            let completed = am.update(&txn).await?;

            txn.commit().await?;
            advanced += 1;

            let rewarded = self
                .grant_stage_reward(
                    &completed,
                    REFERRAL_RETENTION_REWARD,
                    "referral_retention",
                    format!("Referral {} retained for 3 months", completed.id),
                )
                .await?;

            if rewarded {
                let mut am = completed.into_active_model();
                am.status = Set(ReferralStatus::Rewarded);
                am.updated_at = Set(Some(Utc::now()));
                am.update(&self.pool).await?;
            }
        }

        if advanced > 0 {
            log::info!("Retention sweep advanced {} referrals", advanced);
        }

        Ok(advanced)
    }

    /// 推荐人的漏斗与奖励统计
    pub async fn get_stats(&self, user_id: i64) -> AppResult<ReferralStatsResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let rows = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(user_id))
            .all(&self.pool)
            .await?;

        let mut signed_up = 0i64;
        let mut converted = 0i64;
        let mut completed_3_months = 0i64;
        let mut rewarded = 0i64;
        for r in &rows {
            match r.status {
                ReferralStatus::Pending => {}
                ReferralStatus::SignedUp => signed_up += 1,
                ReferralStatus::Converted => converted += 1,
                ReferralStatus::Completed3Months => completed_3_months += 1,
                ReferralStatus::Rewarded => rewarded += 1,
            }
        }

        let reward_rows = earnings::Entity::find()
            .filter(earnings::Column::UserId.eq(user_id))
            .filter(earnings::Column::Source.eq(EarningSource::Referral))
            .all(&self.pool)
            .await?;

        let mut total_reward_earned = 0i64;
        let mut pending_reward_amount = 0i64;
        for e in &reward_rows {
            match e.status {
                EarningStatus::Approved | EarningStatus::Paid => total_reward_earned += e.amount,
                EarningStatus::Pending => pending_reward_amount += e.amount,
                EarningStatus::Rejected => {}
            }
        }

        Ok(ReferralStatsResponse {
            referral_code: user.referral_code,
            total_referrals: rows.len() as i64,
            signed_up,
            converted,
            completed_3_months,
            rewarded,
            total_reward_earned,
            pending_reward_amount,
        })
    }

    /// 幂等发放某阶段奖励；返回是否实际入账
    async fn grant_stage_reward(
        &self,
        referral: &referrals::Model,
        amount: i64,
        stage: &str,
        description: String,
    ) -> AppResult<bool> {
        let related_id = referral.id.to_string();

        let existing = earnings::Entity::find()
            .filter(earnings::Column::UserId.eq(referral.referrer_id))
            .filter(earnings::Column::Source.eq(EarningSource::Referral))
            .filter(earnings::Column::RelatedType.eq(stage))
            .filter(earnings::Column::RelatedId.eq(related_id.clone()))
            .count(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        match self
            .earning_service
            .record_earning(
                referral.referrer_id,
                amount,
                EarningSource::Referral,
                Some(stage.to_string()),
                Some(related_id),
                Some(description),
                Some(json!({
                    "referral_id": referral.id,
                    "referee_id": referral.referee_id,
                    "stage": stage,
                })),
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(AppError::CapExceeded { current, cap, .. }) => {
                log::warn!(
                    "Dropping {} reward for referrer {}: monthly cap reached ({}/{})",
                    stage,
                    referral.referrer_id,
                    current,
                    cap
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_reward_table() {
        assert_eq!(REFERRAL_SIGNUP_REWARD, 500);
        assert_eq!(REFERRAL_CONVERSION_REWARD, 2_000);
        assert_eq!(REFERRAL_RETENTION_REWARD, 3_000);
        assert_eq!(RETENTION_DAYS, 90);
    }
}
