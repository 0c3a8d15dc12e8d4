use crate::entities::{
    EarningSource, EarningStatus, SubscriptionTier, earning_entity as earnings,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CanEarnResult, EarningQuery, EarningResponse, EarningStatsResponse, MonthlyCapStatus,
    PaginatedResponse, PaginationParams, SourceBreakdown,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

/// 各订阅档位的月度收益上限（centavos）
/// VIP 档保留数值上限，不按“无限”处理
pub fn earning_cap(tier: &SubscriptionTier) -> i64 {
    match tier {
        SubscriptionTier::Free => 3_000,     // R$30
        SubscriptionTier::Academy => 15_000, // R$150
        SubscriptionTier::Vip => 50_000,     // R$500
    }
}

/// 当前月度桶，"YYYY-MM"
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

fn remaining_cap(current: i64, cap: i64) -> i64 {
    (cap - current).max(0)
}

#[derive(Clone)]
pub struct EarningService {
    pool: DatabaseConnection,
}

impl EarningService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 统计某月已入账收益（approved + paid）
    async fn month_total<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        period: &str,
    ) -> AppResult<i64> {
        let amounts: Vec<i64> = earnings::Entity::find()
            .select_only()
            .column(earnings::Column::Amount)
            .filter(earnings::Column::UserId.eq(user_id))
            .filter(earnings::Column::MonthlyPeriod.eq(period))
            .filter(
                earnings::Column::Status
                    .is_in([EarningStatus::Approved, EarningStatus::Paid]),
            )
            .into_tuple()
            .all(conn)
            .await?;
        Ok(amounts.iter().sum())
    }

    /// 判断当月还能否入账指定金额
    pub async fn can_earn(&self, user_id: i64, amount: i64) -> AppResult<CanEarnResult> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let period = current_month();
        let current = self.month_total(&self.pool, user_id, &period).await?;
        let cap = earning_cap(&user.tier);

        Ok(CanEarnResult {
            can_earn: current + amount <= cap,
            current_earnings: current,
            cap,
            remaining: remaining_cap(current, cap),
        })
    }

    /// 台账唯一的入账写路径
    ///
    /// referral 来源先落 pending 等待审批，其余来源直接 approved 并立即入余额。
    /// 校验与写入在同一事务内，用户行加排它锁，杜绝并发绕过上限。
    pub async fn record_earning(
        &self,
        user_id: i64,
        amount: i64,
        source: EarningSource,
        related_type: Option<String>,
        related_id: Option<String>,
        description: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> AppResult<earnings::Model> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Earning amount must be positive".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        // 锁定用户行，串行化同一用户的上限检查
        let user = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let period = current_month();
        let current = self.month_total(&txn, user_id, &period).await?;
        let cap = earning_cap(&user.tier);

        if current + amount > cap {
            return Err(AppError::CapExceeded {
                current,
                cap,
                remaining: remaining_cap(current, cap),
            });
        }

        let status = if source == EarningSource::Referral {
            EarningStatus::Pending
        } else {
            EarningStatus::Approved
        };

        let earning = earnings::ActiveModel {
            user_id: Set(user_id),
            amount: Set(amount),
            source: Set(source),
            status: Set(status.clone()),
            tier_at_time: Set(user.tier.clone()),
            monthly_period: Set(period),
            related_type: Set(related_type),
            related_id: Set(related_id),
            description: Set(description),
            metadata: Set(metadata),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 自动审批的来源立即入余额
        if status == EarningStatus::Approved {
            self.credit_balance(&txn, user_id, amount).await?;
        }

        txn.commit().await?;

        log::info!(
            "Recorded earning {} for user {}: {} centavos from {} ({})",
            earning.id,
            user_id,
            amount,
            earning.source,
            earning.status
        );

        Ok(earning)
    }

    /// 审批 referral 收益；此刻才重查上限并入余额
    pub async fn approve_earning(
        &self,
        earning_id: i64,
        admin_id: i64,
    ) -> AppResult<earnings::Model> {
        let txn = self.pool.begin().await?;

        let earning = earnings::Entity::find_by_id(earning_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Earning not found".to_string()))?;

        if earning.status != EarningStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Earning {} is {}, only pending earnings can be approved",
                earning_id, earning.status
            )));
        }

        let user = users::Entity::find_by_id(earning.user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 创建之后其它收益可能已占满当月额度，审批时按原月度桶重查
        let current = self
            .month_total(&txn, earning.user_id, &earning.monthly_period)
            .await?;
        let cap = earning_cap(&user.tier);
        if current + earning.amount > cap {
            return Err(AppError::CapExceeded {
                current,
                cap,
                remaining: remaining_cap(current, cap),
            });
        }

        let user_id = earning.user_id;
        let amount = earning.amount;

        let mut am = earning.into_active_model();
        am.status = Set(EarningStatus::Approved);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        self.credit_balance(&txn, user_id, amount).await?;

        txn.commit().await?;

        log::info!(
            "Earning {} approved by admin {}: {} centavos credited to user {}",
            earning_id,
            admin_id,
            amount,
            user_id
        );

        Ok(updated)
    }

    /// 驳回 pending 收益；pending 从未入过余额，无需回滚资金
    pub async fn reject_earning(
        &self,
        earning_id: i64,
        admin_id: i64,
        reason: String,
    ) -> AppResult<earnings::Model> {
        let txn = self.pool.begin().await?;

        let earning = earnings::Entity::find_by_id(earning_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Earning not found".to_string()))?;

        if earning.status != EarningStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Earning {} is {}, only pending earnings can be rejected",
                earning_id, earning.status
            )));
        }

        let mut am = earning.into_active_model();
        am.status = Set(EarningStatus::Rejected);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(Utc::now()));
        am.rejection_reason = Set(Some(reason));
        let updated = am.update(&txn).await?;

        txn.commit().await?;

        log::info!("Earning {} rejected by admin {}", earning_id, admin_id);

        Ok(updated)
    }

    pub async fn get_user_earnings(
        &self,
        user_id: i64,
        query: &EarningQuery,
    ) -> AppResult<PaginatedResponse<EarningResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query =
            earnings::Entity::find().filter(earnings::Column::UserId.eq(user_id));

        if let Some(status) = &query.status {
            base_query = base_query.filter(earnings::Column::Status.eq(status.clone()));
        }
        if let Some(source) = &query.source {
            base_query = base_query.filter(earnings::Column::Source.eq(source.clone()));
        }
        if let Some(period) = &query.monthly_period {
            base_query = base_query.filter(earnings::Column::MonthlyPeriod.eq(period.clone()));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by(earnings::Column::CreatedAt, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(EarningResponse::from).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    /// 管理员审批队列（所有用户的 pending 收益）
    pub async fn get_pending_earnings(
        &self,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> AppResult<PaginatedResponse<EarningResponse>> {
        let params = PaginationParams::new(page, per_page);

        let base_query =
            earnings::Entity::find().filter(earnings::Column::Status.eq(EarningStatus::Pending));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by(earnings::Column::CreatedAt, Order::Asc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(EarningResponse::from).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    pub async fn get_user_earning_stats(&self, user_id: i64) -> AppResult<EarningStatsResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let rows = earnings::Entity::find()
            .filter(earnings::Column::UserId.eq(user_id))
            .all(&self.pool)
            .await?;

        let period = current_month();
        let cap = earning_cap(&user.tier);

        let mut total_earned = 0i64;
        let mut pending_amount = 0i64;
        let mut month_earned = 0i64;
        let mut by_source: Vec<SourceBreakdown> = Vec::new();

        for e in &rows {
            match e.status {
                EarningStatus::Approved | EarningStatus::Paid => {
                    total_earned += e.amount;
                    if e.monthly_period == period {
                        month_earned += e.amount;
                    }
                    if let Some(entry) =
                        by_source.iter_mut().find(|s| s.source == e.source)
                    {
                        entry.total += e.amount;
                    } else {
                        by_source.push(SourceBreakdown {
                            source: e.source.clone(),
                            total: e.amount,
                        });
                    }
                }
                EarningStatus::Pending => pending_amount += e.amount,
                EarningStatus::Rejected => {}
            }
        }

        Ok(EarningStatsResponse {
            total_earned,
            pending_amount,
            current_month: MonthlyCapStatus {
                period,
                earned: month_earned,
                cap,
                remaining: remaining_cap(month_earned, cap),
            },
            by_source,
        })
    }

    /// 原子加余额与累计收益（不做读-改-写）
    async fn credit_balance<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        amount: i64,
    ) -> AppResult<()> {
        users::Entity::update_many()
            .col_expr(
                users::Column::RealMoneyBalance,
                Expr::col(users::Column::RealMoneyBalance).add(amount),
            )
            .col_expr(
                users::Column::TotalEarned,
                Expr::col(users::Column::TotalEarned).add(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::cust("NOW()"))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earning_cap_table() {
        assert_eq!(earning_cap(&SubscriptionTier::Free), 3_000);
        assert_eq!(earning_cap(&SubscriptionTier::Academy), 15_000);
        assert_eq!(earning_cap(&SubscriptionTier::Vip), 50_000);
    }

    #[test]
    fn test_current_month_format() {
        let period = current_month();
        assert_eq!(period.len(), 7);
        let (year, month) = period.split_once('-').unwrap();
        assert_eq!(year.len(), 4);
        assert!(year.parse::<u32>().is_ok());
        let month: u32 = month.parse().unwrap();
        assert!((1..=12).contains(&month));
    }

    #[test]
    fn test_remaining_cap() {
        assert_eq!(remaining_cap(0, 3_000), 3_000);
        assert_eq!(remaining_cap(2_500, 3_000), 500);
        assert_eq!(remaining_cap(3_000, 3_000), 0);
        // 超额历史数据不产生负剩余
        assert_eq!(remaining_cap(5_000, 3_000), 0);
    }

    #[test]
    fn test_free_tier_cap_scenario() {
        // 免费档已入账 R$25，再入 R$10 必须触顶
        let current = 2_500;
        let cap = earning_cap(&SubscriptionTier::Free);
        assert!(current + 1_000 > cap);
        // R$5 以内仍可入账
        assert!(current + 500 <= cap);
    }
}
