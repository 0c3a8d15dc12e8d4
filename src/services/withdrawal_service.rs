use crate::entities::{
    PaymentMethod, WithdrawalStatus, user_entity as users, withdrawal_entity as withdrawals,
};
use crate::error::{AppError, AppResult};
use crate::external::{BankAccount, PayoutGateway, PayoutStatus};
use crate::models::{
    CreateWithdrawalRequest, PaginatedResponse, PaginationParams, PaymentDetails, WithdrawalQuery,
    WithdrawalResponse,
};
use crate::utils::detect_pix_key_type;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 最低提现金额（centavos，R$20）
pub const MIN_WITHDRAWAL: i64 = 2_000;

/// 校验支付方式明细：pix 需要 pix_key，bank_transfer 需要全部六个银行字段
pub fn validate_payment_details(
    method: &PaymentMethod,
    details: &PaymentDetails,
) -> AppResult<()> {
    fn present(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    match method {
        PaymentMethod::Pix => {
            if !present(&details.pix_key) {
                return Err(AppError::ValidationError(
                    "Pix key is required for Pix withdrawals".to_string(),
                ));
            }
        }
        PaymentMethod::BankTransfer => {
            let required = [
                ("bank_name", &details.bank_name),
                ("bank_agency", &details.bank_agency),
                ("bank_account_number", &details.bank_account_number),
                ("bank_account_digit", &details.bank_account_digit),
                ("bank_account_type", &details.bank_account_type),
                ("bank_holder_name", &details.bank_holder_name),
            ];
            for (name, value) in required {
                if !present(value) {
                    return Err(AppError::ValidationError(format!(
                        "Missing bank transfer field: {}",
                        name
                    )));
                }
            }
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct WithdrawalService {
    pool: DatabaseConnection,
    gateway: PayoutGateway,
}

impl WithdrawalService {
    pub fn new(pool: DatabaseConnection, gateway: PayoutGateway) -> Self {
        Self { pool, gateway }
    }

    /// 创建提现请求并原子保留资金
    ///
    /// 余额校验与扣减合并为一条条件 UPDATE，
    /// 并发请求不可能把可用余额打成负数。
    pub async fn create_withdrawal(
        &self,
        user_id: i64,
        request: CreateWithdrawalRequest,
    ) -> AppResult<WithdrawalResponse> {
        if request.amount < MIN_WITHDRAWAL {
            return Err(AppError::ValidationError(format!(
                "Minimum withdrawal is {} centavos (R$20)",
                MIN_WITHDRAWAL
            )));
        }

        validate_payment_details(&request.payment_method, &request.payment_details)?;

        let details = request.payment_details;
        let pix_key_type = match request.payment_method {
            PaymentMethod::Pix => details.pix_key.as_deref().map(detect_pix_key_type),
            PaymentMethod::BankTransfer => None,
        };

        let txn = self.pool.begin().await?;

        // 资金保留：仅当可用余额足够时才扣减
        let hold = users::Entity::update_many()
            .col_expr(
                users::Column::RealMoneyBalance,
                Expr::col(users::Column::RealMoneyBalance).sub(request.amount),
            )
            .col_expr(
                users::Column::PendingWithdrawal,
                Expr::col(users::Column::PendingWithdrawal).add(request.amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::cust("NOW()"))
            .filter(users::Column::Id.eq(user_id))
            .filter(Expr::cust_with_values(
                "real_money_balance - pending_withdrawal >= ?",
                [request.amount],
            ))
            .exec(&txn)
            .await?;

        if hold.rows_affected == 0 {
            let user = users::Entity::find_by_id(user_id).one(&txn).await?;
            return match user {
                None => Err(AppError::NotFound("User not found".to_string())),
                Some(u) => Err(AppError::ValidationError(format!(
                    "Insufficient available balance: {} centavos available, {} requested",
                    u.real_money_balance - u.pending_withdrawal,
                    request.amount
                ))),
            };
        }

        let withdrawal = withdrawals::ActiveModel {
            user_id: Set(user_id),
            amount: Set(request.amount),
            payment_method: Set(request.payment_method),
            pix_key: Set(details.pix_key),
            pix_key_type: Set(pix_key_type),
            bank_name: Set(details.bank_name),
            bank_agency: Set(details.bank_agency),
            bank_account_number: Set(details.bank_account_number),
            bank_account_digit: Set(details.bank_account_digit),
            bank_account_type: Set(details.bank_account_type),
            bank_holder_name: Set(details.bank_holder_name),
            status: Set(WithdrawalStatus::Pending),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Withdrawal {} created: user {} reserved {} centavos via {}",
            withdrawal.id,
            user_id,
            withdrawal.amount,
            withdrawal.payment_method
        );

        Ok(withdrawal.into())
    }

    /// 审批通过；资金保持保留状态
    pub async fn approve_withdrawal(
        &self,
        withdrawal_id: i64,
        admin_id: i64,
    ) -> AppResult<WithdrawalResponse> {
        let txn = self.pool.begin().await?;

        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;

        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Withdrawal {} is {}, only pending withdrawals can be approved",
                withdrawal_id, withdrawal.status
            )));
        }

        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Approved);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(Utc::now()));
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Withdrawal {} approved by admin {}",
            withdrawal_id,
            admin_id
        );

        Ok(updated.into())
    }

    /// 驳回请求并解除资金保留（唯一把保留资金放回可用池的路径）
    pub async fn reject_withdrawal(
        &self,
        withdrawal_id: i64,
        admin_id: i64,
        reason: String,
    ) -> AppResult<WithdrawalResponse> {
        let txn = self.pool.begin().await?;

        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;

        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Withdrawal {} is {}, only pending withdrawals can be rejected",
                withdrawal_id, withdrawal.status
            )));
        }

        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;

        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Rejected);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(Utc::now()));
        am.rejection_reason = Set(Some(reason));
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        // 精确返还保留金额
        users::Entity::update_many()
            .col_expr(
                users::Column::RealMoneyBalance,
                Expr::col(users::Column::RealMoneyBalance).add(amount),
            )
            .col_expr(
                users::Column::PendingWithdrawal,
                Expr::col(users::Column::PendingWithdrawal).sub(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::cust("NOW()"))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        log::info!(
            "Withdrawal {} rejected by admin {}: {} centavos released back to user {}",
            withdrawal_id,
            admin_id,
            amount,
            user_id
        );

        Ok(updated.into())
    }

    /// 发起外部转账
    ///
    /// 行级排它锁 + approved 状态守卫保证资金只迁移一次；
    /// 按台账口径，金额在发起时即计入 total_withdrawn。
    pub async fn process_withdrawal(
        &self,
        withdrawal_id: i64,
        admin_id: i64,
    ) -> AppResult<WithdrawalResponse> {
        let txn = self.pool.begin().await?;

        let withdrawal = withdrawals::Entity::find_by_id(withdrawal_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))?;

        if withdrawal.status != WithdrawalStatus::Approved {
            return Err(AppError::InvalidState(format!(
                "Withdrawal {} is {}, only approved withdrawals can be processed",
                withdrawal_id, withdrawal.status
            )));
        }

        let reference = format!("wd-{}", withdrawal.id);
        let transaction_id = match withdrawal.payment_method {
            PaymentMethod::Pix => {
                let pix_key = withdrawal.pix_key.as_deref().ok_or_else(|| {
                    AppError::InternalError(format!(
                        "Withdrawal {} has no Pix key",
                        withdrawal_id
                    ))
                })?;
                let key_type = withdrawal
                    .pix_key_type
                    .clone()
                    .unwrap_or_else(|| detect_pix_key_type(pix_key));
                self.gateway
                    .send_pix(pix_key, &key_type, withdrawal.amount, &reference)
                    .await?
            }
            PaymentMethod::BankTransfer => {
                let account = BankAccount {
                    bank_name: withdrawal.bank_name.as_deref().unwrap_or_default(),
                    agency: withdrawal.bank_agency.as_deref().unwrap_or_default(),
                    account_number: withdrawal
                        .bank_account_number
                        .as_deref()
                        .unwrap_or_default(),
                    account_digit: withdrawal
                        .bank_account_digit
                        .as_deref()
                        .unwrap_or_default(),
                    account_type: withdrawal.bank_account_type.as_deref().unwrap_or_default(),
                    holder_name: withdrawal.bank_holder_name.as_deref().unwrap_or_default(),
                };
                self.gateway
                    .send_bank_transfer(&account, withdrawal.amount, &reference)
                    .await?
            }
        };

        let user_id = withdrawal.user_id;
        let amount = withdrawal.amount;

        let mut am = withdrawal.into_active_model();
        am.status = Set(WithdrawalStatus::Processing);
        am.transaction_id = Set(Some(transaction_id.clone()));
        am.processed_by = Set(Some(admin_id));
        am.processed_at = Set(Some(Utc::now()));
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(&txn).await?;

        // 保留资金结转为累计提现
        users::Entity::update_many()
            .col_expr(
                users::Column::PendingWithdrawal,
                Expr::col(users::Column::PendingWithdrawal).sub(amount),
            )
            .col_expr(
                users::Column::TotalWithdrawn,
                Expr::col(users::Column::TotalWithdrawn).add(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::cust("NOW()"))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        log::info!(
            "Withdrawal {} processing: transaction {} dispatched by admin {}",
            withdrawal_id,
            transaction_id,
            admin_id
        );

        Ok(updated.into())
    }

    /// 轮询 processing 中的提现，向网关确认结果
    ///
    /// 工作集来自数据库，进程重启不丢失；失败会写入 failure_reason
    /// 而不是被吞掉。返回状态发生变化的行数。
    pub async fn poll_processing_withdrawals(&self) -> AppResult<u64> {
        let processing = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Processing))
            .all(&self.pool)
            .await?;

        let mut settled = 0u64;

        for withdrawal in processing {
            let Some(transaction_id) = withdrawal.transaction_id.clone() else {
                log::error!(
                    "Withdrawal {} is processing without a transaction id",
                    withdrawal.id
                );
                continue;
            };

            let status = match self.gateway.payment_status(&transaction_id).await {
                Ok(status) => status,
                Err(e) => {
                    log::error!(
                        "Payout status lookup failed for withdrawal {}: {:?}",
                        withdrawal.id,
                        e
                    );
                    continue;
                }
            };

            match status {
                PayoutStatus::Processing => {}
                PayoutStatus::Completed => {
                    let id = withdrawal.id;
                    let mut am = withdrawal.into_active_model();
                    am.status = Set(WithdrawalStatus::Completed);
                    am.updated_at = Set(Some(Utc::now()));
                    am.update(&self.pool).await?;
                    settled += 1;
                    log::info!("Withdrawal {} completed ({})", id, transaction_id);
                }
                PayoutStatus::Failed(reason) => {
                    let id = withdrawal.id;
                    let mut am = withdrawal.into_active_model();
                    am.status = Set(WithdrawalStatus::Failed);
                    am.failure_reason = Set(Some(reason.clone()));
                    am.updated_at = Set(Some(Utc::now()));
                    am.update(&self.pool).await?;
                    settled += 1;
                    log::error!(
                        "Withdrawal {} failed at provider ({}): {}",
                        id,
                        transaction_id,
                        reason
                    );
                }
            }
        }

        Ok(settled)
    }

    pub async fn get_user_withdrawals(
        &self,
        user_id: i64,
        query: &WithdrawalQuery,
    ) -> AppResult<PaginatedResponse<WithdrawalResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query =
            withdrawals::Entity::find().filter(withdrawals::Column::UserId.eq(user_id));

        if let Some(status) = &query.status {
            base_query = base_query.filter(withdrawals::Column::Status.eq(status.clone()));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by(withdrawals::Column::CreatedAt, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(WithdrawalResponse::from).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    /// 管理员审批队列（所有用户的 pending 提现）
    pub async fn get_pending_withdrawals(
        &self,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> AppResult<PaginatedResponse<WithdrawalResponse>> {
        let params = PaginationParams::new(page, per_page);

        let base_query = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by(withdrawals::Column::CreatedAt, Order::Asc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(WithdrawalResponse::from).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pix_details(key: &str) -> PaymentDetails {
        PaymentDetails {
            pix_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    fn bank_details() -> PaymentDetails {
        PaymentDetails {
            pix_key: None,
            bank_name: Some("Banco do Brasil".to_string()),
            bank_agency: Some("1234".to_string()),
            bank_account_number: Some("56789".to_string()),
            bank_account_digit: Some("0".to_string()),
            bank_account_type: Some("checking".to_string()),
            bank_holder_name: Some("Maria Silva".to_string()),
        }
    }

    #[test]
    fn test_minimum_withdrawal_constant() {
        // R$20
        assert_eq!(MIN_WITHDRAWAL, 2_000);
    }

    #[test]
    fn test_validate_pix_details() {
        assert!(
            validate_payment_details(&PaymentMethod::Pix, &pix_details("user@example.com"))
                .is_ok()
        );
        assert!(
            validate_payment_details(&PaymentMethod::Pix, &PaymentDetails::default()).is_err()
        );
        assert!(validate_payment_details(&PaymentMethod::Pix, &pix_details("  ")).is_err());
    }

    #[test]
    fn test_validate_bank_details_requires_all_fields() {
        assert!(validate_payment_details(&PaymentMethod::BankTransfer, &bank_details()).is_ok());

        let mut missing = bank_details();
        missing.bank_account_digit = None;
        let err = validate_payment_details(&PaymentMethod::BankTransfer, &missing).unwrap_err();
        assert!(err.to_string().contains("bank_account_digit"));
    }

    #[test]
    fn test_pix_key_ignored_for_bank_transfer() {
        // bank_transfer 不要求 pix_key
        let details = bank_details();
        assert!(validate_payment_details(&PaymentMethod::BankTransfer, &details).is_ok());
    }
}
