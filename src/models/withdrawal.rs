use crate::entities::{
    PaymentMethod, PixKeyType, WithdrawalStatus, withdrawal_entity as withdrawals,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 支付方式明细：pix 只需 pix_key；bank_transfer 需要全部银行字段
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentDetails {
    #[schema(example = "maria@example.com")]
    pub pix_key: Option<String>,
    pub bank_name: Option<String>,
    pub bank_agency: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_digit: Option<String>,
    pub bank_account_type: Option<String>,
    pub bank_holder_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWithdrawalRequest {
    /// 金额（centavos，最低 2000 = R$20）
    #[schema(example = 2000)]
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalQuery {
    pub status: Option<WithdrawalStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub pix_key: Option<String>,
    pub pix_key_type: Option<PixKeyType>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub status: WithdrawalStatus,
    pub transaction_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<withdrawals::Model> for WithdrawalResponse {
    fn from(w: withdrawals::Model) -> Self {
        Self {
            id: w.id,
            user_id: w.user_id,
            amount: w.amount,
            payment_method: w.payment_method,
            pix_key: w.pix_key,
            pix_key_type: w.pix_key_type,
            bank_name: w.bank_name,
            bank_account_number: w.bank_account_number,
            status: w.status,
            transaction_id: w.transaction_id,
            rejection_reason: w.rejection_reason,
            failure_reason: w.failure_reason,
            created_at: w.created_at.unwrap_or_else(Utc::now),
            updated_at: w.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectWithdrawalRequest {
    #[schema(example = "Payout details do not match account holder")]
    pub reason: String,
}
