use crate::config::PayoutConfig;
use crate::entities::PixKeyType;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 网关侧的转账状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutStatus {
    Processing,
    Completed,
    Failed(String),
}

/// 银行转账收款账户（六个必填字段）
#[derive(Debug, Serialize)]
pub struct BankAccount<'a> {
    pub bank_name: &'a str,
    pub agency: &'a str,
    pub account_number: &'a str,
    pub account_digit: &'a str,
    pub account_type: &'a str,
    pub holder_name: &'a str,
}

#[derive(Debug, Serialize)]
struct PixPayoutRequest<'a> {
    key: &'a str,
    key_type: String,
    amount_cents: i64,
    reference: &'a str,
}

#[derive(Debug, Serialize)]
struct BankPayoutRequest<'a> {
    #[serde(flatten)]
    account: &'a BankAccount<'a>,
    amount_cents: i64,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct PayoutCreatedResponse {
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct PayoutStatusResponse {
    status: String,
    failure_reason: Option<String>,
}

#[derive(Clone)]
pub struct PayoutGateway {
    client: Client,
    config: PayoutConfig,
}

impl PayoutGateway {
    pub fn new(config: PayoutConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 发起 Pix 转账，返回网关交易号
    pub async fn send_pix(
        &self,
        pix_key: &str,
        pix_key_type: &PixKeyType,
        amount: i64,
        reference: &str,
    ) -> AppResult<String> {
        if self.config.simulate {
            let transaction_id = format!("SIM-PIX-{}", Uuid::new_v4());
            log::info!(
                "Simulated Pix payout of {} centavos to {} key ({})",
                amount,
                pix_key_type,
                transaction_id
            );
            return Ok(transaction_id);
        }

        let url = format!("{}/v1/payouts/pix", self.config.base_url);
        let body = PixPayoutRequest {
            key: pix_key,
            key_type: pix_key_type.to_string(),
            amount_cents: amount,
            reference,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            let created: PayoutCreatedResponse = response.json().await?;
            log::info!(
                "Pix payout dispatched: {} ({} centavos)",
                created.transaction_id,
                amount
            );
            Ok(created.transaction_id)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Pix payout dispatch failed: {}", error_text);
            Err(AppError::ExternalApiError(format!(
                "Pix payout failed: {}",
                error_text
            )))
        }
    }

    /// 发起银行转账（TED），返回网关交易号
    pub async fn send_bank_transfer(
        &self,
        account: &BankAccount<'_>,
        amount: i64,
        reference: &str,
    ) -> AppResult<String> {
        if self.config.simulate {
            let transaction_id = format!("SIM-TED-{}", Uuid::new_v4());
            log::info!(
                "Simulated bank transfer of {} centavos to {} ({})",
                amount,
                account.bank_name,
                transaction_id
            );
            return Ok(transaction_id);
        }

        let url = format!("{}/v1/payouts/bank-transfer", self.config.base_url);
        let body = BankPayoutRequest {
            account,
            amount_cents: amount,
            reference,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            let created: PayoutCreatedResponse = response.json().await?;
            log::info!(
                "Bank transfer dispatched: {} ({} centavos)",
                created.transaction_id,
                amount
            );
            Ok(created.transaction_id)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Bank transfer dispatch failed: {}", error_text);
            Err(AppError::ExternalApiError(format!(
                "Bank transfer failed: {}",
                error_text
            )))
        }
    }

    /// 查询转账状态，供后台轮询任务使用
    pub async fn payment_status(&self, transaction_id: &str) -> AppResult<PayoutStatus> {
        if self.config.simulate {
            // 模拟模式下转账总是立即结算
            return Ok(PayoutStatus::Completed);
        }

        let url = format!("{}/v1/payouts/{}", self.config.base_url, transaction_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Payout status lookup failed: {}",
                error_text
            )));
        }

        let status: PayoutStatusResponse = response.json().await?;
        match status.status.as_str() {
            "completed" | "settled" => Ok(PayoutStatus::Completed),
            "failed" | "returned" => Ok(PayoutStatus::Failed(
                status
                    .failure_reason
                    .unwrap_or_else(|| "Payout failed at provider".to_string()),
            )),
            _ => Ok(PayoutStatus::Processing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulated_gateway() -> PayoutGateway {
        PayoutGateway::new(PayoutConfig {
            base_url: "http://localhost:0".to_string(),
            api_key: String::new(),
            simulate: true,
        })
    }

    #[tokio::test]
    async fn test_simulated_pix_payout() {
        let gateway = simulated_gateway();
        let txn = gateway
            .send_pix("user@example.com", &PixKeyType::Email, 2000, "wd-1")
            .await
            .unwrap();
        assert!(txn.starts_with("SIM-PIX-"));

        let status = gateway.payment_status(&txn).await.unwrap();
        assert_eq!(status, PayoutStatus::Completed);
    }

    #[tokio::test]
    async fn test_simulated_bank_transfer() {
        let gateway = simulated_gateway();
        let account = BankAccount {
            bank_name: "Banco do Brasil",
            agency: "1234",
            account_number: "56789",
            account_digit: "0",
            account_type: "checking",
            holder_name: "Maria Silva",
        };
        let txn = gateway
            .send_bank_transfer(&account, 5000, "wd-2")
            .await
            .unwrap();
        assert!(txn.starts_with("SIM-TED-"));
    }
}
