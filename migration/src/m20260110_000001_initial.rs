use sea_orm_migration::prelude::*;
use sea_orm_migration::prelude::extension::postgres::Type;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    Role,
    Tier,
    RealMoneyBalance,
    PendingWithdrawal,
    TotalEarned,
    TotalWithdrawn,
    ReferrerId,
    ReferralCode,
    CreatedAt,
    UpdatedAt,
}

/// 收益台账（append-only，状态可变）
#[derive(DeriveIden)]
enum Earnings {
    Table,
    Id,
    UserId,
    Amount,
    Source,
    Status,
    TierAtTime,
    MonthlyPeriod,
    RelatedType,
    RelatedId,
    Description,
    Metadata,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    PaymentMethod,
    PixKey,
    PixKeyType,
    BankName,
    BankAgency,
    BankAccountNumber,
    BankAccountDigit,
    BankAccountType,
    BankHolderName,
    Status,
    TransactionId,
    ReviewedBy,
    ReviewedAt,
    ProcessedBy,
    ProcessedAt,
    RejectionReason,
    FailureReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    RefereeId,
    ReferralCode,
    Status,
    SignedUpAt,
    ConvertedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Postgres ENUM 类型
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("subscription_tier"))
                    .values(vec![
                        Alias::new("free"),
                        Alias::new("academy"),
                        Alias::new("vip"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("user_role"))
                    .values(vec![Alias::new("student"), Alias::new("master_admin")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("earning_source"))
                    .values(vec![
                        Alias::new("referral"),
                        Alias::new("content_creation"),
                        Alias::new("mission"),
                        Alias::new("streak"),
                        Alias::new("achievement"),
                        Alias::new("daily_login"),
                        Alias::new("challenge"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("earning_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("approved"),
                        Alias::new("rejected"),
                        Alias::new("paid"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("withdrawal_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("approved"),
                        Alias::new("processing"),
                        Alias::new("completed"),
                        Alias::new("rejected"),
                        Alias::new("failed"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("payment_method"))
                    .values(vec![Alias::new("pix"), Alias::new("bank_transfer")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("pix_key_type"))
                    .values(vec![
                        Alias::new("cpf"),
                        Alias::new("cnpj"),
                        Alias::new("email"),
                        Alias::new("phone"),
                        Alias::new("random"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("referral_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("signed_up"),
                        Alias::new("converted"),
                        Alias::new("completed_3_months"),
                        Alias::new("rewarded"),
                    ])
                    .to_owned(),
            )
            .await?;

        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Username).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Users::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::Role)
                            .custom(Alias::new("user_role"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::Tier)
                            .custom(Alias::new("subscription_tier"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::RealMoneyBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::PendingWithdrawal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::TotalEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::TotalWithdrawn)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::ReferrerId).big_integer().null())
                    .col(ColumnDef::new(Users::ReferralCode).string_len(32).null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email_unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_referral_code_unique")
                    .table(Users::Table)
                    .col(Users::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 收益台账表
        manager
            .create_table(
                Table::create()
                    .table(Earnings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Earnings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Earnings::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Earnings::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Earnings::Source)
                            .custom(Alias::new("earning_source"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Earnings::Status)
                            .custom(Alias::new("earning_status"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Earnings::TierAtTime)
                            .custom(Alias::new("subscription_tier"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Earnings::MonthlyPeriod)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Earnings::RelatedType).string_len(64).null())
                    .col(ColumnDef::new(Earnings::RelatedId).string_len(128).null())
                    .col(ColumnDef::new(Earnings::Description).text().null())
                    .col(ColumnDef::new(Earnings::Metadata).json_binary().null())
                    .col(ColumnDef::new(Earnings::ReviewedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Earnings::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Earnings::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(Earnings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_earnings_user_period")
                    .table(Earnings::Table)
                    .col(Earnings::UserId)
                    .col(Earnings::MonthlyPeriod)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_earnings_status")
                    .table(Earnings::Table)
                    .col(Earnings::Status)
                    .to_owned(),
            )
            .await?;

        // 里程碑奖励去重键；related_id 为 NULL 的行不参与唯一性
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_earnings_dedup_unique")
                    .table(Earnings::Table)
                    .col(Earnings::UserId)
                    .col(Earnings::Source)
                    .col(Earnings::RelatedType)
                    .col(Earnings::RelatedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 提现表
        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Withdrawals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Withdrawals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Withdrawals::PaymentMethod)
                            .custom(Alias::new("payment_method"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Withdrawals::PixKey).string_len(255).null())
                    .col(
                        ColumnDef::new(Withdrawals::PixKeyType)
                            .custom(Alias::new("pix_key_type"))
                            .null(),
                    )
                    .col(ColumnDef::new(Withdrawals::BankName).string_len(255).null())
                    .col(
                        ColumnDef::new(Withdrawals::BankAgency)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankAccountNumber)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankAccountDigit)
                            .string_len(8)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankAccountType)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankHolderName)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .custom(Alias::new("withdrawal_status"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::TransactionId)
                            .string_len(128)
                            .null(),
                    )
                    .col(ColumnDef::new(Withdrawals::ReviewedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Withdrawals::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::ProcessedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Withdrawals::RejectionReason).text().null())
                    .col(ColumnDef::new(Withdrawals::FailureReason).text().null())
                    .col(
                        ColumnDef::new(Withdrawals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_user")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_status")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::Status)
                    .to_owned(),
            )
            .await?;

        // 推荐漏斗表
        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferrerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Referrals::RefereeId).big_integer().null())
                    .col(
                        ColumnDef::new(Referrals::ReferralCode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::Status)
                            .custom(Alias::new("referral_status"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::SignedUpAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ConvertedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Referrals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referrals_referrer")
                    .table(Referrals::Table)
                    .col(Referrals::ReferrerId)
                    .to_owned(),
            )
            .await?;

        // 一个被推荐人只占一条漏斗记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referrals_referee_unique")
                    .table(Referrals::Table)
                    .col(Referrals::RefereeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referrals_status")
                    .table(Referrals::Table)
                    .col(Referrals::Status)
                    .to_owned(),
            )
            .await?;

        // 外键（不做级联删除，台账与漏斗历史必须保留）
        manager
            .alter_table(
                Table::alter()
                    .table(Earnings::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_earnings_user")
                            .from_tbl(Earnings::Table)
                            .from_col(Earnings::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Withdrawals::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_withdrawals_user")
                            .from_tbl(Withdrawals::Table)
                            .from_col(Withdrawals::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Referrals::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_referrals_referrer")
                            .from_tbl(Referrals::Table)
                            .from_col(Referrals::ReferrerId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：漏斗 -> 提现 -> 台账 -> 用户 -> 枚举类型
        manager
            .drop_table(Table::drop().if_exists().table(Referrals::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Withdrawals::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Earnings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;

        for name in [
            "referral_status",
            "pix_key_type",
            "payment_method",
            "withdrawal_status",
            "earning_status",
            "earning_source",
            "user_role",
            "subscription_tier",
        ] {
            manager
                .drop_type(Type::drop().if_exists().name(Alias::new(name)).to_owned())
                .await?;
        }

        Ok(())
    }
}
