use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    EarningSource, EarningStatus, PaymentMethod, PixKeyType, ReferralStatus, SubscriptionTier,
    UserRole, WithdrawalStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::earning::record_earning,
        handlers::earning::can_earn,
        handlers::earning::list_earnings,
        handlers::earning::earning_stats,
        handlers::earning::pending_earnings,
        handlers::earning::approve_earning,
        handlers::earning::reject_earning,
        handlers::withdrawal::create_withdrawal,
        handlers::withdrawal::list_withdrawals,
        handlers::withdrawal::pending_withdrawals,
        handlers::withdrawal::approve_withdrawal,
        handlers::withdrawal::reject_withdrawal,
        handlers::withdrawal::process_withdrawal,
        handlers::referral::get_referral_code,
        handlers::referral::referral_stats,
        handlers::referral::convert_referral,
        handlers::event::content_event,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            UserResponse,
            UserRole,
            SubscriptionTier,
            RecordEarningRequest,
            CanEarnQuery,
            EarningQuery,
            EarningResponse,
            EarningSource,
            EarningStatus,
            CanEarnResult,
            MonthlyCapStatus,
            SourceBreakdown,
            EarningStatsResponse,
            RejectEarningRequest,
            CreateWithdrawalRequest,
            PaymentDetails,
            PaymentMethod,
            PixKeyType,
            WithdrawalQuery,
            WithdrawalResponse,
            WithdrawalStatus,
            RejectWithdrawalRequest,
            ReferralCodeResponse,
            ReferralResponse,
            ReferralStatus,
            ReferralStatsResponse,
            ContentEventKind,
            ContentEventRequest,
            ContentEventResponse,
            PaginationParams,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "user", description = "User profile API"),
        (name = "earning", description = "Earning ledger API"),
        (name = "withdrawal", description = "Withdrawal API"),
        (name = "referral", description = "Referral program API"),
        (name = "event", description = "Internal content event API"),
    ),
    info(
        title = "So Fluent Rewards API",
        version = "1.0.0",
        description = "Earning ledger, withdrawal and referral reward REST API",
        contact(
            name = "API Support",
            email = "dev@sofluent.com.br"
        )
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
