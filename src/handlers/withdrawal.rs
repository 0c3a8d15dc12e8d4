use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::{UserService, WithdrawalService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/withdrawals",
    tag = "withdrawal",
    request_body = CreateWithdrawalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "提现请求已创建并保留资金", body = WithdrawalResponse),
        (status = 400, description = "金额低于下限、余额不足或支付明细缺失"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_withdrawal(
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
    request: web::Json<CreateWithdrawalRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match withdrawal_service
        .create_withdrawal(user_id, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/withdrawals",
    tag = "withdrawal",
    params(
        ("status" = Option<String>, Query, description = "状态过滤"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取提现历史成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_withdrawals(
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
    query: web::Query<WithdrawalQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match withdrawal_service.get_user_withdrawals(user_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/withdrawals/pending",
    tag = "withdrawal",
    params(
        ("page" = Option<i64>, Query, description = "页码"),
        ("page_size" = Option<i64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取待审批提现成功"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn pending_withdrawals(
    withdrawal_service: web::Data<WithdrawalService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    match withdrawal_service
        .get_pending_withdrawals(
            query.page.map(|p| p as u32),
            query.page_size.map(|p| p as u32),
        )
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/approve",
    tag = "withdrawal",
    params(
        ("id" = i64, Path, description = "提现ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审批通过", body = WithdrawalResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "状态不允许审批")
    )
)]
pub async fn approve_withdrawal(
    withdrawal_service: web::Data<WithdrawalService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    match withdrawal_service
        .approve_withdrawal(path.into_inner(), caller)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/reject",
    tag = "withdrawal",
    params(
        ("id" = i64, Path, description = "提现ID")
    ),
    request_body = RejectWithdrawalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "驳回并解除资金保留", body = WithdrawalResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "状态不允许驳回")
    )
)]
pub async fn reject_withdrawal(
    withdrawal_service: web::Data<WithdrawalService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectWithdrawalRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    match withdrawal_service
        .reject_withdrawal(path.into_inner(), caller, request.into_inner().reason)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/withdrawals/{id}/process",
    tag = "withdrawal",
    params(
        ("id" = i64, Path, description = "提现ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已发起外部转账", body = WithdrawalResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "仅 approved 状态可发起转账"),
        (status = 502, description = "支付网关错误")
    )
)]
pub async fn process_withdrawal(
    withdrawal_service: web::Data<WithdrawalService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    match withdrawal_service
        .process_withdrawal(path.into_inner(), caller)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn withdrawal_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/withdrawals")
            .route("/pending", web::get().to(pending_withdrawals))
            .route("/{id}/approve", web::post().to(approve_withdrawal))
            .route("/{id}/reject", web::post().to(reject_withdrawal))
            .route("/{id}/process", web::post().to(process_withdrawal))
            .route("", web::post().to(create_withdrawal))
            .route("", web::get().to(list_withdrawals)),
    );
}
