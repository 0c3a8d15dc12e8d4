use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::{EarningService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/earnings/record",
    tag = "earning",
    request_body = RecordEarningRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "入账成功", body = EarningResponse),
        (status = 400, description = "金额非法或超出月度上限"),
        (status = 401, description = "未授权")
    )
)]
pub async fn record_earning(
    earning_service: web::Data<EarningService>,
    req: HttpRequest,
    request: web::Json<RecordEarningRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    let request = request.into_inner();
    match earning_service
        .record_earning(
            user_id,
            request.amount,
            request.source,
            request.related_type,
            request.related_id,
            request.description,
            request.metadata,
        )
        .await
    {
        Ok(earning) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": crate::models::EarningResponse::from(earning)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/earnings",
    tag = "earning",
    params(
        ("status" = Option<String>, Query, description = "状态过滤"),
        ("source" = Option<String>, Query, description = "来源过滤"),
        ("monthly_period" = Option<String>, Query, description = "月度桶过滤 (YYYY-MM)"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取收益列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_earnings(
    earning_service: web::Data<EarningService>,
    req: HttpRequest,
    query: web::Query<EarningQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match earning_service.get_user_earnings(user_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/earnings/can-earn",
    tag = "earning",
    params(
        ("amount" = i64, Query, description = "预检金额（centavos）")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预检成功", body = CanEarnResult),
        (status = 401, description = "未授权")
    )
)]
pub async fn can_earn(
    earning_service: web::Data<EarningService>,
    req: HttpRequest,
    query: web::Query<CanEarnQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match earning_service.can_earn(user_id, query.amount).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/earnings/stats",
    tag = "earning",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取收益统计成功", body = EarningStatsResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn earning_stats(
    earning_service: web::Data<EarningService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match earning_service.get_user_earning_stats(user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/earnings/pending",
    tag = "earning",
    params(
        ("page" = Option<i64>, Query, description = "页码"),
        ("page_size" = Option<i64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取待审批队列成功"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn pending_earnings(
    earning_service: web::Data<EarningService>,
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

    match earning_service
        .get_pending_earnings(
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
    path = "/earnings/{id}/approve",
    tag = "earning",
    params(
        ("id" = i64, Path, description = "收益ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审批通过", body = EarningResponse),
        (status = 400, description = "超出月度上限"),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "状态不允许审批")
    )
)]
pub async fn approve_earning(
    earning_service: web::Data<EarningService>,
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

    match earning_service
        .approve_earning(path.into_inner(), caller)
        .await
    {
        Ok(earning) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": crate::models::EarningResponse::from(earning)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/earnings/{id}/reject",
    tag = "earning",
    params(
        ("id" = i64, Path, description = "收益ID")
    ),
    request_body = RejectEarningRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "驳回成功", body = EarningResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "状态不允许驳回")
    )
)]
pub async fn reject_earning(
    earning_service: web::Data<EarningService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectEarningRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    match earning_service
        .reject_earning(path.into_inner(), caller, request.into_inner().reason)
        .await
    {
        Ok(earning) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": crate::models::EarningResponse::from(earning)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn earning_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/earnings")
            .route("/record", web::post().to(record_earning))
            .route("/can-earn", web::get().to(can_earn))
            .route("/stats", web::get().to(earning_stats))
            .route("/pending", web::get().to(pending_earnings))
            .route("/{id}/approve", web::post().to(approve_earning))
            .route("/{id}/reject", web::post().to(reject_earning))
            .route("", web::get().to(list_earnings)),
    );
}
