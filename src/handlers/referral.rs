use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::{ReferralRewardService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/referrals/code",
    tag = "referral",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取推荐码成功", body = ReferralCodeResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_referral_code(
    referral_service: web::Data<ReferralRewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match referral_service.get_or_create_code(user_id).await {
        Ok(code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ReferralCodeResponse {
                referral_code: code
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/referrals/stats",
    tag = "referral",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取推荐漏斗统计成功", body = ReferralStatsResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn referral_stats(
    referral_service: web::Data<ReferralRewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match referral_service.get_stats(user_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/referrals/{id}/convert",
    tag = "referral",
    params(
        ("id" = i64, Path, description = "推荐记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "转化已确认", body = ReferralResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "状态不允许转化")
    )
)]
pub async fn convert_referral(
    referral_service: web::Data<ReferralRewardService>,
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

    match referral_service.handle_conversion(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/referrals")
            .route("/code", web::get().to(get_referral_code))
            .route("/stats", web::get().to(referral_stats))
            .route("/{id}/convert", web::post().to(convert_referral)),
    );
}
