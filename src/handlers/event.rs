use crate::error::AppError;
use crate::handlers::current_user_id;
use crate::models::{ContentEventKind, ContentEventRequest, ContentEventResponse};
use crate::services::{ContentRewardService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/events/content",
    tag = "event",
    request_body = ContentEventRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "事件已处理", body = ContentEventResponse),
        (status = 400, description = "事件参数缺失"),
        (status = 403, description = "仅限内部服务调用")
    )
)]
pub async fn content_event(
    content_reward_service: web::Data<ContentRewardService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<ContentEventRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    // 内容服务以管理员身份回调
    if let Err(e) = user_service.ensure_admin(caller).await {
        return Ok(e.error_response());
    }

    let request = request.into_inner();

    let result = match request.event_type {
        ContentEventKind::PostCreated => content_reward_service
            .handle_post_created(request.author_id, request.post_id)
            .await
            .map(|id| id.into_iter().collect::<Vec<_>>()),
        ContentEventKind::LikeMilestone => match request.like_count {
            Some(like_count) => {
                content_reward_service
                    .handle_like_milestone(request.author_id, request.post_id, like_count)
                    .await
            }
            None => Err(AppError::ValidationError(
                "like_count is required for like_milestone events".to_string(),
            )),
        },
        ContentEventKind::PostFeatured => content_reward_service
            .handle_post_featured(request.author_id, request.post_id)
            .await
            .map(|id| id.into_iter().collect::<Vec<_>>()),
    };

    match result {
        Ok(earning_ids) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ContentEventResponse { earning_ids }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/events").route("/content", web::post().to(content_event)));
}
