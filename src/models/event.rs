use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 内容侧事件，由内容服务回调本服务触发奖励
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentEventKind {
    PostCreated,
    LikeMilestone,
    PostFeatured,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContentEventRequest {
    pub event_type: ContentEventKind,
    /// 帖子作者（奖励对象）
    pub author_id: i64,
    pub post_id: i64,
    /// like_milestone 事件必填：当前点赞数
    pub like_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContentEventResponse {
    /// 本次事件实际入账的台账行 ID（去重或触顶时可能为空）
    pub earning_ids: Vec<i64>,
}
