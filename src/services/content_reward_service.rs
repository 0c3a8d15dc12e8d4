use crate::entities::{EarningSource, earning_entity as earnings};
use crate::error::{AppError, AppResult};
use crate::services::EarningService;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

/// 内容奖励表（centavos）
pub const POST_CREATED_REWARD: i64 = 50;
pub const POST_FEATURED_REWARD: i64 = 500;

/// 点赞里程碑 -> 奖励金额
pub const LIKE_MILESTONES: [(i64, i64); 4] = [(10, 100), (50, 300), (100, 500), (500, 1_000)];

/// 当前点赞数已达到的里程碑阈值（升序）
pub fn reached_milestones(like_count: i64) -> Vec<i64> {
    LIKE_MILESTONES
        .iter()
        .filter(|(threshold, _)| like_count >= *threshold)
        .map(|(threshold, _)| *threshold)
        .collect()
}

pub fn like_milestone_reward(milestone: i64) -> Option<i64> {
    LIKE_MILESTONES
        .iter()
        .find(|(threshold, _)| *threshold == milestone)
        .map(|(_, reward)| *reward)
}

/// 内容事件 -> 收益台账的薄适配层
///
/// 每个事件至多触发一次入账；触顶的奖励直接丢弃（只记日志），不排队不重试。
#[derive(Clone)]
pub struct ContentRewardService {
    pool: DatabaseConnection,
    earning_service: EarningService,
}

impl ContentRewardService {
    pub fn new(pool: DatabaseConnection, earning_service: EarningService) -> Self {
        Self {
            pool,
            earning_service,
        }
    }

    pub async fn handle_post_created(
        &self,
        author_id: i64,
        post_id: i64,
    ) -> AppResult<Option<i64>> {
        self.grant_once(
            author_id,
            POST_CREATED_REWARD,
            "post_created",
            &post_id.to_string(),
            format!("Reward for publishing post {}", post_id),
            json!({ "post_id": post_id }),
        )
        .await
    }

    /// 点赞达标奖励；点赞数跨越多个里程碑时逐个补发
    pub async fn handle_like_milestone(
        &self,
        author_id: i64,
        post_id: i64,
        like_count: i64,
    ) -> AppResult<Vec<i64>> {
        let mut granted = Vec::new();

        for milestone in reached_milestones(like_count) {
            let Some(reward) = like_milestone_reward(milestone) else {
                continue;
            };
            let earning_id = self
                .grant_once(
                    author_id,
                    reward,
                    "post_like_milestone",
                    &format!("{}:{}", post_id, milestone),
                    format!("Post {} reached {} likes", post_id, milestone),
                    json!({ "post_id": post_id, "milestone": milestone }),
                )
                .await?;
            if let Some(id) = earning_id {
                granted.push(id);
            }
        }

        Ok(granted)
    }

    pub async fn handle_post_featured(
        &self,
        author_id: i64,
        post_id: i64,
    ) -> AppResult<Option<i64>> {
        self.grant_once(
            author_id,
            POST_FEATURED_REWARD,
            "post_featured",
            &post_id.to_string(),
            format!("Post {} featured by the editorial team", post_id),
            json!({ "post_id": post_id }),
        )
        .await
    }

    /// 幂等发放：先查重，再走台账唯一写路径；触顶则丢弃
    async fn grant_once(
        &self,
        user_id: i64,
        amount: i64,
        related_type: &str,
        related_id: &str,
        description: String,
        metadata: serde_json::Value,
    ) -> AppResult<Option<i64>> {
        if self
            .already_rewarded(user_id, related_type, related_id)
            .await?
        {
            return Ok(None);
        }

        match self
            .earning_service
            .record_earning(
                user_id,
                amount,
                EarningSource::ContentCreation,
                Some(related_type.to_string()),
                Some(related_id.to_string()),
                Some(description),
                Some(metadata),
            )
            .await
        {
            Ok(earning) => Ok(Some(earning.id)),
            Err(AppError::CapExceeded { current, cap, .. }) => {
                log::warn!(
                    "Dropping content reward for user {} ({}/{}): monthly cap reached ({}/{})",
                    user_id,
                    related_type,
                    related_id,
                    current,
                    cap
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn already_rewarded(
        &self,
        user_id: i64,
        related_type: &str,
        related_id: &str,
    ) -> AppResult<bool> {
        let count = earnings::Entity::find()
            .filter(earnings::Column::UserId.eq(user_id))
            .filter(earnings::Column::Source.eq(EarningSource::ContentCreation))
            .filter(earnings::Column::RelatedType.eq(related_type))
            .filter(earnings::Column::RelatedId.eq(related_id))
            .count(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_milestone_rewards() {
        assert_eq!(like_milestone_reward(10), Some(100));
        assert_eq!(like_milestone_reward(50), Some(300));
        assert_eq!(like_milestone_reward(100), Some(500));
        assert_eq!(like_milestone_reward(500), Some(1_000));
        assert_eq!(like_milestone_reward(7), None);
    }

    #[test]
    fn test_reached_milestones() {
        assert!(reached_milestones(9).is_empty());
        assert_eq!(reached_milestones(10), vec![10]);
        assert_eq!(reached_milestones(120), vec![10, 50, 100]);
        assert_eq!(reached_milestones(9_999), vec![10, 50, 100, 500]);
    }
}
