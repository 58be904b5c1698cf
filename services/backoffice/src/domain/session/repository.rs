//! 会话仓储接口

use async_trait::async_trait;
use stockdesk_errors::AppResult;

use super::session::{Session, SessionId};

/// 会话仓储接口
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 持久化会话
    ///
    /// 登录流程依赖此操作成功：会话写入失败时不得签发令牌
    async fn save(&self, session: &Session) -> AppResult<()>;

    /// 根据刷新令牌摘要查找会话
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// 吊销会话
    async fn revoke(&self, id: &SessionId) -> AppResult<()>;

    /// 清理已过期/已吊销的会话，返回删除数量
    async fn delete_expired(&self) -> AppResult<u64>;
}
