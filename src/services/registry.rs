//! 会话注册表
//!
//! 按会话标识维护内存中的会话状态。不同会话完全独立、可以并行；
//! 同一会话的轮次必须串行，这由会话级互斥锁保证（陷阱计数与
//! 场景记忆是读-改-写状态）。进程重启后状态不保留，过期清理
//! 由外部策略通过删除接口驱动。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::message::Message;
use crate::models::session::SessionState;

/// 会话注册表
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    /// 创建注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建会话
    ///
    /// 新会话可用载荷携带的历史做初始填充。
    pub fn get_or_create(
        &self,
        session_id: &str,
        seed_history: Vec<Message>,
    ) -> Arc<Mutex<SessionState>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionState::with_history(
                    session_id,
                    seed_history,
                )))
            })
            .clone()
    }

    /// 查找会话
    pub fn get(&self, session_id: &str) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// 删除会话，返回是否存在
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// 全部会话标识
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// 会话数量
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create("s-1", Vec::new());
        let b = registry.get_or_create("s-1", Vec::new());

        // 同一把锁，不是两个副本
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_history_only_on_create() {
        use crate::models::message::Sender;

        let registry = SessionRegistry::new();
        let seed = vec![Message::new("earlier message", Sender::Scammer)];
        registry.get_or_create("s-2", seed);

        // 第二次 get_or_create 不会重置历史
        let handle = registry.get_or_create("s-2", Vec::new());
        let state = handle.lock().await;
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_list() {
        let registry = SessionRegistry::new();
        registry.get_or_create("b", Vec::new());
        registry.get_or_create("a", Vec::new());

        assert_eq!(registry.list_ids(), vec!["a", "b"]);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.len(), 1);
    }
}
