use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::intel::Intelligence;
use crate::models::message::Message;

/// 会话状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    /// 活跃状态
    Active,
    /// 已结束
    Ended,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// 场景记忆
///
/// 记录人设已经陈述过的事实（键 → 取值）。每个键只写一次，
/// 之后只能复用，保证人设对自身处境的说法跨轮次一致。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScenarioMemory {
    facts: BTreeMap<String, String>,
}

impl ScenarioMemory {
    /// 声明一个事实；键已存在时保留原值并返回 false
    pub fn declare(&mut self, key: &str, value: &str) -> bool {
        if self.facts.contains_key(key) {
            return false;
        }
        self.facts.insert(key.to_string(), value.to_string());
        true
    }

    /// 读取事实
    pub fn get(&self, key: &str) -> Option<&str> {
        self.facts.get(key).map(|v| v.as_str())
    }

    /// 遍历全部事实（键有序）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// 陷阱使用计数
///
/// 仅在陷阱响应实际发出时自增；上限由配置决定。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrapUsage {
    counts: HashMap<String, u32>,
}

impl TrapUsage {
    /// 查询某类别已触发次数
    pub fn count(&self, category: &str) -> u32 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// 记录一次触发
    pub fn record(&mut self, category: &str) {
        *self.counts.entry(category.to_string()).or_insert(0) += 1;
    }

    /// 导出全部计数
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.counts.clone()
    }
}

/// 会话状态聚合
///
/// 按会话标识创建，聚合对话历史、场景记忆、陷阱计数与累积情报。
/// 同一会话内的轮次必须串行执行；注册表通过会话级互斥锁保证。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// 会话唯一标识
    pub id: String,
    /// 对话历史（只追加）
    pub history: Vec<Message>,
    /// 场景记忆
    pub scenario_memory: ScenarioMemory,
    /// 陷阱使用计数
    pub trap_usage: TrapUsage,
    /// 跨轮次累积的情报
    pub aggregated_intel: Intelligence,
    /// 已处理轮次数
    pub turn_count: u64,
    /// 会话状态
    pub status: SessionStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最后活跃时间
    pub last_active_at: DateTime<Utc>,
}

impl SessionState {
    /// 创建新会话状态
    pub fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            history: Vec::new(),
            scenario_memory: ScenarioMemory::default(),
            trap_usage: TrapUsage::default(),
            aggregated_intel: Intelligence::default(),
            turn_count: 0,
            status: SessionStatus::Active,
            created_at: now,
            last_active_at: now,
        }
    }

    /// 以既有历史初始化（首条消息携带了先前的对话）
    pub fn with_history(id: &str, history: Vec<Message>) -> Self {
        let mut state = Self::new(id);
        state.history = history;
        state
    }

    /// 追加一条消息
    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
        self.last_active_at = Utc::now();
    }

    /// 记录一轮处理完成
    pub fn complete_turn(&mut self, turn_intel: &Intelligence) {
        self.turn_count += 1;
        self.aggregated_intel.merge(turn_intel);
        self.last_active_at = Utc::now();
    }

    /// 最近 n 条消息的文本（用于语体检测等）
    pub fn recent_texts(&self, n: usize) -> Vec<&str> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].iter().map(|m| m.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Sender;

    #[test]
    fn test_scenario_memory_write_once() {
        let mut memory = ScenarioMemory::default();
        assert!(memory.declare("phone_issue", "single_phone"));
        assert!(!memory.declare("phone_issue", "device_not_compatible"));
        assert_eq!(memory.get("phone_issue"), Some("single_phone"));
    }

    #[test]
    fn test_trap_usage_counts() {
        let mut usage = TrapUsage::default();
        assert_eq!(usage.count("qr_scan"), 0);
        usage.record("qr_scan");
        usage.record("qr_scan");
        assert_eq!(usage.count("qr_scan"), 2);
        assert_eq!(usage.count("video_call"), 0);
    }

    #[test]
    fn test_session_turn_accumulates_intel() {
        let mut state = SessionState::new("s-1");
        let mut intel = Intelligence::default();
        intel.payment_handles.insert("fraud@paytm".into());

        state.complete_turn(&intel);
        state.complete_turn(&intel);

        assert_eq!(state.turn_count, 2);
        assert_eq!(state.aggregated_intel.payment_handles.len(), 1);
    }

    #[test]
    fn test_recent_texts_window() {
        let mut state = SessionState::new("s-2");
        for i in 0..5 {
            state.push_message(Message::new(&format!("msg {i}"), Sender::Scammer));
        }
        let recent = state.recent_texts(3);
        assert_eq!(recent, vec!["msg 2", "msg 3", "msg 4"]);
    }
}
