//! 会话接口 DTO

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::intel::Intelligence;
use crate::models::session::SessionState;

/// 会话摘要响应
#[derive(Debug, Serialize)]
pub struct SessionSummaryResponse {
    /// 会话标识
    pub id: String,
    /// 已处理轮次数
    pub turn_count: u64,
    /// 历史消息数
    pub history_len: usize,
    /// 累积情报
    pub aggregated_intel: Intelligence,
    /// 情报摘要
    pub intel_summary: String,
    /// 陷阱触发计数
    pub trap_usage: HashMap<String, u32>,
    /// 已声明的场景事实
    pub scenario_facts: BTreeMap<String, String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最后活跃时间
    pub last_active_at: DateTime<Utc>,
}

impl SessionSummaryResponse {
    /// 由会话状态构造摘要
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            id: state.id.clone(),
            turn_count: state.turn_count,
            history_len: state.history.len(),
            aggregated_intel: state.aggregated_intel.clone(),
            intel_summary: state.aggregated_intel.summary(),
            trap_usage: state.trap_usage.snapshot(),
            scenario_facts: state
                .scenario_memory
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            created_at: state.created_at,
            last_active_at: state.last_active_at,
        }
    }
}

/// 会话列表响应
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// 会话标识列表
    pub sessions: Vec<String>,
    /// 总数
    pub total: usize,
}

/// 删除会话响应
#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    /// 会话标识
    pub id: String,
    /// 结果消息
    pub message: String,
}
