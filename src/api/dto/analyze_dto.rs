//! 分析接口 DTO
//!
//! 入站载荷与单轮结果的线格式。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::intel::AnalysisResult;
use crate::models::message::{Message, Metadata, Sender};

/// 入站消息
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    /// 消息内容
    #[serde(default)]
    pub text: String,
    /// 发送方: "scammer" / "agent" / 其他
    #[serde(default)]
    pub sender: String,
    /// 时间戳（缺省取当前时间）
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MessageDto {
    /// 转为领域消息
    pub fn into_message(self) -> Message {
        let sender = match self.sender.trim().to_lowercase().as_str() {
            "scammer" => Sender::Scammer,
            "agent" | "user" => Sender::Agent,
            _ => Sender::Unknown,
        };
        match self.timestamp {
            Some(ts) => Message::with_timestamp(&self.text, sender, ts),
            None => Message::new(&self.text, sender),
        }
    }
}

/// 渠道元数据
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MetadataDto {
    /// 渠道
    pub channel: Option<String>,
    /// 语言提示
    pub language: Option<String>,
    /// 地区代码
    pub locale: Option<String>,
}

impl MetadataDto {
    /// 转为领域元数据，缺省字段取默认值
    pub fn into_metadata(self) -> Metadata {
        let defaults = Metadata::default();
        Metadata {
            channel: self.channel.unwrap_or(defaults.channel),
            language: self.language.unwrap_or(defaults.language),
            locale: self.locale.unwrap_or(defaults.locale),
        }
    }
}

/// 分析请求
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// 会话标识
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// 当前消息
    pub message: MessageDto,
    /// 历史消息
    #[serde(rename = "conversationHistory", default)]
    pub conversation_history: Vec<MessageDto>,
    /// 元数据
    #[serde(default)]
    pub metadata: MetadataDto,
}

/// 分析响应
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// 会话标识
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// 本轮分析结果
    pub analysis: AnalysisResult,
    /// 人设回复（非诈骗判定时为 null）
    pub reply: Option<String>,
    /// 命中的陷阱类别
    pub trap_category: Option<String>,
}
