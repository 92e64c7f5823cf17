use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息发送方
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// 诈骗者
    Scammer,
    /// 诱饵人设
    Agent,
    /// 未知来源
    Unknown,
}

impl Default for Sender {
    fn default() -> Self {
        Sender::Unknown
    }
}

/// 会话消息
///
/// 创建后不可变，历史记录只追加不修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 消息内容
    pub text: String,
    /// 发送方
    pub sender: Sender,
    /// 消息时间戳
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// 创建新消息
    pub fn new(text: &str, sender: Sender) -> Self {
        Self {
            text: text.trim().to_string(),
            sender,
            timestamp: Utc::now(),
        }
    }

    /// 创建带时间戳的消息
    pub fn with_timestamp(text: &str, sender: Sender, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.trim().to_string(),
            sender,
            timestamp,
        }
    }
}

/// 渠道元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// 渠道: SMS/WhatsApp/Email/Chat
    pub channel: String,
    /// 语言提示
    pub language: String,
    /// 地区代码
    pub locale: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            channel: "unknown".into(),
            language: "English".into(),
            locale: "IN".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_trims_text() {
        let msg = Message::new("  hello sir  ", Sender::Scammer);
        assert_eq!(msg.text, "hello sir");
        assert_eq!(msg.sender, Sender::Scammer);
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = Metadata::default();
        assert_eq!(meta.channel, "unknown");
        assert_eq!(meta.locale, "IN");
    }
}
