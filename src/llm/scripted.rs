//! 脚本化生成后端
//!
//! 按脚本顺序吐出预设回复，队列耗尽后返回固定兜底。
//! 用于离线运行和测试编排器的各条路径。

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::Generator;
use crate::error::{AppError, Result};
use crate::models::message::Message;

/// 脚本化生成器
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: String,
}

enum ScriptedReply {
    Text(String),
    Failure(String),
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: "I am ready to proceed. Please share your account details first?".to_string(),
        }
    }
}

impl ScriptedGenerator {
    /// 创建空脚本的生成器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置队列耗尽后的兜底回复
    pub fn with_fallback(fallback: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
        }
    }

    /// 追加一条脚本回复
    pub fn push_reply(&self, text: &str) {
        self.replies
            .lock()
            .push_back(ScriptedReply::Text(text.to_string()));
    }

    /// 追加一次脚本化失败
    pub fn push_failure(&self, reason: &str) {
        self.replies
            .lock()
            .push_back(ScriptedReply::Failure(reason.to_string()));
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        _directive: &str,
        _message: &str,
        _history: &[Message],
    ) -> Result<String> {
        match self.replies.lock().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(reason)) => Err(AppError::Generation(reason)),
            None => Ok(self.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let generator = ScriptedGenerator::new();
        generator.push_reply("first");
        generator.push_reply("second");

        assert_eq!(generator.generate("d", "m", &[]).await.unwrap(), "first");
        assert_eq!(generator.generate("d", "m", &[]).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_fallback_after_exhaustion() {
        let generator = ScriptedGenerator::with_fallback("canned line");
        assert_eq!(generator.generate("d", "m", &[]).await.unwrap(), "canned line");
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let generator = ScriptedGenerator::new();
        generator.push_failure("upstream unavailable");
        assert!(generator.generate("d", "m", &[]).await.is_err());
    }
}
