//! 文本生成模块
//!
//! 将外部文本生成能力隔离在一个窄接口后面，便于用脚本化替身
//! 独立测试编排器及其失败路径。

pub mod gemini;
pub mod scripted;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::config::GenerationConfig;
use crate::error::Result;
use crate::models::message::Message;

pub use gemini::GeminiGenerator;
pub use scripted::ScriptedGenerator;

/// 文本生成能力
///
/// 可失败、可能很慢；调用方必须用超时约束。
#[async_trait]
pub trait Generator: Send + Sync {
    /// 根据指令文档、当前消息与有界历史生成文本
    async fn generate(&self, directive: &str, message: &str, history: &[Message])
    -> Result<String>;
}

/// 按配置创建生成后端
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.backend.as_str() {
        "gemini" => {
            let generator = GeminiGenerator::new(config)?;
            Ok(Arc::new(generator))
        }
        _ => Ok(Arc::new(ScriptedGenerator::default())),
    }
}
