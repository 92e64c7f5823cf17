use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 检测配置
///
/// 规则回退评分的阈值与权重。阈值 0.4 来自原始调参结果，
/// 作为策略可调项暴露而非写死在控制流里。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectionConfig {
    /// 回退评分判定为诈骗的分数阈值
    pub scam_score_threshold: f64,
    /// 可疑关键词数量达到该值记重分
    pub keyword_heavy_count: usize,
    /// 可疑关键词数量达到该值记轻分
    pub keyword_light_count: usize,
    /// 主分类器提示词携带的历史轮次窗口
    pub history_window: usize,
}

/// 交互策略配置
///
/// 阶段轮次边界（1/5/12）与陷阱使用上限（2）同样是策略可调项。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngagementConfig {
    /// HOOK 阶段的最大历史轮次
    pub hook_max_turns: usize,
    /// COMPLIANCE 阶段的最大历史轮次
    pub compliance_max_turns: usize,
    /// FRICTION 阶段的最大历史轮次
    pub friction_max_turns: usize,
    /// 单个陷阱类别在一个会话内的最大触发次数
    pub trap_usage_cap: u32,
    /// 判定为混合语体所需的方言词命中数
    pub vernacular_min_hits: usize,
    /// 回复保留的最大句子数
    pub max_reply_sentences: usize,
}

/// 节奏配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PacingConfig {
    /// 模拟打字速度（字符/秒）
    pub chars_per_second: f64,
    /// 犹豫抖动下限（秒）
    pub hesitation_min: f64,
    /// 犹豫抖动上限（秒）
    pub hesitation_max: f64,
    /// 附加延迟硬上限（秒），防止上游请求超时
    pub max_delay: f64,
}

/// 错字注入配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TypoConfig {
    /// 相邻键替换概率（每个符合条件的字符）
    pub substitution_rate: f64,
    /// 逗号后空格丢失概率（每处）
    pub comma_space_drop_rate: f64,
    /// 随机大写概率（每个字母）
    pub random_caps_rate: f64,
    /// 句末标点加倍概率（每条消息）
    pub double_punct_rate: f64,
}

/// 文本生成配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationConfig {
    /// 生成后端类型: "gemini" 或 "scripted"
    pub backend: String,
    /// API 基础地址
    pub base_url: String,
    /// API 密钥
    pub api_key: String,
    /// 模型名称
    pub model_name: String,
    /// 单次生成请求超时（秒）
    pub timeout: u64,
    /// 采样温度
    pub temperature: f64,
    /// 最大输出 Token 数
    pub max_output_tokens: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件路径
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 检测配置
    pub detection: DetectionConfig,
    /// 交互策略配置
    pub engagement: EngagementConfig,
    /// 节奏配置
    pub pacing: PacingConfig,
    /// 错字注入配置
    pub typo: TypoConfig,
    /// 文本生成配置
    pub generation: GenerationConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout: 30,
                max_request_size: 1024 * 1024,
            },
            detection: DetectionConfig {
                scam_score_threshold: 0.4,
                keyword_heavy_count: 5,
                keyword_light_count: 2,
                history_window: 6,
            },
            engagement: EngagementConfig {
                hook_max_turns: 1,
                compliance_max_turns: 5,
                friction_max_turns: 12,
                trap_usage_cap: 2,
                vernacular_min_hits: 2,
                max_reply_sentences: 3,
            },
            pacing: PacingConfig {
                chars_per_second: 25.0,
                hesitation_min: 1.5,
                hesitation_max: 4.0,
                max_delay: 5.0,
            },
            typo: TypoConfig {
                substitution_rate: 0.08,
                comma_space_drop_rate: 0.04,
                random_caps_rate: 0.024,
                double_punct_rate: 0.15,
            },
            generation: GenerationConfig {
                backend: "scripted".into(),
                base_url: "https://generativelanguage.googleapis.com".into(),
                api_key: String::new(),
                model_name: "gemini-2.5-flash".into(),
                timeout: 12,
                temperature: 0.7,
                max_output_tokens: 300,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: true,
                log_dir: Some(PathBuf::from("./logs")),
            },
            app_name: "mongoose".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.generation.backend = "gemini".into();
        config
    }
}
