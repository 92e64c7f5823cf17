use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. ./config.toml
    /// 2. 环境变量（MONGOOSE_ 前缀）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("MONGOOSE_").split("_").global());

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MONGOOSE_").split("_").global());

        figment.extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.detection.scam_score_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold);
        }

        if config.engagement.hook_max_turns >= config.engagement.compliance_max_turns
            || config.engagement.compliance_max_turns >= config.engagement.friction_max_turns
        {
            return Err(ConfigValidationError::InvalidPhaseBounds);
        }

        if config.pacing.hesitation_min > config.pacing.hesitation_max {
            return Err(ConfigValidationError::InvalidPacing);
        }

        if config.generation.backend == "gemini" && config.generation.api_key.is_empty() {
            return Err(ConfigValidationError::MissingApiKey);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("诈骗评分阈值无效，必须大于 0")]
    InvalidThreshold,

    #[error("阶段轮次边界无效，必须严格递增")]
    InvalidPhaseBounds,

    #[error("节奏抖动区间无效，下限不能大于上限")]
    InvalidPacing,

    #[error("gemini 后端需要配置 API 密钥")]
    MissingApiKey,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_is_valid() {
        let config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_phase_bounds_must_increase() {
        let mut config = AppConfig::development();
        config.engagement.compliance_max_turns = config.engagement.friction_max_turns;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPhaseBounds)
        ));
    }

    #[test]
    fn test_gemini_backend_requires_api_key() {
        let mut config = AppConfig::development();
        config.generation.backend = "gemini".into();
        config.generation.api_key = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingApiKey)
        ));
    }
}
