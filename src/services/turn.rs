//! 单轮处理服务
//!
//! 对外的唯一入口：规范化 → 情报抽取 → 两级检测 → （确认诈骗时）
//! 人设交互，并把轮次结果写回会话状态。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::{ClassifierTier, Detector, Extractor, Normalizer};
use crate::engagement::EngagementEngine;
use crate::error::{AppError, Result};
use crate::models::intel::{AnalysisResult, Intelligence};
use crate::models::message::{Message, Metadata, Sender};
use crate::observability::AppMetrics;
use crate::services::registry::SessionRegistry;

/// 单轮处理请求
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// 会话标识
    pub session_id: String,
    /// 当前消息
    pub message: Message,
    /// 载荷携带的历史（仅用于初始化新会话）
    pub history: Vec<Message>,
    /// 渠道元数据
    pub metadata: Metadata,
}

/// 单轮处理结果
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// 会话标识
    pub session_id: String,
    /// 本轮分析结果
    pub analysis: AnalysisResult,
    /// 人设回复（非诈骗判定时为 None）
    pub reply: Option<String>,
    /// 命中的陷阱类别
    pub trap_category: Option<String>,
}

/// 单轮处理服务 trait
#[async_trait]
pub trait TurnService: Send + Sync {
    /// 处理一轮
    async fn process(&self, request: TurnRequest) -> Result<TurnOutcome>;
}

/// 单轮处理服务实现
pub struct TurnServiceImpl {
    registry: Arc<SessionRegistry>,
    normalizer: Normalizer,
    extractor: Extractor,
    detector: Detector,
    engagement: EngagementEngine,
    metrics: Arc<AppMetrics>,
}

impl TurnServiceImpl {
    /// 创建服务实例
    pub fn new(
        registry: Arc<SessionRegistry>,
        detector: Detector,
        engagement: EngagementEngine,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            registry,
            normalizer: Normalizer::new(),
            extractor: Extractor::new(),
            detector,
            engagement,
            metrics,
        }
    }

    /// 抽取本轮情报：当前消息 + 历史消息
    ///
    /// 历史中的关键词不并入，避免把旧轮次的噪音算到本轮头上。
    fn extract_intel(&self, message: &str, normalized: &str, history: &[Message]) -> Intelligence {
        let mut intel = self.extractor.extract(message, normalized);

        for msg in history {
            if msg.sender != Sender::Scammer {
                continue;
            }
            let history_normalized = self.normalizer.normalize(&msg.text);
            let mut history_intel = self.extractor.extract(&msg.text, &history_normalized);
            history_intel.suspicious_keywords.clear();
            intel.merge(&history_intel);
        }

        intel
    }
}

#[async_trait]
impl TurnService for TurnServiceImpl {
    async fn process(&self, request: TurnRequest) -> Result<TurnOutcome> {
        if request.session_id.trim().is_empty() {
            return Err(AppError::Validation("sessionId cannot be empty".to_string()));
        }

        let entry = self
            .registry
            .get_or_create(&request.session_id, request.history.clone());

        // 会话级互斥：同一会话的轮次严格串行
        let mut state = entry.lock().await;
        let turn_started = Instant::now();
        self.metrics.record_turn();

        let message_text = request.message.text.clone();
        if message_text.trim().is_empty() {
            debug!(session_id = %request.session_id, "empty message received");
            return Ok(TurnOutcome {
                session_id: request.session_id,
                analysis: AnalysisResult::safe("empty message received"),
                reply: None,
                trap_category: None,
            });
        }

        let normalized = self.normalizer.normalize(&message_text);
        let intel = self.extract_intel(&message_text, &normalized, &state.history);

        let (analysis, tier) = self
            .detector
            .classify(&normalized, &state.history, &intel, &request.metadata)
            .await;

        if tier == ClassifierTier::Fallback {
            self.metrics.record_fallback_detection();
        }
        info!(
            session_id = %request.session_id,
            is_scam = analysis.is_scam,
            confidence = analysis.confidence_score,
            tier = ?tier,
            intel_items = analysis.extracted.item_count(),
            "turn classified"
        );

        let mut reply = None;
        let mut trap_category = None;

        if analysis.is_scam {
            self.metrics.record_scam_detected();
            let engaged = self
                .engagement
                .engage(&mut state, &message_text, turn_started)
                .await;
            if engaged.trap_category.is_some() {
                self.metrics.record_trap_fired();
            }
            if engaged.generation_failed {
                self.metrics.record_generation_failure();
            }
            trap_category = engaged.trap_category;
            reply = Some(engaged.text);
        }

        // 回写历史：先对方消息，再人设回复
        state.push_message(request.message);
        if let Some(text) = &reply {
            state.push_message(Message::new(text, Sender::Agent));
        }
        state.complete_turn(&analysis.extracted);

        Ok(TurnOutcome {
            session_id: request.session_id,
            analysis,
            reply,
            trap_category,
        })
    }
}

/// 创建单轮处理服务
pub fn create_turn_service(
    registry: Arc<SessionRegistry>,
    detector: Detector,
    engagement: EngagementEngine,
    metrics: Arc<AppMetrics>,
) -> Box<dyn TurnService> {
    Box::new(TurnServiceImpl::new(registry, detector, engagement, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::config::config::TypoConfig;
    use crate::llm::ScriptedGenerator;
    use crate::models::persona::Persona;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn service_with(generator: ScriptedGenerator) -> TurnServiceImpl {
        let config = AppConfig::development();
        let generator = Arc::new(generator);
        let detector = Detector::new(
            generator.clone(),
            config.detection.clone(),
            Duration::from_secs(5),
        );
        let engagement = EngagementEngine::with_rng(
            generator,
            Arc::new(Persona::default()),
            &config.engagement,
            config.pacing.clone(),
            TypoConfig {
                substitution_rate: 0.0,
                comma_space_drop_rate: 0.0,
                random_caps_rate: 0.0,
                double_punct_rate: 0.0,
            },
            Duration::from_secs(5),
            StdRng::seed_from_u64(11),
        );
        TurnServiceImpl::new(
            Arc::new(SessionRegistry::new()),
            detector,
            engagement,
            Arc::new(AppMetrics::default()),
        )
    }

    fn request(session_id: &str, text: &str) -> TurnRequest {
        TurnRequest {
            session_id: session_id.to_string(),
            message: Message::new(text, Sender::Scammer),
            history: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    const SCAM_VERDICT: &str =
        r#"{"is_scam": true, "risk_category": "financial", "reason": "payment pressure", "confidence": 0.9}"#;
    const SAFE_VERDICT: &str =
        r#"{"is_scam": false, "risk_category": "safe", "reason": "routine", "confidence": 0.9}"#;

    #[tokio::test(start_paused = true)]
    async fn test_empty_session_id_rejected() {
        let service = service_with(ScriptedGenerator::new());
        let result = service.process(request("  ", "hello")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_message_is_safe_no_reply() {
        let service = service_with(ScriptedGenerator::new());
        let outcome = service.process(request("s-1", "   ")).await.unwrap();

        assert!(!outcome.analysis.is_scam);
        assert_eq!(outcome.analysis.confidence_score, 0.0);
        assert!(outcome.reply.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scam_turn_engages_and_stores_history() {
        let generator = ScriptedGenerator::new();
        generator.push_reply(SCAM_VERDICT);
        generator.push_reply("Sir I understand. Can you share your official number?");
        let service = service_with(generator);

        let outcome = service
            .process(request("s-2", "your account will be blocked, verify now"))
            .await
            .unwrap();

        assert!(outcome.analysis.is_scam);
        let reply = outcome.reply.unwrap();
        assert!(reply.contains("official number"));

        // 历史：对方消息 + 人设回复
        let entry = service.registry.get("s-2").unwrap();
        let state = entry.lock().await;
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].sender, Sender::Scammer);
        assert_eq!(state.history[1].sender, Sender::Agent);
        assert_eq!(state.turn_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_safe_turn_has_no_reply() {
        let generator = ScriptedGenerator::new();
        generator.push_reply(SAFE_VERDICT);
        let service = service_with(generator);

        let outcome = service
            .process(request("s-3", "see you at the meeting tomorrow"))
            .await
            .unwrap();

        assert!(!outcome.analysis.is_scam);
        assert!(outcome.reply.is_none());
        assert!(outcome.trap_category.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trap_fires_without_second_generation_call() {
        let generator = ScriptedGenerator::new();
        generator.push_reply(SCAM_VERDICT);
        // 队列为空：若交互走了生成调用，会得到兜底文案而非陷阱应答
        let service = service_with(generator);

        let outcome = service
            .process(request("s-4", "scan this qr code now"))
            .await
            .unwrap();

        assert_eq!(outcome.trap_category.as_deref(), Some("qr_scan"));
        assert!(outcome.reply.unwrap().contains("payment handle"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_intel_accumulates_across_turns() {
        let generator = ScriptedGenerator::new();
        generator.push_reply(SCAM_VERDICT);
        // 第一轮命中 payment_request 陷阱，不消耗生成队列
        generator.push_reply(SCAM_VERDICT);
        generator.push_reply("Sir the transfer shows pending. Is there another number?");
        let service = service_with(generator);

        service
            .process(request("s-5", "send money to fraud@okaxis jaldi"))
            .await
            .unwrap();
        let outcome = service
            .process(request("s-5", "ok also call 9876543210 abhi"))
            .await
            .unwrap();

        assert!(outcome.analysis.extracted.phone_numbers.contains("+919876543210"));

        let entry = service.registry.get("s-5").unwrap();
        let state = entry.lock().await;
        assert!(state.aggregated_intel.payment_handles.contains("fraud@okaxis"));
        assert!(state.aggregated_intel.phone_numbers.contains("+919876543210"));
        assert_eq!(state.turn_count, 2);
    }
}
