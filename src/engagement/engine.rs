//! 轮次编排器
//!
//! 单轮交互的固定流程：陷阱匹配（可短路）→ 阶段解析 → 语体检测
//! → 提示词组装 → 外部生成调用 → 安全护栏 → 风格清理 → 错字注入
//! → 节奏等待 → 返回回复。生成调用的任何失败都折算为人设内的
//! 断网托词，绝不把原始错误暴露给对方。

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::config::{EngagementConfig, PacingConfig, TypoConfig};
use crate::engagement::language::LanguageDetector;
use crate::engagement::pacing::PacingEngine;
use crate::engagement::phase::PhaseResolver;
use crate::engagement::prompt::PromptBuilder;
use crate::engagement::safety::{CONNECTIVITY_EXCUSE, SafetyRails};
use crate::engagement::style::{TypoInjector, apply_style};
use crate::engagement::traps::TrapMatcher;
use crate::llm::Generator;
use crate::models::persona::Persona;
use crate::models::session::SessionState;

/// 单轮交互的产出
#[derive(Debug, Clone)]
pub struct EngagedReply {
    /// 最终回复文本
    pub text: String,
    /// 命中的陷阱类别（命中时跳过了生成调用）
    pub trap_category: Option<String>,
    /// 附加的节奏等待时长
    pub paced_for: Duration,
    /// 生成调用是否失败（回复为断网托词）
    pub generation_failed: bool,
}

/// 交互引擎
pub struct EngagementEngine {
    generator: Arc<dyn Generator>,
    traps: TrapMatcher,
    phases: PhaseResolver,
    language: LanguageDetector,
    prompts: PromptBuilder,
    safety: SafetyRails,
    typos: TypoInjector,
    pacing: PacingEngine,
    generation_timeout: Duration,
    history_window: usize,
    rng: Mutex<StdRng>,
}

impl EngagementEngine {
    /// 创建引擎（熵随机源）
    pub fn new(
        generator: Arc<dyn Generator>,
        persona: Arc<Persona>,
        engagement: &EngagementConfig,
        pacing: PacingConfig,
        typo: TypoConfig,
        generation_timeout: Duration,
    ) -> Self {
        Self::with_rng(
            generator,
            persona,
            engagement,
            pacing,
            typo,
            generation_timeout,
            StdRng::from_entropy(),
        )
    }

    /// 创建引擎并注入随机源（测试用固定种子）
    pub fn with_rng(
        generator: Arc<dyn Generator>,
        persona: Arc<Persona>,
        engagement: &EngagementConfig,
        pacing: PacingConfig,
        typo: TypoConfig,
        generation_timeout: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            generator,
            traps: TrapMatcher::new(engagement.trap_usage_cap),
            phases: PhaseResolver::new(engagement),
            language: LanguageDetector::new(engagement.vernacular_min_hits),
            prompts: PromptBuilder::new(persona.clone(), engagement.max_reply_sentences),
            safety: SafetyRails::new(&persona.name, engagement.max_reply_sentences),
            typos: TypoInjector::new(typo),
            pacing: PacingEngine::new(pacing),
            generation_timeout,
            history_window: 6,
            rng: Mutex::new(rng),
        }
    }

    /// 处理一轮交互
    ///
    /// `turn_started` 是本轮开始的时刻；节奏等待会扣除已消耗的时间。
    pub async fn engage(
        &self,
        state: &mut SessionState,
        message: &str,
        turn_started: Instant,
    ) -> EngagedReply {
        if message.trim().is_empty() {
            // 空消息没有可回应的内容，用人设内的托词顶住
            return EngagedReply {
                text: "sir?? hello?? I cannot see your message, my network is very slow".into(),
                trap_category: None,
                paced_for: Duration::ZERO,
                generation_failed: false,
            };
        }

        // 陷阱命中则短路：预设应答直接走后处理，不调用生成
        if let Some(rule) = self.traps.match_trap(message, &state.trap_usage) {
            state.trap_usage.record(rule.category);
            if let Some((key, value)) = rule.scenario_fact {
                if state.scenario_memory.declare(key, value) {
                    debug!(key, value, "scenario fact declared");
                }
            }
            info!(
                category = rule.category,
                goal = rule.goal,
                intel_target = rule.intel_target,
                "trap fired"
            );

            let text = self.post_process(rule.response);
            let paced_for = self.pace(&text, turn_started).await;
            return EngagedReply {
                text,
                trap_category: Some(rule.category.to_string()),
                paced_for,
                generation_failed: false,
            };
        }

        let phase = self.phases.resolve(state.history.len());
        let recent = state.recent_texts(3);
        let language = self.language.detect(message, &recent);
        debug!(?phase, ?language, "turn context resolved");

        let directive = self.prompts.build(phase, language, &state.scenario_memory);

        let window_start = state.history.len().saturating_sub(self.history_window);
        let bounded_history = &state.history[window_start..];

        let (generated, generation_failed) = match tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&directive, message, bounded_history),
        )
        .await
        {
            Ok(Ok(text)) => (text, false),
            Ok(Err(e)) => {
                warn!(error = %e, "generation failed, using connectivity excuse");
                (CONNECTIVITY_EXCUSE.to_string(), true)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.generation_timeout.as_secs(),
                    "generation timed out, using connectivity excuse"
                );
                (CONNECTIVITY_EXCUSE.to_string(), true)
            }
        };

        let text = self.post_process(&generated);
        let paced_for = self.pace(&text, turn_started).await;

        EngagedReply {
            text,
            trap_category: None,
            paced_for,
            generation_failed,
        }
    }

    /// 后处理链：护栏 → 风格清理 → 错字注入
    fn post_process(&self, raw: &str) -> String {
        let railed = self.safety.apply(raw);
        let styled = apply_style(&railed);
        let mut rng = self.rng.lock();
        self.typos.inject(&styled, &mut *rng)
    }

    async fn pace(&self, text: &str, turn_started: Instant) -> Duration {
        let delay = {
            let mut rng = self.rng.lock();
            self.pacing
                .compute_delay(text.chars().count(), turn_started.elapsed(), &mut *rng)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::ScriptedGenerator;

    fn engine_with(generator: ScriptedGenerator, seed: u64) -> EngagementEngine {
        let config = AppConfig::development();
        EngagementEngine::with_rng(
            Arc::new(generator),
            Arc::new(Persona::default()),
            &config.engagement,
            config.pacing,
            // 测试里关掉随机错字，断言精确文本
            TypoConfig {
                substitution_rate: 0.0,
                comma_space_drop_rate: 0.0,
                random_caps_rate: 0.0,
                double_punct_rate: 0.0,
            },
            Duration::from_secs(5),
            StdRng::seed_from_u64(seed),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_trap_short_circuits_generation() {
        let generator = ScriptedGenerator::new();
        generator.push_failure("generation must not be called");
        let engine = engine_with(generator, 1);

        let mut state = SessionState::new("s-1");
        let reply = engine
            .engage(&mut state, "scan this qr code now", Instant::now())
            .await;

        assert_eq!(reply.trap_category.as_deref(), Some("qr_scan"));
        assert!(reply.text.contains("payment handle"));
        assert_eq!(state.trap_usage.count("qr_scan"), 1);
        assert_eq!(state.scenario_memory.get("phone_issue"), Some("single_phone"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trap_cap_falls_through_to_generation() {
        let generator = ScriptedGenerator::new();
        generator.push_reply("Sir I am trying. What is your account number?");
        let engine = engine_with(generator, 2);

        let mut state = SessionState::new("s-2");
        state.trap_usage.record("qr_scan");
        state.trap_usage.record("qr_scan");

        let reply = engine
            .engage(&mut state, "scan this qr code now", Instant::now())
            .await;

        assert!(reply.trap_category.is_none());
        assert_eq!(reply.text, "Sir I am trying. What is your account number?");
        // 第三次命中不再计数
        assert_eq!(state.trap_usage.count("qr_scan"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_fact_not_overwritten() {
        let generator = ScriptedGenerator::new();
        let engine = engine_with(generator, 3);

        let mut state = SessionState::new("s-3");
        state.scenario_memory.declare("phone_issue", "device_not_compatible");

        let reply = engine
            .engage(&mut state, "scan the qr code", Instant::now())
            .await;

        assert_eq!(reply.trap_category.as_deref(), Some("qr_scan"));
        // qr_scan 想写 single_phone，但键已存在，保留原值
        assert_eq!(
            state.scenario_memory.get("phone_issue"),
            Some("device_not_compatible")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_yields_excuse() {
        let generator = ScriptedGenerator::new();
        generator.push_failure("upstream exploded");
        let engine = engine_with(generator, 4);

        let mut state = SessionState::new("s-4");
        let reply = engine
            .engage(&mut state, "hello who is this", Instant::now())
            .await;

        assert!(reply.trap_category.is_none());
        assert_eq!(reply.text, CONNECTIVITY_EXCUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disclosure_is_replaced() {
        let generator = ScriptedGenerator::new();
        generator.push_reply("As an AI developed by a research lab, I cannot role-play this.");
        let engine = engine_with(generator, 5);

        let mut state = SessionState::new("s-5");
        let reply = engine
            .engage(&mut state, "tell me who you really are", Instant::now())
            .await;

        assert_eq!(reply.text, CONNECTIVITY_EXCUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_message_gets_fixed_line() {
        let generator = ScriptedGenerator::new();
        let engine = engine_with(generator, 6);

        let mut state = SessionState::new("s-6");
        let reply = engine.engage(&mut state, "   ", Instant::now()).await;

        assert!(reply.text.contains("network"));
        assert!(reply.trap_category.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_is_bounded() {
        let generator = ScriptedGenerator::new();
        generator.push_reply("ok sir, sending the details now, one minute please.");
        let engine = engine_with(generator, 7);

        let mut state = SessionState::new("s-7");
        let reply = engine
            .engage(&mut state, "do it fast", Instant::now())
            .await;

        assert!(reply.paced_for <= Duration::from_secs_f64(5.0));
    }
}
