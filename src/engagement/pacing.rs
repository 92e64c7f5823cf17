//! 节奏引擎
//!
//! 计算拟人的回复延迟：按老年打字速度估算输入时长，加上有界的
//! 犹豫抖动，再扣除本轮已经消耗的处理时间，使总体观测延迟逼近
//! 目标值而不是叠加在生成调用之上。

use rand::Rng;
use std::time::Duration;

use crate::config::config::PacingConfig;

/// 节奏引擎
#[derive(Debug, Clone)]
pub struct PacingEngine {
    config: PacingConfig,
}

impl PacingEngine {
    /// 创建引擎
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// 计算附加等待时长
    ///
    /// 结果永远非负且不超过配置的硬上限。
    pub fn compute_delay<R: Rng>(
        &self,
        reply_len: usize,
        elapsed: Duration,
        rng: &mut R,
    ) -> Duration {
        let typing = reply_len as f64 / self.config.chars_per_second;
        let hesitation = rng.gen_range(self.config.hesitation_min..=self.config.hesitation_max);
        let expected = typing + hesitation;

        let residual = expected - elapsed.as_secs_f64();
        if residual <= 0.0 {
            // 生成调用本身已经足够慢，无需再等
            return Duration::ZERO;
        }

        Duration::from_secs_f64(residual.min(self.config.max_delay))
    }

    /// 执行等待
    pub async fn pace<R: Rng>(&self, reply_len: usize, elapsed: Duration, rng: &mut R) -> Duration {
        let delay = self.compute_delay(reply_len, elapsed, rng);
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
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine() -> PacingEngine {
        PacingEngine::new(AppConfig::development().pacing)
    }

    #[test]
    fn test_delay_never_exceeds_ceiling() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(1);

        for len in [0usize, 40, 200, 5000] {
            let delay = engine.compute_delay(len, Duration::ZERO, &mut rng);
            assert!(delay <= Duration::from_secs_f64(5.0), "ceiling violated at len {len}");
        }
    }

    #[test]
    fn test_slow_generation_means_no_wait() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(2);

        // 已经过去 60 秒，任何回复长度都不应再等
        let delay = engine.compute_delay(100, Duration::from_secs(60), &mut rng);
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_delay_is_never_negative() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(3);

        for elapsed in [0u64, 1, 3, 10, 100] {
            let delay = engine.compute_delay(50, Duration::from_secs(elapsed), &mut rng);
            assert!(delay >= Duration::ZERO);
        }
    }

    #[test]
    fn test_longer_reply_waits_longer() {
        let engine = engine();

        // 固定种子使抖动一致，只比较打字时长的影响
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let short = engine.compute_delay(10, Duration::ZERO, &mut rng_a);
        let long = engine.compute_delay(120, Duration::ZERO, &mut rng_b);
        assert!(long >= short);
    }
}
