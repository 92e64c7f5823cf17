//! 可观测性模块
//!
//! 提供基于原子计数的轻量指标、健康检查与存活/就绪探针。

use axum::{Json, Router, response::IntoResponse, routing::get};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// ===== Simple Metrics (using atomics for zero-dep implementation) =====

/// 应用指标
#[derive(Clone, Default)]
pub struct AppMetrics {
    pub http_requests_total: Arc<AtomicU64>,
    pub turns_total: Arc<AtomicU64>,
    pub scams_detected_total: Arc<AtomicU64>,
    pub traps_fired_total: Arc<AtomicU64>,
    pub fallback_detections_total: Arc<AtomicU64>,
    pub generation_failures_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self) {
        self.http_requests_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录处理轮次
    pub fn record_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录诈骗判定
    pub fn record_scam_detected(&self) {
        self.scams_detected_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录陷阱触发
    pub fn record_trap_fired(&self) {
        self.traps_fired_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录规则回退
    pub fn record_fallback_detection(&self) {
        self.fallback_detections_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录生成失败
    pub fn record_generation_failure(&self) {
        self.generation_failures_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP turns_total Total turns processed
# TYPE turns_total counter
turns_total {}
# HELP scams_detected_total Turns classified as scam
# TYPE scams_detected_total counter
scams_detected_total {}
# HELP traps_fired_total Trap responses emitted
# TYPE traps_fired_total counter
traps_fired_total {}
# HELP fallback_detections_total Turns classified by the rule fallback
# TYPE fallback_detections_total counter
fallback_detections_total {}
# HELP generation_failures_total External generation failures
# TYPE generation_failures_total counter
generation_failures_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
"#,
            self.http_requests_total.load(Ordering::SeqCst),
            self.turns_total.load(Ordering::SeqCst),
            self.scams_detected_total.load(Ordering::SeqCst),
            self.traps_fired_total.load(Ordering::SeqCst),
            self.fallback_detections_total.load(Ordering::SeqCst),
            self.generation_failures_total.load(Ordering::SeqCst),
            self.errors_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
}

/// 应用状态（用于健康检查）
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            start_time: Utc::now(),
            version,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(
    state: axum::extract::State<Arc<ObservabilityState>>,
) -> impl IntoResponse {
    let health_status = HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(health_status)
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查
pub async fn readiness() -> impl IntoResponse {
    "Ready"
}

/// 指标端点
pub async fn metrics(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    state.metrics.gather()
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counters() {
        let metrics = AppMetrics::default();
        metrics.record_turn();
        metrics.record_turn();
        metrics.record_scam_detected();
        metrics.record_trap_fired();

        let gathered = metrics.gather();
        assert!(gathered.contains("turns_total 2"));
        assert!(gathered.contains("scams_detected_total 1"));
        assert!(gathered.contains("traps_fired_total 1"));
    }

    #[test]
    fn test_uptime_is_non_negative() {
        let state = ObservabilityState::new("0.1.0".to_string(), Arc::new(AppMetrics::default()));
        assert!(state.uptime_seconds() >= 0.0);
    }
}
