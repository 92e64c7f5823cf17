//! 规则回退分类
//!
//! 主分类器不可用时的确定性回退。相同 (消息, 情报) 输入
//! 永远得到相同的分数与判定。

use serde::{Deserialize, Serialize};

use crate::config::config::DetectionConfig;
use crate::models::intel::{Intelligence, RiskCategory};

/// 紧迫话术词
static URGENCY_TERMS: &[&str] = &[
    "urgent", "immediately", "now", "today", "hurry", "jaldi", "abhi", "turant",
];

/// 威胁话术词
static THREAT_TERMS: &[&str] = &[
    "block", "suspend", "arrest", "police", "legal", "court", "case",
];

/// 规则评分结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleVerdict {
    /// 是否判定为诈骗
    pub is_scam: bool,
    /// 原始分数
    ///
    /// 刻意不钳位到 1.0：这是信号强度，不是校准过的概率。
    pub score: f64,
    /// 风险类别
    pub risk_category: RiskCategory,
    /// 判定理由
    pub reason: String,
}

/// 规则评分器
#[derive(Debug, Clone)]
pub struct RuleScorer {
    config: DetectionConfig,
}

impl RuleScorer {
    /// 创建评分器
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// 对 (消息, 情报) 评分
    pub fn score(&self, message: &str, intel: &Intelligence) -> RuleVerdict {
        let mut score = 0.0;
        let mut reasons = Vec::new();
        let message_lower = message.to_lowercase();

        let keyword_count = intel.suspicious_keywords.len();
        if keyword_count >= self.config.keyword_heavy_count {
            score += 0.4;
            reasons.push(format!("multiple suspicious keywords ({keyword_count})"));
        } else if keyword_count >= self.config.keyword_light_count {
            score += 0.2;
            reasons.push(format!("suspicious keywords detected ({keyword_count})"));
        }

        if !intel.payment_handles.is_empty() {
            score += 0.3;
            reasons.push("payment handle detected".to_string());
        }

        if !intel.urls.is_empty() {
            score += 0.3;
            reasons.push("suspicious urls detected".to_string());
        }

        if URGENCY_TERMS.iter().any(|t| message_lower.contains(t)) {
            score += 0.2;
            reasons.push("urgency tactics detected".to_string());
        }

        if THREAT_TERMS.iter().any(|t| message_lower.contains(t)) {
            score += 0.25;
            reasons.push("threat tactics detected".to_string());
        }

        let risk_category = if score >= 0.5 {
            RiskCategory::Financial
        } else if score >= 0.3 {
            RiskCategory::Urgent
        } else {
            RiskCategory::Safe
        };

        RuleVerdict {
            is_scam: score >= self.config.scam_score_threshold,
            score,
            risk_category,
            reason: if reasons.is_empty() {
                "fallback analysis completed".to_string()
            } else {
                reasons.join("; ")
            },
        }
    }
}
