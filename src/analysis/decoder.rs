//! 失效安全解码器
//!
//! 将主分类器的原始回复解析为结构化判定。解析策略逐级降级，
//! 任何一级失败都不致命；最后一级保证返回值，并刻意偏向
//! `is_scam = true`：误把正常发件人当作诈骗可以容忍，
//! 悄悄放走真正的诈骗不可以。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::intel::RiskCategory;

/// 解码兜底时使用的固定低置信度标记
pub const DEFAULTED_CONFIDENCE: f64 = 0.5;

/// 围栏代码块
static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap());

/// 分类器回复的线格式
#[derive(Debug, Deserialize)]
struct VerdictWire {
    is_scam: bool,
    #[serde(default)]
    risk_category: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// 解码后的判定
#[derive(Debug, Clone)]
pub struct DecodedVerdict {
    /// 是否判定为诈骗
    pub is_scam: bool,
    /// 风险类别
    pub risk_category: RiskCategory,
    /// 判定理由
    pub reason: String,
    /// 分类器自报置信度
    pub confidence: f64,
    /// 是否走到了兜底默认值
    pub defaulted: bool,
}

impl From<VerdictWire> for DecodedVerdict {
    fn from(wire: VerdictWire) -> Self {
        DecodedVerdict {
            is_scam: wire.is_scam,
            risk_category: wire
                .risk_category
                .as_deref()
                .map(RiskCategory::parse)
                .unwrap_or(RiskCategory::Unknown),
            reason: wire.reason.unwrap_or_default(),
            confidence: wire.confidence.unwrap_or(DEFAULTED_CONFIDENCE).clamp(0.0, 1.0),
            defaulted: false,
        }
    }
}

/// 回复解码器
#[derive(Debug, Clone, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    /// 创建解码器
    pub fn new() -> Self {
        Self
    }

    /// 解码原始回复，总是返回判定
    pub fn decode(&self, raw: &str) -> DecodedVerdict {
        if raw.trim().is_empty() {
            return Self::defaulted("empty classifier response - defaulting to scam engagement");
        }

        // 第 1 级：剥掉围栏代码块后严格解析
        let cleaned = match FENCED_BLOCK_RE.captures(raw) {
            Some(caps) => caps[1].trim().to_string(),
            None => raw.trim().to_string(),
        };

        // 第 2 级：对清理后的文本直接严格解析
        if let Ok(wire) = serde_json::from_str::<VerdictWire>(&cleaned) {
            return wire.into();
        }

        // 第 3 级：找出第一个括号配平的子串再解析
        if let Some(candidate) = first_balanced_object(&cleaned) {
            if let Ok(wire) = serde_json::from_str::<VerdictWire>(candidate) {
                return wire.into();
            }
        }

        // 第 4 级：在键名附近启发式找布尔字面量
        if let Some(verdict) = boolean_near_key(&cleaned) {
            return verdict;
        }

        // 第 5 级：兜底，偏向判定为诈骗
        Self::defaulted("classifier response unparseable - defaulting to scam engagement")
    }

    fn defaulted(reason: &str) -> DecodedVerdict {
        DecodedVerdict {
            is_scam: true,
            risk_category: RiskCategory::Unknown,
            reason: reason.to_string(),
            confidence: DEFAULTED_CONFIDENCE,
            defaulted: true,
        }
    }
}

/// 提取第一个括号配平的 `{...}` 子串，忽略字符串字面量内部的括号
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// 在 `is_scam` 键名之后的窗口里找 true/false
fn boolean_near_key(text: &str) -> Option<DecodedVerdict> {
    let lower = text.to_lowercase();
    let key_at = lower.find("is_scam")?;
    let window: String = lower[key_at..].chars().take(60).collect();

    let truth = window.find("true");
    let falsity = window.find("false");

    let is_scam = match (truth, falsity) {
        (Some(t), Some(f)) => t < f,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => return None,
    };

    Some(DecodedVerdict {
        is_scam,
        risk_category: RiskCategory::Unknown,
        reason: "extracted from malformed classifier response".to_string(),
        confidence: 0.6,
        defaulted: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decode(raw: &str) -> DecodedVerdict {
        ResponseDecoder::new().decode(raw)
    }

    #[test]
    fn test_strict_json() {
        let verdict = decode(r#"{"is_scam": true, "risk_category": "financial", "reason": "otp request", "confidence": 0.9}"#);
        assert!(verdict.is_scam);
        assert!(!verdict.defaulted);
        assert_eq!(verdict.risk_category, RiskCategory::Financial);
        assert_eq!(verdict.confidence, 0.9);
    }

    #[test]
    fn test_fenced_block_stripped() {
        let raw = "```json\n{\"is_scam\": false, \"risk_category\": \"safe\"}\n```";
        let verdict = decode(raw);
        assert!(!verdict.is_scam);
        assert!(!verdict.defaulted);
        assert_eq!(verdict.risk_category, RiskCategory::Safe);
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let raw = r#"Here is my analysis: {"is_scam": true, "reason": "urgency"} hope it helps"#;
        let verdict = decode(raw);
        assert!(verdict.is_scam);
        assert!(!verdict.defaulted);
    }

    #[test]
    fn test_nested_object_is_balanced() {
        let raw = r#"noise {"is_scam": true, "extra": {"depth": 2}} trailing"#;
        let verdict = decode(raw);
        assert!(verdict.is_scam);
        assert!(!verdict.defaulted);
    }

    #[test]
    fn test_boolean_proximity_fallback() {
        let verdict = decode("the field is_scam should be true here, I think");
        assert!(verdict.is_scam);
        assert!(!verdict.defaulted);
        assert_eq!(verdict.confidence, 0.6);

        let verdict = decode("is_scam: false because it is a routine notice");
        assert!(!verdict.is_scam);
    }

    #[rstest]
    #[case("")]
    #[case("complete nonsense with no structure")]
    #[case("{broken json")]
    #[case("[1, 2, 3]")]
    fn test_garbage_defaults_to_scam(#[case] raw: &str) {
        let verdict = decode(raw);
        assert!(verdict.is_scam, "fail-open violated for {raw:?}");
        assert!(verdict.defaulted);
        assert_eq!(verdict.confidence, DEFAULTED_CONFIDENCE);
    }
}
