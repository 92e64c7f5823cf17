//! 语体检测
//!
//! 统计当前消息与最近历史中的方言音译词密度，决定回复语体。

use serde::{Deserialize, Serialize};

/// 方言音译关键词
static VERNACULAR_KEYWORDS: &[&str] = &[
    "hai", "kya", "karo", "karde", "wala", "paise", "bolo", "batao", "accha", "theek", "nahi",
    "haan", "abhi", "jaldi", "bhejo", "kaise", "kaisa", "samjha", "samjho", "dekho", "suno",
    "bhai", "arey", "yaar", "beta", "sahab", "ji", "mera", "tera", "apka", "kahan", "kyun",
    "kab", "kaun", "kitna", "aap", "tum", "hum",
];

/// 回复语体
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMode {
    /// 默认英文
    Default,
    /// 混合方言语体
    VernacularMixed,
}

impl LanguageMode {
    /// 语体指令，供提示词组装使用
    pub fn directive(&self) -> &'static str {
        match self {
            LanguageMode::Default => {
                "LANGUAGE: reply in clear, polite English. \
                 Simple sentences, no slang."
            }
            LanguageMode::VernacularMixed => {
                "LANGUAGE: the counterparty mixes transliterated vernacular into English. \
                 Mirror that register lightly: plain English sentences with an occasional \
                 word like \"haan ji\", \"theek hai\" or \"sir ji\". Do not write full \
                 sentences in the vernacular."
            }
        }
    }
}

/// 语体检测器
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    min_hits: usize,
}

impl LanguageDetector {
    /// 创建检测器
    pub fn new(min_hits: usize) -> Self {
        Self { min_hits }
    }

    /// 检测语体：当前消息与最近历史拼接后按子串计数
    pub fn detect(&self, current: &str, recent: &[&str]) -> LanguageMode {
        let mut combined = current.to_lowercase();
        for text in recent {
            combined.push(' ');
            combined.push_str(&text.to_lowercase());
        }

        let hits = VERNACULAR_KEYWORDS
            .iter()
            .filter(|kw| combined.contains(*kw))
            .count();

        if hits >= self.min_hits {
            LanguageMode::VernacularMixed
        } else {
            LanguageMode::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vernacular_message_detected() {
        let detector = LanguageDetector::new(2);
        assert_eq!(
            detector.detect("kya hua bhai paise bhejo", &[]),
            LanguageMode::VernacularMixed
        );
    }

    #[test]
    fn test_english_message_is_default() {
        let detector = LanguageDetector::new(2);
        assert_eq!(
            detector.detect("your account has been blocked, verify now", &[]),
            LanguageMode::Default
        );
    }

    #[test]
    fn test_recent_history_counts() {
        let detector = LanguageDetector::new(2);
        // 当前消息只有一个方言词，历史补足第二个
        assert_eq!(
            detector.detect("send money jaldi", &["theek hai sir"]),
            LanguageMode::VernacularMixed
        );
    }

    #[test]
    fn test_single_hit_stays_default() {
        let detector = LanguageDetector::new(2);
        assert_eq!(
            detector.detect("please do it jaldi", &[]),
            LanguageMode::Default
        );
    }
}
