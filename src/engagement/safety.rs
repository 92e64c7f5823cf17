//! 安全护栏
//!
//! 扫描生成文本中暴露自动化来源或拒答的迹象。任何命中都整体
//! 丢弃并替换为固定的断网托词，不做局部涂改。未命中的文本做
//! 轻量清理：剥掉人设名前缀、去掉强调标记、截断到句子上限。

use once_cell::sync::Lazy;
use regex::Regex;

/// 固定的断网托词
///
/// 生成失败与护栏命中共用同一条，在人设内可信。
pub const CONNECTIVITY_EXCUSE: &str =
    "I apologize, there seems to be a connection issue. Can you please share your contact details again?";

/// 暴露/拒答模式
static DISCLOSURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^as an ai",
        r"(?i)\bi'?m an ai\b",
        r"(?i)\bi am an ai\b",
        r"(?i)as a language model",
        r"(?i)\bi'?m a language model\b",
        r"(?i)as an artificial",
        r"(?i)i cannot assist",
        r"(?i)i'?m not able to help",
        r"(?i)i can'?t help with",
        r"(?i)i won'?t (?:be able to )?(?:help|assist)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// 强调标记
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// 安全护栏过滤器
#[derive(Debug, Clone)]
pub struct SafetyRails {
    name_prefix_re: Regex,
    max_sentences: usize,
}

impl SafetyRails {
    /// 创建过滤器
    pub fn new(persona_name: &str, max_sentences: usize) -> Self {
        // "Varun Singh:" 或 "Varun:" 这类前缀
        let first_name = persona_name.split_whitespace().next().unwrap_or(persona_name);
        let pattern = format!(
            r"(?i)^(?:{}|{})\s*:\s*",
            regex::escape(persona_name),
            regex::escape(first_name),
        );
        Self {
            name_prefix_re: Regex::new(&pattern).unwrap(),
            max_sentences,
        }
    }

    /// 过滤生成文本
    pub fn apply(&self, response: &str) -> String {
        let trimmed = response.trim();

        if DISCLOSURE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
            return CONNECTIVITY_EXCUSE.to_string();
        }

        let unprefixed = self.name_prefix_re.replace(trimmed, "");
        let unbold = BOLD_RE.replace_all(&unprefixed, "$1");
        let unitalic = ITALIC_RE.replace_all(&unbold, "$1");
        let plain = CODE_RE.replace_all(&unitalic, "$1");

        truncate_sentences(plain.trim(), self.max_sentences)
    }
}

/// 按句子终止符截断，超出上限时附加省略号
fn truncate_sentences(text: &str, max: usize) -> String {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            // 吃掉连续的终止符（"!!"、"?!"）
            while matches!(chars.peek(), Some('.') | Some('!') | Some('?')) {
                current.push(chars.next().unwrap());
            }
            sentences.push(current.trim().to_string());
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current.trim().to_string());
    }

    if sentences.len() <= max {
        return text.to_string();
    }
    format!("{}...", sentences[..max].join(" "))
}
