//! 文本规范化
//!
//! 还原诈骗者常用的文本混淆手段：跨文字系统的同形字、符号/数字
//! 替换字母、零宽字符、逐字符空格拆词。规范化是全函数，永不失败，
//! 最坏情况返回空字符串，且满足 normalize(normalize(x)) == normalize(x)。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// 同形字映射表（西里尔/希腊字母 → 拉丁字母）
///
/// 静态数据表而非分支逻辑，便于扩展和本地化。
static HOMOGLYPH_MAP: Lazy<HashMap<char, char>> = Lazy::new(|| {
    let pairs: &[(char, char)] = &[
        // 西里尔字母
        ('а', 'a'),
        ('А', 'A'),
        ('в', 'b'),
        ('В', 'B'),
        ('с', 'c'),
        ('С', 'C'),
        ('е', 'e'),
        ('Е', 'E'),
        ('ё', 'e'),
        ('Ё', 'E'),
        ('һ', 'h'),
        ('Һ', 'H'),
        ('і', 'i'),
        ('І', 'I'),
        ('ј', 'j'),
        ('Ј', 'J'),
        ('к', 'k'),
        ('К', 'K'),
        ('м', 'm'),
        ('М', 'M'),
        ('н', 'n'),
        ('Н', 'H'),
        ('о', 'o'),
        ('О', 'O'),
        ('р', 'p'),
        ('Р', 'P'),
        ('ѕ', 's'),
        ('Ѕ', 'S'),
        ('т', 't'),
        ('Т', 'T'),
        ('у', 'y'),
        ('У', 'Y'),
        ('х', 'x'),
        ('Х', 'X'),
        // 希腊字母
        ('α', 'a'),
        ('Α', 'A'),
        ('β', 'b'),
        ('Β', 'B'),
        ('ε', 'e'),
        ('Ε', 'E'),
        ('η', 'n'),
        ('Η', 'H'),
        ('ι', 'i'),
        ('Ι', 'I'),
        ('κ', 'k'),
        ('Κ', 'K'),
        ('ν', 'v'),
        ('Ν', 'N'),
        ('ο', 'o'),
        ('Ο', 'O'),
        ('ρ', 'p'),
        ('Ρ', 'P'),
        ('τ', 't'),
        ('Τ', 'T'),
        ('υ', 'u'),
        ('Υ', 'Y'),
        ('χ', 'x'),
        ('Χ', 'X'),
    ];
    pairs.iter().copied().collect()
});

/// 符号/数字替代字母映射
static LOOKALIKE_MAP: Lazy<HashMap<char, char>> = Lazy::new(|| {
    [
        ('0', 'o'),
        ('1', 'l'),
        ('3', 'e'),
        ('4', 'a'),
        ('5', 's'),
        ('7', 't'),
        ('$', 's'),
        ('!', 'i'),
        ('|', 'l'),
        ('@', 'a'),
    ]
    .into_iter()
    .collect()
});

/// 需要移除的零宽/不可见码点
const ZERO_WIDTH: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{2060}', '\u{00AD}',
];

/// 词内强调噪音字符
const EMPHASIS_NOISE: &[char] = &['*', '_', '~', '`'];

/// 逐字符空格拆词："P a y t m" 这类单字母间隔序列（3 个及以上）
static SPACED_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z](?:[ \t][A-Za-z]){2,}\b").unwrap());

/// 连续空格/制表符
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// 三个以上连续换行
static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// 文本规范化器
#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    /// 创建规范化器
    pub fn new() -> Self {
        Self
    }

    /// 规范化文本
    ///
    /// 迭代应用各步骤直到不动点，保证整体幂等。
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut current = normalize_pass(text);
        // 拆词合并可能暴露新的替代字母上下文（"B L 0 C K" → "BL0CK"）
        for _ in 0..4 {
            let next = normalize_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// 单趟规范化：NFKC → 同形字 → 替代字母/噪音 → 零宽移除 → 拆词合并 → 空白整理
fn normalize_pass(text: &str) -> String {
    let folded: String = text.nfkc().collect();

    let unglyphed: String = folded
        .chars()
        .map(|c| HOMOGLYPH_MAP.get(&c).copied().unwrap_or(c))
        .collect();

    let substituted = substitute_lookalikes(&unglyphed);

    let visible: String = substituted
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .collect();

    let collapsed = SPACED_CHARS_RE
        .replace_all(&visible, |caps: &regex::Captures| {
            caps[0].chars().filter(|c| !c.is_whitespace()).collect::<String>()
        })
        .into_owned();

    let spaced = SPACE_RUN_RE.replace_all(&collapsed, " ");
    let tidy = NEWLINE_RUN_RE.replace_all(&spaced, "\n\n");
    tidy.trim().to_string()
}

/// 上下文相关的替代字母还原
///
/// 只有当字符夹在字母之间、且不属于连续数字串时才替换；
/// `@` 在构成合理句柄（两侧为多字符的字母数字段）时保留。
/// 词内的强调噪音（* _ ~ `）直接剥除。
fn substitute_lookalikes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut last_emitted: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        let prev_alpha = last_emitted.map_or(false, |p| p.is_alphabetic());
        let next_alpha = next_effective(&chars, i).map_or(false, |n| n.is_alphabetic());

        // 词内强调噪音直接剥除，不进入输出
        if EMPHASIS_NOISE.contains(&c) && prev_alpha && next_alpha {
            continue;
        }

        let emitted = match LOOKALIKE_MAP.get(&c) {
            Some(&sub) if c == '@' => {
                if forms_handle(&chars, i) {
                    c
                } else if prev_alpha || next_alpha {
                    sub
                } else {
                    c
                }
            }
            Some(&sub) => {
                let in_digit_run = c.is_ascii_digit()
                    && (i.checked_sub(1)
                        .and_then(|p| chars.get(p))
                        .map_or(false, |p| p.is_ascii_digit())
                        || chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()));

                if prev_alpha && next_alpha && !in_digit_run {
                    sub
                } else {
                    c
                }
            }
            None => c,
        };

        out.push(emitted);
        last_emitted = Some(emitted);
    }

    out
}

/// 跳过替代符号后的下一个有效字符
fn next_effective(chars: &[char], i: usize) -> Option<char> {
    chars[i + 1..]
        .iter()
        .copied()
        .find(|c| !LOOKALIKE_MAP.contains_key(c) || c.is_ascii_digit())
}

/// 判断 `@` 是否构成真实句柄：本地部分 ≥2 个句柄字符，域部分 ≥2 个字母数字
fn forms_handle(chars: &[char], at: usize) -> bool {
    let local_len = chars[..at]
        .iter()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .count();
    let domain_len = chars[at + 1..]
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric())
        .count();
    local_len >= 2 && domain_len >= 2
}
