//! 风格处理与错字注入
//!
//! 四种独立的随机效果模拟不熟练的手机打字：相邻键误触、
//! 逗号后空格丢失、随机大写、句末标点加倍。随机源由调用方
//! 注入，固定种子下输出可复现。

use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::HashMap;

use crate::config::config::TypoConfig;

/// QWERTY 相邻键表
static ADJACENT_KEYS: Lazy<HashMap<char, &'static [char]>> = Lazy::new(|| {
    let entries: &[(char, &'static [char])] = &[
        ('a', &['s', 'q', 'z']),
        ('b', &['v', 'n', 'g', 'h']),
        ('c', &['x', 'v', 'd', 'f']),
        ('d', &['s', 'f', 'e', 'r', 'c', 'x']),
        ('e', &['w', 'r', 'd', 's']),
        ('f', &['d', 'g', 'r', 't', 'v', 'c']),
        ('g', &['f', 'h', 't', 'y', 'b', 'v']),
        ('h', &['g', 'j', 'y', 'u', 'n', 'b']),
        ('i', &['u', 'o', 'k', 'j']),
        ('j', &['h', 'k', 'u', 'i', 'm', 'n']),
        ('k', &['j', 'l', 'i', 'o', 'm']),
        ('l', &['k', 'o', 'p']),
        ('m', &['n', 'j', 'k']),
        ('n', &['b', 'm', 'h', 'j']),
        ('o', &['i', 'p', 'l', 'k']),
        ('p', &['o', 'l']),
        ('q', &['w', 'a']),
        ('r', &['e', 't', 'd', 'f']),
        ('s', &['a', 'd', 'w', 'e', 'x', 'z']),
        ('t', &['r', 'y', 'f', 'g']),
        ('u', &['y', 'i', 'h', 'j']),
        ('v', &['c', 'b', 'f', 'g']),
        ('w', &['q', 'e', 'a', 's']),
        ('x', &['z', 'c', 's', 'd']),
        ('y', &['t', 'u', 'g', 'h']),
        ('z', &['a', 'x', 's']),
    ];
    entries.iter().copied().collect()
});

/// 错字注入器
#[derive(Debug, Clone)]
pub struct TypoInjector {
    config: TypoConfig,
}

impl TypoInjector {
    /// 创建注入器
    pub fn new(config: TypoConfig) -> Self {
        Self { config }
    }

    /// 注入错字
    pub fn inject<R: Rng>(&self, text: &str, rng: &mut R) -> String {
        if text.is_empty() {
            return String::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let last = chars.len() - 1;
        let mut out = String::with_capacity(text.len() + 2);
        let mut skip_next_space = false;

        for (i, &c) in chars.iter().enumerate() {
            if skip_next_space && c == ' ' {
                skip_next_space = false;
                continue;
            }
            skip_next_space = false;

            let mut emitted = c;

            // 相邻键误触（首尾字符除外）
            if i != 0 && i != last {
                if let Some(adjacent) = ADJACENT_KEYS.get(&c.to_ascii_lowercase()) {
                    if c.is_ascii_alphabetic()
                        && rng.gen_range(0.0..1.0) < self.config.substitution_rate
                    {
                        let slip = adjacent[rng.gen_range(0..adjacent.len())];
                        emitted = if c.is_uppercase() {
                            slip.to_ascii_uppercase()
                        } else {
                            slip
                        };
                    }
                }
            }

            // 逗号后空格丢失
            if c == ',' && chars.get(i + 1) == Some(&' ')
                && rng.gen_range(0.0..1.0) < self.config.comma_space_drop_rate
            {
                skip_next_space = true;
            }

            // 随机大写
            if emitted.is_ascii_lowercase() && rng.gen_range(0.0..1.0) < self.config.random_caps_rate {
                emitted = emitted.to_ascii_uppercase();
            }

            out.push(emitted);
        }

        // 句末标点加倍（整条消息一次判定）
        if let Some(tail) = out.chars().next_back() {
            if matches!(tail, '.' | '!' | '?') && rng.gen_range(0.0..1.0) < self.config.double_punct_rate {
                out.push(tail);
            }
        }

        out
    }
}

/// 风格清理
///
/// 发出前的最后一道整理：去首尾空白、压缩连续空格。
pub fn apply_style(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.trim().chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}
