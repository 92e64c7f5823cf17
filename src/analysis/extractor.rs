//! 情报抽取
//!
//! 从原始文本与规范化文本中抽取收款句柄、电话号码、银行账号、
//! URL 和可疑关键词。抽取是全函数，永不失败，最坏情况返回空结果。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;

use crate::models::intel::Intelligence;

/// 收款句柄提供方白名单
///
/// 仅接受已知的支付提供方，公共邮箱域名一律拒绝。
static PAYMENT_PROVIDERS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "okicici",
        "okhdfc",
        "okhdfcbank",
        "okaxis",
        "oksbi",
        "okboi",
        "okcanarabank",
        "okidfcfirst",
        "okkotak",
        "paytm",
        "gpay",
        "phonepe",
        "ybl",
        "upi",
        "axl",
        "ibl",
        "sbi",
        "hdfcbank",
        "icici",
        "axisbank",
        "kotak",
        "indus",
        "citi",
        "freecharge",
        "airtel",
        "jio",
        "amazon",
        "waaxis",
        "wahdfcbank",
        "wasbi",
        "apl",
        "rapl",
        "yapl",
        "ikwik",
        "jupiteraxis",
        "barodampay",
        "fbl",
        "federal",
        "unionbank",
        "uboi",
        "uco",
        "rbl",
        "idbi",
        "pnb",
        "cnrb",
        "dbs",
        "sib",
        "yesbank",
        "kbl",
        "kvb",
        "dlb",
        "jkb",
        "psb",
        "allbank",
    ]
    .into_iter()
    .collect()
});

/// 公共邮箱域名（非收款句柄）
static GENERIC_MAIL_DOMAINS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "gmail",
        "googlemail",
        "yahoo",
        "hotmail",
        "outlook",
        "rediffmail",
        "protonmail",
        "icloud",
        "live",
        "aol",
        "zoho",
        "mail",
    ]
    .into_iter()
    .collect()
});

/// 英文可疑关键词
static SUSPICIOUS_KEYWORDS_EN: &[&str] = &[
    // 紧迫
    "urgent",
    "immediately",
    "now",
    "today only",
    "last chance",
    "hurry",
    "limited time",
    "act fast",
    "don't delay",
    "expire",
    "deadline",
    // 威胁
    "block",
    "blocked",
    "suspend",
    "suspended",
    "terminate",
    "close",
    "legal action",
    "police",
    "arrest",
    "court",
    "case",
    "fir",
    "cyber crime",
    "fraud",
    "investigation",
    // 金融
    "verify",
    "update",
    "confirm",
    "link aadhaar",
    "kyc",
    "pan card",
    "bank account",
    "credit card",
    "debit card",
    "atm",
    "cvv",
    "pin",
    "otp",
    "password",
    "login",
    "credentials",
    // 奖励诱饵
    "congratulations",
    "winner",
    "won",
    "lottery",
    "prize",
    "reward",
    "cashback",
    "refund",
    "claim",
    "bonus",
    "gift",
    "free",
    // 行动指令
    "click",
    "tap",
    "open",
    "download",
    "install",
    "share",
    "forward",
    "call back",
    "reply",
    "send",
    "transfer",
    "pay",
];

/// 方言音译可疑关键词
static SUSPICIOUS_KEYWORDS_VERNACULAR: &[&str] = &[
    // 动作
    "karo",
    "karde",
    "kijiye",
    "karein",
    "karna",
    "kar do",
    "bhejo",
    "bhej do",
    "bhejiye",
    "batao",
    "bataiye",
    "dijiye",
    "de do",
    "dena",
    // 紧迫
    "urgent hai",
    "jaldi",
    "abhi",
    "turant",
    "foran",
    "aaj hi",
    "kal tak",
    "time khatam",
    // 威胁
    "band ho jayega",
    "block ho jayega",
    "band kar denge",
    "thana",
    "jail",
    "pakad lenge",
    // 常见话术
    "aapka account",
    "aapka number",
    "aapka bank",
    "otp bhejo",
    "code bhejo",
    "pin batao",
    "paisa transfer",
    "paise bhejo",
    "payment karo",
    // 取信
    "main bol raha",
    "bank se",
    "government se",
    "sarkari",
    "customer care",
    "helpline",
    // 贪婪诱饵
    "inam",
    "jeet gaye",
    "aapko mila",
];

/// 收款句柄：localpart@provider
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z0-9][a-z0-9._-]{1,49})@([a-z][a-z0-9]{1,24})\b").unwrap());

/// 电话号码：可选国家码 + 10 位，首位 6-9，允许空格/点/短横分隔
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+91|91|0)?[\s.\-]*([6-9](?:[\s.\-]?[0-9]){9})").unwrap());

/// 银行账号（上下文通道）：关键词后跟 9-18 位数字
static BANK_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:a/?c\.?|account|acct|acc|bank|savings|current)\s*(?:no\.?|number|num|#)?[\s:.\-]*([0-9]{9,18})",
    )
    .unwrap()
});

/// 裸数字串（独立通道候选）
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// URL：可选协议 + 域名 + 已知 TLD + 可选路径
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:https?://)?(?:www\.)?(?:[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.)+(?:com|in|net|org|xyz|info|biz|co|io|me|app|link|site|online|tech|shop|store|click|top|win|vip|club|live|buzz)(?:/[^\s<>"']*)?"#,
    )
    .unwrap()
});

/// 已知短链域名
static SHORT_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:bit\.ly|goo\.gl|t\.co|tinyurl\.com|ow\.ly|is\.gd|buff\.ly|adf\.ly|bc\.vc|j\.mp|rb\.gy|cutt\.ly|shorturl\.at|tiny\.cc)/[a-z0-9_\-]+",
    )
    .unwrap()
});

/// 可疑关键词整词匹配
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let mut all: Vec<String> = SUSPICIOUS_KEYWORDS_EN
        .iter()
        .chain(SUSPICIOUS_KEYWORDS_VERNACULAR.iter())
        .map(|kw| regex::escape(kw))
        .collect();
    // 长词优先，避免前缀词抢先匹配
    all.sort_by_key(|kw| std::cmp::Reverse(kw.len()));
    Regex::new(&format!(r"(?i)\b(?:{})\b", all.join("|"))).unwrap()
});

/// 情报抽取器
#[derive(Debug, Clone, Default)]
pub struct Extractor;

impl Extractor {
    /// 创建抽取器
    pub fn new() -> Self {
        Self
    }

    /// 从原始文本与规范化文本中抽取情报
    pub fn extract(&self, raw: &str, normalized: &str) -> Intelligence {
        let mut intel = Intelligence::default();

        for text in [raw, normalized] {
            let phone_spans = extract_phones(text, &mut intel);
            extract_handles(text, &mut intel);
            extract_bank_accounts(text, &phone_spans, &mut intel);
            extract_urls(text, &mut intel);
        }

        for m in KEYWORD_RE.find_iter(raw).chain(KEYWORD_RE.find_iter(normalized)) {
            intel.suspicious_keywords.insert(m.as_str().to_lowercase());
        }

        intel
    }
}

/// 抽取电话号码，返回已认领的字节区间（电话优先于银行账号）
fn extract_phones(text: &str, intel: &mut Intelligence) -> Vec<Range<usize>> {
    let mut claimed = Vec::new();

    for caps in PHONE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let number = caps.get(1).unwrap();

        // 前后紧邻数字说明这是更长数字串的一部分，不是电话号码
        if text[..whole.start()]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_digit())
        {
            continue;
        }
        if text[number.end()..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_digit())
        {
            continue;
        }

        let digits: String = number.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9') {
            intel.phone_numbers.insert(format!("+91{digits}"));
            claimed.push(whole.start()..number.end());
        }
    }

    claimed
}

fn extract_handles(text: &str, intel: &mut Intelligence) {
    for caps in HANDLE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();

        // 模拟负向后顾：前一个字符属于邮箱本体字符时跳过
        if text[..whole.start()]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
        {
            continue;
        }

        let provider = caps[2].to_lowercase();
        if GENERIC_MAIL_DOMAINS.contains(provider.as_str()) {
            continue;
        }
        if !PAYMENT_PROVIDERS.contains(provider.as_str()) {
            continue;
        }

        let handle = format!("{}@{}", caps[1].to_lowercase(), provider);
        if handle.len() >= 5 {
            intel.payment_handles.insert(handle);
        }
    }
}

fn extract_bank_accounts(text: &str, phone_spans: &[Range<usize>], intel: &mut Intelligence) {
    let overlaps_phone = |range: &Range<usize>| {
        phone_spans
            .iter()
            .any(|span| range.start < span.end && span.start < range.end)
    };

    // 上下文通道：账号关键词后的 9-18 位数字，置信度高
    for caps in BANK_CONTEXT_RE.captures_iter(text) {
        let digits = caps.get(1).unwrap();
        if text[digits.end()..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_digit())
        {
            continue;
        }
        let range = digits.start()..digits.end();
        if overlaps_phone(&range) {
            continue;
        }
        if intel.phone_numbers.iter().any(|p| p.ends_with(digits.as_str())) {
            continue;
        }
        intel.bank_accounts.insert(digits.as_str().to_string());
    }

    // 独立通道：11-18 位裸数字串，未被电话通道认领时才接受
    for m in DIGIT_RUN_RE.find_iter(text) {
        if !(11..=18).contains(&m.as_str().len()) {
            continue;
        }
        let range = m.start()..m.end();
        if overlaps_phone(&range) {
            continue;
        }
        intel.bank_accounts.insert(m.as_str().to_string());
    }
}

fn extract_urls(text: &str, intel: &mut Intelligence) {
    for m in URL_RE.find_iter(text).chain(SHORT_URL_RE.find_iter(text)) {
        let cleaned = m
            .as_str()
            .trim()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        if cleaned.len() <= 5 {
            continue;
        }
        let url = if cleaned.to_lowercase().starts_with("http") {
            cleaned.to_string()
        } else {
            format!("http://{cleaned}")
        };
        intel.urls.insert(url);
    }
}
