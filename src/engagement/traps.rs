//! 陷阱匹配
//!
//! 固定优先级的触发词表：命中即发出预设应答并跳过生成调用，
//! 每个类别在一个会话内最多触发有限次数。表是静态数据，
//! 扩展新陷阱不需要改动控制流。

use crate::models::session::TrapUsage;

/// 单条陷阱规则
#[derive(Debug)]
pub struct TrapRule {
    /// 类别名
    pub category: &'static str,
    /// 触发关键词（小写）
    pub triggers: &'static [&'static str],
    /// 预设应答
    pub response: &'static str,
    /// 诱导目标
    pub goal: &'static str,
    /// 目标情报类型
    pub intel_target: &'static str,
    /// 触发时写入场景记忆的事实（键只写一次）
    pub scenario_fact: Option<(&'static str, &'static str)>,
}

/// 陷阱表，按优先级排列
pub static TRAP_TABLE: &[TrapRule] = &[
    TrapRule {
        category: "qr_scan",
        triggers: &["scan", "qr", "qr code", "scanner", "barcode"],
        response: "I can not scan the QR code on my phone. Can you share your payment handle instead? I will transfer directly.",
        goal: "extract the counterparty's payment handle",
        intel_target: "payment_handle",
        scenario_fact: Some(("phone_issue", "single_phone")),
    },
    TrapRule {
        category: "remote_access",
        triggers: &[
            "anydesk",
            "teamviewer",
            "quick support",
            "quicksupport",
            "rustdesk",
            "remote",
            "screen share",
            "ammyy",
        ],
        response: "My phone does not support this app. Can we do a direct bank transfer instead? Please share your account number and IFSC code.",
        goal: "avoid remote access, get bank details",
        intel_target: "bank_account",
        scenario_fact: Some(("phone_issue", "device_not_compatible")),
    },
    TrapRule {
        category: "video_call",
        triggers: &["video", "zoom", "google meet", "camera", "video call"],
        response: "I am at the hospital with my wife right now and cannot do a video call. Can you share your WhatsApp number? I will message you there.",
        goal: "extract a phone number",
        intel_target: "phone_number",
        scenario_fact: Some(("health_excuse", "hospital_with_wife")),
    },
    TrapRule {
        category: "otp_request",
        triggers: &[
            "otp",
            "verification code",
            "one time",
            "sms code",
            "4 digit",
            "6 digit",
        ],
        response: "I am not receiving any OTP on my phone. There might be a network issue. Can you share an alternative contact number or email where I can reach you?",
        goal: "extract an alternative contact",
        intel_target: "phone_number",
        scenario_fact: None,
    },
    TrapRule {
        category: "intimidation",
        triggers: &[
            "police",
            "arrest",
            "jail",
            "court",
            "fir",
            "cyber cell",
            "legal",
            "lawyer",
            "summons",
            "warrant",
        ],
        response: "I understand sir. I want to cooperate fully. Can you share your official ID or badge number so I can verify and proceed?",
        goal: "extract credentials or break cover",
        intel_target: "credentials",
        scenario_fact: None,
    },
    TrapRule {
        category: "abuse",
        triggers: &[
            "idiot",
            "stupid",
            "fool",
            "shut up",
            "pagal",
            "bewakoof",
            "gadha",
            "ullu",
        ],
        response: "I apologize for the delay. I am trying my best. Please share your bank account details and I will complete the transfer immediately.",
        goal: "redirect abuse to bank account extraction",
        intel_target: "bank_account",
        scenario_fact: None,
    },
    TrapRule {
        category: "link_click",
        triggers: &["click", "tap", "open link", "visit", "go to"],
        response: "The link is not opening on my phone. Can you share the correct URL again? Also, which website is this from?",
        goal: "confirm and extract the URL",
        intel_target: "url",
        scenario_fact: None,
    },
    TrapRule {
        category: "payment_request",
        triggers: &[
            "send money",
            "transfer",
            "pay",
            "upi",
            "gpay",
            "phonepe",
            "paytm karo",
            "bhejo",
        ],
        response: "I am ready to transfer the amount. Can you confirm your bank account number and IFSC code? I will add you as a beneficiary.",
        goal: "extract bank account details",
        intel_target: "bank_account",
        scenario_fact: None,
    },
];

/// 陷阱匹配器
#[derive(Debug, Clone)]
pub struct TrapMatcher {
    usage_cap: u32,
}

impl TrapMatcher {
    /// 创建匹配器
    pub fn new(usage_cap: u32) -> Self {
        Self { usage_cap }
    }

    /// 扫描消息，返回第一条可触发的陷阱规则
    ///
    /// 已达上限的类别视同未命中，继续向后扫描；
    /// 全部未命中时返回 None，流程落回正常生成。
    pub fn match_trap(&self, message: &str, usage: &TrapUsage) -> Option<&'static TrapRule> {
        let text = message.to_lowercase();

        TRAP_TABLE.iter().find(|rule| {
            usage.count(rule.category) < self.usage_cap
                && rule.triggers.iter().any(|t| text.contains(t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_trigger_matches_first() {
        let matcher = TrapMatcher::new(2);
        let usage = TrapUsage::default();

        let rule = matcher.match_trap("scan this qr code now", &usage).unwrap();
        assert_eq!(rule.category, "qr_scan");
    }

    #[test]
    fn test_capped_category_is_skipped() {
        let matcher = TrapMatcher::new(2);
        let mut usage = TrapUsage::default();
        usage.record("qr_scan");
        usage.record("qr_scan");

        // qr_scan 已达上限；"scan ... transfer" 落到 payment_request
        let rule = matcher
            .match_trap("scan the qr and transfer fast", &usage)
            .unwrap();
        assert_eq!(rule.category, "payment_request");

        // 没有其他触发词时整体不命中
        assert!(matcher.match_trap("scan this qr code now", &usage).is_none());
    }

    #[test]
    fn test_table_order_is_priority() {
        let matcher = TrapMatcher::new(2);
        let usage = TrapUsage::default();

        // 同时含 qr 与 transfer 时，表内靠前的 qr_scan 胜出
        let rule = matcher
            .match_trap("scan qr to transfer money", &usage)
            .unwrap();
        assert_eq!(rule.category, "qr_scan");
    }

    #[test]
    fn test_case_insensitive_matching() {
        let matcher = TrapMatcher::new(2);
        let usage = TrapUsage::default();

        let rule = matcher.match_trap("Download ANYDESK please", &usage).unwrap();
        assert_eq!(rule.category, "remote_access");
    }

    #[test]
    fn test_no_trigger_no_match() {
        let matcher = TrapMatcher::new(2);
        let usage = TrapUsage::default();
        assert!(matcher.match_trap("hello, how are you", &usage).is_none());
    }
}
