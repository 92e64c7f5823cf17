use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 抽取到的情报
///
/// 五类字符串集合，按值精确去重，插入顺序无关。跨轮次的累积
/// 由调用方（会话层）通过 [`Intelligence::merge`] 单调合并。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Intelligence {
    /// 收款句柄（localpart@provider）
    pub payment_handles: BTreeSet<String>,
    /// 电话号码（E.164 格式）
    pub phone_numbers: BTreeSet<String>,
    /// 银行账号
    pub bank_accounts: BTreeSet<String>,
    /// URL 与钓鱼链接
    pub urls: BTreeSet<String>,
    /// 命中的可疑关键词
    pub suspicious_keywords: BTreeSet<String>,
}

impl Intelligence {
    /// 是否未抽取到任何情报
    pub fn is_empty(&self) -> bool {
        self.payment_handles.is_empty()
            && self.phone_numbers.is_empty()
            && self.bank_accounts.is_empty()
            && self.urls.is_empty()
            && self.suspicious_keywords.is_empty()
    }

    /// 合并另一份情报（单调并集）
    pub fn merge(&mut self, other: &Intelligence) {
        self.payment_handles
            .extend(other.payment_handles.iter().cloned());
        self.phone_numbers
            .extend(other.phone_numbers.iter().cloned());
        self.bank_accounts
            .extend(other.bank_accounts.iter().cloned());
        self.urls.extend(other.urls.iter().cloned());
        self.suspicious_keywords
            .extend(other.suspicious_keywords.iter().cloned());
    }

    /// 情报条目总数（不含关键词）
    pub fn item_count(&self) -> usize {
        self.payment_handles.len()
            + self.phone_numbers.len()
            + self.bank_accounts.len()
            + self.urls.len()
    }

    /// 生成简要摘要，用于日志与会话查询
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.payment_handles.is_empty() {
            parts.push(format!("handles: {}", self.payment_handles.len()));
        }
        if !self.phone_numbers.is_empty() {
            parts.push(format!("phones: {}", self.phone_numbers.len()));
        }
        if !self.bank_accounts.is_empty() {
            parts.push(format!("accounts: {}", self.bank_accounts.len()));
        }
        if !self.urls.is_empty() {
            parts.push(format!("urls: {}", self.urls.len()));
        }
        if !self.suspicious_keywords.is_empty() {
            parts.push(format!("keywords: {}", self.suspicious_keywords.len()));
        }
        if parts.is_empty() {
            "no intel collected yet".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// 风险类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    /// 金融类诈骗
    Financial,
    /// 制造紧迫感
    Urgent,
    /// 钓鱼链接
    Phishing,
    /// 冒充机构
    Impersonation,
    /// 无法判定
    Unknown,
    /// 安全
    Safe,
}

impl Default for RiskCategory {
    fn default() -> Self {
        RiskCategory::Safe
    }
}

impl RiskCategory {
    /// 从分类器返回的字符串解析，未知取值归入 Unknown
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "financial" => RiskCategory::Financial,
            "urgent" => RiskCategory::Urgent,
            "phishing" => RiskCategory::Phishing,
            "impersonation" => RiskCategory::Impersonation,
            "safe" => RiskCategory::Safe,
            _ => RiskCategory::Unknown,
        }
    }
}

/// 单轮分析结果
///
/// 每轮新建，核心不保留。`confidence_score` 在主分类器路径上
/// 位于 0.0-1.0；规则回退路径上是未钳位的原始分数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 是否检测到诈骗意图
    pub is_scam: bool,
    /// 置信分数
    pub confidence_score: f64,
    /// 风险类别
    pub risk_category: RiskCategory,
    /// 判定理由
    pub reason: String,
    /// 本轮抽取到的情报
    #[serde(rename = "extracted_data")]
    pub extracted: Intelligence,
}

impl AnalysisResult {
    /// 空消息等边界情况下的安全结果
    pub fn safe(reason: &str) -> Self {
        Self {
            is_scam: false,
            confidence_score: 0.0,
            risk_category: RiskCategory::Safe,
            reason: reason.to_string(),
            extracted: Intelligence::default(),
        }
    }
}
