use serde::{Deserialize, Serialize};

/// 诱饵人设
///
/// 固定身份档案，进程启动时加载一次，所有会话只读共享。
/// 银行字段是诱饵数据，用于换取对方的收款信息，绝不对应真实账户。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// 姓名
    pub name: String,
    /// 年龄
    pub age: u32,
    /// 职业
    pub occupation: String,
    /// 所在地
    pub location: String,
    /// 手机型号
    pub phone_model: String,

    /// 诱饵银行名称
    pub bank_name: String,
    /// 诱饵账号末四位
    pub account_last_4: String,
    /// 诱饵收款句柄
    pub payment_handle: String,
    /// 诱饵存款金额
    pub savings_amount: String,

    /// 借口库（失败/拖延时的在人设内托词）
    pub excuses: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Varun Singh".into(),
            age: 45,
            occupation: "IT Manager at a private company".into(),
            location: "Mumbai, Maharashtra".into(),
            phone_model: "Samsung Galaxy S21".into(),
            bank_name: "HDFC Bank".into(),
            account_last_4: "7823".into(),
            payment_handle: "varun.singh45@hdfcbank".into(),
            savings_amount: "Rs. 8,50,000".into(),
            excuses: vec![
                "I am having some network problem, one minute please.".into(),
                "My phone is hanging, please bear with me.".into(),
                "The app is not opening, it keeps loading only.".into(),
            ],
        }
    }
}

impl Persona {
    /// 渲染为提示词中的身份与诱饵段落
    pub fn identity_section(&self) -> String {
        format!(
            "YOUR COVER IDENTITY (use these details when needed):\n\
             - Name: {}\n\
             - Age: {} years\n\
             - Occupation: {}\n\
             - Location: {}\n\
             - Phone: {}\n\n\
             YOUR BAIT BANKING DETAILS (share these to extract their details):\n\
             - Bank: {}\n\
             - Account ending: ...{}\n\
             - Payment handle: {}\n\
             - Savings: {}\n\n\
             STRATEGY: appear willing to comply, but always need their details first.",
            self.name,
            self.age,
            self.occupation,
            self.location,
            self.phone_model,
            self.bank_name,
            self.account_last_4,
            self.payment_handle,
            self.savings_amount,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_section_contains_bait() {
        let persona = Persona::default();
        let section = persona.identity_section();
        assert!(section.contains(&persona.name));
        assert!(section.contains(&persona.payment_handle));
        assert!(section.contains("their details first"));
    }
}
