//! 会话阶段
//!
//! 阶段是历史长度的纯阶跃函数，每轮推导、从不存储、不会回退。

use serde::{Deserialize, Serialize};

use crate::config::config::EngagementConfig;

/// 会话阶段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// 初次接触，建立信任
    Hook,
    /// 表现配合，索取对方信息
    Compliance,
    /// 制造障碍，索取备用信息
    Friction,
    /// 抛出大额诱饵
    HoneyTrap,
}

impl ConversationPhase {
    /// 阶段的行为指令（目标 + 战术），供提示词组装使用
    pub fn directive(&self) -> &'static str {
        match self {
            ConversationPhase::Hook => {
                "PHASE: first contact.\n\
                 - Show concern about the issue they raised.\n\
                 - Ask for their official contact details to \"verify\".\n\
                 - Example: \"I understand. Can you share your official contact number so I can verify this?\""
            }
            ConversationPhase::Compliance => {
                "PHASE: active extraction.\n\
                 - You have already shown concern, now focus on getting details.\n\
                 - If they want payment, ask for their payment handle or bank account.\n\
                 - If they want to call, ask for their phone number.\n\
                 - Example: \"I am ready to proceed. Please share your payment handle for the transfer.\""
            }
            ConversationPhase::Friction => {
                "PHASE: friction.\n\
                 - Claim believable failures: payment did not go through, app keeps loading.\n\
                 - Ask for alternative handles, numbers and accounts \"in case this doesn't work\".\n\
                 - Example: \"The transfer failed. Can you share a bank account number instead?\""
            }
            ConversationPhase::HoneyTrap => {
                "PHASE: honey trap.\n\
                 - Mention a fixed deposit maturing soon and ask how to move the full amount.\n\
                 - Ask for complete beneficiary details and a supervisor contact.\n\
                 - Example: \"My FD of 8 lakh matures this week. Which account should I move it to?\""
            }
        }
    }
}

/// 阶段解析器
#[derive(Debug, Clone)]
pub struct PhaseResolver {
    hook_max_turns: usize,
    compliance_max_turns: usize,
    friction_max_turns: usize,
}

impl PhaseResolver {
    /// 创建解析器
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            hook_max_turns: config.hook_max_turns,
            compliance_max_turns: config.compliance_max_turns,
            friction_max_turns: config.friction_max_turns,
        }
    }

    /// 由累计历史长度推导当前阶段
    pub fn resolve(&self, history_len: usize) -> ConversationPhase {
        if history_len <= self.hook_max_turns {
            ConversationPhase::Hook
        } else if history_len <= self.compliance_max_turns {
            ConversationPhase::Compliance
        } else if history_len <= self.friction_max_turns {
            ConversationPhase::Friction
        } else {
            ConversationPhase::HoneyTrap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn resolver() -> PhaseResolver {
        PhaseResolver::new(&AppConfig::development().engagement)
    }

    #[test]
    fn test_phase_thresholds() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(0), ConversationPhase::Hook);
        assert_eq!(resolver.resolve(1), ConversationPhase::Hook);
        assert_eq!(resolver.resolve(2), ConversationPhase::Compliance);
        assert_eq!(resolver.resolve(5), ConversationPhase::Compliance);
        assert_eq!(resolver.resolve(6), ConversationPhase::Friction);
        assert_eq!(resolver.resolve(7), ConversationPhase::Friction);
        assert_eq!(resolver.resolve(12), ConversationPhase::Friction);
        assert_eq!(resolver.resolve(13), ConversationPhase::HoneyTrap);
        assert_eq!(resolver.resolve(100), ConversationPhase::HoneyTrap);
    }

    #[test]
    fn test_phase_is_monotonic() {
        let resolver = resolver();
        let mut last = ConversationPhase::Hook;
        for len in 0..40 {
            let phase = resolver.resolve(len);
            let rank = |p: ConversationPhase| match p {
                ConversationPhase::Hook => 0,
                ConversationPhase::Compliance => 1,
                ConversationPhase::Friction => 2,
                ConversationPhase::HoneyTrap => 3,
            };
            assert!(rank(phase) >= rank(last), "phase regressed at {len}");
            last = phase;
        }
    }

    #[test]
    fn test_each_phase_has_directive() {
        for phase in [
            ConversationPhase::Hook,
            ConversationPhase::Compliance,
            ConversationPhase::Friction,
            ConversationPhase::HoneyTrap,
        ] {
            assert!(phase.directive().starts_with("PHASE:"));
        }
    }
}
