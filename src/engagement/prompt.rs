//! 提示词组装
//!
//! 由 (阶段, 语体, 场景记忆, 人设) 纯函数式地组装生成指令文档。
//! 段落顺序固定；本模块只组装，不触发生成。

use std::sync::Arc;

use crate::engagement::language::LanguageMode;
use crate::engagement::phase::ConversationPhase;
use crate::models::persona::Persona;
use crate::models::session::ScenarioMemory;

/// 提示词组装器
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: Arc<Persona>,
    max_sentences: usize,
}

impl PromptBuilder {
    /// 创建组装器
    pub fn new(persona: Arc<Persona>, max_sentences: usize) -> Self {
        Self {
            persona,
            max_sentences,
        }
    }

    /// 组装指令文档
    ///
    /// 段落顺序：人设身份与诱饵 → 不变行为规则 → 阶段指令 →
    /// 语体指令 → 场景记忆一致性 → 输出硬约束。
    pub fn build(
        &self,
        phase: ConversationPhase,
        language: LanguageMode,
        memory: &ScenarioMemory,
    ) -> String {
        let mut sections = Vec::with_capacity(6);

        // 1. 人设身份与诱饵事实
        sections.push(format!(
            "You are {}, a {}-year-old {} from {}.\n\n{}",
            self.persona.name,
            self.persona.age,
            self.persona.occupation,
            self.persona.location,
            self.persona.identity_section(),
        ));

        // 2. 不变行为规则
        let mut rules = String::from(
            "INVARIANT RULES:\n\
             1. NEVER actually complete any transaction or share real credentials.\n\
             2. NEVER admit you are automated, synthetic, or anything but this person.\n\
             3. Address the counterparty respectfully (\"sir\"/\"madam\").\n\
             4. Appear cooperative, but always need their details first.\n\
             5. Always ask for NEW information you do not have yet.",
        );
        if !self.persona.excuses.is_empty() {
            rules.push_str("\n\nWhen you need to stall, use one of your usual excuses:");
            for excuse in &self.persona.excuses {
                rules.push_str(&format!("\n- \"{excuse}\""));
            }
        }
        sections.push(rules);

        // 3. 阶段指令
        sections.push(phase.directive().to_string());

        // 4. 语体指令
        sections.push(language.directive().to_string());

        // 5. 场景记忆一致性
        if !memory.is_empty() {
            let mut lines = vec!["CONSISTENCY: you already stated the following, do not contradict it:".to_string()];
            for (key, value) in memory.iter() {
                lines.push(format!("- {}: {} (remain consistent)", key.replace('_', " "), value.replace('_', " ")));
            }
            sections.push(lines.join("\n"));
        }

        // 6. 输出硬约束
        sections.push(format!(
            "OUTPUT RESTRICTIONS:\n\
             - At most {} sentences.\n\
             - Never say \"as an AI\", \"language model\", or refuse the conversation.\n\
             - End with a question that asks for their contact or payment details.",
            self.max_sentences,
        ));

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(Arc::new(Persona::default()), 3)
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = builder().build(
            ConversationPhase::Compliance,
            LanguageMode::Default,
            &ScenarioMemory::default(),
        );

        let identity = prompt.find("YOUR COVER IDENTITY").unwrap();
        let rules = prompt.find("INVARIANT RULES").unwrap();
        let phase = prompt.find("PHASE:").unwrap();
        let language = prompt.find("LANGUAGE:").unwrap();
        let output = prompt.find("OUTPUT RESTRICTIONS").unwrap();

        assert!(identity < rules && rules < phase && phase < language && language < output);
    }

    #[test]
    fn test_memory_facts_rendered() {
        let mut memory = ScenarioMemory::default();
        memory.declare("phone_issue", "device_not_compatible");

        let prompt = builder().build(
            ConversationPhase::Friction,
            LanguageMode::Default,
            &memory,
        );

        assert!(prompt.contains("you already stated"));
        assert!(prompt.contains("phone issue: device not compatible"));
    }

    #[test]
    fn test_empty_memory_omits_consistency_section() {
        let prompt = builder().build(
            ConversationPhase::Hook,
            LanguageMode::Default,
            &ScenarioMemory::default(),
        );
        assert!(!prompt.contains("CONSISTENCY"));
    }

    #[test]
    fn test_vernacular_directive_included() {
        let prompt = builder().build(
            ConversationPhase::Hook,
            LanguageMode::VernacularMixed,
            &ScenarioMemory::default(),
        );
        assert!(prompt.contains("transliterated vernacular"));
    }
}
