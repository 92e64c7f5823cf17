//! 交互模块
//!
//! 确认诈骗后驱动诱饵人设：陷阱应答、阶段状态机、语体检测、
//! 提示词组装与生成后处理。

pub mod engine;
pub mod language;
pub mod pacing;
pub mod phase;
pub mod prompt;
pub mod safety;
pub mod style;
pub mod traps;

pub use engine::{EngagedReply, EngagementEngine};
pub use language::{LanguageDetector, LanguageMode};
pub use pacing::PacingEngine;
pub use phase::{ConversationPhase, PhaseResolver};
pub use prompt::PromptBuilder;
pub use safety::{CONNECTIVITY_EXCUSE, SafetyRails};
pub use style::TypoInjector;
pub use traps::{TrapMatcher, TrapRule};
