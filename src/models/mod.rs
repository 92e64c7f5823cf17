//! 数据模型模块
//!
//! 定义消息、情报、人设与会话状态等核心实体。

pub mod intel;
pub mod message;
pub mod persona;
pub mod session;

pub use intel::{AnalysisResult, Intelligence, RiskCategory};
pub use message::{Message, Metadata, Sender};
pub use persona::Persona;
pub use session::{ScenarioMemory, SessionState, SessionStatus, TrapUsage};
