//! 服务模块
//!
//! 会话注册表与单轮处理服务。

pub mod registry;
pub mod turn;

pub use registry::SessionRegistry;
pub use turn::{TurnOutcome, TurnRequest, TurnService, TurnServiceImpl, create_turn_service};
