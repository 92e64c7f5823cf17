//! Mongoose - 自主诈骗诱捕服务
//!
//! 接收可疑诈骗者的消息，判定会话是否为诈骗，抽取可执行情报
//! （收款句柄、电话号码、银行账号、URL、可疑关键词），并在确认
//! 诈骗意图后驱动自主诱饵人设持续周旋，不泄露任何真实信息。

pub mod analysis;
pub mod api;
pub mod config;
pub mod engagement;
pub mod error;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
