//! 分析模块
//!
//! 文本规范化、情报抽取与两级诈骗分类。

pub mod decoder;
pub mod detector;
pub mod extractor;
pub mod normalizer;
pub mod rules;

pub use decoder::{DEFAULTED_CONFIDENCE, DecodedVerdict, ResponseDecoder};
pub use detector::{ClassifierTier, Detector};
pub use extractor::Extractor;
pub use normalizer::Normalizer;
pub use rules::RuleScorer;
