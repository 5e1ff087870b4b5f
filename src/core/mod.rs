// Core algorithm exports
pub mod engine;
pub mod keywords;
pub mod pipeline;
pub mod rules;
pub mod scoring;
pub mod text;

pub use engine::{EvaluateError, Evaluator};
pub use keywords::KeywordTables;
pub use pipeline::ClassificationPipeline;
pub use rules::RuleEvaluator;
pub use scoring::ScoringEngine;
