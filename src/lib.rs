//! Bidfit - opportunity classification and fit-scoring engine
//!
//! This library classifies government contracting notices by technical
//! domain, complexity, and project type, then scores each against a company
//! capability profile to recommend bid, team, or ignore.
//!
//! Classification runs through an ordered fallback pipeline: a primary AI
//! provider, a secondary AI provider, and finally a deterministic rule-based
//! evaluator that always answers. Scoring is a pure weighted combination of
//! six criteria, identical no matter which evaluator classified the notice.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::config::{ConfigurationError, Settings};
pub use crate::core::{
    ClassificationPipeline, EvaluateError, Evaluator, KeywordTables, RuleEvaluator, ScoringEngine,
};
pub use crate::models::{
    CapabilityProfile, Classification, Complexity, Domain, EvaluatedOpportunity, FitScore,
    Opportunity, ProjectType, Provenance, Recommendation, RolePreference, ScoreBreakdown,
    ScoringWeights,
};
pub use crate::services::{ClassificationProvider, OllamaProvider, OpenAiProvider, ProviderError};
