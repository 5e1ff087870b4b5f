// Model exports
pub mod domain;

pub use domain::{
    CapabilityProfile, Classification, Complexity, Domain, EvaluatedOpportunity, FitScore,
    Opportunity, ProjectType, Provenance, Recommendation, RolePreference, ScoreBreakdown,
    ScoringWeights,
};
