use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One government contracting notice, supplied pre-parsed by the ingestion
/// layer. Read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Opportunity {
    #[validate(length(min = 1))]
    pub notice_id: String,
    pub title: String,
    pub description: String,
    pub agency: String,
    /// NAICS classification codes attached to the notice.
    #[serde(default)]
    pub naics: Vec<String>,
    #[serde(default)]
    pub set_aside: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub posted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Technical domain of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "AI")]
    Ai,
    Data,
    Cloud,
    Cybersecurity,
    #[serde(rename = "IT Operations")]
    ItOperations,
    Software,
    Modernization,
    Other,
}

impl Domain {
    /// Every domain the classifier can assign, in tie-break order.
    pub const ALL: [Domain; 8] = [
        Domain::Ai,
        Domain::Cybersecurity,
        Domain::Cloud,
        Domain::Data,
        Domain::Modernization,
        Domain::Software,
        Domain::ItOperations,
        Domain::Other,
    ];

    /// Rank used to break ties when two domains collect the same number of
    /// keyword hits. Lower wins.
    pub fn priority(self) -> u8 {
        match self {
            Domain::Ai => 0,
            Domain::Cybersecurity => 1,
            Domain::Cloud => 2,
            Domain::Data => 3,
            Domain::Modernization => 4,
            Domain::Software => 5,
            Domain::ItOperations => 6,
            Domain::Other => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Ai => "AI",
            Domain::Data => "Data",
            Domain::Cloud => "Cloud",
            Domain::Cybersecurity => "Cybersecurity",
            Domain::ItOperations => "IT Operations",
            Domain::Software => "Software",
            Domain::Modernization => "Modernization",
            Domain::Other => "Other",
        }
    }

    /// Parse a domain label from an AI response, tolerating the aliases the
    /// models actually produce ("AI/ML", "Cyber", "DevOps", ...). Returns
    /// `None` for anything that cannot be mapped to a known domain.
    pub fn parse(raw: &str) -> Option<Domain> {
        let value = raw.trim().to_ascii_uppercase();
        if value.is_empty() {
            return None;
        }

        // Short aliases match exactly; longer ones match as substrings so
        // decorated labels like "Cloud Architecture & Migration" still parse.
        const EXACT: &[(&str, Domain)] = &[
            ("AI", Domain::Ai),
            ("ML", Domain::Ai),
            ("DATA", Domain::Data),
            ("CLOUD", Domain::Cloud),
            ("CYBER", Domain::Cybersecurity),
            ("SOFTWARE", Domain::Software),
            ("IT OPS", Domain::ItOperations),
            ("OTHER", Domain::Other),
        ];
        const CONTAINS: &[(&str, Domain)] = &[
            ("AI/ML", Domain::Ai),
            ("ARTIFICIAL INTELLIGENCE", Domain::Ai),
            ("MACHINE LEARNING", Domain::Ai),
            ("DATA ANALYTIC", Domain::Data),
            ("DATA ENGINEER", Domain::Data),
            ("CLOUD", Domain::Cloud),
            ("CYBERSECURITY", Domain::Cybersecurity),
            ("ZERO TRUST", Domain::Cybersecurity),
            ("DEVSECOPS", Domain::Software),
            ("DEVOPS", Domain::Software),
            ("AUTOMATION", Domain::Software),
            ("SOFTWARE", Domain::Software),
            ("IT OPERATIONS", Domain::ItOperations),
            ("MODERNIZATION", Domain::Modernization),
            ("OTHER", Domain::Other),
        ];

        EXACT
            .iter()
            .find(|(alias, _)| value == *alias)
            .or_else(|| CONTAINS.iter().find(|(alias, _)| value.contains(alias)))
            .map(|(_, domain)| *domain)
    }
}

/// Technical complexity of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn parse(raw: &str) -> Option<Complexity> {
        let value = raw.trim().to_ascii_uppercase();
        if value.contains("HIGH") {
            Some(Complexity::High)
        } else if value.contains("LOW") {
            Some(Complexity::Low)
        } else if value.contains("MEDIUM") || value.contains("MODERATE") {
            Some(Complexity::Medium)
        } else {
            None
        }
    }
}

/// What kind of delivery the notice describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    Modernization,
    Operations,
    Greenfield,
    Legacy,
}

impl ProjectType {
    pub fn parse(raw: &str) -> Option<ProjectType> {
        let value = raw.trim().to_ascii_uppercase();
        if value.contains("MODERNIZATION") {
            Some(ProjectType::Modernization)
        } else if value.contains("OPERATIONS") || value.contains("O&M") {
            Some(ProjectType::Operations)
        } else if value.contains("GREENFIELD") {
            Some(ProjectType::Greenfield)
        } else if value.contains("LEGACY") {
            Some(ProjectType::Legacy)
        } else {
            None
        }
    }
}

/// Which evaluator produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "primary-provider")]
    PrimaryProvider,
    #[serde(rename = "secondary-provider")]
    SecondaryProvider,
    #[serde(rename = "rule-based")]
    RuleBased,
}

impl Provenance {
    /// True when an AI provider produced the classification.
    pub fn is_ai(self) -> bool {
        !matches!(self, Provenance::RuleBased)
    }
}

/// Structured judgment about one opportunity: domain, complexity, project
/// type, and which evaluator said so.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub primary_domain: Domain,
    /// Additional domains with real signal, strongest first. Never contains
    /// the primary domain.
    #[serde(default)]
    pub secondary_domains: Vec<Domain>,
    pub complexity: Complexity,
    pub project_type: ProjectType,
    pub provenance: Provenance,
    /// The provider's own 0-100 strategic assessment. Absent for rule-based
    /// classifications; the scoring engine substitutes its baseline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_value: Option<f64>,
}

/// How the company prefers to engage on contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolePreference {
    Prime,
    Subcontractor,
    Either,
}

impl Default for RolePreference {
    fn default() -> Self {
        RolePreference::Prime
    }
}

/// A company's declared capabilities, supplied validated by the profile
/// service. Read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub company_name: String,
    #[serde(default)]
    pub core_domains: Vec<Domain>,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub naics: Vec<String>,
    #[serde(default)]
    pub preferred_agencies: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub role_preference: RolePreference,
}

/// Per-criterion sub-scores, each in 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub domain_match: f64,
    pub code_match: f64,
    pub skill_match: f64,
    pub agency_match: f64,
    pub contract_type_fit: f64,
    pub strategic_value: f64,
}

/// What the company should do with an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "BID")]
    Bid,
    #[serde(rename = "TEAM_SUB")]
    TeamSub,
    #[serde(rename = "IGNORE")]
    Ignore,
}

impl Recommendation {
    /// Aggregate-score thresholds. Boundary values belong to the higher band:
    /// 70.0 recommends a bid, 50.0 recommends teaming.
    pub fn for_score(score: f64) -> Recommendation {
        if score >= 70.0 {
            Recommendation::Bid
        } else if score >= 50.0 {
            Recommendation::TeamSub
        } else {
            Recommendation::Ignore
        }
    }
}

/// Weighted fit between an opportunity and a capability profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitScore {
    /// Weighted aggregate of the breakdown, rounded to one decimal place.
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub recommendation: Recommendation,
    /// One-line justification per criterion, keyed by criterion name.
    pub rationale: BTreeMap<String, String>,
    pub risk_factors: Vec<String>,
}

/// Criterion weights owned by a scoring engine instance. Alternative
/// weighting schemes are alternative engine instances, never mutation.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub domain: f64,
    pub code: f64,
    pub skill: f64,
    pub agency: f64,
    pub contract_type: f64,
    pub strategic: f64,
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.domain + self.code + self.skill + self.agency + self.contract_type + self.strategic
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            domain: 0.30,
            code: 0.20,
            skill: 0.20,
            agency: 0.10,
            contract_type: 0.10,
            strategic: 0.10,
        }
    }
}

/// Batch runner output for one successfully evaluated opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedOpportunity {
    pub opportunity: Opportunity,
    pub classification: Classification,
    pub fit: FitScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_aliases() {
        assert_eq!(Domain::parse("AI"), Some(Domain::Ai));
        assert_eq!(Domain::parse("AI/ML"), Some(Domain::Ai));
        assert_eq!(Domain::parse("machine learning"), Some(Domain::Ai));
        assert_eq!(Domain::parse("Cloud Architecture & Migration"), Some(Domain::Cloud));
        assert_eq!(Domain::parse("Cybersecurity/Zero Trust"), Some(Domain::Cybersecurity));
        assert_eq!(Domain::parse("DevSecOps"), Some(Domain::Software));
        assert_eq!(Domain::parse("IT Operations"), Some(Domain::ItOperations));
        assert_eq!(Domain::parse("Other"), Some(Domain::Other));
    }

    #[test]
    fn test_domain_parse_rejects_unknown() {
        assert_eq!(Domain::parse(""), None);
        assert_eq!(Domain::parse("Groundskeeping"), None);
        assert_eq!(Domain::parse("42"), None);
    }

    #[test]
    fn test_domain_priority_order() {
        assert!(Domain::Ai.priority() < Domain::Cybersecurity.priority());
        assert!(Domain::Cybersecurity.priority() < Domain::Cloud.priority());
        assert!(Domain::ItOperations.priority() < Domain::Other.priority());
    }

    #[test]
    fn test_complexity_parse() {
        assert_eq!(Complexity::parse("High"), Some(Complexity::High));
        assert_eq!(Complexity::parse("moderate"), Some(Complexity::Medium));
        assert_eq!(Complexity::parse("very high"), Some(Complexity::High));
        assert_eq!(Complexity::parse("trivial"), None);
    }

    #[test]
    fn test_project_type_parse() {
        assert_eq!(ProjectType::parse("Modernization"), Some(ProjectType::Modernization));
        assert_eq!(ProjectType::parse("o&m"), Some(ProjectType::Operations));
        assert_eq!(ProjectType::parse("greenfield build"), Some(ProjectType::Greenfield));
        assert_eq!(ProjectType::parse("unknown"), None);
    }

    #[test]
    fn test_recommendation_boundaries() {
        assert_eq!(Recommendation::for_score(70.0), Recommendation::Bid);
        assert_eq!(Recommendation::for_score(69.9), Recommendation::TeamSub);
        assert_eq!(Recommendation::for_score(50.0), Recommendation::TeamSub);
        assert_eq!(Recommendation::for_score(49.9), Recommendation::Ignore);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoringWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_provenance_wire_format() {
        let json = serde_json::to_string(&Provenance::RuleBased).unwrap();
        assert_eq!(json, "\"rule-based\"");
        let json = serde_json::to_string(&Provenance::PrimaryProvider).unwrap();
        assert_eq!(json, "\"primary-provider\"");
    }
}
