use std::collections::BTreeMap;

use crate::core::text::contains_term;
use crate::models::{
    CapabilityProfile, Classification, FitScore, Opportunity, Recommendation, RolePreference,
    ScoreBreakdown, ScoringWeights,
};

/// Risk note attached whenever the strategic criterion falls back to the
/// fixed baseline instead of an AI judgment.
pub const STRATEGIC_NOT_AI_ASSESSED: &str = "strategic value not AI-assessed";

/// Weighted multi-criteria fit scorer.
///
/// The five capability criteria are computed from the notice and the profile
/// alone, identically for every classification provenance — scores stay
/// comparable across opportunities no matter which evaluator classified them.
/// Only the strategic criterion differs: AI-classified notices carry the
/// provider's own 0-100 judgment, rule-classified notices get the configured
/// baseline plus a risk flag.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    strategic_baseline: f64,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights, strategic_baseline: f64) -> Self {
        Self {
            weights,
            strategic_baseline,
        }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            strategic_baseline: 70.0,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one opportunity against a capability profile. Pure computation.
    pub fn score(
        &self,
        opportunity: &Opportunity,
        classification: &Classification,
        profile: &CapabilityProfile,
    ) -> FitScore {
        let domain_match = domain_match_score(classification, profile);
        let code_match = code_match_score(&opportunity.naics, &profile.naics);
        let skill_match = skill_match_score(&opportunity.description, &profile.technical_skills);
        let agency_match = agency_match_score(&opportunity.agency, &profile.preferred_agencies);
        let contract_type_fit = contract_type_fit_score(
            opportunity.set_aside.as_deref(),
            &profile.certifications,
            profile.role_preference,
        );

        let ai_strategic = classification
            .provenance
            .is_ai()
            .then_some(classification.strategic_value)
            .flatten();
        let strategic_value = match ai_strategic {
            Some(value) => value.clamp(0.0, 100.0),
            None => self.strategic_baseline,
        };

        let breakdown = ScoreBreakdown {
            domain_match,
            code_match,
            skill_match,
            agency_match,
            contract_type_fit,
            strategic_value,
        };

        let weights = &self.weights;
        let score = round1(
            breakdown.domain_match * weights.domain
                + breakdown.code_match * weights.code
                + breakdown.skill_match * weights.skill
                + breakdown.agency_match * weights.agency
                + breakdown.contract_type_fit * weights.contract_type
                + breakdown.strategic_value * weights.strategic,
        );

        let rationale = self.rationale(opportunity, classification, profile, &breakdown, ai_strategic.is_some());
        let risk_factors = self.risk_factors(opportunity, &breakdown, ai_strategic.is_some());

        FitScore {
            score,
            breakdown,
            recommendation: Recommendation::for_score(score),
            rationale,
            risk_factors,
        }
    }

    fn rationale(
        &self,
        opportunity: &Opportunity,
        classification: &Classification,
        profile: &CapabilityProfile,
        breakdown: &ScoreBreakdown,
        ai_assessed: bool,
    ) -> BTreeMap<String, String> {
        let mut rationale = BTreeMap::new();

        let domain = classification.primary_domain.as_str();
        rationale.insert(
            "domain_match".to_string(),
            if breakdown.domain_match >= 100.0 {
                format!("primary domain {} is a core domain", domain)
            } else if breakdown.domain_match > 0.0 {
                "a secondary domain overlaps the core domains".to_string()
            } else {
                format!("primary domain {} is outside the core domains", domain)
            },
        );

        let shared_codes = intersection_count(&opportunity.naics, &profile.naics);
        rationale.insert(
            "code_match".to_string(),
            if opportunity.naics.is_empty() {
                "notice lists no classification codes".to_string()
            } else {
                format!(
                    "{} of {} classification codes overlap the profile",
                    shared_codes,
                    opportunity.naics.len()
                )
            },
        );

        let matched_skills = matched_skill_count(&opportunity.description, &profile.technical_skills);
        rationale.insert(
            "skill_match".to_string(),
            format!(
                "{} of {} technical skills appear in the description",
                matched_skills,
                profile.technical_skills.len()
            ),
        );

        rationale.insert(
            "agency_match".to_string(),
            if breakdown.agency_match >= 100.0 {
                format!("{} is a preferred agency", opportunity.agency)
            } else {
                format!("{} is not a preferred agency", opportunity.agency)
            },
        );

        let contract_note = if breakdown.contract_type_fit >= 100.0 {
            match &opportunity.set_aside {
                Some(set_aside) => format!("set-aside {} matches a held certification", set_aside),
                None => "contract vehicle fits the company".to_string(),
            }
        } else if breakdown.contract_type_fit >= 60.0 {
            "open competition fits the prime role preference".to_string()
        } else {
            match &opportunity.set_aside {
                Some(set_aside) if !set_aside.trim().is_empty() => {
                    format!("set-aside {} has no matching certification", set_aside)
                }
                _ => "open competition with a subcontractor-only preference".to_string(),
            }
        };
        rationale.insert("contract_type_fit".to_string(), contract_note);

        rationale.insert(
            "strategic_value".to_string(),
            if ai_assessed {
                "strategic value assessed by the classification provider".to_string()
            } else {
                format!("baseline strategic value of {:.0} applied", self.strategic_baseline)
            },
        );

        rationale
    }

    fn risk_factors(
        &self,
        opportunity: &Opportunity,
        breakdown: &ScoreBreakdown,
        ai_assessed: bool,
    ) -> Vec<String> {
        let mut risks = Vec::new();
        if !ai_assessed {
            risks.push(STRATEGIC_NOT_AI_ASSESSED.to_string());
        }
        if breakdown.domain_match <= 0.0 {
            risks.push("opportunity is outside the company's core domains".to_string());
        }
        if let Some(set_aside) = &opportunity.set_aside {
            if breakdown.contract_type_fit < 60.0 {
                risks.push(format!("set-aside {} without a matching certification", set_aside));
            }
        }
        risks
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// 100 when the primary domain is a core domain, 60 when only a secondary
/// domain overlaps, 0 otherwise.
pub fn domain_match_score(classification: &Classification, profile: &CapabilityProfile) -> f64 {
    if profile.core_domains.contains(&classification.primary_domain) {
        100.0
    } else if classification
        .secondary_domains
        .iter()
        .any(|domain| profile.core_domains.contains(domain))
    {
        60.0
    } else {
        0.0
    }
}

/// Share of the notice's classification codes the profile also carries.
pub fn code_match_score(opportunity_codes: &[String], profile_codes: &[String]) -> f64 {
    let shared = intersection_count(opportunity_codes, profile_codes);
    100.0 * shared as f64 / opportunity_codes.len().max(1) as f64
}

/// Share of profile skills found (whole-word) in the description, capped.
pub fn skill_match_score(description: &str, skills: &[String]) -> f64 {
    let matched = matched_skill_count(description, skills);
    let ratio = 100.0 * matched as f64 / skills.len().max(1) as f64;
    ratio.min(100.0)
}

/// All-or-nothing agency alignment. A preferred-agency entry may name the
/// agency exactly or be contained in the fuller official name ("Air Force"
/// matches "Department of the Air Force").
pub fn agency_match_score(agency: &str, preferred_agencies: &[String]) -> f64 {
    let agency_lower = agency.to_lowercase();
    let preferred = preferred_agencies.iter().any(|preferred| {
        let preferred_lower = preferred.to_lowercase();
        !preferred_lower.is_empty()
            && (agency_lower == preferred_lower || agency_lower.contains(&preferred_lower))
    });
    if preferred {
        100.0
    } else {
        0.0
    }
}

/// 100 when a set-aside matches a held certification, 60 for open competition
/// with a prime-capable role preference, 30 otherwise.
pub fn contract_type_fit_score(
    set_aside: Option<&str>,
    certifications: &[String],
    role_preference: RolePreference,
) -> f64 {
    match set_aside {
        Some(set_aside) if !set_aside.trim().is_empty() => {
            let set_aside_lower = set_aside.to_lowercase();
            let certified = certifications.iter().any(|cert| {
                let cert_lower = cert.to_lowercase();
                !cert_lower.is_empty() && set_aside_lower.contains(&cert_lower)
            });
            if certified {
                100.0
            } else {
                30.0
            }
        }
        _ => match role_preference {
            RolePreference::Prime | RolePreference::Either => 60.0,
            RolePreference::Subcontractor => 30.0,
        },
    }
}

fn intersection_count(left: &[String], right: &[String]) -> usize {
    left.iter().filter(|value| right.contains(value)).count()
}

fn matched_skill_count(description: &str, skills: &[String]) -> usize {
    let text = description.to_lowercase();
    skills
        .iter()
        .filter(|skill| contains_term(&text, &skill.to_lowercase()))
        .count()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
