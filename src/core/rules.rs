use crate::core::keywords::KeywordTables;
use crate::core::text::{contains_any, count_terms};
use crate::models::{Classification, Complexity, Domain, Opportunity, ProjectType, Provenance};

/// Deterministic keyword classifier. The canonical fallback when no AI
/// provider answers: total over all inputs, no I/O, always constructible.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    tables: KeywordTables,
}

impl RuleEvaluator {
    pub fn new(tables: KeywordTables) -> Self {
        Self { tables }
    }

    pub fn with_default_tables() -> Self {
        Self {
            tables: KeywordTables::default(),
        }
    }

    /// Classify an opportunity from keyword signal alone.
    ///
    /// Domains are ranked by how many of their keywords appear in
    /// title + description; ties fall back to the fixed domain priority.
    /// Domains with at least one hit that lose the primary slot become
    /// secondary domains, capped at three.
    pub fn classify(&self, opportunity: &Opportunity) -> Classification {
        let text = format!("{} {}", opportunity.title, opportunity.description).to_lowercase();

        let mut ranked: Vec<(Domain, usize)> = Domain::ALL
            .iter()
            .filter(|domain| **domain != Domain::Other)
            .map(|domain| (*domain, count_terms(&text, self.tables.domains.for_domain(*domain))))
            .filter(|(_, hits)| *hits > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.priority().cmp(&b.0.priority())));

        let primary_domain = ranked.first().map(|(domain, _)| *domain).unwrap_or(Domain::Other);
        let secondary_domains: Vec<Domain> =
            ranked.iter().skip(1).take(3).map(|(domain, _)| *domain).collect();

        Classification {
            primary_domain,
            secondary_domains,
            complexity: self.complexity(&opportunity.description, &text),
            project_type: self.project_type(&text),
            provenance: Provenance::RuleBased,
            strategic_value: None,
        }
    }

    fn complexity(&self, description: &str, text: &str) -> Complexity {
        let terms = &self.tables.complexity;
        let word_count = description.split_whitespace().count();

        if word_count > terms.long_form_words || contains_any(text, &terms.complex) {
            Complexity::High
        } else if word_count < terms.short_form_words && !contains_any(text, &terms.medium_terms) {
            Complexity::Low
        } else {
            Complexity::Medium
        }
    }

    fn project_type(&self, text: &str) -> ProjectType {
        let terms = &self.tables.project_type;

        if contains_any(text, &terms.modernization) {
            ProjectType::Modernization
        } else if contains_any(text, &terms.greenfield) && !contains_any(text, &terms.aging) {
            ProjectType::Greenfield
        } else if contains_any(text, &terms.operations) {
            ProjectType::Operations
        } else if contains_any(text, &terms.aging) {
            ProjectType::Legacy
        } else {
            ProjectType::Operations
        }
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::with_default_tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opportunity(title: &str, description: &str) -> Opportunity {
        Opportunity {
            notice_id: "N0001".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            agency: "GSA".to_string(),
            naics: vec!["541511".to_string()],
            set_aside: None,
            contract_type: None,
            posted_date: None,
            due_date: None,
        }
    }

    #[test]
    fn test_cloud_only_signal_classifies_cloud() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity(
            "Infrastructure support",
            "The agency requires cloud migration services for its hosting environment.",
        );

        let classification = evaluator.classify(&opp);

        assert_eq!(classification.primary_domain, Domain::Cloud);
        assert!(classification.secondary_domains.is_empty());
        assert_eq!(classification.provenance, Provenance::RuleBased);
        assert_eq!(classification.strategic_value, None);
    }

    #[test]
    fn test_no_signal_falls_back_to_other() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity("Grounds upkeep", "Mowing and landscaping for the facility.");

        let classification = evaluator.classify(&opp);

        assert_eq!(classification.primary_domain, Domain::Other);
        assert!(classification.secondary_domains.is_empty());
    }

    #[test]
    fn test_tie_breaks_by_domain_priority() {
        let evaluator = RuleEvaluator::with_default_tables();
        // One keyword hit each for Cloud and Cybersecurity; priority puts
        // Cybersecurity first.
        let opp = opportunity("Support services", "Requires fedramp compliance on aws.");

        let classification = evaluator.classify(&opp);

        assert_eq!(classification.primary_domain, Domain::Cybersecurity);
        assert_eq!(classification.secondary_domains, vec![Domain::Cloud]);
    }

    #[test]
    fn test_secondary_domains_capped_at_three() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity(
            "Enterprise IT services",
            "Machine learning pipelines, data analytics, cloud migration to aws, \
             cybersecurity with zero trust, devops automation with kubernetes, and \
             help desk support.",
        );

        let classification = evaluator.classify(&opp);

        assert_eq!(classification.secondary_domains.len(), 3);
        assert!(!classification
            .secondary_domains
            .contains(&classification.primary_domain));
    }

    #[test]
    fn test_secondary_domains_ordered_by_hits() {
        let evaluator = RuleEvaluator::with_default_tables();
        // Three AI hits, two data hits, one cloud hit.
        let opp = opportunity(
            "Analytics platform",
            "Machine learning and deep learning models with nlp, backed by data \
             analytics and a data warehouse, hosted on aws.",
        );

        let classification = evaluator.classify(&opp);

        assert_eq!(classification.primary_domain, Domain::Ai);
        assert_eq!(classification.secondary_domains, vec![Domain::Data, Domain::Cloud]);
    }

    #[test]
    fn test_complexity_high_from_terms() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity(
            "Platform support",
            "A multi-year enterprise-wide effort to sustain the platform.",
        );

        assert_eq!(evaluator.classify(&opp).complexity, Complexity::High);
    }

    #[test]
    fn test_complexity_high_from_length() {
        let evaluator = RuleEvaluator::with_default_tables();
        let description = "word ".repeat(1200);
        let opp = opportunity("Routine notice", &description);

        assert_eq!(evaluator.classify(&opp).complexity, Complexity::High);
    }

    #[test]
    fn test_complexity_low_for_short_plain_notice() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity("Desktop refresh", "Replace 40 workstations at the field office.");

        assert_eq!(evaluator.classify(&opp).complexity, Complexity::Low);
    }

    #[test]
    fn test_complexity_medium_for_short_notice_with_medium_term() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity("Data effort", "Short notice requiring system integration work.");

        assert_eq!(evaluator.classify(&opp).complexity, Complexity::Medium);
    }

    #[test]
    fn test_project_type_modernization_wins_over_operations() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity(
            "System overhaul",
            "Modernization of the case management system, including ongoing support.",
        );

        assert_eq!(evaluator.classify(&opp).project_type, ProjectType::Modernization);
    }

    #[test]
    fn test_project_type_greenfield_requires_no_aging_signal() {
        let evaluator = RuleEvaluator::with_default_tables();
        let fresh = opportunity("New build", "Stand up a new system for grants processing.");
        let replacement = opportunity(
            "Replacement build",
            "Stand up a new system to replace the existing system at end of life.",
        );

        assert_eq!(evaluator.classify(&fresh).project_type, ProjectType::Greenfield);
        assert_ne!(evaluator.classify(&replacement).project_type, ProjectType::Greenfield);
    }

    #[test]
    fn test_project_type_defaults_to_operations() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity("Services", "General technology services for the bureau.");

        assert_eq!(evaluator.classify(&opp).project_type, ProjectType::Operations);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let evaluator = RuleEvaluator::with_default_tables();
        let opp = opportunity("Cloud services", "Cloud migration and data analytics support.");

        let first = serde_json::to_string(&evaluator.classify(&opp)).unwrap();
        let second = serde_json::to_string(&evaluator.classify(&opp)).unwrap();
        assert_eq!(first, second);
    }
}
