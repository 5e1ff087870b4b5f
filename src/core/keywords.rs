use serde::Deserialize;

use crate::models::Domain;

/// Keyword and term tables driving the rule-based classifier. Deserializable
/// from configuration; the built-in defaults cover federal IT notices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    pub domains: DomainKeywords,
    pub complexity: ComplexityTerms,
    pub project_type: ProjectTypeTerms,
}

/// Per-domain keyword sets matched against title + description.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DomainKeywords {
    pub ai: Vec<String>,
    pub data: Vec<String>,
    pub cloud: Vec<String>,
    pub cybersecurity: Vec<String>,
    pub it_operations: Vec<String>,
    pub software: Vec<String>,
    pub modernization: Vec<String>,
}

impl DomainKeywords {
    pub fn for_domain(&self, domain: Domain) -> &[String] {
        match domain {
            Domain::Ai => &self.ai,
            Domain::Data => &self.data,
            Domain::Cloud => &self.cloud,
            Domain::Cybersecurity => &self.cybersecurity,
            Domain::ItOperations => &self.it_operations,
            Domain::Software => &self.software,
            Domain::Modernization => &self.modernization,
            // Other is the no-signal fallback, never keyword-matched.
            Domain::Other => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ai.is_empty()
            && self.data.is_empty()
            && self.cloud.is_empty()
            && self.cybersecurity.is_empty()
            && self.it_operations.is_empty()
            && self.software.is_empty()
            && self.modernization.is_empty()
    }
}

impl Default for DomainKeywords {
    fn default() -> Self {
        Self {
            ai: strings(&[
                "artificial intelligence",
                "machine learning",
                "ml model",
                "llm",
                "large language model",
                "rag",
                "nlp",
                "neural network",
                "deep learning",
                "computer vision",
            ]),
            data: strings(&[
                "data analytics",
                "data engineering",
                "data warehouse",
                "data lake",
                "business intelligence",
                "etl",
                "data pipeline",
                "data science",
            ]),
            cloud: strings(&[
                "cloud migration",
                "cloud architecture",
                "cloud platform",
                "cloud infrastructure",
                "aws",
                "azure",
                "gcp",
                "serverless",
            ]),
            cybersecurity: strings(&[
                "cybersecurity",
                "cyber security",
                "zero trust",
                "fedramp",
                "fisma",
                "rmf",
                "security operations",
                "siem",
                "identity and access management",
                "iam",
            ]),
            it_operations: strings(&[
                "help desk",
                "helpdesk",
                "service desk",
                "it operations",
                "itsm",
                "desktop support",
                "it support",
                "pmo",
            ]),
            software: strings(&[
                "software development",
                "application development",
                "devops",
                "devsecops",
                "ci/cd",
                "microservices",
                "api development",
                "kubernetes",
                "docker",
                "terraform",
            ]),
            modernization: strings(&[
                "modernization",
                "legacy system",
                "mainframe",
                "replatform",
                "system upgrade",
                "technical refresh",
            ]),
        }
    }
}

/// Complexity heuristics: word-count thresholds plus term overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComplexityTerms {
    /// Descriptions longer than this many words rate High outright.
    pub long_form_words: usize,
    /// Descriptions shorter than this many words are candidates for Low.
    pub short_form_words: usize,
    /// Any of these rates the notice High regardless of length.
    pub complex: Vec<String>,
    /// Any of these keeps a short notice at Medium instead of Low.
    pub medium_terms: Vec<String>,
}

impl Default for ComplexityTerms {
    fn default() -> Self {
        Self {
            long_form_words: 1000,
            short_form_words: 200,
            complex: strings(&[
                "multi-year",
                "multi year",
                "enterprise-wide",
                "enterprise wide",
                "legacy modernization",
                "mission critical",
                "multiple award",
                "complex",
            ]),
            medium_terms: strings(&[
                "integration",
                "migration",
                "custom development",
                "security clearance",
            ]),
        }
    }
}

/// Project-type signal terms, checked in declaration order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectTypeTerms {
    pub modernization: Vec<String>,
    pub greenfield: Vec<String>,
    pub operations: Vec<String>,
    /// Signals that the system being bought against already exists and is
    /// aging; drives the Legacy project type.
    pub aging: Vec<String>,
}

impl Default for ProjectTypeTerms {
    fn default() -> Self {
        Self {
            modernization: strings(&[
                "modernization",
                "modernize",
                "legacy system",
                "legacy application",
                "mainframe migration",
                "replatform",
            ]),
            greenfield: strings(&[
                "greenfield",
                "new system",
                "new development",
                "net new",
                "ground up",
            ]),
            operations: strings(&[
                "operations and maintenance",
                "o&m",
                "help desk",
                "helpdesk",
                "sustainment",
                "ongoing support",
                "steady state",
                "maintenance",
            ]),
            aging: strings(&[
                "existing system",
                "aging system",
                "aging infrastructure",
                "end of life",
                "end-of-life",
                "legacy environment",
            ]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
