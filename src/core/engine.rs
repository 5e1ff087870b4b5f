use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tracing::warn;
use validator::Validate;

use crate::config::{ConfigurationError, Settings};
use crate::core::pipeline::ClassificationPipeline;
use crate::core::rules::RuleEvaluator;
use crate::core::scoring::ScoringEngine;
use crate::models::{
    CapabilityProfile, Classification, EvaluatedOpportunity, FitScore, Opportunity, ScoringWeights,
};
use crate::services::provider::ClassificationProvider;
use crate::services::{OllamaProvider, OpenAiProvider};

/// Per-item evaluation failure. Provider failures never show up here; they
/// degrade to rule-based classifications inside the pipeline.
#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("invalid opportunity {notice_id:?}: {reason}")]
    InvalidOpportunity { notice_id: String, reason: String },

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation task failed: {0}")]
    Internal(String),
}

/// The engine's front door: classification pipeline, scoring engine, and the
/// batch runner over both.
///
/// Shared immutable state only; a single `Evaluator` serves concurrent
/// callers and batches.
pub struct Evaluator {
    pipeline: Arc<ClassificationPipeline>,
    scoring: Arc<ScoringEngine>,
    concurrency: usize,
}

impl Evaluator {
    pub fn new(pipeline: ClassificationPipeline, scoring: ScoringEngine, concurrency: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            scoring: Arc::new(scoring),
            concurrency: concurrency.max(1),
        }
    }

    /// Build the full engine from validated settings. Fails fast on a tree
    /// the engine cannot run with; an AI-less tree is fine and runs
    /// rule-based.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        settings.validate()?;

        let max_chars = settings.classifier.max_description_chars;

        let primary: Option<Box<dyn ClassificationProvider>> = if settings.openai.is_configured() {
            Some(Box::new(OpenAiProvider::new(
                settings.openai.endpoint.clone(),
                settings.openai.api_key.clone().unwrap_or_default(),
                settings.openai.model.clone(),
                max_chars,
            )))
        } else {
            None
        };

        let secondary: Option<Box<dyn ClassificationProvider>> = settings
            .ollama
            .is_configured()
            .then(|| {
                Box::new(OllamaProvider::new(
                    settings.ollama.endpoint.clone().unwrap_or_default(),
                    settings.ollama.model.clone(),
                    max_chars,
                )) as Box<dyn ClassificationProvider>
            });

        let pipeline = ClassificationPipeline::new(
            primary,
            secondary,
            RuleEvaluator::new(settings.keywords.clone()),
            Duration::from_secs(settings.classifier.timeout_secs),
        );

        let scoring = ScoringEngine::new(
            ScoringWeights::from(&settings.scoring.weights),
            settings.scoring.strategic_baseline,
        );

        Ok(Self::new(pipeline, scoring, settings.batch.concurrency))
    }

    /// Classify one opportunity through the fallback pipeline. Never fails.
    pub async fn classify(&self, opportunity: &Opportunity) -> Classification {
        self.pipeline.classify(opportunity).await
    }

    /// Score one opportunity against a profile. Pure computation.
    pub fn score(
        &self,
        opportunity: &Opportunity,
        classification: &Classification,
        profile: &CapabilityProfile,
    ) -> FitScore {
        self.scoring.score(opportunity, classification, profile)
    }

    /// Evaluate a batch: classify then score each opportunity. Output order
    /// matches input order; one bad item never aborts the rest.
    pub async fn evaluate(
        &self,
        opportunities: Vec<Opportunity>,
        profile: &CapabilityProfile,
    ) -> Vec<Result<EvaluatedOpportunity, EvaluateError>> {
        // Sender kept alive for the duration of the call; without it the
        // cancel watch would read as already-closed.
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.evaluate_with_cancel(opportunities, profile, cancel_rx).await
    }

    /// Like `evaluate`, but the caller can abort the whole batch by sending
    /// `true` on the watch channel. In-flight provider calls are dropped
    /// promptly; unfinished items come back as `Cancelled`.
    pub async fn evaluate_with_cancel(
        &self,
        opportunities: Vec<Opportunity>,
        profile: &CapabilityProfile,
        cancel: watch::Receiver<bool>,
    ) -> Vec<Result<EvaluatedOpportunity, EvaluateError>> {
        let mut seen_ids: HashSet<String> = HashSet::with_capacity(opportunities.len());
        let duplicates: Vec<bool> = opportunities
            .iter()
            .map(|opportunity| !seen_ids.insert(opportunity.notice_id.clone()))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let profile = Arc::new(profile.clone());

        let mut handles = Vec::with_capacity(opportunities.len());
        for (opportunity, is_duplicate) in opportunities.into_iter().zip(duplicates) {
            let pipeline = Arc::clone(&self.pipeline);
            let scoring = Arc::clone(&self.scoring);
            let semaphore = Arc::clone(&semaphore);
            let profile = Arc::clone(&profile);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                evaluate_one(opportunity, is_duplicate, pipeline, scoring, semaphore, profile, cancel)
                    .await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(err) => {
                    warn!("Evaluation task failed: {}", err);
                    Err(EvaluateError::Internal(err.to_string()))
                }
            });
        }
        results
    }
}

async fn evaluate_one(
    opportunity: Opportunity,
    is_duplicate: bool,
    pipeline: Arc<ClassificationPipeline>,
    scoring: Arc<ScoringEngine>,
    semaphore: Arc<Semaphore>,
    profile: Arc<CapabilityProfile>,
    cancel: watch::Receiver<bool>,
) -> Result<EvaluatedOpportunity, EvaluateError> {
    if let Err(err) = opportunity.validate() {
        return Err(EvaluateError::InvalidOpportunity {
            notice_id: opportunity.notice_id,
            reason: err.to_string(),
        });
    }
    if is_duplicate {
        return Err(EvaluateError::InvalidOpportunity {
            notice_id: opportunity.notice_id,
            reason: "duplicate identifier within batch".to_string(),
        });
    }
    if *cancel.borrow() {
        return Err(EvaluateError::Cancelled);
    }

    tokio::select! {
        _ = cancelled(cancel) => Err(EvaluateError::Cancelled),
        result = async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| EvaluateError::Internal(err.to_string()))?;

            let classification = pipeline.classify(&opportunity).await;
            let fit = scoring.score(&opportunity, &classification, &profile);

            Ok(EvaluatedOpportunity {
                opportunity,
                classification,
                fit,
            })
        } => result,
    }
}

/// Resolve when the watch flag flips to true. A dropped sender means
/// cancellation can never arrive; park forever instead of firing.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, Provenance, RolePreference};

    fn opportunity(id: &str, description: &str) -> Opportunity {
        Opportunity {
            notice_id: id.to_string(),
            title: "IT services".to_string(),
            description: description.to_string(),
            agency: "GSA".to_string(),
            naics: vec!["541511".to_string()],
            set_aside: None,
            contract_type: None,
            posted_date: None,
            due_date: None,
        }
    }

    fn profile() -> CapabilityProfile {
        CapabilityProfile {
            company_name: "Test Co".to_string(),
            core_domains: vec![Domain::Cloud],
            technical_skills: vec!["aws".to_string()],
            naics: vec!["541511".to_string()],
            preferred_agencies: vec!["GSA".to_string()],
            certifications: vec![],
            role_preference: RolePreference::Either,
        }
    }

    fn rules_only_evaluator(concurrency: usize) -> Evaluator {
        Evaluator::new(
            ClassificationPipeline::rules_only(RuleEvaluator::with_default_tables()),
            ScoringEngine::with_default_weights(),
            concurrency,
        )
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_invalid_item() {
        let evaluator = rules_only_evaluator(2);
        let batch = vec![
            opportunity("N1", "cloud migration work"),
            opportunity("", "data analytics work"),
            opportunity("N3", "help desk support"),
        ];

        let results = evaluator.evaluate(batch, &profile()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().opportunity.notice_id, "N1");
        assert!(matches!(
            results[1],
            Err(EvaluateError::InvalidOpportunity { .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().opportunity.notice_id, "N3");
    }

    #[tokio::test]
    async fn test_batch_flags_duplicate_identifiers() {
        let evaluator = rules_only_evaluator(2);
        let batch = vec![
            opportunity("N1", "cloud migration work"),
            opportunity("N1", "the same notice again"),
        ];

        let results = evaluator.evaluate(batch, &profile()).await;

        assert!(results[0].is_ok());
        match &results[1] {
            Err(EvaluateError::InvalidOpportunity { notice_id, reason }) => {
                assert_eq!(notice_id, "N1");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected duplicate error, got {:?}", other.as_ref().map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_batch_results_are_rule_based_without_providers() {
        let evaluator = rules_only_evaluator(4);
        let batch = vec![
            opportunity("N1", "cloud migration"),
            opportunity("N2", "machine learning models"),
            opportunity("N3", "grounds maintenance"),
        ];

        let results = evaluator.evaluate(batch, &profile()).await;

        for result in results {
            let item = result.unwrap();
            assert_eq!(item.classification.provenance, Provenance::RuleBased);
        }
    }

    #[tokio::test]
    async fn test_single_opportunity_entry_points() {
        let evaluator = rules_only_evaluator(1);
        let opp = opportunity("N1", "cloud migration to aws");
        let prof = profile();

        let classification = evaluator.classify(&opp).await;
        assert_eq!(classification.primary_domain, Domain::Cloud);

        let fit = evaluator.score(&opp, &classification, &prof);
        assert_eq!(fit.breakdown.domain_match, 100.0);
        assert_eq!(fit.breakdown.code_match, 100.0);
        assert_eq!(fit.breakdown.agency_match, 100.0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_batch_returns_cancelled_items() {
        let evaluator = rules_only_evaluator(1);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let batch = vec![
            opportunity("N1", "cloud migration"),
            opportunity("N2", "data analytics"),
        ];

        let results = evaluator
            .evaluate_with_cancel(batch, &profile(), cancel_rx)
            .await;

        assert_eq!(results.len(), 2);
        for result in results {
            assert!(matches!(result, Err(EvaluateError::Cancelled)));
        }
    }
}
