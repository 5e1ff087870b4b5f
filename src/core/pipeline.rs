use std::time::Duration;

use tracing::{debug, error, warn};

use crate::core::rules::RuleEvaluator;
use crate::models::{Classification, Opportunity, Provenance};
use crate::services::provider::{ClassificationProvider, ProviderError};

/// Evaluator the pipeline tries next for one opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TryPrimary,
    TrySecondary,
    RuleBased,
}

/// Classification pipeline with ordered fallback.
///
/// Tries the primary provider, then the secondary, then the rule evaluator.
/// Each configured provider gets exactly one bounded attempt per opportunity;
/// a single failure of any kind moves on to the next stage so per-item
/// latency stays bounded. The rule stage cannot fail, so `classify` always
/// returns a `Classification`.
pub struct ClassificationPipeline {
    primary: Option<Box<dyn ClassificationProvider>>,
    secondary: Option<Box<dyn ClassificationProvider>>,
    rules: RuleEvaluator,
    call_timeout: Duration,
}

impl ClassificationPipeline {
    pub fn new(
        primary: Option<Box<dyn ClassificationProvider>>,
        secondary: Option<Box<dyn ClassificationProvider>>,
        rules: RuleEvaluator,
        call_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            rules,
            call_timeout,
        }
    }

    /// Pipeline with no AI providers; every notice classifies rule-based.
    pub fn rules_only(rules: RuleEvaluator) -> Self {
        Self::new(None, None, rules, Duration::from_secs(30))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Classify one opportunity. Never fails; the worst case is a rule-based
    /// result.
    pub async fn classify(&self, opportunity: &Opportunity) -> Classification {
        let mut stage = Stage::TryPrimary;
        loop {
            stage = match stage {
                Stage::TryPrimary => {
                    match &self.primary {
                        Some(provider) => {
                            match self
                                .attempt(provider.as_ref(), opportunity, Provenance::PrimaryProvider)
                                .await
                            {
                                Some(classification) => return classification,
                                None => Stage::TrySecondary,
                            }
                        }
                        None => Stage::TrySecondary,
                    }
                }
                Stage::TrySecondary => {
                    match &self.secondary {
                        Some(provider) => {
                            match self
                                .attempt(
                                    provider.as_ref(),
                                    opportunity,
                                    Provenance::SecondaryProvider,
                                )
                                .await
                            {
                                Some(classification) => return classification,
                                None => Stage::RuleBased,
                            }
                        }
                        None => Stage::RuleBased,
                    }
                }
                Stage::RuleBased => {
                    debug!("Classifying {} rule-based", opportunity.notice_id);
                    return self.rules.classify(opportunity);
                }
            };
        }
    }

    /// One provider attempt. `None` means fall through to the next stage.
    async fn attempt(
        &self,
        provider: &dyn ClassificationProvider,
        opportunity: &Opportunity,
        provenance: Provenance,
    ) -> Option<Classification> {
        let call = provider.classify(opportunity, self.call_timeout);
        let outcome = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match outcome {
            Ok(judgment) => {
                debug!(
                    "Classified {} via {} ({:?})",
                    opportunity.notice_id,
                    provider.name(),
                    judgment.primary_domain
                );
                Some(judgment.into_classification(provenance))
            }
            Err(err @ (ProviderError::Unauthorized | ProviderError::MalformedResponse(_))) => {
                // Configuration-shaped failures; retrying the same provider
                // would fail the same way.
                error!(
                    "Provider {} failed for {}: {}",
                    provider.name(),
                    opportunity.notice_id,
                    err
                );
                None
            }
            Err(err) => {
                warn!(
                    "Provider {} failed for {}: {}",
                    provider.name(),
                    opportunity.notice_id,
                    err
                );
                None
            }
        }
    }
}
