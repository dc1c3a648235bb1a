//! Strategy orchestration.
//!
//! The orchestrator walks a tier's strategy order one attempt at a time:
//!
//! ```text
//! Idle -> Trying(0) -> Success
//!                   -> Trying(1) -> Success
//!                                -> ...   -> Exhausted
//! ```
//!
//! An attempt succeeds only when the fused record is sufficient. Soft
//! failures (transport errors, timeouts, thin content, too few core fields)
//! advance to the next strategy and are only reported in aggregate.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::ExtractorConfig;
use crate::fusion::fuse;
use crate::providers::{ProviderAvailability, Providers};
use crate::record::ExtractedRecord;
use crate::site::{ProtectionTier, SiteClassification};
use crate::sources::parse_sources;
use crate::strategy::{StrategyKind, StrategyOutcome, fetch_raw};
use crate::{AnnonceError, Result};

/// The accepted record and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ExtractedRecord,
    pub strategy: StrategyKind,
    /// Every attempt made, in order, the accepted one last.
    pub outcomes: Vec<StrategyOutcome>,
}

enum State {
    Idle,
    Trying(usize),
    Success(Box<ExtractedRecord>, StrategyKind),
    Exhausted,
}

/// Runs strategies sequentially until one yields a sufficient record.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    providers: Providers,
    config: Arc<ExtractorConfig>,
}

impl Orchestrator {
    pub fn new(providers: Providers, config: Arc<ExtractorConfig>) -> Self {
        Self { providers, config }
    }

    pub fn availability(&self) -> ProviderAvailability {
        self.providers.availability()
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// The strategies that will be attempted for `tier`, unconfigured ones removed.
    pub fn plan(&self, tier: ProtectionTier) -> Vec<StrategyKind> {
        let availability = self.availability();
        StrategyKind::order(tier)
            .iter()
            .copied()
            .filter(|kind| kind.is_available(&availability))
            .collect()
    }

    pub async fn run(&self, url: &Url, classification: &SiteClassification) -> Result<Extraction> {
        let plan = self.plan(classification.tier);
        let mut outcomes: Vec<StrategyOutcome> = Vec::with_capacity(plan.len());
        let mut state = State::Idle;

        loop {
            state = match state {
                State::Idle if plan.is_empty() => {
                    warn!("no transport configured");
                    State::Exhausted
                }
                State::Idle => State::Trying(0),
                State::Trying(i) => {
                    let kind = plan[i];
                    debug!(strategy = kind.name(), attempt = i + 1, of = plan.len(), "trying strategy");

                    match self.attempt(kind, url, classification).await {
                        Ok(record) => {
                            let fields = record.fields_extracted();
                            outcomes.push(StrategyOutcome::succeeded(kind, fields));
                            info!(strategy = kind.name(), fields, "strategy succeeded");
                            State::Success(Box::new(record), kind)
                        }
                        Err(err) if err.is_soft() => {
                            warn!(strategy = kind.name(), error = %err, "strategy failed");
                            outcomes.push(StrategyOutcome::failed(kind, &err));
                            if i + 1 < plan.len() { State::Trying(i + 1) } else { State::Exhausted }
                        }
                        Err(err) => return Err(err),
                    }
                }
                State::Success(record, strategy) => {
                    return Ok(Extraction { record: *record, strategy, outcomes });
                }
                State::Exhausted => {
                    let tried = outcomes.iter().map(|o| o.strategy.name()).collect();
                    return Err(AnnonceError::AllStrategiesExhausted { tried });
                }
            };
        }
    }

    /// One strategy: fetch, parse every source, fuse, check sufficiency.
    async fn attempt(
        &self, kind: StrategyKind, url: &Url, classification: &SiteClassification,
    ) -> Result<ExtractedRecord> {
        let raw = fetch_raw(kind, &self.providers, url, classification, &self.config).await?;
        let sources = parse_sources(&raw, Some(url));
        let record = fuse(Some(url.to_string()), &sources.candidates());

        if !record.is_sufficient(self.config.min_core_fields) {
            return Err(AnnonceError::ParseInsufficient {
                found: record.core_fields_extracted(),
                required: self.config.min_core_fields,
            });
        }
        Ok(record)
    }
}
