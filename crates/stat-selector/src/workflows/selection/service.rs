use std::sync::Arc;

use tracing::{debug, info, warn};

use super::artifacts::{ModelBundle, RecommendError};
use super::domain::{CaseDescriptor, CaseSubmission, InvalidInput, RecommendationResult};
use super::eligibility::EligibilityFilter;

/// Service composing the eligibility filter and the loaded model bundle.
#[derive(Debug, Clone)]
pub struct TestSelectionService {
    filter: EligibilityFilter,
    bundle: Arc<ModelBundle>,
}

impl TestSelectionService {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            filter: EligibilityFilter::new(),
            bundle,
        }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Validate raw collector input, then evaluate it.
    pub fn submit(
        &self,
        submission: CaseSubmission,
    ) -> Result<RecommendationResult, SelectionError> {
        let descriptor = CaseDescriptor::try_from(submission)?;
        self.evaluate(&descriptor)
    }

    /// Gate the descriptor and, when eligible, ask the model for a test.
    ///
    /// An unsupported design is a normal outcome and comes back as `Ok` with
    /// `eligible == false`.
    pub fn evaluate(
        &self,
        descriptor: &CaseDescriptor,
    ) -> Result<RecommendationResult, SelectionError> {
        if let Some(reason) = self.filter.check(descriptor) {
            info!(?reason, "design outside supported scope");
            return Ok(RecommendationResult::unsupported(descriptor, reason));
        }

        let recommendation = self.bundle.recommend(descriptor)?;
        for unknown in &recommendation.warnings {
            warn!(
                feature = %unknown.feature,
                value = %unknown.value,
                "category unseen during training; encoded as zeros"
            );
        }
        debug!(test = %recommendation.test_name, version = %self.bundle.version(), "recommended");

        Ok(RecommendationResult::recommended(
            descriptor,
            recommendation.test_name,
            self.bundle.version(),
            recommendation.warnings,
        ))
    }
}

/// Per-request failures. None of them abort the process.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Recommend(#[from] RecommendError),
}
