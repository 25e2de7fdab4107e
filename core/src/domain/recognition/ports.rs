use std::future::Future;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    recognition::{
        entities::{BackendId, ImageInput, RecognitionCandidate},
        value_objects::{RecognitionResult, RecognizeInput, RegionResolution, ResolveRegionInput},
    },
    validation::entities::Region,
};

/// One independent text/label recognizer.
///
/// Object safe so the pool can hold heterogeneous backends behind `Arc<dyn Recognizer>`.
pub trait Recognizer: Send + Sync {
    fn id(&self) -> BackendId;

    fn recognize<'a>(
        &'a self,
        image: &'a ImageInput,
    ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RecognitionService: Send + Sync {
    /// Runs the image through every backend, merges the results and applies the gate.
    fn recognize(
        &self,
        input: RecognizeInput,
    ) -> impl Future<Output = Result<RecognitionResult, CoreError>> + Send;

    fn resolve_region(
        &self,
        input: ResolveRegionInput,
    ) -> impl Future<Output = Result<RegionResolution, CoreError>> + Send;

    fn pending_regions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Region>, CoreError>> + Send;
}
