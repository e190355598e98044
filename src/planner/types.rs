use async_trait::async_trait;

use crate::kernel::error::InferenceError;
use crate::kernel::event::Output;
use crate::kernel::fusion::FusedRequest;

/// The decision backend. Awaited inside the cycle's `Inferring` stage.
///
/// `Ok(None)` means the backend had nothing to say; the runtime treats it,
/// an `Err`, and a timeout identically: the cycle is skipped.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn infer(&self, request: &FusedRequest) -> Result<Option<Output>, InferenceError>;
}
