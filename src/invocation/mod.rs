//! Model invocation layer.
//!
//! A [`ModelInvoker`] performs exactly one network attempt against the model
//! and classifies its outcome as success, transient or permanent failure.
//! Retrying, credential bookkeeping and parsing happen elsewhere.

use async_trait::async_trait;

pub mod context;
pub mod error;
pub mod openai;
pub mod probe;
pub mod prompt;
pub mod types;

pub use context::CallContext;
pub use error::{ErrorClass, FailureKind, InvocationError};
pub use openai::OpenAiClient;
pub use probe::HttpProbe;
pub use types::{ImageSource, InvocationPayload, ProcessingMode};

use crate::config::InvocationConfig;
use crate::credential::Secret;

/// One attempt against the model.
///
/// # Cancellation Safety
///
/// Implementations must be cancellation-safe: dropping the returned future
/// aborts the in-flight request.
#[async_trait]
pub trait ModelInvoker: Send + Sync + 'static {
    /// Send `payload` using `secret` and return the raw model text.
    ///
    /// Must finish within `config.timeout()`.
    async fn call(
        &self,
        payload: &InvocationPayload,
        config: &InvocationConfig,
        secret: &Secret,
    ) -> Result<String, InvocationError>;
}
