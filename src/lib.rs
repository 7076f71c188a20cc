//! Lens - resilient gateway for vision model analysis of exam questions
//!
//! This library turns photographed exam questions into structured data by
//! calling a remote, rate-limited vision/language model. It rotates between
//! API keys based on their health, retries transient failures with backoff,
//! parses free-form model output tolerantly, and degrades to deterministic
//! mock results when the model cannot be reached.
//!
//! # Example
//!
//! ```no_run
//! use lens::config::LensConfig;
//! use lens::gateway::{AnalyzeRequest, Gateway};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LensConfig::load(None)?.with_env_overrides();
//! let gateway = Gateway::from_config(config)?;
//!
//! let response = gateway
//!     .analyze(AnalyzeRequest::stored("https://cdn.example.com/q/17.jpg"))
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod credential;
pub mod gateway;
pub mod invocation;
pub mod logging;
pub mod retry;
