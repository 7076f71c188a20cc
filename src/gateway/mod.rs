//! Process-wide gateway context.
//!
//! A [`Gateway`] owns one credential pool, one configuration resolver, one
//! model invoker, one retry orchestrator and one fallback generator. Each
//! [`analyze`](Gateway::analyze) call moves through these states:
//!
//! ```text
//! PENDING ──(config invalid)──────────────────────────────▶ DEGRADED_MOCK
//! PENDING ──▶ ATTEMPTING ──(success)──────────────────────▶ SUCCESS
//!             ATTEMPTING ──(permanent error / exhausted)──▶ DEGRADED_MOCK
//! ```
//!
//! Only caller input errors and strict-mode configuration errors produce a
//! `success: false` response.

pub mod types;

pub use types::{
    AnalyzeFailure, AnalyzeOptions, AnalyzeRequest, AnalyzeResponse, AnalyzeSuccess, ErrorBody,
    GatewayError, InputError, RequestOverrides,
};

use crate::analysis::{AnalysisResult, FallbackGenerator, Provenance, ResponseParser};
use crate::config::{ConfigResolver, GatewaySettings, InvocationConfig, LensConfig};
use crate::credential::{
    Clock, CredentialPool, HealthCheckSummary, HealthProbe, PoolStatusReport, Secret, SystemClock,
};
use crate::invocation::{HttpProbe, ImageSource, InvocationPayload, ModelInvoker, OpenAiClient};
use crate::retry::{BackoffStrategy, LinearBackoff, RetryOrchestrator, Sleeper, TokioSleeper};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resilient analysis entry point.
pub struct Gateway {
    settings: GatewaySettings,
    resolver: ConfigResolver,
    pool: Arc<CredentialPool>,
    invoker: Arc<dyn ModelInvoker>,
    orchestrator: RetryOrchestrator,
    parser: ResponseParser,
    fallback: FallbackGenerator,
    probe: Option<Arc<dyn HealthProbe>>,
    cancel: CancellationToken,
    log_model_output: bool,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("settings", &self.settings)
            .field("pool", &self.pool)
            .field("shut_down", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Gateway`], mainly for swapping collaborators in tests.
pub struct GatewayBuilder {
    config: LensConfig,
    invoker: Option<Arc<dyn ModelInvoker>>,
    probe: Option<Arc<dyn HealthProbe>>,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    clock: Option<Arc<dyn Clock>>,
    cancel: CancellationToken,
}

impl GatewayBuilder {
    pub fn new(config: LensConfig) -> Self {
        Self {
            config,
            invoker: None,
            probe: None,
            backoff: None,
            sleeper: None,
            clock: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled by [`Gateway::shutdown`]; hand it to custom invokers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn invoker(mut self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn backoff(mut self, backoff: Arc<dyn BackoffStrategy>) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Gateway, GatewayError> {
        let config = self.config;
        config.validate()?;

        let secrets: Vec<Secret> = config.credentials.secrets();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let pool = Arc::new(
            CredentialPool::from_secrets(secrets.clone(), config.credentials.pool_settings())
                .with_clock(clock),
        );
        let resolver =
            ConfigResolver::new(config.model.clone(), secrets).with_pool(Arc::clone(&pool));

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("lens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::HttpClient(e.to_string()))?;

        let invoker = self.invoker.unwrap_or_else(|| {
            Arc::new(OpenAiClient::new(client.clone(), self.cancel.clone()))
        });

        let probe = self.probe.or_else(|| {
            config
                .model
                .endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(|endpoint| {
                    Arc::new(HttpProbe::new(client.clone(), endpoint, PROBE_TIMEOUT))
                        as Arc<dyn HealthProbe>
                })
        });

        let backoff = self.backoff.unwrap_or_else(|| {
            Arc::new(LinearBackoff::new(Duration::from_millis(
                config.gateway.backoff_step_ms,
            )))
        });
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        tracing::info!(
            credentials = pool.len(),
            error_threshold = pool.settings().error_threshold,
            rotation_cooldown_ms = pool.settings().rotation_cooldown.as_millis() as u64,
            provider = %config.gateway.provider,
            "Gateway initialized"
        );

        Ok(Gateway {
            settings: config.gateway,
            resolver,
            pool,
            invoker,
            orchestrator: RetryOrchestrator::new(backoff, sleeper),
            parser: ResponseParser::new(),
            fallback: FallbackGenerator::new(),
            probe,
            cancel: self.cancel,
            log_model_output: config.logging.log_model_output,
        })
    }
}

impl Gateway {
    /// Build a gateway with the default HTTP invoker.
    pub fn from_config(config: LensConfig) -> Result<Self, GatewayError> {
        GatewayBuilder::new(config).build()
    }

    pub fn builder(config: LensConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn status_report(&self) -> PoolStatusReport {
        self.pool.status_report()
    }

    /// Probe every credential once.
    pub async fn health_check(&self) -> Result<HealthCheckSummary, GatewayError> {
        let probe = self.probe.as_ref().ok_or_else(|| {
            GatewayError::ProbeUnavailable("no endpoint configured".to_string())
        })?;
        Ok(self.pool.perform_health_check(probe.as_ref()).await)
    }

    /// Cancel in-flight attempts. Later calls degrade to mock results.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Gateway shutting down, cancelling in-flight invocations");
            self.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Analyze one image.
    ///
    /// Never fails for upstream problems: those degrade to a
    /// [`Provenance::Mock`] result. Only bad input and strict-mode
    /// configuration errors produce a failure response.
    pub async fn analyze(&self, request: AnalyzeRequest) -> AnalyzeResponse {
        let request_id = request
            .options
            .request_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let span = tracing::info_span!("analyze", request_id = %request_id, mode = %request.mode);
        self.analyze_inner(request, request_id).instrument(span).await
    }

    async fn analyze_inner(&self, request: AnalyzeRequest, request_id: String) -> AnalyzeResponse {
        let started = Instant::now();

        let source = match self.validate_input(&request) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "Rejected analysis request");
                metrics::counter!("lens_invocations_total", "outcome" => "rejected").increment(1);
                return AnalyzeResponse::failure(request_id, ErrorBody::from(&err));
            }
        };

        let config = match self.resolver.resolve(&request.options.overrides.to_resolve()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected analysis request");
                metrics::counter!("lens_invocations_total", "outcome" => "rejected").increment(1);
                return AnalyzeResponse::failure(request_id, ErrorBody::from(&err));
            }
        };

        if !config.is_valid() {
            let result = self.degrade(source.seed(), "invalid_config");
            return self.respond(result, &config, request_id, started);
        }

        let payload = InvocationPayload::new(source, request.mode);
        let invoker = self.invoker.as_ref();
        let payload_ref = &payload;
        let config_ref = &config;

        let outcome = self
            .orchestrator
            .execute(&config, |secret| async move {
                invoker.call(payload_ref, config_ref, &secret).await
            })
            .await;

        let result = match outcome {
            Ok(outcome) => {
                if self.log_model_output {
                    tracing::debug!(content = %outcome.content, "Model output");
                }
                let mut result = self.parser.parse(&outcome.content);
                result.provenance = Provenance::Live;
                tracing::info!(
                    state = "success",
                    attempts = outcome.attempts,
                    credential_id = %outcome.credential_id,
                    confidence = result.confidence,
                    "Analysis completed"
                );
                metrics::counter!("lens_invocations_total", "outcome" => "success").increment(1);
                result
            }
            Err(err) => {
                tracing::warn!(attempts = err.attempts(), error = %err, "Live invocation failed");
                self.degrade(payload.source.seed(), err.reason())
            }
        };

        self.respond(result, &config, request_id, started)
    }

    fn validate_input(&self, request: &AnalyzeRequest) -> Result<ImageSource, InputError> {
        if request.use_file_id {
            return match request.file_id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => Ok(ImageSource::Stored(id.to_string())),
                _ => Err(InputError::NoPayload),
            };
        }

        let data = match request.image_base64.as_deref().map(str::trim) {
            Some(data) if !data.is_empty() => data,
            _ => return Err(InputError::NoPayload),
        };
        if data.len() > self.settings.max_payload_bytes {
            return Err(InputError::PayloadTooLarge {
                size: data.len(),
                limit: self.settings.max_payload_bytes,
            });
        }
        Ok(ImageSource::Inline(data.to_string()))
    }

    fn degrade(&self, seed: &str, reason: &'static str) -> AnalysisResult {
        tracing::warn!(state = "degraded_mock", reason, "Returning mock analysis");
        metrics::counter!("lens_invocations_total", "outcome" => "degraded_mock").increment(1);
        metrics::counter!("lens_fallbacks_total", "reason" => reason).increment(1);
        self.fallback.produce(seed)
    }

    fn respond(
        &self,
        result: AnalysisResult,
        config: &InvocationConfig,
        request_id: String,
        started: Instant,
    ) -> AnalyzeResponse {
        AnalyzeResponse::Success(AnalyzeSuccess {
            success: true,
            result,
            request_id,
            processing_time_ms: started.elapsed().as_millis() as u64,
            provider: self.settings.provider.clone(),
            model_version: config.model().to_string(),
        })
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
