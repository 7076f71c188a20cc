//! Analyze command implementation

use crate::cli::output::format_analysis_pretty;
use crate::cli::AnalyzeArgs;
use crate::config::LensConfig;
use crate::gateway::{AnalyzeRequest, AnalyzeResponse, Gateway, RequestOverrides};
use anyhow::Context;

/// Build the gateway request described by the command line.
pub fn build_request(args: &AnalyzeArgs) -> anyhow::Result<AnalyzeRequest> {
    let request = match (&args.image_url, &args.encoded_file) {
        (Some(url), _) => AnalyzeRequest::stored(url.trim()),
        (None, Some(path)) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            AnalyzeRequest::inline(data.trim())
        }
        (None, None) => anyhow::bail!("Either --image-url or --encoded-file is required"),
    };

    let mut request = request
        .with_mode(args.mode)
        .with_overrides(RequestOverrides {
            timeout_seconds: args.timeout,
            max_retries: args.max_retries,
            strict: args.strict,
            enable_rotation: Some(!args.no_rotation),
        });
    if let Some(id) = &args.request_id {
        request = request.with_request_id(id.clone());
    }
    Ok(request)
}

/// Handle `lens analyze` command
///
/// Returns the rendered response. Rejected requests are returned as errors
/// carrying the rendered output so the process exits non-zero.
pub async fn handle_analyze(args: &AnalyzeArgs, config: LensConfig) -> anyhow::Result<String> {
    let request = build_request(args)?;
    let gateway = Gateway::from_config(config)?;

    let response = gateway.analyze(request).await;
    gateway.shutdown();

    let rendered = if args.json {
        serde_json::to_string_pretty(&response)?
    } else {
        format_analysis_pretty(&response)
    };

    match response {
        AnalyzeResponse::Success(_) => Ok(rendered),
        AnalyzeResponse::Failure(_) => Err(anyhow::anyhow!(rendered)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::ProcessingMode;
    use std::path::PathBuf;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            image_url: None,
            encoded_file: None,
            mode: ProcessingMode::Complete,
            strict: false,
            no_rotation: false,
            timeout: None,
            max_retries: None,
            request_id: None,
            config: None,
            json: false,
        }
    }

    #[test]
    fn test_build_request_from_url() {
        let mut a = args();
        a.image_url = Some(" https://cdn.example.com/q.jpg ".to_string());
        a.no_rotation = true;
        a.timeout = Some(10);
        a.request_id = Some("req-7".to_string());

        let request = build_request(&a).unwrap();
        assert!(request.use_file_id);
        assert_eq!(request.file_id.as_deref(), Some("https://cdn.example.com/q.jpg"));
        assert_eq!(request.options.request_id.as_deref(), Some("req-7"));

        let overrides = request.options.overrides.to_resolve();
        assert!(!overrides.enable_rotation);
        assert_eq!(overrides.timeout, Some(std::time::Duration::from_secs(10)));
    }

    #[test]
    fn test_build_request_from_encoded_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "aGVsbG8=\n").unwrap();
        let mut a = args();
        a.encoded_file = Some(temp.path().to_path_buf());

        let request = build_request(&a).unwrap();
        assert!(!request.use_file_id);
        assert_eq!(request.image_base64.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn test_build_request_missing_file() {
        let mut a = args();
        a.encoded_file = Some(PathBuf::from("/nonexistent/q.b64"));
        let err = build_request(&a).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/q.b64"));
    }

    #[tokio::test]
    async fn test_analyze_without_credentials_degrades_to_mock() {
        let mut a = args();
        a.image_url = Some("https://cdn.example.com/q.jpg".to_string());
        a.json = true;

        let output = handle_analyze(&a, LensConfig::default()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["provenance"], "mock");
    }

    #[tokio::test]
    async fn test_analyze_strict_without_credentials_fails() {
        let mut a = args();
        a.image_url = Some("https://cdn.example.com/q.jpg".to_string());
        a.strict = true;
        a.json = true;

        let err = handle_analyze(&a, LensConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("INVALID_CONFIG"));
    }
}
