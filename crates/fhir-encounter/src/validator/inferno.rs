//! Inferno validator client
//!
//! Talks to an HL7 validator wrapper exposing `POST {base}/validate?profile=`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use super::ConformanceValidator;
use crate::error::{FhirError, Result};

/// Public Inferno validator API
pub const DEFAULT_BASE_URL: &str = "https://inferno.healthit.gov/validatorapi";

const FHIR_JSON: &str = "application/fhir+json";

pub struct InfernoValidator {
    client: Client,
    base_url: String,
}

impl InfernoValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(FhirError::Config(format!(
                "validator URL must be http(s): {base_url}"
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ConformanceValidator for InfernoValidator {
    async fn validate(&self, resource: &Value, profile: &str) -> Result<Value> {
        let url = format!("{}/validate", self.base_url);
        let body = serde_json::to_vec(resource)?;

        tracing::debug!(%url, profile, bytes = body.len(), "Posting resource for validation");

        let response = self
            .client
            .post(&url)
            .query(&[("profile", profile)])
            .header(CONTENT_TYPE, FHIR_JSON)
            .body(body)
            .send()
            .await?;

        // Rejections come back as 4xx with an OperationOutcome body,
        // which is exactly what the model needs to see.
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|_| FhirError::ValidatorResponse {
            status: status.as_u16(),
            detail: text.chars().take(200).collect(),
        })
    }

    fn name(&self) -> &str {
        "inferno"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::US_CORE_ENCOUNTER;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encounter() -> Value {
        json!({"resourceType": "Encounter", "status": "finished"})
    }

    fn validator(server: &MockServer) -> InfernoValidator {
        InfernoValidator::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_posts_to_validate_with_profile() {
        let server = MockServer::start().await;
        let outcome = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "information", "code": "informational", "diagnostics": "All OK"}]
        });
        Mock::given(method("POST"))
            .and(path("/validate"))
            .and(query_param("profile", US_CORE_ENCOUNTER))
            .and(header("content-type", FHIR_JSON))
            .and(body_json(encounter()))
            .respond_with(ResponseTemplate::new(200).set_body_json(outcome.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = validator(&server)
            .validate(&encounter(), US_CORE_ENCOUNTER)
            .await
            .unwrap();
        assert_eq!(result, outcome);
    }

    #[tokio::test]
    async fn test_error_status_body_returned_verbatim() {
        let server = MockServer::start().await;
        let outcome = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "required", "expression": ["Encounter.class"]}]
        });
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(400).set_body_json(outcome.clone()))
            .mount(&server)
            .await;

        let result = validator(&server)
            .validate(&encounter(), US_CORE_ENCOUNTER)
            .await
            .unwrap();
        assert_eq!(result, outcome);
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = validator(&server)
            .validate(&encounter(), US_CORE_ENCOUNTER)
            .await
            .unwrap_err();
        assert!(matches!(err, FhirError::ValidatorResponse { status: 502, .. }));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        assert!(InfernoValidator::new("ftp://example.org", Duration::from_secs(1)).is_err());
        let v = InfernoValidator::new("https://example.org/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(v.base_url(), "https://example.org/api");
    }
}
