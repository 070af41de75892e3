use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::scenario::error::ScenarioError;

/// Thin HTTP client for the service under test.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: Url,
}

/// A response kept as text until a step asks for JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub url: String,
    pub status: u16,
    pub text: String,
}

impl ServiceResponse {
    /// Requires a 2xx status and a JSON body.
    pub fn json(&self, step: &'static str) -> Result<Value, ScenarioError> {
        if !(200..300).contains(&self.status) {
            return Err(ScenarioError::UnexpectedStatus {
                step,
                url: self.url.clone(),
                status: self.status,
                body: self.text.clone(),
            });
        }
        serde_json::from_str(&self.text).map_err(|_| ScenarioError::NonJson {
            step,
            url: self.url.clone(),
            body: self.text.clone(),
        })
    }
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    pub fn url_for(&self, step: &'static str, segments: &[&str]) -> Result<Url, ScenarioError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ScenarioError::InvalidUrl {
                step,
                base: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(
        &self,
        step: &'static str,
        segments: &[&str],
    ) -> Result<ServiceResponse, ScenarioError> {
        let url = self.url_for(step, segments)?;
        debug!(step, url = %url, "GET");
        let request = self.http.get(url.clone());
        self.send(step, url, request).await
    }

    pub async fn post_json<T: Serialize>(
        &self,
        step: &'static str,
        segments: &[&str],
        body: &T,
    ) -> Result<ServiceResponse, ScenarioError> {
        let url = self.url_for(step, segments)?;
        debug!(step, url = %url, "POST");
        let request = self.http.post(url.clone()).json(body);
        self.send(step, url, request).await
    }

    async fn send(
        &self,
        step: &'static str,
        url: Url,
        request: reqwest::RequestBuilder,
    ) -> Result<ServiceResponse, ScenarioError> {
        let http_error = |source| ScenarioError::Http {
            step,
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(http_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(http_error)?;
        debug!(step, url = %url, status, bytes = text.len(), "Response");
        Ok(ServiceResponse {
            url: url.to_string(),
            status,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ServiceClient {
        ServiceClient::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:7000").unwrap(),
        )
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let segments = ["aisearch", "a/b c", "catalog", "search=the matrix.json"];
        let url = client().url_for("t", &segments).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:7000/aisearch/a%2Fb%20c/catalog/search=the%20matrix.json"
        );
    }

    #[test]
    fn test_non_success_status_is_reported_with_body() {
        let response = ServiceResponse {
            url: "http://x/validate".to_string(),
            status: 500,
            text: "boom".to_string(),
        };
        match response.json("validate-config") {
            Err(ScenarioError::UnexpectedStatus { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_is_reported() {
        let response = ServiceResponse {
            url: "http://x/encrypt".to_string(),
            status: 200,
            text: "<html>".to_string(),
        };
        assert!(matches!(
            response.json("encrypt-config"),
            Err(ScenarioError::NonJson { body, .. }) if body == "<html>"
        ));
    }
}
