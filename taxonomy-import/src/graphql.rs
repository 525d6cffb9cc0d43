//! Minimal GraphQL-over-HTTP transport shared by the Discovery and PIM clients.
//!
//! Each endpoint owns a `reqwest::Client` with a fixed timeout and its auth
//! headers baked in as default headers. Queries are plain strings; variables
//! and responses are typed with serde at the call site.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("GraphQL errors: {0}")]
    Errors(String),
    #[error("response carried no data")]
    MissingData,
    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),
}

#[derive(Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: &'a V,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

impl<T> GraphqlResponse<T> {
    fn into_result(self) -> Result<T, GraphqlError> {
        match self.errors {
            Some(errors) if !errors.is_null() => Err(GraphqlError::Errors(errors.to_string())),
            _ => self.data.ok_or(GraphqlError::MissingData),
        }
    }
}

pub struct GraphqlEndpoint {
    client: Client,
    url: String,
    /// Used in log lines only.
    name: &'static str,
}

impl GraphqlEndpoint {
    pub fn new(
        name: &'static str,
        url: &str,
        auth_headers: &[(&'static str, &str)],
        timeout: Duration,
    ) -> Result<Self, GraphqlError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for &(key, value) in auth_headers {
            let name =
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| GraphqlError::InvalidHeader(key))?;
            let mut value =
                HeaderValue::from_str(value).map_err(|_| GraphqlError::InvalidHeader(key))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            name,
        })
    }

    /// Posts `{query, variables}` and decodes `data` into `T`.
    ///
    /// A non-2xx status, a transport error and a non-empty `errors` array are
    /// all failures, even when `data` is partially present.
    pub async fn execute<V, T>(
        &self,
        operation: &str,
        query: &str,
        variables: &V,
    ) -> Result<T, GraphqlError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        debug!(endpoint = self.name, operation, "Sending GraphQL request");
        let response = self
            .client
            .post(&self.url)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = self.name, operation, error = %e, "GraphQL request failed");
                GraphqlError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            error!(endpoint = self.name, operation, %status, body = %body, "GraphQL endpoint returned error status");
            return Err(GraphqlError::Status { status, body });
        }

        let decoded: GraphqlResponse<T> = response.json().await?;
        decoded.into_result().map_err(|e| {
            error!(endpoint = self.name, operation, error = %e, "GraphQL response rejected");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        value: u32,
    }

    fn decode(body: &str) -> Result<Echo, GraphqlError> {
        serde_json::from_str::<GraphqlResponse<Echo>>(body)
            .unwrap()
            .into_result()
    }

    #[test]
    fn data_is_returned_when_no_errors() {
        assert_eq!(decode(r#"{"data":{"value":7}}"#).unwrap(), Echo { value: 7 });
        assert_eq!(
            decode(r#"{"data":{"value":7},"errors":null}"#).unwrap(),
            Echo { value: 7 }
        );
    }

    #[test]
    fn errors_win_over_partial_data() {
        let err = decode(r#"{"data":{"value":7},"errors":[{"message":"boom"}]}"#).unwrap_err();
        match err {
            GraphqlError::Errors(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_data_is_an_error() {
        assert!(matches!(
            decode(r#"{"data":null}"#).unwrap_err(),
            GraphqlError::MissingData
        ));
    }

    #[test]
    fn request_body_has_query_and_variables() {
        let vars = serde_json::json!({"name": "Acme"});
        let body = serde_json::to_value(GraphqlRequest {
            query: "query { x }",
            variables: &vars,
        })
        .unwrap();
        assert_eq!(body["query"], "query { x }");
        assert_eq!(body["variables"]["name"], "Acme");
    }

    #[test]
    fn header_values_are_validated() {
        let err = GraphqlEndpoint::new(
            "test",
            "http://localhost",
            &[("x-token", "bad\nvalue")],
            Duration::from_secs(1),
        )
        .err()
        .expect("newline is not a valid header value");
        assert!(matches!(err, GraphqlError::InvalidHeader("x-token")));
    }
}
