use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crmsync_config::AppConfig;

use super::models::{BatchReadRequest, BatchReadResponse, HubSpotObject, ListResponse, ObjectPage};
use crate::fetcher::RecordSource;

#[derive(Debug, Clone)]
pub struct HubSpotClientConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl HubSpotClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.hubspot_base_url.trim_end_matches('/').to_string(),
            token: config.hubspot_token.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    config: HubSpotClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum HubSpotClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl HubSpotClient {
    pub fn new(config: HubSpotClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: point the client at a mock server.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    fn objects_url(&self, object_type: &str) -> String {
        format!("{}/crm/v3/objects/{}", self.config.base_url, object_type)
    }

    /// Send once and decode the body. Non-2xx responses fail without retrying.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, HubSpotClientError> {
        let response = request.bearer_auth(&self.config.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubSpotClientError::HttpError { status, body });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RecordSource for HubSpotClient {
    type Error = HubSpotClientError;

    async fn list_page(
        &self,
        object_type: &str,
        after: Option<&str>,
        limit: usize,
        properties: &[&str],
    ) -> Result<ObjectPage, HubSpotClientError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        if !properties.is_empty() {
            query.push(("properties", properties.join(",")));
        }

        let request = self.client.get(self.objects_url(object_type)).query(&query);
        let page: ListResponse = self.send_json(request).await?;
        Ok(page.into())
    }

    async fn read_batch(
        &self,
        object_type: &str,
        ids: &[String],
        properties: &[&str],
    ) -> Result<Vec<HubSpotObject>, HubSpotClientError> {
        let url = format!("{}/batch/read", self.objects_url(object_type));
        let request = self
            .client
            .post(url)
            .json(&BatchReadRequest::new(ids, properties));
        let resp: BatchReadResponse = self.send_json(request).await?;
        Ok(resp.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> HubSpotClientConfig {
        HubSpotClientConfig {
            base_url: "http://localhost".to_string(),
            token: "pat-test-token".to_string(),
            timeout_secs: 5,
        }
    }

    fn contact(id: usize) -> serde_json::Value {
        serde_json::json!({
            "id": id.to_string(),
            "properties": {
                "hs_object_id": id.to_string(),
                "email": format!("user{id}@example.com")
            },
            "archived": false
        })
    }

    #[tokio::test]
    async fn list_first_page_without_cursor() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "results": [contact(1), contact(2)],
            "paging": { "next": { "after": "3" } }
        });

        Mock::given(method("GET"))
            .and(path("/crm/v3/objects/contacts"))
            .and(query_param("limit", "2"))
            .and(query_param("properties", "hs_object_id,email"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let page = client
            .list_page("contacts", None, 2, &["hs_object_id", "email"])
            .await
            .unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].id, "2");
        assert_eq!(page.next_after.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn list_passes_cursor() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "results": [contact(3)] });

        Mock::given(method("GET"))
            .and(path("/crm/v3/objects/deals"))
            .and(query_param("after", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let page = client
            .list_page("deals", Some("3"), 100, &["hs_object_id"])
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.next_after, None);
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v3/objects/emails"))
            .and(header("Authorization", "Bearer pat-test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        client.list_page("emails", None, 10, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn batch_read_posts_ids_and_properties() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "status": "COMPLETE",
            "results": [contact(7), contact(8)]
        });

        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/contacts/batch/read"))
            .and(body_json(serde_json::json!({
                "properties": ["hs_object_id", "email"],
                "inputs": [{ "id": "7" }, { "id": "8" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let ids = vec!["7".to_string(), "8".to_string()];
        let objects = client
            .read_batch("contacts", &ids, &["hs_object_id", "email"])
            .await
            .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id, "7");
    }

    #[tokio::test]
    async fn fails_on_server_error_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v3/objects/contacts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let err = client
            .list_page("contacts", None, 100, &[])
            .await
            .unwrap_err();
        match err {
            HubSpotClientError::HttpError { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "unavailable");
            }
            other => panic!("expected HttpError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/deals/batch/read"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client = HubSpotClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let err = client
            .read_batch("deals", &["1".to_string()], &["hs_object_id"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HubSpotClientError::HttpError { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[test]
    fn config_trims_trailing_slash() {
        let app = AppConfig {
            database_url: "postgres://localhost/crm".to_string(),
            db_schema: "hubspot".to_string(),
            db_max_connections: 5,
            hubspot_token: "tok".to_string(),
            hubspot_base_url: "https://api.hubapi.com/".to_string(),
            page_size: 100,
            max_records: None,
            page_delay_ms: 0,
            timeout_secs: 12,
            fetch_mode: Default::default(),
            entities: vec![],
            log_level: "info".to_string(),
        };

        let config = HubSpotClientConfig::from_app_config(&app);
        assert_eq!(config.base_url, "https://api.hubapi.com");
        assert_eq!(config.token, "tok");
        assert_eq!(config.timeout_secs, 12);
    }
}
