use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::notify::{LinePush, NotifyError};

pub const LINE_API_BASE_URL: &str = "https://api.line.me";

#[derive(Debug, Clone)]
pub struct LineClient {
    http: Client,
    base_url: String,
}

impl LineClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LinePush for LineClient {
    async fn push(&self, token: &str, to: &str, messages: Vec<Value>) -> Result<(), NotifyError> {
        let payload = json!({ "to": to, "messages": messages });

        let res = self
            .http
            .post(format!("{}/v2/bot/message/push", self.base_url))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn push_posts_payload_with_bearer_token() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v2/bot/message/push"),
                request::headers(contains(("authorization", "Bearer line-token"))),
                request::body(json_decoded(eq(json!({
                    "to": "G-1",
                    "messages": [{ "type": "text", "text": "hello" }]
                })))),
            ])
            .respond_with(status_code(200).body("{}")),
        );

        let client = LineClient::new(&server.url_str(""));
        client
            .push("line-token", "G-1", vec![json!({ "type": "text", "text": "hello" })])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/bot/message/push"))
                .respond_with(status_code(400).body(r#"{"message":"Invalid to"}"#)),
        );

        let client = LineClient::new(&server.url_str(""));
        let err = client.push("line-token", "bad", vec![]).await.unwrap_err();

        match err {
            NotifyError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid to"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
