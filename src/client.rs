use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Same characters `encodeURIComponent` leaves alone, minus the few it
/// also spares (`!*'()`), which the server decodes identically anyway.
const QUESTION_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Everything that can go wrong while fetching an answer. The client
/// never panics and never lets a transport error escape as anything
/// other than one of these variants.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server returned status {0}")]
    Status(StatusCode),
    #[error("malformed answer body: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct AnswerBody {
    resposta: String,
}

/// Thin HTTP client for the answer service. One GET per question, no
/// retries, no caching; timeouts are whatever reqwest defaults to.
#[derive(Clone)]
pub struct AnswerClient {
    http: Client,
    base_url: String,
}

impl AnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// `{base}/response?pergunta=<percent-encoded question>`
    pub fn answer_url(&self, question: &str) -> String {
        let encoded = utf8_percent_encode(question, QUESTION_ENCODE);
        format!("{}/response?pergunta={}", self.base_url, encoded)
    }

    /// Fetch the answer for a question. The caller is responsible for
    /// trimming and rejecting empty input; whatever arrives here is sent.
    pub async fn ask(&self, question: &str) -> Result<String, AskError> {
        let response = self
            .http
            .get(self.answer_url(question))
            .send()
            .await
            .map_err(AskError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AskError::Status(status));
        }

        let body = response.text().await.map_err(AskError::Transport)?;
        let answer: AnswerBody = serde_json::from_str(&body).map_err(AskError::Malformed)?;
        Ok(answer.resposta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn answer_url_encodes_like_encode_uri_component() {
        let client = AnswerClient::new("http://localhost:55555");
        assert_eq!(
            client.answer_url("Quem é Chiquinho?"),
            "http://localhost:55555/response?pergunta=Quem%20%C3%A9%20Chiquinho%3F"
        );
    }

    #[tokio::test]
    async fn ask_returns_the_answer_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/response"))
            .and(query_param("pergunta", "Quem é Chiquinho?"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resposta": "Chiquinho é um personagem."
            })))
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let answer = client.ask("Quem é Chiquinho?").await.unwrap();
        assert_eq!(answer, "Chiquinho é um personagem.");
    }

    #[tokio::test]
    async fn ask_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/response"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let err = client.ask("oi").await.unwrap_err();
        assert!(matches!(err, AskError::Status(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn ask_reports_body_that_is_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/response"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let err = client.ask("oi").await.unwrap_err();
        assert!(matches!(err, AskError::Malformed(_)));
    }

    #[tokio::test]
    async fn ask_reports_body_missing_the_answer_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/response"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "detail": "ok" })),
            )
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let err = client.ask("oi").await.unwrap_err();
        assert!(matches!(err, AskError::Malformed(_)));
    }

    #[tokio::test]
    async fn ask_reports_connection_failure() {
        // Nothing listens on port 1.
        let client = AnswerClient::new("http://127.0.0.1:1");
        let err = client.ask("oi").await.unwrap_err();
        assert!(matches!(err, AskError::Transport(_)));
    }
}
