use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::{JudgeError, JudgePrompt, VerdictSource};

/// Chat-completions client for the xAI API with live search enabled.
#[derive(Debug, Clone)]
pub struct XaiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl XaiClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    async fn send(&self, prompt: &JudgePrompt) -> Result<String, JudgeError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            "search_parameters": {
                "mode": "on",
                "sources": [{ "type": "web" }, { "type": "x" }],
            },
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let chat: ChatResponse = resp.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(JudgeError::EmptyResponse)
    }
}

impl VerdictSource for XaiClient {
    /// Ask the model, giving up after the configured timeout.
    ///
    /// The deadline is enforced through a child of `cancel`, so a caller
    /// cancelling the parent token also aborts the request.
    async fn ask(
        &self,
        prompt: &JudgePrompt,
        cancel: &CancellationToken,
    ) -> Result<String, JudgeError> {
        let deadline = cancel.child_token();
        let timer = {
            let deadline = deadline.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline.cancel();
            })
        };

        let result = tokio::select! {
            r = self.send(prompt) => r,
            _ = deadline.cancelled() => {
                if cancel.is_cancelled() {
                    Err(JudgeError::Cancelled)
                } else {
                    Err(JudgeError::Timeout(self.timeout.as_secs()))
                }
            }
        };

        timer.abort();
        result
    }
}
