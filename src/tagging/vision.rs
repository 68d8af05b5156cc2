//! Client for an OpenAI-compatible chat-completions endpoint with image input.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::VisionConfig;

pub struct VisionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vision API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("vision API returned no content")]
    EmptyResponse,

    #[error("could not parse model output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected model output: {0}")]
    UnexpectedShape(&'static str),
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl VisionClient {
    pub fn new(cfg: &VisionConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        }
    }

    /// Sends `prompt` together with a JPEG image and returns the model's text answer.
    pub async fn complete(
        &self,
        prompt: &str,
        jpeg: &[u8],
        max_tokens: u32,
    ) -> Result<String, VisionError> {
        let body = request_body(&self.model, prompt, jpeg, max_tokens);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)?;
        debug!(model = %self.model, chars = content.len(), "vision completion received");
        Ok(content)
    }
}

fn request_body(model: &str, prompt: &str, jpeg: &[u8], max_tokens: u32) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)) }
                }
            ]
        }],
        "max_tokens": max_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_embeds_image_as_data_url() {
        let body = request_body("gpt-4o", "describe", b"\xff\xd8\xff", 1000);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["text"], "describe");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn completion_shape_deserializes() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"slot\":\"top\"}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("{\"slot\":\"top\"}")
        );
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let cfg = VisionConfig {
            api_key: None,
            base_url: "http://localhost:1234/v1/".into(),
            model: "m".into(),
            force_mock: false,
        };
        let client = VisionClient::new(&cfg, "k".into());
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }
}
