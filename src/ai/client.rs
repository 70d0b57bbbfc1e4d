use super::prompts::Stage;
use super::provider::{CompletionOptions, LlmProvider};
use crate::error::TrinityError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_base: Duration,
    dump_dir: Option<PathBuf>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, TrinityError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_retries: 3,
            retry_base: Duration::from_secs(1),
            dump_dir: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Backoff unit; attempt `n` waits `retry_base * 2^n` before retrying.
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    pub fn with_dump_dir(mut self, dump_dir: Option<PathBuf>) -> Self {
        self.dump_dir = dump_dir;
        self
    }

    async fn complete_attempt(&self, prompt: &str, options: &CompletionOptions) -> Result<String, TrinityError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = build_payload(&self.model, prompt, options);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            log::error!("API Error: {}", err_text);
            return Err(TrinityError::GenerationFailed(format!("API Error {status}: {err_text}")));
        }

        let body: Value = res.json().await?;
        let text = extract_content(&body)?;

        if let Some(dir) = &self.dump_dir {
            dump_response(dir, options.stage, &text);
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, TrinityError> {
        let max_retries = self.max_retries;

        for attempt in 1..=max_retries {
            match self.complete_attempt(prompt, options).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    log::warn!("[{}] Attempt {attempt}/{max_retries} failed: {e}", options.stage);
                    if attempt == max_retries {
                        return Err(e);
                    }
                    sleep(self.retry_base * 2u32.pow(attempt)).await;
                }
            }
        }
        Err(TrinityError::GenerationFailed("Max retries exceeded".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn build_payload(model: &str, prompt: &str, options: &CompletionOptions) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    })
}

fn extract_content(body: &Value) -> Result<String, TrinityError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|text| text.trim().to_string())
        .ok_or_else(|| TrinityError::GenerationFailed("No text content returned".into()))
}

fn dump_response(dir: &Path, stage: Stage, text: &str) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let path = dir.join(format!("llm_response_{}_{}.txt", stage.name(), timestamp));

    if let Err(e) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, text)) {
        log::warn!("Failed to dump response to {}: {}", path.display(), e);
    } else {
        log::info!("💾 LLM Response dumped to '{}'", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_sampling_options() {
        let opts = CompletionOptions::new(Stage::Synthesize)
            .with_temperature(0.5)
            .with_max_tokens(42);
        let payload = build_payload("gpt-4o-mini", "hi", &opts);

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "hi");
        assert_eq!(payload["temperature"], 0.5);
        assert_eq!(payload["max_tokens"], 42);
    }

    #[test]
    fn content_is_trimmed() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": "  plan \n" } }] });
        assert_eq!(extract_content(&body).unwrap(), "plan");
    }

    #[test]
    fn missing_content_is_an_error() {
        let body = json!({ "choices": [] });
        assert!(matches!(extract_content(&body), Err(TrinityError::GenerationFailed(_))));
    }

    #[test]
    fn builder_normalises_base_url() {
        let client = OpenAiClient::new("key", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:4000/v1/")
            .with_model("local")
            .with_max_retries(0);
        assert_eq!(client.base_url, "http://localhost:4000/v1");
        assert_eq!(client.name(), "local");
        assert_eq!(client.max_retries, 1);
    }

    #[test]
    fn dump_writes_stage_named_file() {
        let dir = std::env::temp_dir().join(format!("trinity-dump-{}", uuid::Uuid::new_v4()));
        dump_response(&dir, Stage::Oppose, "tensions");

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(Result::ok).collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().into_string().unwrap();
        assert!(name.starts_with("llm_response_oppose_"));
        assert_eq!(fs::read_to_string(entries[0].path()).unwrap(), "tensions");

        fs::remove_dir_all(&dir).unwrap();
    }

    mod stubbed {
        use super::*;
        use axum::extract::State;
        use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::post;
        use axum::{Json, Router};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::{Arc, Mutex};

        /// Fake completions endpoint: fails the first `failures` calls, then answers.
        struct Upstream {
            failures: usize,
            failure_status: StatusCode,
            hits: AtomicUsize,
            seen: Mutex<Vec<(Option<String>, Value)>>,
        }

        async fn completions(
            State(upstream): State<Arc<Upstream>>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Response {
            let n = upstream.hits.fetch_add(1, Ordering::SeqCst);
            let auth = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            upstream.seen.lock().unwrap().push((auth, body));

            if n < upstream.failures {
                (upstream.failure_status, "invalid api key").into_response()
            } else {
                Json(json!({ "choices": [{ "message": { "role": "assistant", "content": "  fused plan \n" } }] }))
                    .into_response()
            }
        }

        async fn spawn_upstream(failures: usize, failure_status: StatusCode) -> (String, Arc<Upstream>) {
            let upstream = Arc::new(Upstream {
                failures,
                failure_status,
                hits: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            });
            let app = Router::new()
                .route("/v1/chat/completions", post(completions))
                .with_state(upstream.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

            (format!("http://{addr}/v1/"), upstream)
        }

        fn client_for(base_url: &str) -> OpenAiClient {
            let mut client = OpenAiClient::new("sk-stub", Duration::from_secs(5))
                .unwrap()
                .with_base_url(base_url)
                .with_model("stub-model")
                .with_max_retries(2)
                .with_retry_base(Duration::from_millis(1));
            client.client = reqwest::Client::builder().no_proxy().build().unwrap();
            client
        }

        #[tokio::test]
        async fn server_error_is_retried_then_reply_is_dumped() {
            let (base_url, upstream) = spawn_upstream(1, StatusCode::INTERNAL_SERVER_ERROR).await;
            let dir = std::env::temp_dir().join(format!("trinity-stub-{}", uuid::Uuid::new_v4()));
            let client = client_for(&base_url).with_dump_dir(Some(dir.clone()));

            let opts = CompletionOptions::new(Stage::Synthesize).with_temperature(0.5);
            let reply = client.complete("fuse this", &opts).await.unwrap();
            assert_eq!(reply, "fused plan");
            assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);

            let seen = upstream.seen.lock().unwrap();
            for (auth, body) in seen.iter() {
                assert_eq!(auth.as_deref(), Some("Bearer sk-stub"));
                assert_eq!(body["model"], "stub-model");
                assert_eq!(body["messages"][0]["content"], "fuse this");
                assert_eq!(body["temperature"], 0.5);
                assert_eq!(body["max_tokens"], 800);
            }

            let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(Result::ok).collect();
            assert_eq!(entries.len(), 1);
            let name = entries[0].file_name().into_string().unwrap();
            assert!(name.starts_with("llm_response_synthesize_"));
            assert_eq!(fs::read_to_string(entries[0].path()).unwrap(), "fused plan");
            fs::remove_dir_all(&dir).unwrap();
        }

        #[tokio::test]
        async fn persistent_rejection_returns_status_and_body() {
            let (base_url, upstream) = spawn_upstream(usize::MAX, StatusCode::UNAUTHORIZED).await;
            let client = client_for(&base_url);

            let err = client
                .complete("hello", &CompletionOptions::new(Stage::Generate))
                .await
                .unwrap_err();

            let message = err.to_string();
            assert!(matches!(err, TrinityError::GenerationFailed(_)));
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("invalid api key"), "{message}");
            assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
        }
    }
}
