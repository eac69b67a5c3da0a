//! Interview, chat and evaluation endpoints. Payloads are passed through as JSON; their shape is
//! owned by the question-generation and evaluation services.

use crate::client::ApiClient;
use crate::error::ApiResult;
use reqwest::Method;
use serde_json::Value;

impl ApiClient {
    pub async fn interview_presets(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/interview/presets").await
    }

    pub async fn create_interview_preset(&self, preset: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/interview/presets", preset)
            .await
    }

    pub async fn delete_interview_preset(&self, preset_id: &str) -> ApiResult<Value> {
        self.request(Method::DELETE, &format!("/interview/presets/{}", preset_id))
            .await
    }

    pub async fn generate_interview_question(&self, request: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/interview/generate-question", request)
            .await
    }

    pub async fn generate_interview_preset(&self, request: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/interview/generate-preset", request)
            .await
    }

    /// Hands the finished chat to the evaluation service.
    pub async fn end_interview(&self, chat: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/api/interview/end", chat)
            .await
    }

    pub async fn chat_history(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/api/chats").await
    }

    pub async fn chat_transcript(&self, chat_id: &str) -> ApiResult<Value> {
        self.request(Method::GET, &format!("/api/chats/{}", chat_id))
            .await
    }

    pub async fn evaluation(&self, chat_id: &str) -> ApiResult<Value> {
        self.request(Method::GET, &format!("/api/evaluation/{}", chat_id))
            .await
    }

    pub async fn save_interview(&self, interview: &Value) -> ApiResult<Value> {
        self.request_json(Method::POST, "/auth/interviews", interview)
            .await
    }

    pub async fn interviews(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/auth/interviews").await
    }

    pub async fn interview(&self, interview_id: &str) -> ApiResult<Value> {
        self.request(Method::GET, &format!("/auth/interviews/{}", interview_id))
            .await
    }

    pub async fn delete_interview(&self, interview_id: &str) -> ApiResult<Value> {
        self.request(Method::DELETE, &format!("/auth/interviews/{}", interview_id))
            .await
    }
}
