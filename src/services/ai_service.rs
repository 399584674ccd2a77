use crate::error::{Error, Result};
use crate::models::exercise::Exercise;
use crate::models::flashcard::Flashcard;
use crate::services::parser_service::{
    self, ContentShape, Parsed, ParsedContent, CORRECT_PROPOSITION, END_ANSWER, END_EXERCISE,
    END_PROPOSITION, END_QUESTION, INCORRECT_PROPOSITION,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Text completion backend. Implementations return the raw completion; callers
/// treat it as untrusted.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, task: &str, content: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, task: &str, content: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": task},
                {"role": "user", "content": content}
            ],
            "temperature": 0.7
        });

        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response format").into())
    }
}

/// Either the completion text or the caller's fallback when the service failed.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptReply<T> {
    Text(String),
    Fallback(T),
}

#[derive(Clone)]
pub struct AIService {
    completion: Arc<dyn CompletionClient>,
    max_items: usize,
}

fn quiz_task() -> String {
    format!(
        "You write multiple-choice exercises about the course material you are given. \
         Write each exercise as the question text followed by {eq}, then between 2 and 8 \
         propositions, then {ee}. Start each proposition with {c} if it is correct or {i} \
         if it is not, and end it with {p}. At least one proposition must be correct. \
         Output nothing else.",
        eq = END_QUESTION,
        ee = END_EXERCISE,
        c = CORRECT_PROPOSITION,
        i = INCORRECT_PROPOSITION,
        p = END_PROPOSITION,
    )
}

fn flashcards_task() -> String {
    format!(
        "You write study flashcards about the course material you are given. Write each card \
         as the question followed by {eq}, then the answer followed by {ea}. Output nothing else.",
        eq = END_QUESTION,
        ea = END_ANSWER,
    )
}

impl AIService {
    pub fn new(completion: Arc<dyn CompletionClient>, max_items: usize) -> Self {
        Self {
            completion,
            max_items: max_items.max(1),
        }
    }

    pub fn openai(api_key: Option<String>, model: String, max_items: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self::new(
            Arc::new(OpenAiClient::new(api_key, model, client)),
            max_items,
        ))
    }

    pub async fn prompt<T>(&self, task: &str, content: &str, fallback: T) -> PromptReply<T> {
        match self.completion.complete(task, content).await {
            Ok(text) => PromptReply::Text(text),
            Err(e) => {
                tracing::error!("Completion failed, using fallback: {:?}", e);
                PromptReply::Fallback(fallback)
            }
        }
    }

    async fn generate(&self, task: &str, content: &str, shape: ContentShape) -> Result<ParsedContent> {
        if content.trim().is_empty() {
            return Err(Error::BadRequest("no source content to generate from".to_string()));
        }

        let text = match self.prompt(task, content, ()).await {
            PromptReply::Text(text) => text,
            PromptReply::Fallback(()) => return Err(Error::PromptAi),
        };

        let parsed = parser_service::parse(&text, shape)?;
        Ok(parsed)
    }

    pub async fn generate_quiz(&self, content: &str) -> Result<Parsed<Exercise>> {
        let ParsedContent::Quiz(mut parsed) =
            self.generate(&quiz_task(), content, ContentShape::Quiz).await?
        else {
            return Err(Error::Internal("parser returned flashcards for a quiz".to_string()));
        };
        parsed.truncate(self.max_items);
        tracing::info!(
            "Generated {} exercises ({} fragments dropped)",
            parsed.items.len(),
            parsed.warnings.len()
        );
        Ok(parsed)
    }

    pub async fn generate_flashcards(&self, content: &str) -> Result<Parsed<Flashcard>> {
        let ParsedContent::Flashcards(mut parsed) = self
            .generate(&flashcards_task(), content, ContentShape::Flashcards)
            .await?
        else {
            return Err(Error::Internal("parser returned a quiz for flashcards".to_string()));
        };
        parsed.truncate(self.max_items);
        tracing::info!(
            "Generated {} flashcards ({} fragments dropped)",
            parsed.items.len(),
            parsed.warnings.len()
        );
        Ok(parsed)
    }
}
