//! HR chat assistant backed by a Gemini `generateContent` endpoint
//!
//! The model only ever sees a read-only snapshot of the caller's own records.
//! Upstream trouble never fails the request: the caller gets a fixed apology
//! and the cause goes to the log.

use std::time::Duration;

use chrono::NaiveDate;
use common::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AssistantConfig;
use crate::models::{LeaveRequest, TimeLog};
use crate::repositories::{LeaveStore, TimeLogStore, UserDirectory};

pub const UNAVAILABLE_REPLY: &str =
    "Sorry, the HR assistant is not available right now because it has not been configured.";
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong while contacting the assistant. Please try again.";

/// Time logs included in the context
const RECENT_TIME_LOGS: i64 = 7;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("a prompt is required")]
    EmptyPrompt,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub department: String,
    pub role: String,
}

/// What the model may know about the caller
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub user_info: Option<UserInfo>,
    pub leave_requests: Vec<LeaveRequest>,
    pub time_logs: Vec<TimeLog>,
}

impl UserContext {
    pub async fn gather<U, L, T>(
        users: &U,
        leaves: &L,
        time_logs: &T,
        user_id: &str,
    ) -> DatabaseResult<Self>
    where
        U: UserDirectory,
        L: LeaveStore,
        T: TimeLogStore,
    {
        let user_info = users.find_by_id(user_id).await?.map(|u| UserInfo {
            id: u.id,
            name: u.name,
            department: u.department,
            role: u.role,
        });

        Ok(Self {
            user_info,
            leave_requests: leaves.list_by_user(user_id).await?,
            time_logs: time_logs.list_for_user(user_id, RECENT_TIME_LOGS).await?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text of the first candidate
fn reply_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();

    if text.trim().is_empty() { None } else { Some(text) }
}

fn system_instruction(context: &UserContext, today: NaiveDate) -> String {
    let snapshot = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are Linky, the HR assistant of TimeLink HR. Be friendly, professional and concise.\n\
         Answer ONLY from the JSON data about the employee below and never invent information.\n\
         If a question is not about HR or the data below, politely decline.\n\
         When asked about leave, list the types and dates. When asked about attendance, \
         summarize check-in and check-out times.\n\
         Today's date is {}.\n\n\
         Employee data:\n{}",
        today.format("%Y-%m-%d"),
        snapshot
    )
}

#[derive(Clone)]
pub struct Assistant {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl Assistant {
    pub fn new(config: AssistantConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_none() {
            warn!("No assistant API key configured, the chat assistant is disabled");
        }

        Ok(Self { client, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub async fn chat(
        &self,
        context: &UserContext,
        prompt: &str,
        today: NaiveDate,
    ) -> Result<String, AssistantError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AssistantError::EmptyPrompt);
        }

        let Some(api_key) = self.config.api_key.as_deref().filter(|_| self.is_enabled()) else {
            return Ok(UNAVAILABLE_REPLY.to_string());
        };

        match self.generate(api_key, context, prompt, today).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                error!("Assistant request failed: {}", e);
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    async fn generate(
        &self,
        api_key: &str,
        context: &UserContext,
        prompt: &str,
        today: NaiveDate,
    ) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction(context, today) }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response: GenerateContentResponse = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reply = reply_text(response)
            .ok_or_else(|| anyhow::anyhow!("assistant response carried no text"))?;

        info!(model = %self.config.model, "assistant replied");
        Ok(reply)
    }
}
