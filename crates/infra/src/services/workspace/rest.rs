use super::{ApiError, DeliveryReceipt, IWorkspaceApi, UserProfile};
use eod_reminder_domain::UserId;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The prompt members get at their local trigger time.
const DAILY_PROMPT: &str =
    "Time for your daily status update! Do you have any updates to share today?";

const MISSING_PERMISSION: &str = "missing-permission";
const RATE_LIMITED: &str = "rate-limited";

/// REST client for the workspace API. All endpoints answer with an
/// `ok`/`error` envelope; rate limits come back as HTTP 429 with an
/// optional `Retry-After` header in seconds.
pub struct WorkspaceRestApi {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GroupMembersResponse {
    ok: bool,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserProfileResponse {
    ok: bool,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendPromptRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendPromptResponse {
    ok: bool,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl WorkspaceRestApi {
    pub fn new(base_url: String, token: String) -> Self {
        let client = Client::new();

        Self {
            client,
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn check_rate_limit(res: &Response) -> Result<(), ApiError> {
        if res.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(());
        }
        let retry_after = res
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs);
        Err(ApiError::RateLimited { retry_after })
    }
}

fn classify(error: Option<String>) -> ApiError {
    match error.as_deref() {
        Some(MISSING_PERMISSION) => ApiError::MissingPermission,
        Some(RATE_LIMITED) => ApiError::RateLimited { retry_after: None },
        Some(other) => ApiError::Api(other.to_string()),
        None => ApiError::Api("unknown".to_string()),
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[async_trait::async_trait]
impl IWorkspaceApi for WorkspaceRestApi {
    async fn fetch_group_members(&self, group_id: &str) -> Result<Vec<UserId>, ApiError> {
        let res = self
            .client
            .get(&self.url(&format!("groups/{}/members", group_id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        Self::check_rate_limit(&res)?;

        let body: GroupMembersResponse = res.json().await.map_err(transport)?;
        if !body.ok {
            return Err(classify(body.error));
        }
        Ok(body.members.into_iter().map(UserId::from).collect())
    }

    async fn fetch_user_profile(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
        let res = self
            .client
            .get(&self.url(&format!("users/{}", user_id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        Self::check_rate_limit(&res)?;

        let body: UserProfileResponse = res.json().await.map_err(transport)?;
        if !body.ok {
            return Err(classify(body.error));
        }
        Ok(UserProfile {
            timezone: body.timezone,
        })
    }

    async fn send_prompt(&self, user_id: &UserId) -> Result<DeliveryReceipt, ApiError> {
        let res = self
            .client
            .post(&self.url("messages"))
            .bearer_auth(&self.token)
            .json(&SendPromptRequest {
                channel: user_id.as_str(),
                text: DAILY_PROMPT,
            })
            .send()
            .await
            .map_err(transport)?;
        Self::check_rate_limit(&res)?;

        let body: SendPromptResponse = res.json().await.map_err(transport)?;
        if !body.ok {
            return Err(classify(body.error));
        }
        Ok(DeliveryReceipt {
            delivered_at: body.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_member_envelope() {
        let body: GroupMembersResponse =
            serde_json::from_str(r#"{"ok": true, "members": ["U1", "U2"]}"#).unwrap();
        assert!(body.ok);
        assert_eq!(body.members, vec!["U1", "U2"]);
        assert!(body.error.is_none());
    }

    #[test]
    fn classifies_error_envelope() {
        let body: GroupMembersResponse =
            serde_json::from_str(r#"{"ok": false, "error": "missing-permission"}"#).unwrap();
        assert!(!body.ok);
        assert!(matches!(
            classify(body.error),
            ApiError::MissingPermission
        ));

        assert!(matches!(
            classify(Some(RATE_LIMITED.to_string())),
            ApiError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            classify(Some("boom".to_string())),
            ApiError::Api(_)
        ));
    }

    #[test]
    fn profile_timezone_is_optional() {
        let body: UserProfileResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(body.ok);
        assert!(body.timezone.is_none());
    }
}
