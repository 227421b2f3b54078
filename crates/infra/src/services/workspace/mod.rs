mod inmemory;
mod rest;

pub use inmemory::InMemoryWorkspaceApi;
pub use rest::WorkspaceRestApi;

use eod_reminder_domain::UserId;
use std::time::Duration;
use thiserror::Error;

/// The profile fields the reminder engine reads.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    /// IANA timezone declared on the member profile, when set
    pub timezone: Option<String>,
}

/// Acknowledgement returned by the workspace for a delivered prompt.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Server-side delivery timestamp, when the workspace reports one
    pub delivered_at: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Missing permission to call the workspace API")]
    MissingPermission,
    #[error("Rate limited by the workspace API")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Workspace API request failed: {0}")]
    Transport(String),
    #[error("Workspace API responded with error: `{0}`")]
    Api(String),
}

/// The workspace the reminders go to: a member directory, member profiles
/// and a message channel per member.
#[async_trait::async_trait]
pub trait IWorkspaceApi: Send + Sync {
    /// Member ids of the given directory group
    async fn fetch_group_members(&self, group_id: &str) -> Result<Vec<UserId>, ApiError>;

    /// Profile of a single member
    async fn fetch_user_profile(&self, user_id: &UserId) -> Result<UserProfile, ApiError>;

    /// Deliver the daily prompt to a member
    async fn send_prompt(&self, user_id: &UserId) -> Result<DeliveryReceipt, ApiError>;
}
