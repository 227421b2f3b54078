use crate::IWorkspaceApi;
use chrono_tz::Tz;
use eod_reminder_domain::UserId;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps a member to the timezone declared on their profile.
///
/// Resolution never fails: a missing declaration, a failed lookup and an
/// unknown zone name all resolve to UTC.
pub struct TimezoneResolver {
    workspace: Arc<dyn IWorkspaceApi>,
}

impl TimezoneResolver {
    pub fn new(workspace: Arc<dyn IWorkspaceApi>) -> Self {
        Self { workspace }
    }

    pub async fn resolve(&self, user_id: &UserId) -> Tz {
        let name = match self.workspace.fetch_user_profile(user_id).await {
            Ok(profile) => match profile.timezone {
                Some(name) => name,
                None => {
                    debug!("No timezone on profile of {}, defaulting to UTC", user_id);
                    return Tz::UTC;
                }
            },
            Err(e) => {
                warn!(
                    "Profile lookup for {} failed: {}. Defaulting to UTC",
                    user_id, e
                );
                return Tz::UTC;
            }
        };

        match Tz::from_str(&name) {
            Ok(tz) => tz,
            Err(_) => {
                warn!(
                    "Unknown timezone `{}` on profile of {}, defaulting to UTC",
                    name, user_id
                );
                Tz::UTC
            }
        }
    }
}
