use crate::{ApiError, ISys, IWorkspaceApi};
use chrono::{DateTime, Utc};
use eod_reminder_domain::UserId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

struct CachedRoster {
    ids: Vec<UserId>,
    fetched_at: DateTime<Utc>,
}

/// TTL cache over the directory group membership.
///
/// `get` never fails: a failing directory degrades to the last good list,
/// then to the static fallback list, then to an empty roster. A failed
/// refresh keeps the previous value in place, so the directory is asked
/// again on the next call.
pub struct RosterCache {
    workspace: Arc<dyn IWorkspaceApi>,
    sys: Arc<dyn ISys>,
    group_id: Option<String>,
    fallback: Vec<UserId>,
    ttl: chrono::Duration,
    cache: Mutex<Option<CachedRoster>>,
}

impl RosterCache {
    pub fn new(
        workspace: Arc<dyn IWorkspaceApi>,
        sys: Arc<dyn ISys>,
        group_id: Option<String>,
        fallback: Vec<UserId>,
        ttl: Duration,
    ) -> Self {
        Self {
            workspace,
            sys,
            group_id,
            fallback,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::max_value()),
            cache: Mutex::new(None),
        }
    }

    /// The current roster, in directory iteration order, without duplicates
    pub async fn get(&self) -> Vec<UserId> {
        let now = self.sys.now();
        {
            let cache = self.cache.lock().unwrap();
            if let Some(cached) = cache.as_ref() {
                if now - cached.fetched_at < self.ttl {
                    return cached.ids.clone();
                }
            }
        }

        let group_id = match &self.group_id {
            Some(id) => id.clone(),
            None => return self.fallback_roster("no directory group configured"),
        };

        match self.workspace.fetch_group_members(&group_id).await {
            Ok(members) => {
                let ids = dedup_preserving_order(members);
                info!(
                    "Fetched {} members from directory group {}",
                    ids.len(),
                    group_id
                );
                let mut cache = self.cache.lock().unwrap();
                *cache = Some(CachedRoster {
                    ids: ids.clone(),
                    fetched_at: now,
                });
                ids
            }
            Err(e) => {
                match &e {
                    ApiError::MissingPermission => {
                        warn!("Missing permission to read directory group {}", group_id)
                    }
                    ApiError::RateLimited { .. } => warn!("Rate limited by the directory API"),
                    _ => warn!("Directory fetch for group {} failed: {}", group_id, e),
                }

                let cache = self.cache.lock().unwrap();
                if let Some(cached) = cache.as_ref() {
                    // The last good list wins over the configured fallback
                    return cached.ids.clone();
                }
                drop(cache);
                self.fallback_roster("directory fetch failed")
            }
        }
    }

    fn fallback_roster(&self, reason: &str) -> Vec<UserId> {
        if self.fallback.is_empty() {
            warn!(
                "No usable roster ({}) and no fallback ids configured",
                reason
            );
            return Vec::new();
        }
        info!(
            "Using fallback list of {} members ({})",
            self.fallback.len(),
            reason
        );
        let ids = dedup_preserving_order(self.fallback.clone());
        let mut cache = self.cache.lock().unwrap();
        *cache = Some(CachedRoster {
            ids: ids.clone(),
            fetched_at: self.sys.now(),
        });
        ids
    }
}

fn dedup_preserving_order(ids: Vec<UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
