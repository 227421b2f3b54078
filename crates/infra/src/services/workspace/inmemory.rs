use super::{ApiError, DeliveryReceipt, IWorkspaceApi, UserProfile};
use eod_reminder_domain::UserId;
use std::collections::HashMap;
use std::sync::Mutex;

/// Workspace API double for tests. Responses are scripted up front and
/// every directory fetch / delivery is recorded.
pub struct InMemoryWorkspaceApi {
    group_members: Mutex<Result<Vec<UserId>, ApiError>>,
    group_member_fetches: Mutex<usize>,
    profiles: Mutex<HashMap<UserId, Result<UserProfile, ApiError>>>,
    delivery_failures: Mutex<HashMap<UserId, Vec<ApiError>>>,
    sent: Mutex<Vec<UserId>>,
}

impl InMemoryWorkspaceApi {
    pub fn new() -> Self {
        Self {
            group_members: Mutex::new(Ok(Vec::new())),
            group_member_fetches: Mutex::new(0),
            profiles: Mutex::new(HashMap::new()),
            delivery_failures: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_group_members(&self, members: Vec<UserId>) {
        *self.group_members.lock().unwrap() = Ok(members);
    }

    pub fn fail_group_members(&self, error: ApiError) {
        *self.group_members.lock().unwrap() = Err(error);
    }

    /// How many times the directory has been asked for the group
    pub fn group_member_fetches(&self) -> usize {
        *self.group_member_fetches.lock().unwrap()
    }

    pub fn set_timezone(&self, user_id: &UserId, timezone: &str) {
        self.profiles.lock().unwrap().insert(
            user_id.clone(),
            Ok(UserProfile {
                timezone: Some(timezone.to_string()),
            }),
        );
    }

    pub fn fail_profile(&self, user_id: &UserId, error: ApiError) {
        self.profiles
            .lock()
            .unwrap()
            .insert(user_id.clone(), Err(error));
    }

    /// Errors the next deliveries to this member fail with, in order.
    /// Once drained, deliveries succeed again.
    pub fn script_delivery_failures(&self, user_id: &UserId, errors: Vec<ApiError>) {
        self.delivery_failures
            .lock()
            .unwrap()
            .insert(user_id.clone(), errors);
    }

    /// Members that got the prompt, in delivery order
    pub fn sent(&self) -> Vec<UserId> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryWorkspaceApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IWorkspaceApi for InMemoryWorkspaceApi {
    async fn fetch_group_members(&self, _group_id: &str) -> Result<Vec<UserId>, ApiError> {
        *self.group_member_fetches.lock().unwrap() += 1;
        self.group_members.lock().unwrap().clone()
    }

    async fn fetch_user_profile(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
        self.profiles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Ok(UserProfile::default()))
    }

    async fn send_prompt(&self, user_id: &UserId) -> Result<DeliveryReceipt, ApiError> {
        let mut failures = self.delivery_failures.lock().unwrap();
        if let Some(errors) = failures.get_mut(user_id) {
            if !errors.is_empty() {
                return Err(errors.remove(0));
            }
        }
        drop(failures);

        let mut sent = self.sent.lock().unwrap();
        sent.push(user_id.clone());
        Ok(DeliveryReceipt {
            delivered_at: Some(format!("{}.000000", sent.len())),
        })
    }
}
