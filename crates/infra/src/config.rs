use eod_reminder_domain::UserId;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Local wall-clock hour at which members get their daily prompt
    pub trigger_hour: u32,
    /// Local wall-clock minute at which members get their daily prompt
    pub trigger_minute: u32,
    /// How often the scheduler re-evaluates the roster. The trigger check
    /// matches an exact minute, so this should stay at one minute.
    pub tick_interval: Duration,
    /// Number of concurrent deliveries per batch
    pub batch_size: usize,
    /// Pause between delivery batches, bounds the delivery rate
    pub batch_pause: Duration,
    /// How long a fetched roster is served before the directory is asked
    /// again. Ticks run far more often than the roster changes.
    pub roster_ttl: Duration,
    /// Delivery attempts per member before giving up for this window
    pub max_delivery_attempts: u32,
    /// First retry delay, doubled on every subsequent attempt
    pub initial_retry_delay: Duration,
    /// Directory group holding the members to remind
    pub directory_group_id: Option<String>,
    /// Static member list used when the directory is not available
    pub fallback_ids: Vec<UserId>,
    pub api_base_url: String,
    pub api_token: String,
}

impl Config {
    pub fn new() -> Self {
        let api_token = required_env("WORKSPACE_API_TOKEN");
        let api_base_url = required_env("WORKSPACE_API_URL");

        let directory_group_id = match std::env::var("DEVELOPER_USERGROUP_ID") {
            Ok(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            _ => None,
        };
        let fallback_ids = parse_fallback_ids(
            &std::env::var("FALLBACK_DEVELOPER_IDS").unwrap_or_default(),
        );
        if directory_group_id.is_none() && fallback_ids.is_empty() {
            warn!(
                "Neither DEVELOPER_USERGROUP_ID nor FALLBACK_DEVELOPER_IDS is set. \
                 The roster will always be empty and nobody will be reminded."
            );
        }

        let mut trigger_hour: u32 = parsed_env("REMINDER_HOUR", 17);
        let mut trigger_minute: u32 = parsed_env("REMINDER_MINUTE", 0);
        if trigger_hour > 23 || trigger_minute > 59 {
            warn!(
                "The given trigger time {}:{:02} is not a valid wall-clock time, \
                 falling back to 17:00.",
                trigger_hour, trigger_minute
            );
            trigger_hour = 17;
            trigger_minute = 0;
        }

        Self {
            port: parsed_env("PORT", 5000),
            trigger_hour,
            trigger_minute,
            directory_group_id,
            fallback_ids,
            api_base_url,
            api_token,
            ..Default::default()
        }
    }
}

/// Defaults without touching the environment. Tests build on this and
/// override the fields they care about.
impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            trigger_hour: 17,
            trigger_minute: 0,
            tick_interval: Duration::from_secs(60),
            batch_size: 5,
            batch_pause: Duration::from_secs(1),
            roster_ttl: Duration::from_secs(5 * 60),
            max_delivery_attempts: 3,
            initial_retry_delay: Duration::from_secs(1),
            directory_group_id: None,
            fallback_ids: Vec::new(),
            api_base_url: String::new(),
            api_token: String::new(),
        }
    }
}

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{} env var to be present.", name))
}

fn parsed_env<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, raw, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// Comma-separated member ids, trimmed, blanks discarded. Read once at
/// configuration time.
fn parse_fallback_ids(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(UserId::from)
        .collect()
}
