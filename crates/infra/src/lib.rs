mod config;
mod dedup;
mod retry;
mod roster;
mod services;
mod system;
mod timezone;

pub use config::Config;
pub use dedup::DedupTracker;
pub use retry::Retrier;
pub use roster::RosterCache;
pub use services::*;
pub use system::ISys;
use system::RealSys;
pub use timezone::TimezoneResolver;

use std::sync::Arc;

/// Everything the reminder usecases need: configuration, the workspace API,
/// the roster/dedup state and a mockable clock.
#[derive(Clone)]
pub struct Context {
    pub store: Store,
    pub workspace: Arc<dyn IWorkspaceApi>,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

/// In-memory scheduler state. Recreated empty at every boot, only the
/// scheduler loop writes to it.
#[derive(Clone)]
pub struct Store {
    pub roster: Arc<RosterCache>,
    pub dedup: Arc<DedupTracker>,
}

impl Context {
    pub fn create(workspace: Arc<dyn IWorkspaceApi>, config: Config, sys: Arc<dyn ISys>) -> Self {
        let roster = Arc::new(RosterCache::new(
            workspace.clone(),
            sys.clone(),
            config.directory_group_id.clone(),
            config.fallback_ids.clone(),
            config.roster_ttl,
        ));
        Self {
            store: Store {
                roster,
                dedup: Arc::new(DedupTracker::new()),
            },
            workspace,
            config,
            sys,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub fn setup_context() -> Context {
    let config = Config::new();
    let workspace = Arc::new(WorkspaceRestApi::new(
        config.api_base_url.clone(),
        config.api_token.clone(),
    ));
    Context::create(workspace, config, Arc::new(RealSys {}))
}
