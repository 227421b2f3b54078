use crate::shared::usecase::UseCase;
use actix_web::rt::time::sleep;
use chrono::NaiveDate;
use eod_reminder_domain::{TriggerWindow, UserId};
use eod_reminder_infra::{Context, Retrier, TimezoneResolver};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One pass over the roster: members whose local wall-clock sits exactly
/// on the trigger minute, and who were not prompted today, get the prompt.
///
/// Due members are dispatched in fixed-size batches with a pause in
/// between to bound the delivery rate. A member is only marked sent after
/// a successful delivery, so a member whose retries exhaust stays eligible
/// for as long as their local minute matches.
#[derive(Debug)]
pub struct SendRemindersUseCase {
    /// Treat every unprompted member as due, regardless of local time.
    /// Used by the manual trigger endpoint.
    pub ignore_trigger_window: bool,
}

#[derive(Debug)]
pub enum UseCaseError {}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub roster_size: usize,
    pub due: usize,
    pub delivered: usize,
    pub failed: Vec<UserId>,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendRemindersUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "SendReminders";

    /// This will run every minute
    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let roster = ctx.store.roster.get().await;
        let now = ctx.sys.now();
        let today = now.naive_utc().date();
        let window = TriggerWindow::new(ctx.config.trigger_hour, ctx.config.trigger_minute);
        let resolver = TimezoneResolver::new(ctx.workspace.clone());

        let mut due = Vec::new();
        for user_id in &roster {
            if ctx.store.dedup.is_sent(user_id, today) {
                debug!("{} already got today's prompt", user_id);
                continue;
            }
            let tz = resolver.resolve(user_id).await;
            let local = now.with_timezone(&tz);
            if self.ignore_trigger_window || window.matches(&local) {
                due.push(user_id.clone());
            } else {
                debug!(
                    "Not prompt time for {} yet, local time is {}",
                    user_id,
                    local.format("%H:%M")
                );
            }
        }

        let mut report = DeliveryReport {
            roster_size: roster.len(),
            due: due.len(),
            ..Default::default()
        };
        if due.is_empty() {
            return Ok(report);
        }
        info!(
            "{} of {} roster members are due for the daily prompt",
            due.len(),
            roster.len()
        );

        let retrier = Retrier::new(
            ctx.config.max_delivery_attempts,
            ctx.config.initial_retry_delay,
        );
        let mut batches = due.chunks(ctx.config.batch_size.max(1)).peekable();
        while let Some(batch) = batches.next() {
            let deliveries = batch
                .iter()
                .map(|user_id| deliver_prompt(ctx, &retrier, user_id, today));
            for (user_id, delivered) in batch.iter().zip(join_all(deliveries).await) {
                if delivered {
                    report.delivered += 1;
                } else {
                    report.failed.push(user_id.clone());
                }
            }
            if batches.peek().is_some() {
                sleep(ctx.config.batch_pause).await;
            }
        }

        Ok(report)
    }
}

async fn deliver_prompt(
    ctx: &Context,
    retrier: &Retrier,
    user_id: &UserId,
    today: NaiveDate,
) -> bool {
    let workspace = ctx.workspace.clone();
    match retrier.call(|| workspace.send_prompt(user_id)).await {
        Ok(receipt) => {
            ctx.store.dedup.mark_sent(user_id, today);
            info!("Prompted {} (delivery ts: {:?})", user_id, receipt.delivered_at);
            true
        }
        Err(e) => {
            warn!("Giving up on prompting {}: {}", user_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::usecase::execute;
    use chrono::prelude::*;
    use eod_reminder_infra::{ApiError, Config, ISys, IWorkspaceApi, InMemoryWorkspaceApi};
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticSys {
        now: DateTime<Utc>,
    }

    impl ISys for StaticSys {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }
    }

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|id| UserId::from(*id)).collect()
    }

    fn setup(members: &[&str], now: DateTime<Utc>) -> (Arc<InMemoryWorkspaceApi>, Context) {
        let api = Arc::new(InMemoryWorkspaceApi::new());
        api.set_group_members(ids(members));

        let mut config = Config::default();
        config.directory_group_id = Some("devs".to_string());
        config.batch_pause = Duration::from_millis(1);
        config.initial_retry_delay = Duration::from_millis(1);

        let workspace: Arc<dyn IWorkspaceApi> = api.clone();
        let ctx = Context::create(workspace, config, Arc::new(StaticSys { now }));
        (api, ctx)
    }

    fn at_17_utc() -> DateTime<Utc> {
        Utc.ymd(2021, 1, 15).and_hms(17, 0, 0)
    }

    #[actix_web::main]
    #[test]
    async fn prompts_members_at_their_local_trigger_minute() {
        let (api, ctx) = setup(&["U1", "U2"], at_17_utc());
        let u1 = UserId::from("U1");
        let u2 = UserId::from("U2");
        api.set_timezone(&u1, "UTC");
        // UTC-3, so 14:00 local
        api.set_timezone(&u2, "Etc/GMT+3");

        let usecase = SendRemindersUseCase {
            ignore_trigger_window: false,
        };
        let report = execute(usecase, &ctx).await.unwrap();

        assert_eq!(report.roster_size, 2);
        assert_eq!(report.due, 1);
        assert_eq!(report.delivered, 1);
        assert!(report.failed.is_empty());
        assert_eq!(api.sent(), vec![u1.clone()]);

        let today = at_17_utc().naive_utc().date();
        assert!(ctx.store.dedup.is_sent(&u1, today));
        assert!(!ctx.store.dedup.is_sent(&u2, today));
    }

    #[actix_web::main]
    #[test]
    async fn does_not_prompt_twice_on_the_same_day() {
        let (api, ctx) = setup(&["U1"], at_17_utc());

        let first = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(first.delivered, 1);

        let second = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(second.due, 0);
        assert_eq!(second.delivered, 0);
        assert_eq!(api.sent().len(), 1);
    }

    #[actix_web::main]
    #[test]
    async fn exhausted_retries_leave_the_member_eligible() {
        let (api, ctx) = setup(&["U1"], at_17_utc());
        let u1 = UserId::from("U1");
        api.script_delivery_failures(
            &u1,
            vec![
                ApiError::Transport("reset".into()),
                ApiError::Transport("reset".into()),
                ApiError::Transport("reset".into()),
            ],
        );

        let report = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, vec![u1.clone()]);
        let today = at_17_utc().naive_utc().date();
        assert!(!ctx.store.dedup.is_sent(&u1, today));

        // Still inside the matching minute on the next tick, so the member
        // is picked up again and the delivery now goes through
        let retried = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(retried.delivered, 1);
        assert_eq!(api.sent(), vec![u1.clone()]);
        assert!(ctx.store.dedup.is_sent(&u1, today));
    }

    #[actix_web::main]
    #[test]
    async fn retries_transient_failures_within_one_dispatch() {
        let (api, ctx) = setup(&["U1"], at_17_utc());
        let u1 = UserId::from("U1");
        api.script_delivery_failures(
            &u1,
            vec![
                ApiError::RateLimited {
                    retry_after: Some(Duration::from_millis(2)),
                },
                ApiError::Transport("reset".into()),
            ],
        );

        let report = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(report.delivered, 1);
        assert!(report.failed.is_empty());
        assert_eq!(api.sent(), vec![u1]);
    }

    #[actix_web::main]
    #[test]
    async fn manual_trigger_ignores_the_window_but_not_dedup() {
        let now = Utc.ymd(2021, 1, 15).and_hms(12, 34, 0);
        let (api, ctx) = setup(&["U1", "U2"], now);
        let u2 = UserId::from("U2");
        ctx.store.dedup.mark_sent(&u2, now.naive_utc().date());

        let report = execute(
            SendRemindersUseCase {
                ignore_trigger_window: true,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.due, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(api.sent(), vec![UserId::from("U1")]);
    }

    #[actix_web::main]
    #[test]
    async fn delivers_across_multiple_batches() {
        let members = ["U1", "U2", "U3", "U4", "U5"];
        let (api, ctx) = setup(&members, at_17_utc());
        let mut small_batches = ctx.clone();
        small_batches.config.batch_size = 2;

        let report = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &small_batches,
        )
        .await
        .unwrap();

        assert_eq!(report.due, 5);
        assert_eq!(report.delivered, 5);
        let mut sent = api.sent();
        sent.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(sent, ids(&members));
    }

    #[actix_web::main]
    #[test]
    async fn profile_lookup_failure_defaults_to_utc() {
        let (api, ctx) = setup(&["U1"], at_17_utc());
        let u1 = UserId::from("U1");
        api.fail_profile(&u1, ApiError::Api("user_not_found".into()));

        let report = execute(
            SendRemindersUseCase {
                ignore_trigger_window: false,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(api.sent(), vec![u1]);
    }
}
