use crate::reminders::send_reminders::SendRemindersUseCase;
use crate::shared::usecase::execute;
use actix_web::rt::time::{interval, sleep_until, Instant};
use eod_reminder_infra::Context;
use std::time::Duration;
use tracing::info;

/// Seconds until the next wall-clock minute boundary. An exact boundary
/// waits for the following one.
pub fn secs_to_next_minute(now_millis: i64) -> u64 {
    60 - ((now_millis / 1000) % 60) as u64
}

/// The reminder loop: one tick per interval, each tick re-evaluates the
/// whole roster against the trigger window.
pub fn start_send_reminders_job(ctx: Context) {
    actix_web::rt::spawn(async move {
        // Align the first tick with a minute boundary so the exact-minute
        // trigger check observes every wall-clock minute
        let now = ctx.sys.now().timestamp_millis();
        let start = Instant::now() + Duration::from_secs(secs_to_next_minute(now));
        sleep_until(start).await;

        let mut tick = interval(ctx.config.tick_interval);
        loop {
            tick.tick().await;
            let context = ctx.clone();
            // Each tick runs in its own task: a slow or panicking tick
            // never stalls or kills the loop
            actix_web::rt::spawn(async move {
                let usecase = SendRemindersUseCase {
                    ignore_trigger_window: false,
                };
                let _ = execute(usecase, &context).await;
            });
        }
    });
}

/// Clears the delivery records once the UTC date advances. The reset is
/// idempotent, so re-checking on every interval is safe.
pub fn start_dedup_cleanup_job(ctx: Context) {
    actix_web::rt::spawn(async move {
        let mut current_day = ctx.sys.now().naive_utc().date();
        let mut tick = interval(ctx.config.tick_interval);
        loop {
            tick.tick().await;
            let today = ctx.sys.now().naive_utc().date();
            if today != current_day {
                info!("UTC day advanced to {}, delivery records reset", today);
                ctx.store.dedup.reset();
                current_day = today;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_minute_delay_works() {
        assert_eq!(secs_to_next_minute(50 * 1000), 10);
        assert_eq!(secs_to_next_minute(59 * 1000), 1);
        assert_eq!(secs_to_next_minute(60 * 1000), 60);
        assert_eq!(secs_to_next_minute(61 * 1000), 59);
        assert_eq!(secs_to_next_minute(59 * 1000 + 999), 1);
    }
}
