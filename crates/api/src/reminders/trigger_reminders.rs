use super::send_reminders::{DeliveryReport, SendRemindersUseCase};
use crate::shared::usecase::execute;
use actix_web::{web, HttpResponse};
use eod_reminder_infra::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct APIResponse {
    pub report: DeliveryReport,
}

/// Manual escape hatch for operators: prompt every roster member right
/// now, regardless of their local time. Dedup and retry policies still
/// apply, so members already prompted today are skipped.
pub async fn trigger_reminders_controller(ctx: web::Data<Context>) -> HttpResponse {
    let usecase = SendRemindersUseCase {
        ignore_trigger_window: true,
    };
    match execute(usecase, &ctx).await {
        Ok(report) => HttpResponse::Ok().json(APIResponse { report }),
        Err(e) => match e {},
    }
}
