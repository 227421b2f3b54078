pub mod send_reminders;
mod trigger_reminders;

use actix_web::web;
use trigger_reminders::trigger_reminders_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reminders/trigger",
        web::post().to(trigger_reminders_controller),
    );
}
