mod controller;
mod state;
mod ui;

pub use controller::{Command, Controller};
pub use state::{
    Activity, ActivityStatus, AppState, FollowUp, InFlight, Operation, Outcome,
};

use crate::api::ProcessorClient;
use crate::config::AppConfig;
use eframe::{egui, App};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{error, info};

pub struct ImageProcessorApp {
    controller: Controller,
    // Dropped after the controller.
    _runtime: Runtime,
}

impl ImageProcessorApp {
    pub fn new(config: AppConfig, client: ProcessorClient, runtime: Runtime) -> Self {
        info!(base_url = %client.base_url(), "initializing image processor client");
        let controller = Controller::new(config, client, runtime.handle().clone());
        Self {
            controller,
            _runtime: runtime,
        }
    }

    /// Hooks the app to the window and loads the latest batch.
    pub fn attach(mut self, cc: &eframe::CreationContext<'_>) -> Self {
        self.controller.set_repaint_context(cc.egui_ctx.clone());
        self.controller.start();
        self
    }

    fn open_in_browser(&mut self, folder: &str, file: &str) {
        let url = match self.controller.client().processed_file_url(folder, file) {
            Ok(url) => url,
            Err(e) => {
                error!(folder, file, error = %e, "could not build download link");
                self.controller
                    .state_mut()
                    .notifications
                    .error(format!("Download failed: {}", e));
                return;
            }
        };
        self.open_url(url.as_str());
    }

    fn open_url(&mut self, url: &str) {
        let result = open::that(url);
        self.report_open(url, result);
    }

    fn report_open(&mut self, url: &str, result: std::io::Result<()>) {
        if let Err(e) = result {
            error!(url, error = %e, "failed to open link");
            self.controller
                .state_mut()
                .notifications
                .error(format!("Could not open {}: {}", url, e));
        }
    }

    fn update_state(&mut self, ctx: &egui::Context) {
        self.controller.poll();

        let now = Instant::now();
        let notifications = &mut self.controller.state_mut().notifications;
        notifications.expire(now);
        if let Some(wait) = notifications.next_expiry(now) {
            ctx.request_repaint_after(wait);
        }

        if self.controller.state().any_busy() {
            // Keeps the spinners moving while requests are out.
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl App for ImageProcessorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
