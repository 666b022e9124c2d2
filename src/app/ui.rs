use super::{ActivityStatus, Command, ImageProcessorApp, Operation};
use crate::notify::ToastKind;
use eframe::egui::{self, Align, Align2, Color32, RichText};
use rfd::FileDialog;

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);

/// Actions collected while the frame is drawn and run once it is done.
#[derive(Default)]
struct FrameActions {
    commands: Vec<Command>,
    open_links: Vec<(String, String)>,
    open_server: bool,
}

impl ImageProcessorApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = FrameActions::default();

        egui::CentralPanel::default().show(ctx, |ui| {
            let footer_height = 40.0;
            let footer_margin = 15.0;
            let content_height = ui.available_height() - footer_height - footer_margin;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    self.render_header(ui);
                    ui.add_space(20.0);
                    self.render_upload_section(ui, &mut actions);
                    ui.add_space(20.0);
                    self.render_actions(ui, &mut actions);
                    ui.add_space(20.0);
                    self.render_processed_section(ui, &mut actions);

                    if !self.controller.state().activity.is_empty() {
                        ui.add_space(10.0);
                        self.render_details(ui);
                    }
                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(footer_margin);
                self.render_footer(ui, &mut actions);
            });
        });

        self.render_toasts(ctx);

        for command in actions.commands {
            self.controller.dispatch(command);
        }
        for (folder, file) in actions.open_links {
            self.open_in_browser(&folder, &file);
        }
        if actions.open_server {
            let base_url = self.controller.client().base_url().to_string();
            self.open_url(&base_url);
        }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Image Processing App");
            ui.add_space(5.0);
            ui.label(
                RichText::new("Upload images, process them and download the results")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
        });
    }

    fn render_upload_section(&self, ui: &mut egui::Ui, actions: &mut FrameActions) {
        let state = self.controller.state();
        let uploading = state.is_busy(Operation::Upload);
        let deleting = state.is_busy(Operation::Delete);

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!uploading, |ui| {
                    if ui.button("📤 Select Image").clicked() {
                        let extensions: Vec<&str> = self
                            .controller
                            .config()
                            .accepted_patterns
                            .iter()
                            .filter_map(|p| p.strip_prefix("*."))
                            .collect();
                        let mut dialog = FileDialog::new();
                        if !extensions.is_empty() {
                            dialog = dialog.add_filter("Images", extensions.as_slice());
                        }
                        if let Some(path) = dialog.pick_file() {
                            actions.commands.push(Command::Upload(path));
                        }
                    }
                });
                if uploading {
                    ui.spinner();
                    ui.label("Uploading...");
                }
            });

            ui.add_space(8.0);
            ui.label(RichText::new("Uploaded Images").strong());
            ui.add_space(4.0);

            let files = &self.controller.state().uploaded_files;
            if files.is_empty() {
                ui.weak("No images uploaded yet");
            }
            for file in files {
                ui.horizontal(|ui| {
                    ui.label(file.as_str());
                    ui.add_enabled_ui(!deleting, |ui| {
                        if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                            actions.commands.push(Command::Delete(file.clone()));
                        }
                    });
                });
            }
        });
    }

    fn render_actions(&self, ui: &mut egui::Ui, actions: &mut FrameActions) {
        let state = self.controller.state();
        let processing =
            state.is_busy(Operation::Process) || state.is_busy(Operation::FetchLatest);
        let downloading = state.is_busy(Operation::DownloadAll);
        let has_batch = !state.latest_batch.files.is_empty();

        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!processing, |ui| {
                    let button = egui::Button::new("⚙ Process Images")
                        .min_size(egui::vec2(160.0, 36.0));
                    if ui.add(button).clicked() {
                        actions.commands.push(Command::Process);
                    }
                    if ui.button("🔄 Refresh").clicked() {
                        actions.commands.push(Command::RefreshLatest);
                    }
                });

                ui.add_enabled_ui(has_batch && !downloading, |ui| {
                    let button = egui::Button::new("⬇ Download All")
                        .min_size(egui::vec2(160.0, 36.0));
                    if ui.add(button).clicked() {
                        let archive_name = state.latest_batch.archive_name();
                        let dialog = FileDialog::new()
                            .set_file_name(&archive_name)
                            .set_directory(&self.controller.config().download_dir);
                        if let Some(dest) = dialog.save_file() {
                            actions.commands.push(Command::DownloadAll(dest));
                        }
                    }
                });

                if processing || downloading {
                    ui.spinner();
                }
            });
        });
    }

    fn render_processed_section(&self, ui: &mut egui::Ui, actions: &mut FrameActions) {
        let batch = &self.controller.state().latest_batch;
        let downloading = self.controller.state().is_busy(Operation::DownloadFile);

        ui.group(|ui| {
            let title = match batch.folder.as_deref() {
                Some(folder) => format!("Processed Images: {}", folder),
                None => "Processed Images".to_string(),
            };
            ui.label(RichText::new(title).strong());
            ui.add_space(4.0);

            let Some(folder) = batch.folder.as_deref() else {
                ui.weak("Nothing processed yet");
                return;
            };
            if batch.files.is_empty() {
                ui.weak("The latest batch is empty");
            }
            for file in &batch.files {
                ui.horizontal(|ui| {
                    if ui
                        .link(RichText::new(file).color(ACCENT))
                        .on_hover_text("Open in browser")
                        .clicked()
                    {
                        actions
                            .open_links
                            .push((folder.to_string(), file.clone()));
                    }
                    ui.add_enabled_ui(!downloading, |ui| {
                        if ui
                            .small_button("⬇")
                            .on_hover_text("Save to download folder")
                            .clicked()
                        {
                            actions.commands.push(Command::DownloadFile {
                                folder: folder.to_string(),
                                file: file.clone(),
                            });
                        }
                    });
                });
            }
        });
    }

    fn render_details(&mut self, ui: &mut egui::Ui) {
        let state = self.controller.state_mut();
        ui.horizontal(|ui| {
            if ui
                .button(if state.show_details {
                    "Hide Details"
                } else {
                    "Show Details"
                })
                .clicked()
            {
                state.show_details = !state.show_details;
            }
            if ui.button("Clear").clicked() {
                state.clear_activity();
            }
        });

        if state.show_details {
            egui::ScrollArea::vertical()
                .id_source("activity")
                .max_height(200.0)
                .show(ui, |ui| {
                    egui::Frame::none()
                        .fill(ui.style().visuals.extreme_bg_color)
                        .show(ui, |ui| {
                            ui.add_space(8.0);
                            for entry in &state.activity {
                                ui.horizontal(|ui| match &entry.status {
                                    ActivityStatus::Success => {
                                        ui.label("✅");
                                        ui.colored_label(
                                            SUCCESS,
                                            format!(
                                                "{} - {}",
                                                entry.operation.label(),
                                                entry.subject
                                            ),
                                        );
                                    }
                                    ActivityStatus::Error(err) => {
                                        ui.label("❌");
                                        ui.colored_label(
                                            FAILURE,
                                            format!(
                                                "{} - {} - {}",
                                                entry.operation.label(),
                                                entry.subject,
                                                err
                                            ),
                                        );
                                    }
                                });
                                ui.add_space(4.0);
                            }
                            ui.add_space(8.0);
                        });
                });
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui, actions: &mut FrameActions) {
        let base_url = self.controller.client().base_url().to_string();
        ui.horizontal(|ui| {
            ui.label("© 2024 Image Processor");
            ui.label("·");
            if ui
                .add(
                    egui::Label::new(RichText::new(&base_url).color(ACCENT))
                        .sense(egui::Sense::click()),
                )
                .clicked()
            {
                actions.open_server = true;
            }
        });
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        let notifications = &mut self.controller.state_mut().notifications;
        if notifications.is_empty() {
            return;
        }

        let mut dismissed = Vec::new();
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -60.0))
            .show(ctx, |ui| {
                for toast in notifications.visible() {
                    let fill = match toast.kind {
                        ToastKind::Success => SUCCESS,
                        ToastKind::Error => FAILURE,
                        ToastKind::Info => ACCENT,
                    };
                    let response = egui::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ui.colored_label(Color32::WHITE, toast.message.as_str());
                        })
                        .response
                        .interact(egui::Sense::click());
                    if response.clicked() {
                        dismissed.push(toast.id);
                    }
                    ui.add_space(6.0);
                }
            });

        for id in dismissed {
            notifications.dismiss(id);
        }
    }
}
