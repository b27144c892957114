use eframe::egui;

use crate::{
    helpers::estimate_usage,
    settings::{MAX_VALUE, MIN_VALUE, Settings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    /// Keep the values and pick a (new) folder.
    ChooseFolder { interval: u32, count: u32 },
    /// Keep the values and restart on the folder already granted.
    Apply { interval: u32, count: u32 },
    Disable,
    Cancel,
}

/// Form state of the "Automatic Backup" window while it is open.
pub struct BackupDialog {
    pub interval: u32,
    pub count: u32,
    doc_byte_size: usize,
}

impl BackupDialog {
    pub fn new(settings: &Settings, doc_byte_size: usize) -> Self {
        Self {
            interval: settings.interval,
            count: settings.count,
            doc_byte_size,
        }
    }

    pub fn usage(&self) -> String {
        estimate_usage(self.count, self.doc_byte_size)
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        enabled: bool,
        directory: Option<&str>,
    ) -> Option<DialogAction> {
        let mut open = true;
        let mut action = None;

        egui::Window::new("Automatic Backup")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("backup_form")
                    .num_columns(2)
                    .spacing([24.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Interval");
                        ui.add(
                            egui::DragValue::new(&mut self.interval)
                                .range(MIN_VALUE..=MAX_VALUE)
                                .suffix(" minutes"),
                        );
                        ui.end_row();

                        ui.label("Maximum backups");
                        ui.add(egui::DragValue::new(&mut self.count).range(MIN_VALUE..=MAX_VALUE));
                        ui.end_row();

                        ui.label("Estimated disk space required");
                        ui.label(self.usage());
                        ui.end_row();

                        if let (true, Some(dir)) = (enabled, directory) {
                            ui.label("Backup location");
                            ui.code(dir);
                            ui.end_row();
                        }
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    let (interval, count) = (self.interval, self.count);
                    if ui.button("📁 Choose Folder").clicked() {
                        action = Some(DialogAction::ChooseFolder { interval, count });
                    }
                    if directory.is_some() && ui.button("Apply").clicked() {
                        action = Some(DialogAction::Apply { interval, count });
                    }
                    if ui.add_enabled(enabled, egui::Button::new("Disable")).clicked() {
                        action = Some(DialogAction::Disable);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(DialogAction::Cancel);
                    }
                });
            });

        if !open {
            action.get_or_insert(DialogAction::Cancel);
        }
        action
    }
}
