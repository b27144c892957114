use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use eframe::egui;
use rfd::FileDialog;

use crate::{
    directory::RfdPicker,
    document::EditorDocument,
    plugin::AutomaticBackup,
    settings::SettingsStore,
    toast::Toasts,
};

const XML_EXTENSIONS: &[&str] = &["scd", "ssd", "icd", "cid", "iid", "sed", "xml"];

/// Editor window hosting a single XML document and the backup component.
pub struct EditorApp {
    doc: EditorDocument,
    backup: AutomaticBackup,
    status: String,
}

impl EditorApp {
    pub fn new(initial: Option<PathBuf>, store: SettingsStore) -> Self {
        let mut doc = EditorDocument::default();
        let status = match initial {
            Some(path) => match doc.load(path.clone()) {
                Ok(()) => format!("Opened {}", path.display()),
                Err(e) => {
                    log::error!("could not open {}: {e}", path.display());
                    format!("❌ Could not open {}: {e}", path.display())
                }
            },
            None => "Open a document to start editing.".into(),
        };

        Self {
            doc,
            backup: AutomaticBackup::new(store, Toasts::default()),
            status,
        }
    }

    fn open_document(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("SCL / XML", XML_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.status = match self.doc.load(path.clone()) {
            Ok(()) => {
                self.backup.on_edit();
                format!("Opened {}", path.display())
            }
            Err(e) => format!("❌ Could not open {}: {e}", path.display()),
        };
    }

    fn save_document(&mut self) {
        let path = match self.doc.path.clone() {
            Some(p) => p,
            None => match FileDialog::new()
                .add_filter("SCL / XML", XML_EXTENSIONS)
                .set_file_name(&self.doc.name)
                .save_file()
            {
                Some(p) => p,
                None => return,
            },
        };
        self.status = match self.doc.save_as(path.clone()) {
            Ok(()) => format!("✅ Saved {}", path.display()),
            Err(e) => format!("❌ Could not save: {e}"),
        };
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.backup.poll(now, &self.doc);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&self.doc.name);
                ui.separator();
                if ui.button("Open").clicked() {
                    self.open_document();
                }
                if ui
                    .add_enabled(self.doc.is_loaded(), egui::Button::new("Save"))
                    .clicked()
                {
                    self.save_document();
                }
                ui.separator();
                let running = self.backup.scheduler().is_running();
                let label = match (running, self.backup.settings().enabled) {
                    (true, _) => "⏱ Automatic Backup",
                    (false, true) => "⚠ Automatic Backup",
                    (false, false) => "Automatic Backup",
                };
                let kept = self.backup.scheduler().queue().count();
                if ui
                    .add_enabled(!self.backup.is_dialog_open(), egui::Button::new(label))
                    .on_hover_text(format!("{kept} backup(s) kept this session"))
                    .clicked()
                {
                    self.backup.run(&self.doc);
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let edited = ui
                    .add(
                        egui::TextEdit::multiline(&mut self.doc.text)
                            .code_editor()
                            .desired_width(f32::INFINITY)
                            .desired_rows(30),
                    )
                    .changed();
                if edited {
                    self.doc.mark_edited();
                    self.backup.on_edit();
                }
            });
        });

        if let Some(action) = self.backup.show_dialog(ctx) {
            self.backup.handle(action, &mut RfdPicker, Instant::now());
        }
        self.backup.notifier.show(ctx);

        let wait = self
            .backup
            .time_until_due(now)
            .map_or(Duration::from_millis(500), |d| d.min(Duration::from_millis(500)));
        ctx.request_repaint_after(wait);
    }
}
