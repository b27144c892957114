use std::time::{Duration, Instant};

use eframe::egui;

use crate::{
    dialog::{BackupDialog, DialogAction},
    directory::{DirectoryPicker, acquire_directory},
    document::DocumentSource,
    error::AcquireError,
    scheduler::{RetentionScheduler, TickOutcome},
    settings::{Settings, SettingsStore},
    toast::{Notice, Notifier, Toasts},
};

/// The automatic backup component mounted into the editor.
pub struct AutomaticBackup<N: Notifier = Toasts> {
    settings: Settings,
    store: SettingsStore,
    scheduler: RetentionScheduler,
    dialog: Option<BackupDialog>,
    pub notifier: N,
}

impl<N: Notifier> AutomaticBackup<N> {
    pub fn new(store: SettingsStore, notifier: N) -> Self {
        let settings = store.load();
        Self {
            settings,
            store,
            scheduler: RetentionScheduler::new(),
            dialog: None,
            notifier,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &RetentionScheduler {
        &self.scheduler
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    /// Opens the configuration dialog.
    pub fn run(&mut self, doc: &dyn DocumentSource) {
        let byte_size = doc.serialize().map(|s| s.len()).unwrap_or(0);
        self.dialog = Some(BackupDialog::new(&self.settings, byte_size));
    }

    /// Host hook for every edit.
    pub fn on_edit(&mut self) {
        if self.settings.enabled && self.scheduler.directory_name().is_none() {
            self.notifier.notify(Notice::DirectoryMissing);
        }
    }

    pub fn poll(&mut self, now: Instant, doc: &dyn DocumentSource) -> Option<TickOutcome> {
        self.scheduler
            .poll(now, doc, self.settings.count, &mut self.notifier)
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        let before = self.settings;
        change(&mut self.settings);
        if before == self.settings {
            return;
        }
        if let Err(e) = self.store.save(&self.settings) {
            log::error!("{e}");
            self.notifier.notify(Notice::SettingsNotSaved);
        }
    }

    /// Applies what the user chose in the dialog.
    pub fn handle(&mut self, action: DialogAction, picker: &mut dyn DirectoryPicker, now: Instant) {
        self.dialog = None;
        match action {
            DialogAction::Cancel => {}
            DialogAction::Disable => {
                self.update_settings(|s| s.enabled = false);
                self.scheduler.stop();
                self.notifier.notify(Notice::Disabled);
            }
            DialogAction::Apply { interval, count } => {
                self.update_settings(|s| {
                    s.interval = interval;
                    s.count = count;
                });
                if self.scheduler.restart(interval, now) {
                    self.update_settings(|s| s.enabled = true);
                    self.notifier.notify(Notice::BackupActive { interval, count });
                } else {
                    self.notifier.notify(Notice::FolderNotSet);
                }
            }
            DialogAction::ChooseFolder { interval, count } => {
                self.update_settings(|s| {
                    s.interval = interval;
                    s.count = count;
                });
                match acquire_directory(picker) {
                    Ok(directory) => {
                        self.update_settings(|s| s.enabled = true);
                        self.scheduler.start(Box::new(directory), interval, now);
                        self.notifier.notify(Notice::BackupActive { interval, count });
                    }
                    Err(AcquireError::Unsupported) => {
                        self.notifier.notify(Notice::Unsupported);
                    }
                    Err(AcquireError::Cancelled) => {
                        self.notifier.notify(Notice::FolderNotSet);
                    }
                    Err(e @ AcquireError::NotWritable(_)) => {
                        self.notifier.notify(Notice::FolderRejected {
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Draws the dialog if open and returns the button the user pressed.
    pub fn show_dialog(&mut self, ctx: &egui::Context) -> Option<DialogAction> {
        let enabled = self.settings.enabled;
        let directory = self.scheduler.directory_name();
        self.dialog.as_mut()?.show(ctx, enabled, directory)
    }
}
