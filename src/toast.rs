use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use eframe::egui;

const TOAST_LIFETIME: Duration = Duration::from_secs(6);
const MAX_TOASTS: usize = 3;

/// Everything the backup component tells the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    BackupCreated { directory: String },
    BackupActive { interval: u32, count: u32 },
    Disabled,
    Unsupported,
    FolderNotSet,
    FolderRejected { reason: String },
    DirectoryMissing,
    EvictionFailed,
    WriteFailed,
    SettingsNotSaved,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::BackupCreated { directory } => format!("Backup created in {directory}."),
            Notice::BackupActive { interval, count } => format!(
                "While changes are being made, every {interval} minute(s) a backup will be taken, \
                 keeping the {count} most recent backups."
            ),
            Notice::Disabled => "Automatic backups disabled.".into(),
            Notice::Unsupported => {
                "Sorry, choosing a backup folder is not supported on this platform.".into()
            }
            Notice::FolderNotSet => "Backup directory not correctly set. \
                 Please open Automatic Backup and choose a folder."
                .into(),
            Notice::FolderRejected { reason } => format!("Backup folder not usable: {reason}."),
            Notice::DirectoryMissing => "You have automatic backups enabled but a directory has \
                 not been selected, please either disable or choose a directory in Automatic Backup."
                .into(),
            Notice::EvictionFailed => "Unable to remove oldest backup. Check permissions.".into(),
            Notice::WriteFailed => {
                "Unable to write to file system. Check storage space and permissions.".into()
            }
            Notice::SettingsNotSaved => "Backup settings could not be saved.".into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::Unsupported
                | Notice::FolderNotSet
                | Notice::FolderRejected { .. }
                | Notice::DirectoryMissing
                | Notice::EvictionFailed
                | Notice::WriteFailed
                | Notice::SettingsNotSaved
        )
    }
}

/// The one channel through which the backup component reaches the user.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

#[derive(Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    fn is_repeat(&self, notice: &Notice) -> bool {
        self.queue.back().is_some_and(|last| last.notice == *notice)
    }

    fn push_at(&mut self, notice: Notice, now: Instant) {
        if self.is_repeat(&notice) {
            if let Some(last) = self.queue.back_mut() {
                last.shown_at = now;
            }
            return;
        }
        self.queue.push_back(Toast {
            notice,
            shown_at: now,
        });
        while self.queue.len() > MAX_TOASTS {
            self.queue.pop_front();
        }
    }

    fn prune(&mut self, now: Instant) {
        self.queue
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("backup_toasts"))
            .anchor(egui::Align2::LEFT_BOTTOM, [12.0, -12.0])
            .show(ctx, |ui| {
                for (i, toast) in self.queue.iter().enumerate() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_max_width(360.0);
                        ui.horizontal(|ui| {
                            let text = egui::RichText::new(toast.notice.message());
                            if toast.notice.is_error() {
                                ui.label(text.color(ui.visuals().warn_fg_color));
                            } else {
                                ui.label(text);
                            }
                            if ui.small_button("✖").clicked() {
                                dismissed = Some(i);
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });

        if let Some(i) = dismissed {
            self.queue.remove(i);
        }
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}

impl Notifier for Toasts {
    fn notify(&mut self, notice: Notice) {
        // repeats only refresh the toast on screen
        if !self.is_repeat(&notice) {
            if notice.is_error() {
                log::warn!("{}", notice.message());
            } else {
                log::info!("{}", notice.message());
            }
        }
        self.push_at(notice, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_consecutive_notices_collapse() {
        let mut toasts = Toasts::default();
        let now = Instant::now();
        toasts.push_at(Notice::DirectoryMissing, now);
        toasts.push_at(Notice::DirectoryMissing, now + Duration::from_secs(1));
        assert_eq!(toasts.queue.len(), 1);

        toasts.push_at(Notice::Disabled, now);
        toasts.push_at(Notice::DirectoryMissing, now);
        assert_eq!(toasts.queue.len(), 3);
    }

    #[test]
    fn repeat_is_detected_against_the_newest_toast_only() {
        let mut toasts = Toasts::default();
        assert!(!toasts.is_repeat(&Notice::DirectoryMissing));

        toasts.notify(Notice::DirectoryMissing);
        assert!(toasts.is_repeat(&Notice::DirectoryMissing));
        toasts.notify(Notice::DirectoryMissing);
        assert_eq!(toasts.queue.len(), 1);

        toasts.notify(Notice::Disabled);
        assert!(!toasts.is_repeat(&Notice::DirectoryMissing));
    }

    #[test]
    fn old_toasts_expire() {
        let mut toasts = Toasts::default();
        let now = Instant::now();
        toasts.push_at(Notice::Disabled, now);
        toasts.push_at(Notice::WriteFailed, now + Duration::from_secs(4));

        toasts.prune(now + TOAST_LIFETIME);
        assert_eq!(toasts.queue.len(), 1);
        assert_eq!(toasts.queue[0].notice, Notice::WriteFailed);

        toasts.prune(now + Duration::from_secs(60));
        assert!(toasts.is_empty());
    }

    #[test]
    fn queue_is_bounded() {
        let mut toasts = Toasts::default();
        let now = Instant::now();
        for count in 1..=5 {
            toasts.push_at(Notice::BackupActive { interval: 5, count }, now);
        }
        assert_eq!(toasts.queue.len(), MAX_TOASTS);
        assert_eq!(
            toasts.queue[0].notice,
            Notice::BackupActive { interval: 5, count: 3 }
        );
    }

    #[test]
    fn messages_name_the_folder_and_schedule() {
        assert_eq!(
            Notice::BackupCreated { directory: "Backups".into() }.message(),
            "Backup created in Backups."
        );
        let active = Notice::BackupActive { interval: 5, count: 12 }.message();
        assert!(active.contains("every 5 minute(s)"));
        assert!(active.contains("the 12 most recent"));
        assert!(Notice::EvictionFailed.is_error());
        assert!(!Notice::Disabled.is_error());
    }
}
