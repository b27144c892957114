use std::{
    collections::VecDeque,
    io,
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDateTime};

use crate::{
    directory::BackupDirectory,
    document::DocumentSource,
    error::DirectoryError,
    helpers::backup_file_name,
    toast::{Notice, Notifier},
};

/// How many `-n` suffixes are tried before a same-second write gives up.
const MAX_NAME_COLLISIONS: u32 = 99;

struct Timer {
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    NoDirectory,
    NoDocument,
    Unchanged,
    Written { file: String, evicted: Vec<String> },
    EvictionFailed,
    WriteFailed,
}

/// Repeating backup timer plus the queue of backups it has written,
/// oldest first.
#[derive(Default)]
pub struct RetentionScheduler {
    directory: Option<Box<dyn BackupDirectory>>,
    queue: VecDeque<String>,
    last_edit_count: Option<u64>,
    timer: Option<Timer>,
}

impl RetentionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes over a freshly granted folder and arms the timer. The queue
    /// starts empty since earlier backups are not tracked.
    pub fn start(&mut self, directory: Box<dyn BackupDirectory>, interval_minutes: u32, now: Instant) {
        log::info!(
            "backups every {interval_minutes} min into {}",
            directory.name()
        );
        self.directory = Some(directory);
        self.queue.clear();
        self.arm(interval_minutes, now);
    }

    /// Re-arms the timer on the folder already held. Returns false when no
    /// folder has been granted yet.
    pub fn restart(&mut self, interval_minutes: u32, now: Instant) -> bool {
        if self.directory.is_none() {
            return false;
        }
        self.arm(interval_minutes, now);
        true
    }

    fn arm(&mut self, interval_minutes: u32, now: Instant) {
        let interval = Duration::from_secs(60 * u64::from(interval_minutes.max(1)));
        // replacing the timer disarms the previous one
        self.timer = Some(Timer {
            interval,
            next_due: now + interval,
        });
    }

    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            log::info!("backup timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn directory_name(&self) -> Option<&str> {
        self.directory.as_deref().map(|d| d.name())
    }

    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.timer
            .as_ref()
            .map(|t| t.next_due.saturating_duration_since(now))
    }

    /// Runs one tick if the timer is due. Missed ticks are not replayed.
    pub fn poll(
        &mut self,
        now: Instant,
        doc: &dyn DocumentSource,
        count: u32,
        notifier: &mut dyn Notifier,
    ) -> Option<TickOutcome> {
        let timer = self.timer.as_mut()?;
        if now < timer.next_due {
            return None;
        }
        while timer.next_due <= now {
            timer.next_due += timer.interval;
        }
        Some(self.maybe_backup(doc, count, Local::now().naive_local(), notifier))
    }

    /// One backup tick: skip when unchanged, evict the oldest backups until
    /// there is room, then write a fresh snapshot named after `at`.
    pub fn maybe_backup(
        &mut self,
        doc: &dyn DocumentSource,
        count: u32,
        at: NaiveDateTime,
        notifier: &mut dyn Notifier,
    ) -> TickOutcome {
        let Some(directory) = self.directory.as_deref() else {
            return TickOutcome::NoDirectory;
        };
        let Some(snapshot) = doc.serialize() else {
            return TickOutcome::NoDocument;
        };

        let edit_count = doc.edit_count();
        if self.last_edit_count == Some(edit_count) {
            log::debug!("no edits since last backup, skipping");
            return TickOutcome::Unchanged;
        }

        let mut evicted = Vec::new();
        while self.queue.len() + 1 > count.max(1) as usize {
            let Some(oldest) = self.queue.front() else {
                break;
            };
            match directory.delete_file(oldest) {
                Ok(()) => {}
                Err(DirectoryError::Delete { source, .. })
                    if source.kind() == io::ErrorKind::NotFound =>
                {
                    log::debug!("oldest backup {oldest} already gone");
                }
                Err(e) => {
                    log::error!("eviction failed: {e}");
                    notifier.notify(Notice::EvictionFailed);
                    return TickOutcome::EvictionFailed;
                }
            }
            if let Some(name) = self.queue.pop_front() {
                log::info!("evicted backup {name}");
                evicted.push(name);
            }
        }

        let mut written = None;
        for collision in 0..=MAX_NAME_COLLISIONS {
            let name = backup_file_name(doc.name(), at, collision);
            if self.queue.contains(&name) {
                continue;
            }
            match directory.create_file(&name, &snapshot) {
                Ok(()) => {
                    written = Some(name);
                    break;
                }
                Err(DirectoryError::AlreadyExists(_)) => continue,
                Err(e) => {
                    log::error!("backup write failed: {e}");
                    break;
                }
            }
        }
        let Some(file) = written else {
            notifier.notify(Notice::WriteFailed);
            return TickOutcome::WriteFailed;
        };

        log::info!("backup written: {file} ({} bytes)", snapshot.len());
        self.queue.push_back(file.clone());
        self.last_edit_count = Some(edit_count);
        notifier.notify(Notice::BackupCreated {
            directory: directory.name().to_string(),
        });
        TickOutcome::Written { file, evicted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{directory::fake::MemoryDirectory, document::EditorDocument};
    use chrono::NaiveDate;

    fn at(minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, minute, second)
            .unwrap()
    }

    fn started(dir: &MemoryDirectory) -> RetentionScheduler {
        let mut scheduler = RetentionScheduler::new();
        scheduler.start(Box::new(dir.clone()), 5, Instant::now());
        scheduler
    }

    fn queue_of(scheduler: &RetentionScheduler) -> Vec<String> {
        scheduler.queue().map(str::to_string).collect()
    }

    #[test]
    fn keeps_only_the_newest_backups() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();

        for minute in 1..=3 {
            doc.mark_edited();
            scheduler.maybe_backup(&doc, 2, at(minute, 0), &mut notes);
        }

        let expected = vec![
            "Backup_2024-05-01_100200_bay.scd".to_string(),
            "Backup_2024-05-01_100300_bay.scd".to_string(),
        ];
        assert_eq!(queue_of(&scheduler), expected);
        assert_eq!(dir.file_names(), expected);
        assert_eq!(
            notes.last(),
            Some(&Notice::BackupCreated {
                directory: "memory".into()
            })
        );
    }

    #[test]
    fn unchanged_document_is_not_backed_up_again() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();
        doc.mark_edited();

        let first = scheduler.maybe_backup(&doc, 2, at(1, 0), &mut notes);
        assert!(matches!(first, TickOutcome::Written { .. }));
        let second = scheduler.maybe_backup(&doc, 2, at(2, 0), &mut notes);
        assert_eq!(second, TickOutcome::Unchanged);

        assert_eq!(dir.file_names().len(), 1);
        assert_eq!(queue_of(&scheduler).len(), 1);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn first_tick_backs_up_even_without_edits() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let doc = EditorDocument::new("bay.scd", "<SCL/>");
        let outcome = scheduler.maybe_backup(&doc, 3, at(1, 0), &mut Vec::new());
        assert!(matches!(outcome, TickOutcome::Written { .. }));
    }

    #[test]
    fn failed_eviction_keeps_queue_and_writes_nothing() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();
        for minute in 1..=2 {
            doc.mark_edited();
            scheduler.maybe_backup(&doc, 2, at(minute, 0), &mut notes);
        }
        let before = queue_of(&scheduler);

        dir.set_fail_delete(true);
        doc.mark_edited();
        let outcome = scheduler.maybe_backup(&doc, 2, at(3, 0), &mut notes);

        assert_eq!(outcome, TickOutcome::EvictionFailed);
        assert_eq!(queue_of(&scheduler), before);
        assert_eq!(dir.file_names(), before);
        assert_eq!(notes.last(), Some(&Notice::EvictionFailed));
    }

    #[test]
    fn failed_write_leaves_queue_alone_and_retries_next_tick() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();
        doc.mark_edited();

        dir.set_fail_create(true);
        let outcome = scheduler.maybe_backup(&doc, 2, at(1, 0), &mut notes);
        assert_eq!(outcome, TickOutcome::WriteFailed);
        assert_eq!(queue_of(&scheduler).len(), 0);
        assert_eq!(notes, vec![Notice::WriteFailed]);

        dir.set_fail_create(false);
        let retry = scheduler.maybe_backup(&doc, 2, at(2, 0), &mut notes);
        assert!(matches!(retry, TickOutcome::Written { .. }));
    }

    #[test]
    fn same_second_ticks_get_distinct_names() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();

        doc.mark_edited();
        scheduler.maybe_backup(&doc, 5, at(1, 0), &mut notes);
        doc.mark_edited();
        scheduler.maybe_backup(&doc, 5, at(1, 0), &mut notes);

        assert_eq!(
            queue_of(&scheduler),
            vec![
                "Backup_2024-05-01_100100_bay.scd".to_string(),
                "Backup_2024-05-01_100100-1_bay.scd".to_string(),
            ]
        );
    }

    #[test]
    fn existing_file_on_disk_is_never_overwritten() {
        let dir = MemoryDirectory::default();
        dir.create_file("Backup_2024-05-01_100100_bay.scd", "older")
            .unwrap();
        let mut scheduler = started(&dir);
        let doc = EditorDocument::new("bay.scd", "<SCL/>");

        let outcome = scheduler.maybe_backup(&doc, 5, at(1, 0), &mut Vec::new());

        assert_eq!(
            outcome,
            TickOutcome::Written {
                file: "Backup_2024-05-01_100100-1_bay.scd".into(),
                evicted: vec![],
            }
        );
        let state = dir.state.borrow();
        assert_eq!(state.files["Backup_2024-05-01_100100_bay.scd"], "older");
    }

    #[test]
    fn lowered_count_evicts_down_to_fit() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();
        for minute in 1..=4 {
            doc.mark_edited();
            scheduler.maybe_backup(&doc, 10, at(minute, 0), &mut notes);
        }

        doc.mark_edited();
        let outcome = scheduler.maybe_backup(&doc, 2, at(5, 0), &mut notes);

        let TickOutcome::Written { evicted, .. } = outcome else {
            panic!("expected a write");
        };
        assert_eq!(evicted.len(), 3);
        assert_eq!(evicted[0], "Backup_2024-05-01_100100_bay.scd");
        assert_eq!(queue_of(&scheduler).len(), 2);
        assert_eq!(dir.file_names().len(), 2);
    }

    #[test]
    fn externally_deleted_backup_still_counts_as_evicted() {
        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();
        doc.mark_edited();
        scheduler.maybe_backup(&doc, 1, at(1, 0), &mut notes);
        dir.delete_file("Backup_2024-05-01_100100_bay.scd").unwrap();

        doc.mark_edited();
        let outcome = scheduler.maybe_backup(&doc, 1, at(2, 0), &mut notes);
        assert!(matches!(outcome, TickOutcome::Written { .. }));
        assert_eq!(queue_of(&scheduler), dir.file_names());
    }

    #[test]
    fn no_document_or_directory_is_a_no_op() {
        let mut scheduler = RetentionScheduler::new();
        let doc = EditorDocument::new("bay.scd", "<SCL/>");
        assert_eq!(
            scheduler.maybe_backup(&doc, 2, at(1, 0), &mut Vec::new()),
            TickOutcome::NoDirectory
        );

        let dir = MemoryDirectory::default();
        let mut scheduler = started(&dir);
        let empty = EditorDocument::default();
        assert_eq!(
            scheduler.maybe_backup(&empty, 2, at(1, 0), &mut Vec::new()),
            TickOutcome::NoDocument
        );
        assert!(dir.file_names().is_empty());
    }

    #[test]
    fn poll_fires_once_per_interval() {
        let dir = MemoryDirectory::default();
        let mut scheduler = RetentionScheduler::new();
        let t0 = Instant::now();
        scheduler.start(Box::new(dir.clone()), 1, t0);
        let doc = EditorDocument::new("bay.scd", "<SCL/>");
        let mut notes = Vec::new();

        assert!(scheduler
            .poll(t0 + Duration::from_secs(59), &doc, 2, &mut notes)
            .is_none());
        assert!(scheduler
            .poll(t0 + Duration::from_secs(60), &doc, 2, &mut notes)
            .is_some());
        assert!(scheduler
            .poll(t0 + Duration::from_secs(61), &doc, 2, &mut notes)
            .is_none());
        // a long stall produces one tick, not a burst
        assert!(scheduler
            .poll(t0 + Duration::from_secs(600), &doc, 2, &mut notes)
            .is_some());
        assert!(scheduler
            .poll(t0 + Duration::from_secs(601), &doc, 2, &mut notes)
            .is_none());
        assert_eq!(
            scheduler.time_until_due(t0 + Duration::from_secs(601)),
            Some(Duration::from_secs(59))
        );
    }

    #[test]
    fn stop_and_restart_control_the_timer() {
        let dir = MemoryDirectory::default();
        let mut scheduler = RetentionScheduler::new();
        let t0 = Instant::now();
        assert!(!scheduler.restart(5, t0));

        scheduler.start(Box::new(dir.clone()), 5, t0);
        scheduler.stop();
        assert!(!scheduler.is_running());
        let doc = EditorDocument::new("bay.scd", "<SCL/>");
        assert!(scheduler
            .poll(t0 + Duration::from_secs(3600), &doc, 2, &mut Vec::new())
            .is_none());

        assert!(scheduler.restart(2, t0));
        assert_eq!(scheduler.time_until_due(t0), Some(Duration::from_secs(120)));
        assert_eq!(scheduler.directory_name(), Some("memory"));
    }

    #[test]
    fn new_folder_starts_an_empty_queue() {
        let first = MemoryDirectory::default();
        let mut scheduler = started(&first);
        let mut doc = EditorDocument::new("bay.scd", "<SCL/>");
        doc.mark_edited();
        scheduler.maybe_backup(&doc, 2, at(1, 0), &mut Vec::new());
        assert_eq!(queue_of(&scheduler).len(), 1);

        let second = MemoryDirectory::default();
        scheduler.start(Box::new(second), 5, Instant::now());
        assert_eq!(queue_of(&scheduler).len(), 0);
    }
}
