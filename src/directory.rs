use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::error::{AcquireError, DirectoryError};

/// A folder the user granted access to.
pub trait BackupDirectory {
    /// Display name of the folder.
    fn name(&self) -> &str;

    /// Creates `name` with `contents`. Never overwrites an existing file.
    fn create_file(&self, name: &str, contents: &str) -> Result<(), DirectoryError>;

    fn delete_file(&self, name: &str) -> Result<(), DirectoryError>;
}

pub struct LocalDirectory {
    root: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn new(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BackupDirectory for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_file(&self, name: &str, contents: &str) -> Result<(), DirectoryError> {
        let path = self.root.join(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => DirectoryError::AlreadyExists(name.to_string()),
                _ => DirectoryError::Create {
                    name: name.to_string(),
                    source: e,
                },
            })?;

        let written = file.write_all(contents.as_bytes()).and_then(|_| file.sync_all());
        if let Err(e) = written {
            drop(file);
            // half-written backups are worse than none
            if let Err(cleanup) = fs::remove_file(&path) {
                log::warn!("could not remove partial backup {}: {cleanup}", path.display());
            }
            return Err(DirectoryError::Create {
                name: name.to_string(),
                source: e,
            });
        }
        Ok(())
    }

    fn delete_file(&self, name: &str) -> Result<(), DirectoryError> {
        fs::remove_file(self.root.join(name)).map_err(|e| DirectoryError::Delete {
            name: name.to_string(),
            source: e,
        })
    }
}

/// User-driven folder selection.
pub trait DirectoryPicker {
    fn pick(&mut self) -> Result<PathBuf, AcquireError>;
}

/// Native folder dialog, opened in the documents folder.
pub struct RfdPicker;

impl DirectoryPicker for RfdPicker {
    #[cfg(not(target_arch = "wasm32"))]
    fn pick(&mut self) -> Result<PathBuf, AcquireError> {
        let mut dialog = rfd::FileDialog::new().set_title("Choose backup folder");
        if let Some(docs) = dirs::document_dir() {
            dialog = dialog.set_directory(docs);
        }
        dialog.pick_folder().ok_or(AcquireError::Cancelled)
    }

    #[cfg(target_arch = "wasm32")]
    fn pick(&mut self) -> Result<PathBuf, AcquireError> {
        Err(AcquireError::Unsupported)
    }
}

/// Runs the picker once and checks that the chosen folder can take backups.
pub fn acquire_directory(picker: &mut dyn DirectoryPicker) -> Result<LocalDirectory, AcquireError> {
    let path = picker.pick()?;
    let writable = fs::metadata(&path)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false);
    if !writable {
        return Err(AcquireError::NotWritable(path));
    }
    let directory = LocalDirectory::new(path);
    log::info!("backup folder granted: {}", directory.root().display());
    Ok(directory)
}
