use std::path::PathBuf;

/// What the backup component needs from the host editor.
pub trait DocumentSource {
    fn name(&self) -> &str;

    /// Monotonic counter bumped by the host on every edit.
    fn edit_count(&self) -> u64;

    /// Serialized text of the document, or `None` when nothing is loaded.
    fn serialize(&self) -> Option<String>;
}

/// The single XML document edited in the host window.
pub struct EditorDocument {
    pub name: String,
    pub path: Option<PathBuf>,
    pub text: String,
    edit_count: u64,
    loaded: bool,
}

impl Default for EditorDocument {
    fn default() -> Self {
        Self {
            name: "untitled.xml".to_string(),
            path: None,
            text: String::new(),
            edit_count: 0,
            loaded: false,
        }
    }
}

impl EditorDocument {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            text: text.into(),
            edit_count: 0,
            loaded: true,
        }
    }

    fn adopt_path(&mut self, path: PathBuf) {
        self.name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled.xml".to_string());
        self.path = Some(path);
    }

    /// Replaces the buffer with a file from disk. Counts as an edit so the
    /// counter stays monotonic across documents.
    pub fn load(&mut self, path: PathBuf) -> std::io::Result<()> {
        self.text = std::fs::read_to_string(&path)?;
        self.adopt_path(path);
        self.mark_edited();
        Ok(())
    }

    /// Writes the buffer to `path`; the document takes that file's name.
    pub fn save_as(&mut self, path: PathBuf) -> std::io::Result<()> {
        std::fs::write(&path, &self.text)?;
        self.adopt_path(path);
        Ok(())
    }

    /// Called by the host after the text buffer changed.
    pub fn mark_edited(&mut self) {
        self.edit_count += 1;
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl DocumentSource for EditorDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn edit_count(&self) -> u64 {
        self.edit_count
    }

    fn serialize(&self) -> Option<String> {
        self.loaded.then(|| self.text.clone())
    }
}
