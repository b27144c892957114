use chrono::NaiveDateTime;

pub const FALLBACK_DOC_NAME: &str = "document.xml";

/// Replaces characters that common file systems reject.
pub fn sanitize_doc_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        FALLBACK_DOC_NAME.to_string()
    } else {
        cleaned
    }
}

/// `Backup_<YYYY-MM-DD_HHMMSS>_<docName>`, with `-<n>` after the timestamp
/// when a file for the same second already exists.
pub fn backup_file_name(doc_name: &str, at: NaiveDateTime, collision: u32) -> String {
    let stamp = at.format("%Y-%m-%d_%H%M%S");
    let doc_name = sanitize_doc_name(doc_name);
    if collision == 0 {
        format!("Backup_{stamp}_{doc_name}")
    } else {
        format!("Backup_{stamp}-{collision}_{doc_name}")
    }
}

/// Disk space needed to keep `count` copies of a document of `byte_size` bytes.
pub fn estimate_usage(count: u32, byte_size: usize) -> String {
    let bytes = count as f64 * byte_size as f64;
    if bytes >= 1e6 {
        format!("{:.2} MB", bytes / 1e6)
    } else {
        format!("{:.2} kB", bytes / 1e3)
    }
}
