//! # Feature Strings
//!
//! Replies produced by the Rename and Merge handler sets.

use crate::domain::types::FileRef;

pub const RENAME_WELCOME: &str = concat!(
    "✏️ **Rename mode**\n",
    "Send a file to rename it. Send an image to use it as the thumbnail, ",
    "`.delthumb` to remove it."
);

pub const MERGE_WELCOME: &str = concat!(
    "🧩 **Merge mode**\n",
    "Send the files in order, then `.done` to merge them or `.clear` to start over."
);

pub const MISSING_FILE: &str = "⚠️ No file attached.";

pub fn rename_queued(file: &FileRef, with_thumbnail: bool) -> String {
    let thumb = if with_thumbnail { "custom" } else { "default" };
    format!(
        "📥 Received `{}` ({}). Queued for renaming with the {thumb} thumbnail.",
        file.name,
        human_size(file.size)
    )
}

pub const THUMBNAIL_SAVED: &str = "🖼️ Thumbnail saved.";
pub const THUMBNAIL_DELETED: &str = "🗑️ Thumbnail deleted.";
pub const NO_THUMBNAIL: &str = "You have no custom thumbnail.";

pub fn merge_added(file: &FileRef, position: usize) -> String {
    format!("➕ Added `{}` as file #{position}.", file.name)
}

pub fn merge_queue_full(max: usize) -> String {
    format!("⚠️ The merge queue is full ({max} files). Send `.done` or `.clear`.")
}

pub fn merge_needs_more(count: usize) -> String {
    format!("⚠️ Need at least two files to merge, you have {count}.")
}

pub fn merge_started(files: &[FileRef]) -> String {
    let lines: Vec<String> = files
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, f.name))
        .collect();
    format!("🧩 Merging {} files:\n{}", files.len(), lines.join("\n"))
}

pub fn merge_cleared(count: usize) -> String {
    format!("🧹 Cleared {count} queued files.")
}

pub fn human_size(size: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let Some(bytes) = size else {
        return "unknown size".to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
