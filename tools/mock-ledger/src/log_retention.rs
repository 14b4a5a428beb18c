//! Size-bounded rotation for one append-only log file.
//!
//! The active file keeps its configured name. A full file is renamed to the
//! next numbered segment beside it (`calls.jsonl` becomes `calls.1.jsonl`,
//! then `calls.2.jsonl`), and pruning only ever deletes the oldest segments
//! of that log. Other files in the directory are never touched.

use crate::errors::MockError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

struct SegmentName {
    stem: String,
    extension: Option<String>,
}

impl SegmentName {
    fn of(active: &Path) -> Option<Self> {
        let stem = active.file_stem()?.to_str()?.to_string();
        let extension = match active.extension() {
            Some(ext) => Some(ext.to_str()?.to_string()),
            None => None,
        };
        Some(Self { stem, extension })
    }

    fn file_name(&self, seq: u64) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{seq}.{ext}", self.stem),
            None => format!("{}.{seq}", self.stem),
        }
    }

    fn sequence(&self, file_name: &str) -> Option<u64> {
        let rest = file_name.strip_prefix(&self.stem)?.strip_prefix('.')?;
        let digits = match &self.extension {
            Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => rest,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

fn log_dir(active: &Path) -> &Path {
    match active.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn numbered_segments(active: &Path) -> Result<Vec<(u64, PathBuf)>, MockError> {
    let Some(name) = SegmentName::of(active) else {
        return Ok(Vec::new());
    };
    let entries = match fs::read_dir(log_dir(active)) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(MockError::Io(e.to_string())),
    };

    let mut segments = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let seq = name.sequence(entry.file_name().to_str()?)?;
            let path = entry.path();
            path.is_file().then_some((seq, path))
        })
        .collect::<Vec<_>>();
    segments.sort_by_key(|(seq, _)| *seq);
    Ok(segments)
}

/// Rotated segments of `active`, oldest first.
pub fn rotated_segments(active: &Path) -> Result<Vec<PathBuf>, MockError> {
    Ok(numbered_segments(active)?
        .into_iter()
        .map(|(_, path)| path)
        .collect())
}

/// Renames `active` to its next segment. Returns the segment path, or `None`
/// when there is no active file yet.
pub fn rotate(active: &Path) -> Result<Option<PathBuf>, MockError> {
    match fs::metadata(active) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MockError::Io(e.to_string())),
    }
    let Some(name) = SegmentName::of(active) else {
        return Err(MockError::Io(format!(
            "cannot rotate {}: file name is not valid UTF-8",
            active.display()
        )));
    };
    let next = numbered_segments(active)?
        .last()
        .map_or(1, |(seq, _)| seq + 1);
    let target = log_dir(active).join(name.file_name(next));
    fs::rename(active, &target).map_err(|e| MockError::Io(e.to_string()))?;
    Ok(Some(target))
}

/// Deletes the oldest segments of `active` until the log fits
/// `budget_bytes`. The active file is never deleted.
pub fn enforce_total_budget(active: &Path, budget_bytes: u64) -> Result<Vec<PathBuf>, MockError> {
    let segments = numbered_segments(active)?;
    let file_len = |path: &Path| fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);

    let mut total = file_len(active)
        + segments
            .iter()
            .map(|(_, path)| file_len(path))
            .sum::<u64>();

    let mut deleted = Vec::new();
    for (_, path) in segments {
        if total <= budget_bytes {
            break;
        }
        let len = file_len(&path);
        fs::remove_file(&path).map_err(|e| MockError::Io(e.to_string()))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::{enforce_total_budget, rotate, rotated_segments};
    use std::fs;

    #[test]
    fn rotation_numbers_segments_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("calls.jsonl");
        assert_eq!(rotate(&active).expect("nothing to rotate"), None);

        fs::write(&active, "first\n").expect("write first");
        let one = rotate(&active).expect("rotate").expect("segment");
        assert!(one.ends_with("calls.1.jsonl"));
        assert!(!active.exists());

        fs::write(&active, "second\n").expect("write second");
        let two = rotate(&active).expect("rotate").expect("segment");
        assert!(two.ends_with("calls.2.jsonl"));
        assert_eq!(rotated_segments(&active).expect("list"), vec![one, two.clone()]);
        assert_eq!(fs::read_to_string(two).expect("read"), "second\n");
    }

    #[test]
    fn pruning_deletes_only_old_segments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, vec![0u8; 9000]).expect("notes");
        let active = dir.path().join("calls.jsonl");
        fs::write(dir.path().join("calls.1.jsonl"), vec![0u8; 3000]).expect("seg 1");
        fs::write(dir.path().join("calls.2.jsonl"), vec![0u8; 3000]).expect("seg 2");
        fs::write(&active, vec![0u8; 100]).expect("active");

        let deleted = enforce_total_budget(&active, 4096).expect("pruned");
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].ends_with("calls.1.jsonl"));
        assert!(dir.path().join("calls.2.jsonl").exists());
        assert!(active.exists());
        assert!(notes.exists());
    }

    #[test]
    fn oversized_active_file_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("calls.jsonl");
        fs::write(&active, vec![0u8; 500]).expect("active");
        let deleted = enforce_total_budget(&active, 100).expect("checked");
        assert!(deleted.is_empty());
        assert!(active.exists());
    }

    #[test]
    fn lookalike_names_are_not_segments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("calls.jsonl");
        for name in ["calls.jsonl.bak", "calls.old.jsonl", "calls..jsonl", "other.1.jsonl"] {
            fs::write(dir.path().join(name), "x").expect("write");
        }
        fs::write(dir.path().join("calls.7.jsonl"), "x").expect("segment");
        let segments = rotated_segments(&active).expect("list");
        assert_eq!(segments.len(), 1);
        assert!(segments[0].ends_with("calls.7.jsonl"));
    }

    #[test]
    fn missing_directory_has_no_segments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("absent/calls.jsonl");
        assert!(rotated_segments(&active).expect("list").is_empty());
        assert!(enforce_total_budget(&active, 10).expect("checked").is_empty());
    }
}
