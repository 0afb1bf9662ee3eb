//! Read command implementation.

use crate::target;
use rangevfs_core::{RangeSource, ReadStatus};
use serde::Serialize;
use std::sync::Arc;

/// Bytes per hex dump line.
const DUMP_WIDTH: usize = 16;

/// Largest window a single read command accepts (1 MiB).
pub const MAX_READ_AMOUNT: usize = 1 << 20;

/// Result of reading a byte window.
#[derive(Debug, Serialize)]
pub struct ReadResult {
    /// Target URL or path.
    pub target: String,
    /// File size in bytes.
    pub size: u64,
    /// Requested offset.
    pub offset: u64,
    /// Requested length.
    pub amount: usize,
    /// `complete` or `short`.
    pub status: String,
    /// Bytes that came from the file. The rest are zero fill.
    pub bytes_read: usize,
    /// Result code of the read.
    pub code: i32,
    /// The returned window, hex encoded.
    pub data: String,
    #[serde(skip)]
    raw: Vec<u8>,
}

/// Reads the window without printing it.
pub fn collect(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    offset: u64,
    amount: usize,
) -> Result<ReadResult, Box<dyn std::error::Error>> {
    if amount > MAX_READ_AMOUNT {
        return Err(format!("amount {amount} exceeds the {MAX_READ_AMOUNT} byte limit").into());
    }

    let registry = target::registry(source)?;
    let mut opened = target::open_main(&registry, target_path)?;
    let size = opened.file.file_size()?;

    let mut buf = vec![0u8; amount];
    let status = opened.file.read(&mut buf, offset)?;
    opened.file.close()?;

    let (label, bytes_read) = match status {
        ReadStatus::Complete => ("complete", amount),
        ReadStatus::Short { read } => ("short", read),
    };

    Ok(ReadResult {
        target: target_path.to_string(),
        size,
        offset,
        amount,
        status: label.to_string(),
        bytes_read,
        code: status.code().into(),
        data: buf.iter().map(|b| format!("{b:02x}")).collect(),
        raw: buf,
    })
}

/// Runs the read command.
pub fn run(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    offset: u64,
    amount: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(target_path, source, offset, amount)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!(
                "{} bytes at offset {} of {} ({}, {} read, code {})",
                result.amount,
                result.offset,
                result.target,
                result.status,
                result.bytes_read,
                result.code
            );
            for line in hex_dump(result.offset, &result.raw) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Formats `bytes` as hex dump lines labelled from `base`.
pub fn hex_dump(base: u64, bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(DUMP_WIDTH)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:08x}  {:<width$}  |{}|",
                base.wrapping_add((i * DUMP_WIDTH) as u64),
                hex.join(" "),
                ascii,
                width = DUMP_WIDTH * 3 - 1
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangevfs_core::LocalFileSource;

    fn write_fixture() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.db");
        let data: Vec<u8> = (0..100u8).collect();
        std::fs::write(&path, data).unwrap();
        let path = path.to_str().unwrap().to_string();
        (dir, path)
    }

    #[test]
    fn read_in_bounds_is_complete() {
        let (_dir, path) = write_fixture();
        let result = collect(&path, Arc::new(LocalFileSource::new()), 0, 50).unwrap();
        assert_eq!(result.status, "complete");
        assert_eq!(result.bytes_read, 50);
        assert_eq!(result.code, 0);
        assert_eq!(result.raw, (0..50u8).collect::<Vec<_>>());
    }

    #[test]
    fn read_past_end_is_short_and_zero_filled() {
        let (_dir, path) = write_fixture();
        let result = collect(&path, Arc::new(LocalFileSource::new()), 90, 20).unwrap();
        assert_eq!(result.status, "short");
        assert_eq!(result.bytes_read, 10);
        assert_eq!(result.code, 522);
        assert_eq!(&result.raw[..10], &(90..100u8).collect::<Vec<_>>()[..]);
        assert!(result.raw[10..].iter().all(|&b| b == 0));
        assert!(result.data.ends_with("0000"));
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        assert!(collect(path.to_str().unwrap(), Arc::new(LocalFileSource::new()), 0, 1).is_err());
    }

    #[test]
    fn read_amount_is_capped() {
        let (_dir, path) = write_fixture();
        let err = collect(&path, Arc::new(LocalFileSource::new()), 0, MAX_READ_AMOUNT + 1)
            .unwrap_err();
        assert!(err.to_string().contains("limit"));

        let result = collect(&path, Arc::new(LocalFileSource::new()), 0, MAX_READ_AMOUNT).unwrap();
        assert_eq!(result.bytes_read, 100);
    }

    #[test]
    fn read_near_max_offset_is_zero_filled() {
        let (_dir, path) = write_fixture();
        let result = collect(&path, Arc::new(LocalFileSource::new()), u64::MAX - 8, 32).unwrap();
        assert_eq!(result.bytes_read, 0);
        assert_eq!(hex_dump(result.offset, &result.raw).len(), 2);
    }

    #[test]
    fn hex_dump_labels_wrap_at_max_offset() {
        let lines = hex_dump(u64::MAX - 15, &[0u8; 32]);
        assert!(lines[0].starts_with("fffffffffffffff0"));
        assert!(lines[1].starts_with("00000000"));
    }

    #[test]
    fn hex_dump_lines() {
        let lines = hex_dump(0x10, b"SQLite format 3\0ab");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000010  53 51 4c 69"));
        assert!(lines[0].ends_with("|SQLite format 3.|"));
        assert!(lines[1].starts_with("00000020  61 62"));
        assert!(lines[1].ends_with("|ab|"));
    }
}
