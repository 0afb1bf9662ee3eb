//! Stat command implementation.

use crate::target;
use rangevfs_core::{RangeSource, ResultCode};
use serde::Serialize;
use std::sync::Arc;

/// Accessibility report for a database.
#[derive(Debug, Serialize)]
pub struct StatResult {
    /// Target URL or path.
    pub target: String,
    /// Size in bytes.
    pub size: u64,
    /// Access flags as text.
    pub access: String,
    /// Whether the resource can be read.
    pub readable: bool,
    /// Whether range requests are supported.
    pub ranges: bool,
    /// Whether the VFS accepted the open.
    pub usable: bool,
    /// Backend that served the open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Open failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_error: Option<String>,
    /// Result code of the open.
    pub code: i32,
}

/// Collects the stat report without printing it.
pub fn collect(
    target_path: &str,
    source: Arc<dyn RangeSource>,
) -> Result<StatResult, Box<dyn std::error::Error>> {
    let stat = source.stat(target_path)?;
    let registry = target::registry(source)?;

    let mut result = StatResult {
        target: target_path.to_string(),
        size: stat.size,
        access: stat.access.to_string(),
        readable: stat.access.is_readable(),
        ranges: stat.access.supports_ranges(),
        usable: false,
        backend: None,
        open_error: None,
        code: ResultCode::Ok.into(),
    };

    match target::open_main(&registry, target_path) {
        Ok(mut opened) => {
            result.usable = true;
            result.backend = Some(opened.backend.clone());
            opened.file.close()?;
        }
        Err(err) => {
            result.code = err.code().into();
            result.open_error = Some(err.to_string());
        }
    }

    Ok(result)
}

/// Runs the stat command.
pub fn run(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(target_path, source)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &StatResult) {
    println!("Target: {}", result.target);
    println!("  Size:     {} bytes ({})", result.size, format_size(result.size));
    println!("  Access:   {}", result.access);
    println!("  Readable: {}", yes_no(result.readable));
    println!("  Ranges:   {}", yes_no(result.ranges));
    match (&result.backend, &result.open_error) {
        (Some(backend), _) => println!("  Open:     ok (backend {backend})"),
        (None, Some(err)) => println!("  Open:     failed, code {} ({err})", result.code),
        (None, None) => println!("  Open:     failed, code {}", result.code),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Formats a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangevfs_core::LocalFileSource;

    #[test]
    fn stat_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.db");
        std::fs::write(&path, [0u8; 2048]).unwrap();

        let result = collect(path.to_str().unwrap(), Arc::new(LocalFileSource::new())).unwrap();
        assert_eq!(result.size, 2048);
        assert!(result.readable);
        assert!(result.ranges);
        assert!(result.usable);
        assert_eq!(result.backend.as_deref(), Some("http"));
        assert_eq!(result.code, 0);
    }

    #[test]
    fn stat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let result = collect(path.to_str().unwrap(), Arc::new(LocalFileSource::new())).unwrap();
        assert_eq!(result.size, 0);
        assert!(!result.usable);
        assert_eq!(result.code, i32::from(ResultCode::IoErrAccess));
        assert!(result.open_error.is_some());
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
