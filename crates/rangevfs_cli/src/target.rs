//! Resolving command targets to range sources and opened files.

use rangevfs_core::{
    LocalFileSource, OpenFlags, OpenedFile, RangeSource, SystemHost, VfsConfig, VfsRegistry,
    VfsResult,
};
use rangevfs_http::{HttpConfig, HttpSource, ReqwestClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Returns true if `target` should be fetched over HTTP.
pub fn is_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Builds the range source for `target`.
pub fn source_for(
    target: &str,
    timeout: Duration,
) -> Result<Arc<dyn RangeSource>, Box<dyn std::error::Error>> {
    if is_url(target) {
        debug!(url = target, ?timeout, "using HTTP range source");
        let config = HttpConfig::new().with_timeout(timeout);
        let client = ReqwestClient::new(&config)?;
        Ok(Arc::new(HttpSource::with_config(client, config)))
    } else {
        debug!(path = target, "using local file source");
        Ok(Arc::new(LocalFileSource::new()))
    }
}

/// Builds the standard registry over `source`.
pub fn registry(source: Arc<dyn RangeSource>) -> VfsResult<VfsRegistry> {
    VfsRegistry::standard(&VfsConfig::default(), source, Arc::new(SystemHost::new()))
}

/// Opens `target` read-only as a main database.
pub fn open_main(registry: &VfsRegistry, target: &str) -> VfsResult<OpenedFile> {
    registry.open(Some(target), OpenFlags::READONLY | OpenFlags::MAIN_DB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/a.db"));
        assert!(is_url("http://localhost:8080/a.db"));
        assert!(!is_url("data/a.db"));
        assert!(!is_url("/tmp/https.db"));
    }

    #[test]
    fn local_target_opens_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.db");
        std::fs::write(&path, [1u8; 512]).unwrap();
        let target = path.to_str().unwrap();

        let registry = registry(source_for(target, Duration::from_secs(1)).unwrap()).unwrap();
        let opened = open_main(&registry, target).unwrap();
        assert_eq!(opened.backend, "http");
        assert_eq!(opened.file.file_size().unwrap(), 512);
    }
}
