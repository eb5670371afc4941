use std::{fs::{self, File}, io::Write, path::{Path, PathBuf}, time::Duration};

use reqwest::blocking::Client;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Write-then-rename wrapper so an interrupted download never leaves a partial archive behind.
struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingWrite {
    fn open(target: &Path, force: bool) -> Result<Self> {
        let parent = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;
        if !force && target.exists() {
            return Err(Error::Download(format!("refusing to overwrite existing file {}", target.display())));
        }
        Ok(Self { target: target.to_path_buf(), tmp: NamedTempFile::new_in(parent)? })
    }

    fn finalize(self) -> Result<()> {
        self.tmp.as_file().sync_all().ok(); // best-effort fsync
        self.tmp.persist(&self.target)
            .map_err(|e| Error::Download(format!("rename to {}: {e}", self.target.display())))?;
        if let Some(dir) = self.target.parent() {
            let _ = File::open(dir).and_then(|f| f.sync_all());
        }
        Ok(())
    }
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

/// Blocking HTTP client with a project user agent.
pub(super) fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("plz2wk/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(300))
        .build()?)
}

/// Download a large file from `url` to `out_path`.
pub fn download_big_file(url: &str, out_path: &Path, force: bool) -> Result<()> {
    let mut sink = PendingWrite::open(out_path, force)?;

    let mut response = client()?.get(url).send()?.error_for_status()?;
    let copied = std::io::copy(&mut response, &mut sink)?;
    log::debug!("downloaded {copied} bytes from {url}");

    sink.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_write_only_appears_on_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("archive.zip");

        let mut sink = PendingWrite::open(&target, false).unwrap();
        sink.write_all(b"PK").unwrap();
        assert!(!target.exists());
        sink.finalize().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"PK");

        assert!(matches!(PendingWrite::open(&target, false), Err(Error::Download(_))));
        assert!(PendingWrite::open(&target, true).is_ok());
    }
}
