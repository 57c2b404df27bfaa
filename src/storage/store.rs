use std::io::Write;
use std::path::{Path, PathBuf};

use super::ledger::Ledger;
use super::types::{LedgerError, LedgerFile};

/// File name suffix of persisted ledgers.
pub const LEDGER_SUFFIX: &str = ".ledger.json";

/// Suffix of ledgers written by earlier releases into the same directory.
const LEGACY_LEDGER_SUFFIX: &str = ".pickle";

/// Returns true if `file_name` is a ledger file or one of its in-flight temp files.
///
/// Config discovery uses this so persisted state is never mistaken for a
/// configuration. Legacy `*.pickle` ledgers count too; they are not read.
pub fn is_ledger_file(file_name: &str) -> bool {
    file_name.ends_with(LEDGER_SUFFIX)
        || file_name.contains(".ledger.json.tmp.")
        || file_name.ends_with(LEGACY_LEDGER_SUFFIX)
}

/// Ledgers stored as one JSON file per configuration under a directory.
///
/// The directory is created on first persist if it does not exist yet.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the ledger file for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, LedgerError> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
            || key.contains('\0')
        {
            return Err(LedgerError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}{LEDGER_SUFFIX}")))
    }

    /// Loads the ledger for `key`.
    ///
    /// - Missing file → empty ledger
    /// - Unreadable or corrupt file → error; treating it as empty would
    ///   resubmit everything the feed still lists
    pub async fn load(&self, key: &str) -> Result<Ledger, LedgerError> {
        let path = self.path_for(key)?;

        let content = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No ledger yet, starting empty");
                return Ok(Ledger::new(key));
            }
            Err(e) => return Err(LedgerError::io(path, e)),
        };

        let file: LedgerFile = serde_json::from_slice(&content)
            .map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?;

        let ledger = Ledger::from_ids(key, file.submitted);
        tracing::debug!(path = %path.display(), ids = ledger.len(), "Loaded ledger");
        Ok(ledger)
    }

    /// Durably writes `ledger` under its key.
    ///
    /// Missing parent directories are created. The content is written to a
    /// temp file, synced, then renamed over the ledger so readers only ever
    /// see a complete file.
    pub async fn persist(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let path = self.path_for(ledger.key())?;

        let file = LedgerFile {
            submitted: ledger.ids().to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| LedgerError::io(&self.dir, e))?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &bytes))
            .await
            .map_err(|e| LedgerError::io(&path, std::io::Error::other(e)))??;

        tracing::debug!(path = %path.display(), ids = ledger.len(), "Persisted ledger");
        Ok(())
    }
}

/// Write `content` to `dst` using write-to-temp-then-rename.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<(), LedgerError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Randomized temp name so a stale or planted file cannot be reused.
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dst.with_file_name(format!("{file_name}.tmp.{random_suffix:016x}"));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| LedgerError::io(&temp_path, e))?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    drop(temp_file);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(LedgerError::io(&temp_path, e));
    }

    // On Windows, rename fails if destination exists
    #[cfg(windows)]
    if dst.exists() {
        if let Err(e) = std::fs::remove_file(dst) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(LedgerError::io(dst, e));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, dst) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(LedgerError::io(dst, e));
    }

    Ok(())
}
