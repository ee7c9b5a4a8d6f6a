use super::{AppendLog, LogError, LogRecord, StreamId};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct Target {
    path: PathBuf,
    /// Shared by every stream that resolves to the same path.
    lock: Arc<Mutex<()>>,
}

/// File-backed streams, one text file per target.
///
/// Every append opens the file in append mode, writes the whole line with a
/// single `write_all`, flushes, syncs and closes it again while holding the
/// target's lock. The write also takes an exclusive advisory lock on the file
/// itself, so other processes appending through `FileAppendLog` to the same
/// path never interleave with it.
pub struct FileAppendLog {
    targets: HashMap<StreamId, Target>,
}

impl FileAppendLog {
    pub fn new<I, P>(targets: I) -> Self
    where
        I: IntoIterator<Item = (StreamId, P)>,
        P: Into<PathBuf>,
    {
        let mut locks: HashMap<PathBuf, Arc<Mutex<()>>> = HashMap::new();
        let targets = targets
            .into_iter()
            .map(|(stream, path)| {
                let path = path.into();
                let lock = Arc::clone(locks.entry(path.clone()).or_default());
                (stream, Target { path, lock })
            })
            .collect();

        Self { targets }
    }

    pub fn path(&self, stream: StreamId) -> Option<&Path> {
        self.targets.get(&stream).map(|t| t.path.as_path())
    }
}

impl AppendLog for FileAppendLog {
    fn append(&self, stream: StreamId, record: &LogRecord) -> Result<(), LogError> {
        let target = self
            .targets
            .get(&stream)
            .ok_or(LogError::UnknownStream(stream))?;

        let mut line = record.to_line();
        line.push('\n');

        let io_err = |source| LogError::Io {
            path: target.path.clone(),
            source,
        };

        // The guarded value is (), so a poisoned lock carries no broken state
        let _guard = target.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = target.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target.path)
            .map_err(io_err)?;
        FileExt::lock_exclusive(&file).map_err(io_err)?;
        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data());
        // Dropping the file releases the lock as well
        let _ = FileExt::unlock(&file);
        written.map_err(io_err)
    }
}
