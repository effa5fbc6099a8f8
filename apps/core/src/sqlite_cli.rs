use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::error::QueryError;

pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_STDERR_BYTES: usize = 64 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(5);
const READ_CHUNK: usize = 64 * 1024;
const COMPANION_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ScratchCopy {
    path: PathBuf,
    companions: Vec<PathBuf>,
}

impl ScratchCopy {
    pub fn create(source: &Path, scratch_dir: &Path, key: &str) -> std::io::Result<Self> {
        fs::create_dir_all(scratch_dir)?;
        // Paths are registered before copying so Drop also removes partial files.
        let mut copy = Self {
            path: scratch_dir.join(scratch_file_name(key)),
            companions: Vec::new(),
        };
        fs::copy(source, &copy.path)?;

        for suffix in COMPANION_SUFFIXES {
            let companion = with_suffix(source, suffix);
            if !companion.is_file() {
                continue;
            }
            let target = with_suffix(&copy.path, suffix);
            copy.companions.push(target.clone());
            fs::copy(&companion, &target)?;
        }
        Ok(copy)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchCopy {
    fn drop(&mut self) {
        for path in self.companions.iter().chain(std::iter::once(&self.path)) {
            if let Err(error) = fs::remove_file(path) {
                if error.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("failed to remove scratch copy {}: {error}", path.display());
                }
            }
        }
    }
}

pub fn query_snapshot(
    executor: &Path,
    database: &Path,
    scratch_dir: &Path,
    key: &str,
    sql: &str,
    options: &QueryOptions,
    cancel: &CancelToken,
) -> Result<String, QueryError> {
    if cancel.is_cancelled() {
        return Err(QueryError::Cancelled);
    }
    let copy = ScratchCopy::create(database, scratch_dir, key).map_err(QueryError::Scratch)?;
    log::debug!(
        "querying snapshot {} of {}",
        copy.path().display(),
        database.display()
    );
    run_query(executor, copy.path(), sql, options, cancel)
}

pub fn run_query(
    executor: &Path,
    database: &Path,
    sql: &str,
    options: &QueryOptions,
    cancel: &CancelToken,
) -> Result<String, QueryError> {
    let mut child = Command::new(executor)
        .arg(database)
        .arg(sql)
        .arg("-readonly")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| QueryError::Spawn {
            executor: executor.to_path_buf(),
            source,
        })?;

    let overflowed = Arc::new(AtomicBool::new(false));
    let stdout_reader = child.stdout.take().map(|pipe| {
        let overflowed = Arc::clone(&overflowed);
        let limit = options.max_output_bytes;
        thread::spawn(move || read_bounded(pipe, limit, &overflowed))
    });
    let stderr_reader = child.stderr.take().map(|pipe| {
        let ignored = Arc::new(AtomicBool::new(false));
        thread::spawn(move || read_bounded(pipe, MAX_STDERR_BYTES, &ignored))
    });

    let status = match wait_for_exit(&mut child, options, cancel, &overflowed) {
        Ok(status) => status,
        Err(error) => {
            terminate(&mut child);
            // Readers are detached: a grandchild may still hold the pipes open.
            return Err(error);
        }
    };

    let stdout = join_reader(stdout_reader)?;
    let stderr = join_reader(stderr_reader).unwrap_or_default();
    if overflowed.load(Ordering::SeqCst) {
        return Err(QueryError::BufferExceeded(options.max_output_bytes));
    }
    if !status.success() {
        return Err(QueryError::ExitStatus {
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn wait_for_exit(
    child: &mut Child,
    options: &QueryOptions,
    cancel: &CancelToken,
    overflowed: &AtomicBool,
) -> Result<ExitStatus, QueryError> {
    let started = Instant::now();
    loop {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        if overflowed.load(Ordering::SeqCst) {
            return Err(QueryError::BufferExceeded(options.max_output_bytes));
        }
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= options.timeout {
            return Err(QueryError::Timeout(options.timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn terminate(child: &mut Child) {
    if let Err(error) = child.kill() {
        log::debug!("query tool already gone: {error}");
    }
    let _ = child.wait();
}

fn read_bounded<R: Read>(
    mut pipe: R,
    limit: usize,
    overflowed: &AtomicBool,
) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = vec![0_u8; READ_CHUNK];
    loop {
        let read = pipe.read(&mut chunk)?;
        if read == 0 {
            return Ok(buffer);
        }
        if buffer.len() + read > limit {
            overflowed.store(true, Ordering::SeqCst);
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
}

fn join_reader(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>, QueryError> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    match reader.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(QueryError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "query output reader panicked",
        ))),
    }
}

fn scratch_file_name(key: &str) -> String {
    let safe_key: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{safe_key}-{}-{nanos}.db", std::process::id())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::{scratch_file_name, with_suffix};
    use std::path::Path;

    #[test]
    fn scratch_names_are_keyed_and_sanitized() {
        let name = scratch_file_name("notes/win id");
        assert!(name.starts_with("notes_win_id-"));
        assert!(name.ends_with(".db"));
    }

    #[test]
    fn companion_suffix_is_appended_to_file_name() {
        assert_eq!(
            with_suffix(Path::new("/data/History.db"), "-wal"),
            Path::new("/data/History.db-wal")
        );
    }
}
