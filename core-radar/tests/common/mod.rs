//! Shared fakes for the core-radar integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    error::Result, BridgeError, ByteStream, Clock, Compositor, FileMetadata, FileSystemAccess,
    ManualClock, RemoteEntry, TransferClient, TransferSession,
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use core_radar::Settings;
use core_runtime::config::RadarConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;

pub const CACHE: &str = "/cache";

// ============================================================================
// In-memory file system
// ============================================================================

#[derive(Clone)]
struct MemoryFile {
    data: Bytes,
    modified_at: DateTime<Utc>,
}

/// File system whose writes are stamped with the injected clock
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
    undeletable: Mutex<HashSet<PathBuf>>,
    clock: Arc<dyn Clock>,
    writes: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
            undeletable: Mutex::new(HashSet::new()),
            clock,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, data: &[u8]) {
        let modified_at = self.clock.now();
        self.insert_modified(path, data, modified_at);
    }

    pub fn insert_modified(&self, path: impl Into<PathBuf>, data: &[u8], modified_at: DateTime<Utc>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.mkdirs(parent);
        }
        self.files.lock().unwrap().insert(
            path,
            MemoryFile {
                data: Bytes::copy_from_slice(data),
                modified_at,
            },
        );
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path.as_ref())
            .map(|f| f.data.clone())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.lock().unwrap().contains_key(path.as_ref())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    pub fn protect(&self, path: impl Into<PathBuf>) {
        self.undeletable.lock().unwrap().insert(path.into());
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn mkdirs(&self, path: &Path) {
        let mut dirs = self.dirs.lock().unwrap();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        if let Some(file) = self.files.lock().unwrap().get(path) {
            return Ok(FileMetadata {
                size: file.data.len() as u64,
                modified_at: Some(file.modified_at),
                is_directory: false,
            });
        }
        if self.dirs.lock().unwrap().contains(path) {
            return Ok(FileMetadata {
                size: 0,
                modified_at: None,
                is_directory: true,
            });
        }
        Err(BridgeError::NotFound(path.to_path_buf()))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.mkdirs(path);
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        self.contents(path)
            .ok_or_else(|| BridgeError::NotFound(path.to_path_buf()))
    }

    async fn write_stream_atomic(&self, path: &Path, mut stream: ByteStream) -> Result<u64> {
        let mut data = Vec::new();
        // Nothing lands unless the whole stream was read
        stream.read_to_end(&mut data).await?;
        self.insert(path, &data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(data.len() as u64)
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        if self.undeletable.lock().unwrap().contains(path) {
            return Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BridgeError::NotFound(path.to_path_buf()))
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.dirs.lock().unwrap().contains(path) {
            return Err(BridgeError::NotFound(path.to_path_buf()));
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    async fn open_read_stream(&self, path: &Path) -> Result<ByteStream> {
        let data = self
            .contents(path)
            .ok_or_else(|| BridgeError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(std::io::Cursor::new(data.to_vec())))
    }
}

// ============================================================================
// Fake mirror
// ============================================================================

#[derive(Default)]
struct MirrorState {
    directories: Mutex<HashMap<String, Vec<(String, Bytes)>>>,
    connects: AtomicUsize,
    lists: AtomicUsize,
    fetches: AtomicUsize,
    closes: AtomicUsize,
    visited: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    refuse: Mutex<bool>,
    list_delay: Mutex<Option<Duration>>,
    fetch_delay: Mutex<Option<Duration>>,
    close_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Remote collaborator that serves fixed directory listings and counts calls
#[derive(Clone, Default)]
pub struct FakeMirror {
    state: Arc<MirrorState>,
}

impl FakeMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, dir: &str, name: &str, data: &[u8]) {
        let mut dirs = self.state.directories.lock().unwrap();
        let files = dirs.entry(dir.to_string()).or_default();
        files.retain(|(existing, _)| existing != name);
        files.push((name.to_string(), Bytes::copy_from_slice(data)));
    }

    /// Standard fixture: one base background and two frames ten minutes apart
    pub fn with_standard_listing(self) -> Self {
        self.put("/anon/gen/radar_transparencies", "IDR032.background.png", &[b'b'; 100]);
        self.put("/anon/gen/radar", "IDR032.T.201803210500.png", &[b'0'; 50]);
        self.put("/anon/gen/radar", "IDR032.T.201803210510.png", &[b'1'; 50]);
        self
    }

    pub fn fail_fetch(&self, name: &str) {
        self.state.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn refuse_connections(&self) {
        *self.state.refuse.lock().unwrap() = true;
    }

    pub fn delay_listing(&self, delay: Duration) {
        *self.state.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_fetches(&self, delay: Duration) {
        *self.state.fetch_delay.lock().unwrap() = Some(delay);
    }

    /// Closing waits this long, like a session still busy with a transfer
    pub fn stall_close(&self, delay: Duration) {
        *self.state.close_delay.lock().unwrap() = Some(delay);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.state.lists.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferClient for FakeMirror {
    async fn connect(&self, host: &str) -> Result<Box<dyn TransferSession>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if *self.state.refuse.lock().unwrap() {
            return Err(BridgeError::Transfer(format!("connect to {}: refused", host)));
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            cwd: Mutex::new(None),
        }))
    }
}

struct FakeSession {
    state: Arc<MirrorState>,
    cwd: Mutex<Option<String>>,
}

impl FakeSession {
    fn current(&self) -> Result<String> {
        self.cwd
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BridgeError::Transfer("no directory selected".to_string()))
    }
}

#[async_trait]
impl TransferSession for FakeSession {
    async fn change_directory(&self, path: &str) -> Result<()> {
        if !self.state.directories.lock().unwrap().contains_key(path) {
            return Err(BridgeError::Transfer(format!("cwd {}: no such directory", path)));
        }
        self.state.visited.lock().unwrap().push(path.to_string());
        *self.cwd.lock().unwrap() = Some(path.to_string());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        self.state.lists.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let cwd = self.current()?;
        let dirs = self.state.directories.lock().unwrap();
        Ok(dirs
            .get(&cwd)
            .map(|files| {
                files
                    .iter()
                    .map(|(name, data)| RemoteEntry::new(name.clone(), data.len() as u64))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch(&self, name: &str) -> Result<ByteStream> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.state.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.failing.lock().unwrap().contains(name) {
            return Err(BridgeError::Transfer(format!("get {}: 550", name)));
        }

        let cwd = self.current()?;
        let dirs = self.state.directories.lock().unwrap();
        let data = dirs
            .get(&cwd)
            .and_then(|files| files.iter().find(|(n, _)| n == name))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| BridgeError::Transfer(format!("get {}: not found", name)))?;
        Ok(Box::new(std::io::Cursor::new(data.to_vec())))
    }

    async fn close(&self) -> Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.close_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

// ============================================================================
// Recording compositor
// ============================================================================

/// Writes a small placeholder to the final argument and remembers every call
pub struct RecordingCompositor {
    fs: Arc<MemoryFileSystem>,
    calls: Mutex<Vec<Vec<String>>>,
    fail: Mutex<bool>,
}

impl RecordingCompositor {
    pub fn new(fs: Arc<MemoryFileSystem>) -> Self {
        Self {
            fs,
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

pub const RENDERED: &[u8] = b"GIF89a-rendered";

#[async_trait]
impl Compositor for RecordingCompositor {
    async fn composite(&self, args: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(args.to_vec());
        if std::mem::take(&mut *self.fail.lock().unwrap()) {
            return Err(BridgeError::Process("convert exited with 1".to_string()));
        }
        let output = args
            .last()
            .ok_or_else(|| BridgeError::OperationFailed("no output".to_string()))?;
        let stream: ByteStream = Box::new(std::io::Cursor::new(RENDERED.to_vec()));
        self.fs
            .write_stream_atomic(Path::new(output), stream)
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Close enough to the standard listing that its frames survive default retention
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 3, 21, 5, 20, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub fs: Arc<MemoryFileSystem>,
    pub mirror: FakeMirror,
    pub compositor: Arc<RecordingCompositor>,
}

impl Harness {
    pub fn new(mirror: FakeMirror) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let fs = Arc::new(MemoryFileSystem::new(clock.clone()));
        let compositor = Arc::new(RecordingCompositor::new(fs.clone()));
        Self {
            clock,
            fs,
            mirror,
            compositor,
        }
    }

    pub fn config(&self) -> RadarConfig {
        RadarConfig::builder()
            .file_system(self.fs.clone())
            .transfer_client(Arc::new(self.mirror.clone()))
            .compositor(self.compositor.clone())
            .clock(self.clock.clone())
            .build()
            .unwrap()
    }

    pub fn config_with_compositor(&self, compositor: Arc<dyn Compositor>) -> RadarConfig {
        RadarConfig::builder()
            .file_system(self.fs.clone())
            .transfer_client(Arc::new(self.mirror.clone()))
            .compositor(compositor)
            .clock(self.clock.clone())
            .build()
            .unwrap()
    }
}

pub fn settings() -> Settings {
    Settings {
        cache_path: PathBuf::from(CACHE),
        ..Settings::default()
    }
}

pub fn cached(name: &str) -> PathBuf {
    Path::new(CACHE).join(name)
}

/// Frame name for a local wall-clock instant
pub fn frame_name(at: NaiveDateTime) -> String {
    format!("IDR032.T.{}.png", at.format("%Y%m%d%H%M"))
}
