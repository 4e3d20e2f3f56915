//! history.rs: bounded analysis history behind a key-value persistence seam.
//!
//! The list is loaded once when the store is opened and rewritten wholesale
//! after every successful analysis. Newest entry first.

use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::model::{content_preview, AnalysisResult, HistoryItem};

pub const HISTORY_KEY: &str = "analysis_history";
pub const DEFAULT_CAPACITY: usize = 5;

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        Ok(g.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        g.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating history dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.sync_all()?;
    fs::rename(tmp, path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        write_atomic(&path, value).with_context(|| format!("writing {}", path.display()))
    }
}

#[derive(Debug)]
struct State {
    items: Vec<HistoryItem>,
    last_id: i64,
}

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
    inner: Mutex<State>,
}

impl HistoryStore {
    /// Read the persisted list once. Missing or unreadable data starts an empty history.
    pub fn load(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        let cap = cap.max(1);
        let mut items: Vec<HistoryItem> = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored history is corrupt, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = ?e, "history store unreadable, starting empty");
                Vec::new()
            }
        };
        items.truncate(cap);
        let last_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        Self {
            store,
            cap,
            inner: Mutex::new(State { items, last_id }),
        }
    }

    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::default()), DEFAULT_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Prepend a new entry, drop overflow, and persist the whole list.
    pub fn record(&self, content: &str, result: &AnalysisResult) -> anyhow::Result<HistoryItem> {
        let mut g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("history mutex poisoned"))?;

        // Time-derived, strictly increasing even within one millisecond.
        let id = Utc::now().timestamp_millis().max(g.last_id + 1);
        g.last_id = id;

        let item = HistoryItem {
            id,
            content: content_preview(content),
            result: result.clone(),
        };
        g.items.insert(0, item.clone());
        let cap = self.cap;
        g.items.truncate(cap);

        // The in-memory list stays updated when the save fails; the next
        // successful save writes the whole list and catches the store up.
        let json = serde_json::to_string(&g.items)?;
        self.store.set(HISTORY_KEY, &json)?;
        Ok(item)
    }

    /// Snapshot, newest first.
    pub fn items(&self) -> Vec<HistoryItem> {
        self.inner
            .lock()
            .map(|g| g.items.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
