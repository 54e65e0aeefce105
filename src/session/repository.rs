// Keyed session cache backed by session files on disk

use crate::errors::PitdeltaError;
use crate::session::{Session, SessionKey, SessionType, load_session_jsonl, write_session_jsonl};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SESSION_FILE_EXTENSION: &str = "jsonl";

/// Source of fully materialized sessions.
///
/// Repeated loads of the same key return the same `Arc` until the key is
/// invalidated, callers can rely on `Arc::ptr_eq` to detect a reload.
pub trait SessionRepository {
    /// Resolve and load the session identified by `key`
    fn load(&mut self, key: &SessionKey) -> Result<Arc<Session>, PitdeltaError>;

    /// Drop the cached session for `key`, returns whether anything was cached
    fn invalidate(&mut self, key: &SessionKey) -> bool;

    /// Drop every cached session
    fn clear(&mut self);
}

/// File-based implementation of the session repository
pub struct FileSessionRepository {
    /// Base directory holding `<year>/<event>/<session>.jsonl` files
    root: PathBuf,
    cache: HashMap<SessionKey, Arc<Session>>,
}

impl FileSessionRepository {
    /// Create a new repository rooted at `root`, creating the directory if needed
    pub fn new(root: PathBuf) -> Result<Self, PitdeltaError> {
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| PitdeltaError::SessionWriterError { source: e })?;
        }

        Ok(Self {
            root,
            cache: HashMap::new(),
        })
    }

    /// Create the repository in the default application cache directory
    pub fn new_default() -> Result<Self, PitdeltaError> {
        Self::new(Self::default_root()?)
    }

    pub fn default_root() -> Result<PathBuf, PitdeltaError> {
        let cache_dir = dirs::cache_dir().ok_or(PitdeltaError::NoConfigDir)?;
        Ok(cache_dir.join("pitdelta").join("sessions"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cached_sessions(&self) -> usize {
        self.cache.len()
    }

    /// Location of the session file for a given year, event and session type
    pub fn file_path(&self, year: u16, event: &str, session_type: SessionType) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(Self::normalize_event_name(event))
            .join(format!("{}.{}", session_type.code(), SESSION_FILE_EXTENSION))
    }

    /// Normalize event name for consistent directory naming
    fn normalize_event_name(event: &str) -> String {
        event
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// Place a session file in the repository, replacing any previous file for
    /// the same session. Cached copies are left untouched until invalidated.
    pub fn store(&self, session: &Session) -> Result<PathBuf, PitdeltaError> {
        let path = self.file_path(
            session.info.year,
            &session.info.event,
            session.info.session_type,
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PitdeltaError::SessionWriterError { source: e })?;
        }
        write_session_jsonl(&path, session)?;
        info!("Stored {} in {:?}", session.label(), path);
        Ok(path)
    }

    /// List the session files present on disk as (year, event directory, session type)
    pub fn available_sessions(&self) -> Result<Vec<(u16, String, SessionType)>, PitdeltaError> {
        let mut sessions = Vec::new();
        for year_dir in read_dirs(&self.root)? {
            let Some(year) = file_name(&year_dir).and_then(|name| name.parse::<u16>().ok()) else {
                continue;
            };
            for event_dir in read_dirs(&year_dir)? {
                let Some(event) = file_name(&event_dir) else {
                    continue;
                };
                for entry in fs::read_dir(&event_dir)
                    .map_err(|e| PitdeltaError::SessionLoaderError { source: e })?
                    .flatten()
                {
                    let path = entry.path();
                    let extension = path.extension().and_then(|ext| ext.to_str());
                    if extension != Some(SESSION_FILE_EXTENSION) {
                        continue;
                    }
                    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
                    match stem.parse::<SessionType>() {
                        Ok(session_type) => sessions.push((year, event.clone(), session_type)),
                        Err(_) => warn!("Ignoring unrecognized session file {:?}", path),
                    }
                }
            }
        }
        sessions.sort_by(|a, b| (a.0, &a.1, a.2.code()).cmp(&(b.0, &b.1, b.2.code())));
        Ok(sessions)
    }
}

impl SessionRepository for FileSessionRepository {
    fn load(&mut self, key: &SessionKey) -> Result<Arc<Session>, PitdeltaError> {
        if let Some(session) = self.cache.get(key) {
            debug!("Using cached session {}", key);
            return Ok(Arc::clone(session));
        }

        let path = self.file_path(key.year, &key.event, key.session_type);
        if !path.exists() {
            return Err(PitdeltaError::SessionNotFound {
                key: key.to_string(),
            });
        }

        let session = Arc::new(load_session_jsonl(&path)?);
        if session.laps_for_driver(&key.driver).next().is_none() {
            warn!("Session {} has no laps for {}", session.label(), key.driver);
        }
        self.cache.insert(key.clone(), Arc::clone(&session));
        Ok(session)
    }

    fn invalidate(&mut self, key: &SessionKey) -> bool {
        self.cache.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.cache.clear();
    }
}

fn read_dirs(path: &Path) -> Result<Vec<PathBuf>, PitdeltaError> {
    let entries = fs::read_dir(path).map_err(|e| PitdeltaError::SessionLoaderError { source: e })?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
