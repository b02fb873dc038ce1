//! Saved wizard drafts
//!
//! Each session is written as pretty JSON to `<dir>/<session id>.json` so
//! an applicant can pick up where they left off.

use crate::session::Session;
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Failure reading or writing a draft
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no draft directory is available on this platform")]
    NoDataDir,

    #[error("draft {0} not found")]
    NotFound(Uuid),

    #[error("draft i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("draft is not valid: {0}")]
    Format(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Directory-backed store of sessions
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform data directory
    pub fn default_location() -> StoreResult<Self> {
        ProjectDirs::from("ca", "bcregistry", "namerequest")
            .map(|dirs| Self::new(dirs.data_dir().join("drafts")))
            .ok_or(StoreError::NoDataDir)
    }

    /// Store in `dir` when one is configured, else the platform default
    pub fn resolve(dir: Option<&Path>) -> StoreResult<Self> {
        match dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::default_location(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write the session, replacing any earlier draft with the same id
    pub fn save(&self, session: &Session) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(session.id());
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&path, content)?;
        debug!(session = %session.id(), path = %path.display(), "saved draft");
        Ok(path)
    }

    pub fn load(&self, id: Uuid) -> StoreResult<Session> {
        let path = self.path_for(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Ids of every saved draft, sorted
    pub fn list(&self) -> StoreResult<Vec<Uuid>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Remove a draft. Returns false when there was nothing to remove.
    pub fn delete(&self, id: Uuid) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Modal, NameChoice, NameChoices, WizardStep};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, DraftStore) {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path().join("drafts"));
        (dir, store)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_dir, store) = store();
        let mut session = Session::start();
        session
            .apply_name_choice(NameChoices::from_names([NameChoice::new("Acme", Some("Ltd."))]))
            .unwrap();
        session.go_to(WizardStep::NamesCapture).unwrap();
        session.open_modal(Modal::HelpMeChoose).unwrap();

        store.save(&session).unwrap();
        let loaded = store.load(session.id()).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_resolve_prefers_configured_dir() {
        let (dir, _store) = store();
        let resolved = DraftStore::resolve(Some(dir.path())).unwrap();
        assert_eq!(resolved.dir(), dir.path());
    }

    #[test]
    fn test_load_missing_draft() {
        let (_dir, store) = store();
        let id = Uuid::new_v4();
        assert!(matches!(store.load(id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn test_corrupt_draft_is_a_format_error() {
        let (_dir, store) = store();
        let id = Uuid::new_v4();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(id), "{not json").unwrap();
        assert!(matches!(store.load(id), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_list_ignores_other_files() {
        let (_dir, store) = store();
        let a = Session::start();
        let b = Session::start();
        store.save(&a).unwrap();
        store.save(&b).unwrap();
        fs::write(store.dir().join("notes.txt"), "x").unwrap();
        fs::write(store.dir().join("not-a-uuid.json"), "{}").unwrap();

        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(store.list().unwrap(), expected);
    }

    #[test]
    fn test_list_without_directory() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        let session = Session::start();
        store.save(&session).unwrap();
        assert!(store.delete(session.id()).unwrap());
        assert!(!store.delete(session.id()).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_closed_session_is_stored_closed() {
        let (_dir, store) = store();
        let mut session = Session::start();
        session.submit().unwrap();
        store.save(&session).unwrap();
        let loaded = store.load(session.id()).unwrap();
        assert!(!loaded.is_active());
    }
}
