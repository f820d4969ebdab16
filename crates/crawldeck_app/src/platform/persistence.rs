use std::fs;
use std::path::PathBuf;

use crawldeck_core::CredentialStore;
use crawldeck_engine::{AtomicFileWriter, TokenSource};
use crawldeck_logging::{deck_debug, deck_error, deck_warn};
use serde::{Deserialize, Serialize};

pub const SESSION_FILENAME: &str = ".crawldeck_session.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSession {
    auth_token: Option<String>,
}

/// The durable credential slot: one ron file in the state directory.
/// A missing or unreadable file reads as logged out.
pub struct FileCredentialStore {
    writer: AtomicFileWriter,
}

impl FileCredentialStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    fn path(&self) -> PathBuf {
        self.writer.dir().join(SESSION_FILENAME)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                deck_warn!("Failed to read session file {:?}: {}", path, err);
                return None;
            }
        };
        match ron::from_str::<PersistedSession>(&content) {
            Ok(session) => session.auth_token.filter(|token| !token.is_empty()),
            Err(err) => {
                deck_warn!("Failed to parse session file {:?}: {}", path, err);
                None
            }
        }
    }

    fn save(&self, credential: &str) {
        let session = PersistedSession {
            auth_token: Some(credential.to_string()),
        };
        let content = match ron::ser::to_string_pretty(&session, ron::ser::PrettyConfig::new()) {
            Ok(text) => text,
            Err(err) => {
                deck_error!("Failed to serialize session: {}", err);
                return;
            }
        };
        match self.writer.write(SESSION_FILENAME, &content) {
            Ok(path) => deck_debug!("Credential stored at {:?}", path),
            Err(err) => deck_error!("Failed to write session file: {}", err),
        }
    }

    fn clear(&self) {
        if let Err(err) = self.writer.remove(SESSION_FILENAME) {
            deck_error!("Failed to remove session file: {}", err);
        }
    }
}

impl TokenSource for FileCredentialStore {
    fn bearer(&self) -> Option<String> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_credential_survives_a_new_store() {
        let temp = TempDir::new().unwrap();
        FileCredentialStore::new(temp.path().to_path_buf()).save("abc.def.ghi");

        let reopened = FileCredentialStore::new(temp.path().to_path_buf());
        assert_eq!(reopened.load().as_deref(), Some("abc.def.ghi"));
        assert_eq!(reopened.bearer().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn clear_removes_the_file() {
        let temp = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp.path().to_path_buf());
        store.save("token");
        store.clear();
        assert_eq!(store.load(), None);
        assert!(!temp.path().join(SESSION_FILENAME).exists());
        store.clear();
    }

    #[test]
    fn garbage_file_reads_as_logged_out() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SESSION_FILENAME), "{{ not ron").unwrap();
        let store = FileCredentialStore::new(temp.path().to_path_buf());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn session_store_round_trips_through_the_file() {
        use crawldeck_core::SessionStore;
        use std::sync::Arc;

        let temp = TempDir::new().unwrap();
        let file = Arc::new(FileCredentialStore::new(temp.path().to_path_buf()));
        let mut session = SessionStore::open(file.clone());
        assert!(session.login("not-a-token").is_none());
        assert_eq!(file.load(), None);
        session.logout();
        assert!(!temp.path().join(SESSION_FILENAME).exists());
    }
}
