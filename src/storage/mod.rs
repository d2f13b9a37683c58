use crate::models::User;
use serde::Serialize;

pub(crate) const TOKEN_KEY: &str = "authToken";
pub(crate) const USER_KEY: &str = "authUser";

/// Read side of the session, injected into the HTTP client.
///
/// Implementations must return the token as of *now*; the client calls this
/// once per request so a rotated token is picked up without rebuilding it.
pub(crate) trait SessionProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

/// Session persisted in `localStorage` under `authToken` / `authUser`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalSession;

impl SessionProvider for LocalSession {
    fn token(&self) -> Option<String> {
        local_storage()
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
            .filter(|t| !t.trim().is_empty())
    }
}

impl LocalSession {
    pub fn save_token(&self, token: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(TOKEN_KEY, token);
        }
    }

    pub fn save_user(&self, user: &User) {
        save_json_to_storage(USER_KEY, user);
    }

    /// Stored user, if any. A corrupt entry is treated as a broken session
    /// and wiped together with the token.
    pub fn load_user(&self) -> Option<User> {
        let storage = local_storage()?;
        let json = storage.get_item(USER_KEY).ok().flatten()?;
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(_) => {
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn load(&self) -> Session {
        let user = self.load_user();
        let token = self.token();
        Session { token, user }
    }
}

/// Snapshot of the signed-in state, mirrored into a signal for the UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::SessionProvider;
    use std::sync::{Arc, RwLock};

    /// In-memory token holder for tests; cloning shares the slot.
    #[derive(Clone, Default)]
    pub(crate) struct MemorySession(Arc<RwLock<Option<String>>>);

    impl MemorySession {
        pub fn with_token(token: &str) -> Self {
            let s = Self::default();
            s.set(Some(token));
            s
        }

        pub fn set(&self, token: Option<&str>) {
            if let Ok(mut slot) = self.0.write() {
                *slot = token.map(str::to_string);
            }
        }
    }

    impl SessionProvider for MemorySession {
        fn token(&self) -> Option<String> {
            self.0.read().ok().and_then(|t| t.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_requires_token_and_user() {
        let mut s = Session::default();
        assert!(!s.is_authenticated());

        s.token = Some("t".to_string());
        assert!(!s.is_authenticated());

        s.user = Some(User {
            id: 1,
            email: "u@example.com".to_string(),
            username: "u".to_string(),
            name: String::new(),
            role: None,
        });
        assert!(s.is_authenticated());
    }

    #[test]
    fn test_memory_session_reads_latest_token() {
        let s = memory::MemorySession::with_token("first");
        let reader = s.clone();
        assert_eq!(reader.token().as_deref(), Some("first"));

        s.set(Some("rotated"));
        assert_eq!(reader.token().as_deref(), Some("rotated"));

        s.set(None);
        assert!(reader.token().is_none());
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_local_session_roundtrip() {
        let session = LocalSession;
        session.clear();
        assert!(!session.load().is_authenticated());

        session.save_token("t1");
        session.save_user(&User {
            id: 1,
            email: "u@example.com".to_string(),
            username: "u".to_string(),
            name: "U".to_string(),
            role: None,
        });

        let loaded = session.load();
        assert!(loaded.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("t1"));

        session.clear();
        assert!(session.token().is_none());
    }

    #[wasm_bindgen_test]
    fn test_corrupt_user_clears_session() {
        let session = LocalSession;
        session.save_token("t2");
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(USER_KEY, "{not json");
        }
        assert!(session.load_user().is_none());
        assert!(session.token().is_none());
    }
}
