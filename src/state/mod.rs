mod post_create;

pub(crate) use post_create::{run_post_create, PostCreateTarget};

use crate::api::{ApiClient, LoginData};
use crate::models::User;
use crate::storage::{LocalSession, Session};
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    api: StoredValue<ApiClient>,
    store: LocalSession,

    /// Mirrors `localStorage`; route guards and the header read this.
    pub session: RwSignal<Session>,
}

impl AppState {
    pub fn new() -> Self {
        let store = LocalSession;
        Self {
            api: StoredValue::new(ApiClient::from_env(Arc::new(store))),
            session: RwSignal::new(store.load()),
            store,
        }
    }

    pub fn api(&self) -> ApiClient {
        self.api.get_value()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.with(Session::is_authenticated)
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.with(|s| s.user.clone())
    }

    pub fn sign_in(&self, token: &str, user: User) {
        self.store.save_token(token);
        self.store.save_user(&user);
        self.session.set(Session {
            token: Some(token.to_string()),
            user: Some(user),
        });
    }

    pub fn sign_in_with(&self, data: LoginData) {
        self.sign_in(&data.token, data.user);
    }

    /// Tell the backend, then drop the local session whatever it answered.
    pub fn sign_out(&self) {
        let state = *self;
        spawn_local(async move {
            if let Err(e) = state.api().logout().await {
                warn!("Logout request failed, clearing local session anyway: {e}");
            }
            state.clear_local();
        });
    }

    /// The token was rejected: clear it and go to the sign-in page.
    pub fn expire_session(&self) {
        log!("Session expired");
        self.clear_local();
        let _ = window().location().set_href("/signin");
    }

    pub fn unauthorized_handler(&self) -> Callback<()> {
        let state = *self;
        Callback::new(move |_| state.expire_session())
    }

    fn clear_local(&self) {
        self.store.clear();
        self.session.set(Session::default());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
