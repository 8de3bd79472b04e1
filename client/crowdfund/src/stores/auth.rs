//! Session holder: bearer token plus user record, mirrored to durable storage.
//!
//! The session is hydrated from storage before the store exists, so there is
//! no window in which an observer can see an empty session that is about to
//! be replaced. Other stores only ever get a [`SessionReader`].

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::errors::{ClientError, Result};
use crate::models::{LoginResponse, User};
use crate::navigation::Navigator;
use crate::storage::{ClientStorage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Read-only view of the session for stores that need the token.
#[derive(Clone, Debug)]
pub struct SessionReader {
    rx: watch::Receiver<Session>,
}

impl SessionReader {
    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.rx.borrow().user.clone()
    }

    /// The bearer token, or [`ClientError::MissingToken`].
    pub fn require_token(&self) -> Result<String> {
        self.token().ok_or(ClientError::MissingToken)
    }

    /// A reader pinned to a fixed session, for hosts that never log in.
    pub fn detached(session: Session) -> Self {
        let (_tx, rx) = watch::channel(session);
        Self { rx }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct AuthStore {
    session: watch::Sender<Session>,
    storage: ClientStorage,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl AuthStore {
    /// Build the store with whatever session durable storage already holds.
    pub async fn hydrate(
        storage: ClientStorage,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Result<Self> {
        let token = storage.get_item(TOKEN_KEY).await?;
        let user = match storage.get_item(USER_KEY).await? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Discarding unreadable stored user: {e}");
                    None
                }
            },
            None => None,
        };

        if token.is_some() {
            info!("Restored session from client storage");
        }

        let (session, _) = watch::channel(Session { user, token });
        Ok(Self {
            session,
            storage,
            navigator,
            login_route: login_route.into(),
        })
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.session.subscribe(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Persist a login response and make it the current session.
    pub async fn login(&self, response: LoginResponse) -> Result<()> {
        let user_json = serde_json::to_string(&response.user)?;
        self.storage.set_item(USER_KEY, &user_json).await?;
        self.storage.set_item(TOKEN_KEY, &response.token).await?;

        info!("Logged in as {}", response.user.display_name());
        self.session.send_replace(Session {
            user: Some(response.user),
            token: Some(response.token),
        });
        Ok(())
    }

    /// Exchange credentials for a session at `POST /auth/login`.
    pub async fn sign_in(&self, api: &ApiClient, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::precondition("Email and password are required"));
        }
        let response: LoginResponse = api
            .post("/auth/login", &Credentials { email, password }, None)
            .await?;
        let user = response.user.clone();
        self.login(response).await?;
        Ok(user)
    }

    /// Forget the session everywhere and send the user to the login route.
    pub async fn logout(&self) -> Result<()> {
        self.storage.remove_item(USER_KEY).await?;
        self.storage.remove_item(TOKEN_KEY).await?;
        self.session.send_replace(Session::default());
        info!("Logged out");
        self.navigator.navigate(&self.login_route);
        Ok(())
    }
}
