//! The signed-in user's own profile.

use crate::api::ApiClient;
use crate::errors::Result;
use crate::models::{Profile, ProfileInput};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: Option<Profile>,
}

#[derive(Clone)]
pub struct ProfileStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<ProfileState>,
}

impl ProfileStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("profile"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<ProfileState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<ProfileState> {
        self.state.subscribe()
    }

    /// `GET /users/profile`
    pub async fn fetch_profile(&self) -> Result<Profile> {
        let token = self
            .state
            .check("fetch_profile", self.session.require_token())?;
        self.state
            .run(
                "fetch_profile",
                self.api.get::<Profile>("/users/profile", Some(&token)),
                |s, profile: &Profile| s.profile = Some(profile.clone()),
            )
            .await
    }

    /// `PUT /users/profile`
    pub async fn update_profile(&self, input: &ProfileInput) -> Result<Profile> {
        let token = self
            .state
            .check("update_profile", self.session.require_token())?;
        self.state
            .run(
                "update_profile",
                self.api
                    .put::<Profile, _>("/users/profile", input, Some(&token)),
                |s, profile: &Profile| s.profile = Some(profile.clone()),
            )
            .await
    }
}
