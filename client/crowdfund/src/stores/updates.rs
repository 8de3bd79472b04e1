//! Progress updates posted by a campaign's owner.

use crate::api::{self, ApiClient};
use crate::errors::Result;
use crate::models::{Listing, Update, UpdateInput};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;
use crate::stores::rewards::{require_campaign, require_id};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateState {
    pub updates: Vec<Update>,
}

#[derive(Clone)]
pub struct UpdateStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<UpdateState>,
}

impl UpdateStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("updates"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<UpdateState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<UpdateState> {
        self.state.subscribe()
    }

    /// `GET /fundraisers/campaigns/{campaign_id}/updates`
    pub async fn fetch_updates(&self, campaign_id: &str) -> Result<Vec<Update>> {
        require_campaign(&self.state, "fetch_updates", campaign_id)?;
        let token = self.session.token();
        let path = self.state.check(
            "fetch_updates",
            api::path(&["fundraisers", "campaigns", campaign_id, "updates"]),
        )?;
        self.state
            .run(
                "fetch_updates",
                async {
                    let listing: Listing<Update> = self.api.get(&path, token.as_deref()).await?;
                    Ok(listing.into_parts().0)
                },
                |s, updates: &Vec<Update>| s.updates = updates.clone(),
            )
            .await
    }

    pub async fn create_update(&self, campaign_id: &str, input: &UpdateInput) -> Result<Update> {
        let token = self
            .state
            .check("create_update", self.session.require_token())?;
        require_campaign(&self.state, "create_update", campaign_id)?;
        let path = self.state.check(
            "create_update",
            api::path(&["fundraisers", "campaigns", campaign_id, "updates"]),
        )?;
        self.state
            .run(
                "create_update",
                self.api.post::<Update, _>(&path, input, Some(&token)),
                |s, update: &Update| s.updates.push(update.clone()),
            )
            .await
    }

    pub async fn edit_update(
        &self,
        campaign_id: &str,
        update_id: &str,
        input: &UpdateInput,
    ) -> Result<Update> {
        let token = self
            .state
            .check("edit_update", self.session.require_token())?;
        require_campaign(&self.state, "edit_update", campaign_id)?;
        require_id(&self.state, "edit_update", update_id, "Update ID not found")?;
        let path = self.state.check(
            "edit_update",
            api::path(&["fundraisers", "campaigns", campaign_id, "updates", update_id]),
        )?;
        self.state
            .run(
                "edit_update",
                self.api.put::<Update, _>(&path, input, Some(&token)),
                |s, update: &Update| {
                    for existing in s.updates.iter_mut().filter(|u| u.id.matches(update_id)) {
                        *existing = update.clone();
                    }
                },
            )
            .await
    }

    pub async fn delete_update(&self, campaign_id: &str, update_id: &str) -> Result<()> {
        let token = self
            .state
            .check("delete_update", self.session.require_token())?;
        require_campaign(&self.state, "delete_update", campaign_id)?;
        require_id(&self.state, "delete_update", update_id, "Update ID not found")?;
        let path = self.state.check(
            "delete_update",
            api::path(&["fundraisers", "campaigns", campaign_id, "updates", update_id]),
        )?;
        self.state
            .run("delete_update", self.api.delete(&path, Some(&token)), |s, _| {
                s.updates.retain(|u| !u.id.matches(update_id))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::errors::ClientError;
    use crate::testing::{api, signed_in, signed_out, BEARER};

    #[tokio::test]
    async fn crud_round() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fundraisers/campaigns/5/updates")
            .with_status(200)
            .with_body(r#"[{"id": 1, "title": "Week 1", "content": "Started"}]"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/fundraisers/campaigns/5/updates")
            .match_header("authorization", BEARER)
            .with_status(201)
            .with_body(r#"{"id": 2, "title": "Week 2", "content": "Halfway"}"#)
            .create_async()
            .await;
        server
            .mock("PUT", "/fundraisers/campaigns/5/updates/2")
            .with_status(200)
            .with_body(r#"{"id": 2, "title": "Week 2", "content": "Halfway there"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/fundraisers/campaigns/5/updates/1")
            .with_status(204)
            .create_async()
            .await;

        let store = UpdateStore::new(api(&server), signed_in());
        store.fetch_updates("5").await.unwrap();
        store
            .create_update(
                "5",
                &UpdateInput {
                    title: "Week 2".to_string(),
                    content: "Halfway".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .edit_update(
                "5",
                "2",
                &UpdateInput {
                    title: "Week 2".to_string(),
                    content: "Halfway there".to_string(),
                },
            )
            .await
            .unwrap();
        store.delete_update("5", "1").await.unwrap();

        let updates = store.snapshot().data.updates;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].content, "Halfway there");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn posting_requires_session() {
        let server = mockito::Server::new_async().await;
        let store = UpdateStore::new(api(&server), signed_out());
        let err = store
            .create_update("5", &UpdateInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }

    #[tokio::test]
    async fn blank_update_id_is_rejected_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let put = server.mock("PUT", Matcher::Any).expect(0).create_async().await;

        let store = UpdateStore::new(api(&server), signed_in());
        let err = store.delete_update("5", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Update ID not found");
        let err = store
            .edit_update("5", "", &UpdateInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Update ID not found");
        delete.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn update_id_with_query_characters_stays_in_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/fundraisers/campaigns/5/updates/1%3Fforce=true")
            .match_header("authorization", BEARER)
            .with_status(204)
            .create_async()
            .await;

        let store = UpdateStore::new(api(&server), signed_in());
        store.delete_update("5", "1?force=true").await.unwrap();
        mock.assert_async().await;
    }
}
