//! Rewards offered by a campaign to its backers.

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{Listing, Reward, RewardInput};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardState {
    pub rewards: Vec<Reward>,
}

#[derive(Clone)]
pub struct RewardStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<RewardState>,
}

impl RewardStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("rewards"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<RewardState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<RewardState> {
        self.state.subscribe()
    }

    /// `GET /fundraisers/campaigns/{campaign_id}/rewards`
    pub async fn fetch_rewards(&self, campaign_id: &str) -> Result<Vec<Reward>> {
        require_campaign(&self.state, "fetch_rewards", campaign_id)?;
        let token = self.session.token();
        let path = self.state.check(
            "fetch_rewards",
            api::path(&["fundraisers", "campaigns", campaign_id, "rewards"]),
        )?;
        self.state
            .run(
                "fetch_rewards",
                async {
                    let listing: Listing<Reward> = self.api.get(&path, token.as_deref()).await?;
                    Ok(listing.into_parts().0)
                },
                |s, rewards: &Vec<Reward>| s.rewards = rewards.clone(),
            )
            .await
    }

    /// `POST /fundraisers/campaigns/{campaign_id}/rewards`
    pub async fn create_reward(&self, campaign_id: &str, input: &RewardInput) -> Result<Reward> {
        let token = self
            .state
            .check("create_reward", self.session.require_token())?;
        require_campaign(&self.state, "create_reward", campaign_id)?;
        let path = self.state.check(
            "create_reward",
            api::path(&["fundraisers", "campaigns", campaign_id, "rewards"]),
        )?;
        self.state
            .run(
                "create_reward",
                self.api.post::<Reward, _>(&path, input, Some(&token)),
                |s, reward: &Reward| s.rewards.push(reward.clone()),
            )
            .await
    }

    /// `PUT /fundraisers/campaigns/{campaign_id}/rewards/{reward_id}`
    pub async fn update_reward(
        &self,
        campaign_id: &str,
        reward_id: &str,
        input: &RewardInput,
    ) -> Result<Reward> {
        let token = self
            .state
            .check("update_reward", self.session.require_token())?;
        require_campaign(&self.state, "update_reward", campaign_id)?;
        require_id(&self.state, "update_reward", reward_id, "Reward ID not found")?;
        let path = self.state.check(
            "update_reward",
            api::path(&["fundraisers", "campaigns", campaign_id, "rewards", reward_id]),
        )?;
        self.state
            .run(
                "update_reward",
                self.api.put::<Reward, _>(&path, input, Some(&token)),
                |s, reward: &Reward| {
                    for existing in s.rewards.iter_mut().filter(|r| r.id.matches(reward_id)) {
                        *existing = reward.clone();
                    }
                },
            )
            .await
    }

    /// `DELETE /fundraisers/campaigns/{campaign_id}/rewards/{reward_id}`
    pub async fn delete_reward(&self, campaign_id: &str, reward_id: &str) -> Result<()> {
        let token = self
            .state
            .check("delete_reward", self.session.require_token())?;
        require_campaign(&self.state, "delete_reward", campaign_id)?;
        require_id(&self.state, "delete_reward", reward_id, "Reward ID not found")?;
        let path = self.state.check(
            "delete_reward",
            api::path(&["fundraisers", "campaigns", campaign_id, "rewards", reward_id]),
        )?;
        self.state
            .run("delete_reward", self.api.delete(&path, Some(&token)), |s, _| {
                s.rewards.retain(|r| !r.id.matches(reward_id))
            })
            .await
    }
}

/// Shared by every campaign-scoped child store.
pub(crate) fn require_campaign<S: Clone + Default>(
    state: &Store<S>,
    op: &'static str,
    campaign_id: &str,
) -> Result<()> {
    require_id(state, op, campaign_id, "Campaign ID not found")
}

/// A blank id would address the parent collection instead of one record.
pub(crate) fn require_id<S: Clone + Default>(
    state: &Store<S>,
    op: &'static str,
    id: &str,
    message: &'static str,
) -> Result<()> {
    if id.trim().is_empty() {
        return state.reject(op, ClientError::precondition(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::testing::{api, signed_in, signed_out, BEARER};

    const REWARDS: &str = r#"[
        {"id": 7, "title": "Thank-you card", "amount": "10.00"},
        {"id": 8, "title": "T-shirt", "minimum_amount": 50}
    ]"#;

    async fn loaded(server: &mut mockito::ServerGuard) -> RewardStore {
        server
            .mock("GET", "/fundraisers/campaigns/42/rewards")
            .with_status(200)
            .with_body(REWARDS)
            .create_async()
            .await;
        let store = RewardStore::new(api(server), signed_in());
        store.fetch_rewards("42").await.unwrap();
        store
    }

    #[tokio::test]
    async fn delete_removes_reward_by_id() {
        let mut server = mockito::Server::new_async().await;
        let store = loaded(&mut server).await;
        let mock = server
            .mock("DELETE", "/fundraisers/campaigns/42/rewards/7")
            .match_header("authorization", BEARER)
            .with_status(200)
            .with_body(r#"{"detail":"deleted"}"#)
            .create_async()
            .await;

        store.delete_reward("42", "7").await.unwrap();

        let snap = store.snapshot();
        assert!(snap.data.rewards.iter().all(|r| !r.id.matches("7")));
        assert_eq!(snap.data.rewards.len(), 1);
        assert_eq!(snap.error, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_delete_leaves_rewards_and_sets_error() {
        let mut server = mockito::Server::new_async().await;
        let store = loaded(&mut server).await;
        server
            .mock("DELETE", "/fundraisers/campaigns/42/rewards/7")
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let before = store.snapshot().data.rewards;
        let err = store.delete_reward("42", "7").await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        let snap = store.snapshot();
        assert_eq!(snap.data.rewards, before);
        assert_eq!(snap.error.as_deref(), Some("Not found."));
    }

    #[tokio::test]
    async fn create_and_update_map_the_list() {
        let mut server = mockito::Server::new_async().await;
        let store = loaded(&mut server).await;
        server
            .mock("POST", "/fundraisers/campaigns/42/rewards")
            .match_body(Matcher::PartialJson(json!({ "title": "Poster", "amount": "25" })))
            .with_status(201)
            .with_body(r#"{"id": 9, "title": "Poster", "amount": "25.00"}"#)
            .create_async()
            .await;
        server
            .mock("PUT", "/fundraisers/campaigns/42/rewards/8")
            .with_status(200)
            .with_body(r#"{"id": 8, "title": "Hoodie", "amount": "60.00"}"#)
            .create_async()
            .await;

        let poster = RewardInput {
            title: "Poster".to_string(),
            description: "A2 print".to_string(),
            amount: "25".to_string(),
            ..RewardInput::default()
        };
        store.create_reward("42", &poster).await.unwrap();
        let hoodie = RewardInput {
            title: "Hoodie".to_string(),
            amount: "60".to_string(),
            ..RewardInput::default()
        };
        store.update_reward("42", "8", &hoodie).await.unwrap();

        let titles: Vec<String> = store
            .snapshot()
            .data
            .rewards
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Thank-you card", "Hoodie", "Poster"]);
    }

    #[tokio::test]
    async fn mutations_require_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let store = RewardStore::new(api(&server), signed_out());
        let err = store.delete_reward("42", "7").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_campaign_id_is_rejected() {
        let server = mockito::Server::new_async().await;
        let store = RewardStore::new(api(&server), signed_in());
        let err = store.fetch_rewards("").await.unwrap_err();
        assert_eq!(err.to_string(), "Campaign ID not found");
        assert_eq!(store.snapshot().error.as_deref(), Some("Campaign ID not found"));
    }

    #[tokio::test]
    async fn blank_reward_id_never_reaches_the_collection() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let put = server.mock("PUT", Matcher::Any).expect(0).create_async().await;

        let store = RewardStore::new(api(&server), signed_in());
        let err = store.delete_reward("42", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Reward ID not found");
        let err = store
            .update_reward("42", " ", &RewardInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Reward ID not found");
        assert_eq!(store.snapshot().error.as_deref(), Some("Reward ID not found"));
        delete.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn reward_id_is_encoded_into_one_segment() {
        let mut server = mockito::Server::new_async().await;
        let campaign = server
            .mock("DELETE", "/fundraisers/campaigns/42")
            .expect(0)
            .create_async()
            .await;
        let encoded = server
            .mock("DELETE", "/fundraisers/campaigns/42/rewards/..%2F..%3Fx")
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let store = RewardStore::new(api(&server), signed_in());
        let err = store.delete_reward("42", "../..?x").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let err = store.delete_reward("42", "..").await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(_)));
        campaign.assert_async().await;
        encoded.assert_async().await;
    }
}
