//! Loyalty points and the rewards backers have earned.

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{BackerReward, Listing, PointBalance};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointState {
    pub balance: Option<PointBalance>,
    pub backer_rewards: Vec<BackerReward>,
}

#[derive(Clone)]
pub struct PointStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<PointState>,
}

impl PointStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("points"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<PointState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<PointState> {
        self.state.subscribe()
    }

    /// `GET /points/my_points`
    pub async fn fetch_my_points(&self) -> Result<PointBalance> {
        let token = self
            .state
            .check("fetch_my_points", self.session.require_token())?;
        self.state
            .run(
                "fetch_my_points",
                self.api.get::<PointBalance>("/points/my_points", Some(&token)),
                |s, balance: &PointBalance| s.balance = Some(balance.clone()),
            )
            .await
    }

    /// `GET /backer_rewards/my_rewards`
    pub async fn fetch_backer_rewards(&self) -> Result<Vec<BackerReward>> {
        let token = self
            .state
            .check("fetch_backer_rewards", self.session.require_token())?;
        self.state
            .run(
                "fetch_backer_rewards",
                async {
                    let listing: Listing<BackerReward> = self
                        .api
                        .get("/backer_rewards/my_rewards", Some(&token))
                        .await?;
                    Ok(listing.into_parts().0)
                },
                |s, rewards: &Vec<BackerReward>| s.backer_rewards = rewards.clone(),
            )
            .await
    }

    /// `GET /backer_rewards/campaign/{campaign_id}`
    pub async fn fetch_campaign_backer_rewards(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<BackerReward>> {
        let op = "fetch_campaign_backer_rewards";
        let token = self.state.check(op, self.session.require_token())?;
        if campaign_id.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition("Campaign ID not found"));
        }
        let path = self.state.check(op, api::path(&["backer_rewards", "campaign", campaign_id]))?;
        self.state
            .run(
                op,
                async {
                    let listing: Listing<BackerReward> = self.api.get(&path, Some(&token)).await?;
                    Ok(listing.into_parts().0)
                },
                |s, rewards: &Vec<BackerReward>| s.backer_rewards = rewards.clone(),
            )
            .await
    }
}
