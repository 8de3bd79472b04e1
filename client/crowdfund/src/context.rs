//! Composition root: one HTTP client, one storage handle, one session, and
//! every store built on top of them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;
use crate::errors::Result;
use crate::models::Recipient;
use crate::navigation::Navigator;
use crate::saga::{PayoutRequest, PayoutSaga};
use crate::storage::ClientStorage;
use crate::stores::articles::ArticleStore;
use crate::stores::auth::AuthStore;
use crate::stores::campaigns::CampaignStore;
use crate::stores::comments::CommentStore;
use crate::stores::donations::DonationStore;
use crate::stores::leaderboard::LeaderboardStore;
use crate::stores::points::PointStore;
use crate::stores::profile::ProfileStore;
use crate::stores::rewards::RewardStore;
use crate::stores::transfers::TransferStore;
use crate::stores::updates::UpdateStore;

pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub auth: AuthStore,
    pub campaigns: CampaignStore,
    pub donations: DonationStore,
    pub rewards: RewardStore,
    pub comments: CommentStore,
    pub updates: UpdateStore,
    pub transfers: TransferStore,
    pub leaderboard: LeaderboardStore,
    pub points: PointStore,
    pub articles: ArticleStore,
    pub profile: ProfileStore,
}

impl AppContext {
    /// Open storage, restore the session and construct every store.
    pub async fn build(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let storage = ClientStorage::open(&config.storage_url).await?;
        Self::with_parts(config, http, storage, navigator).await
    }

    /// Like [`AppContext::build`] but with caller-supplied HTTP client and storage.
    pub async fn with_parts(
        config: Config,
        http: Client,
        storage: ClientStorage,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let api = ApiClient::new(http, config.api_base_url.clone());
        let auth = AuthStore::hydrate(storage, navigator.clone(), config.login_route.clone()).await?;
        let session = auth.reader();

        info!("Client context ready for {}", api.base_url());
        Ok(Self {
            campaigns: CampaignStore::new(api.clone(), session.clone()),
            donations: DonationStore::new(api.clone(), session.clone(), navigator),
            rewards: RewardStore::new(api.clone(), session.clone()),
            comments: CommentStore::new(api.clone(), session.clone()),
            updates: UpdateStore::new(api.clone(), session.clone()),
            transfers: TransferStore::new(api.clone(), session.clone()),
            leaderboard: LeaderboardStore::new(api.clone(), session.clone()),
            points: PointStore::new(api.clone(), session.clone()),
            articles: ArticleStore::new(api.clone(), session.clone()),
            profile: ProfileStore::new(api.clone(), session),
            config,
            api,
            auth,
        })
    }

    /// A payout saga bound to this context's transfer store and retry budget.
    pub fn payout(&self, request: PayoutRequest, recipient: Option<Recipient>) -> PayoutSaga {
        let attempts = self.config.payout_max_attempts;
        match recipient {
            Some(recipient) => {
                PayoutSaga::with_recipient(self.transfers.clone(), request, recipient, attempts)
            }
            None => PayoutSaga::new(self.transfers.clone(), request, attempts),
        }
    }
}
