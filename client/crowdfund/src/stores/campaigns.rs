//! Campaigns: the signed-in user's own list, the public listing, a single
//! campaign, dashboard statistics and favourites.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{Campaign, CampaignInput, CampaignStatistics, Listing, Pagination};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

const CAMPAIGN_ID_NOT_FOUND: &str = "Campaign ID not found";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignState {
    pub campaigns: Vec<Campaign>,
    pub current_campaign: Option<Campaign>,
    pub statistics: Option<CampaignStatistics>,
    pub favorites: Vec<Campaign>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Parameters of the public campaign listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignQuery {
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
    /// Extra backend filters (`status`, `category`, `search`, ...).
    pub filters: BTreeMap<String, String>,
}

impl Default for CampaignQuery {
    fn default() -> Self {
        Self {
            sort_by: "created_at".to_string(),
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: 12,
            filters: BTreeMap::new(),
        }
    }
}

impl CampaignQuery {
    fn to_pairs(&self) -> Vec<(String, String)> {
        let order = match self.sort_order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        let mut pairs = vec![
            ("sort_by".to_string(), self.sort_by.clone()),
            ("sort_order".to_string(), order.to_string()),
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

#[derive(Clone)]
pub struct CampaignStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<CampaignState>,
}

impl CampaignStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("campaigns"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<CampaignState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<CampaignState> {
        self.state.subscribe()
    }

    // ─────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────

    /// `GET /fundraisers/campaigns`: campaigns owned by the signed-in user.
    pub async fn fetch_campaigns(&self) -> Result<Vec<Campaign>> {
        let token = self.state.check("fetch_campaigns", self.session.require_token())?;
        self.state
            .run(
                "fetch_campaigns",
                async {
                    let listing: Listing<Campaign> =
                        self.api.get("/fundraisers/campaigns", Some(&token)).await?;
                    Ok(listing.into_parts().0)
                },
                |s, campaigns: &Vec<Campaign>| s.campaigns = campaigns.clone(),
            )
            .await
    }

    /// `GET /fundraisers/campaigns/all`: the public, paginated listing.
    pub async fn fetch_all_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>> {
        let token = self.session.token();
        let pairs = query.to_pairs();
        let (campaigns, _) = self
            .state
            .run(
                "fetch_all_campaigns",
                async {
                    let listing: Listing<Campaign> = self
                        .api
                        .get_with_query("/fundraisers/campaigns/all", &pairs, token.as_deref())
                        .await?;
                    Ok(listing.into_parts())
                },
                |s, (campaigns, pagination): &(Vec<Campaign>, Option<Pagination>)| {
                    s.campaigns = campaigns.clone();
                    s.pagination = *pagination;
                },
            )
            .await?;
        Ok(campaigns)
    }

    /// `GET /fundraisers/campaigns/{id}`
    pub async fn fetch_campaign_by_id(&self, id: &str) -> Result<Campaign> {
        if id.trim().is_empty() {
            return self
                .state
                .reject("fetch_campaign_by_id", ClientError::precondition(CAMPAIGN_ID_NOT_FOUND));
        }
        let token = self.session.token();
        let path = self.state.check(
            "fetch_campaign_by_id",
            api::path(&["fundraisers", "campaigns", id]),
        )?;
        self.state
            .run(
                "fetch_campaign_by_id",
                self.api.get::<Campaign>(&path, token.as_deref()),
                |s, campaign: &Campaign| s.current_campaign = Some(campaign.clone()),
            )
            .await
    }

    /// `GET /fundraisers/campaigns/statistics`
    pub async fn fetch_campaign_statistics(&self) -> Result<CampaignStatistics> {
        let token = self.state.check("fetch_campaign_statistics", self.session.require_token())?;
        self.state
            .run(
                "fetch_campaign_statistics",
                self.api
                    .get::<CampaignStatistics>("/fundraisers/campaigns/statistics", Some(&token)),
                |s, stats: &CampaignStatistics| s.statistics = Some(stats.clone()),
            )
            .await
    }

    /// `GET /fundraisers/campaigns/favorites`
    pub async fn fetch_favorited_campaigns(&self) -> Result<Vec<Campaign>> {
        let token = self.state.check("fetch_favorited_campaigns", self.session.require_token())?;
        self.state
            .run(
                "fetch_favorited_campaigns",
                async {
                    let listing: Listing<Campaign> = self
                        .api
                        .get("/fundraisers/campaigns/favorites", Some(&token))
                        .await?;
                    Ok(listing.into_parts().0)
                },
                |s, favorites: &Vec<Campaign>| s.favorites = favorites.clone(),
            )
            .await
    }

    // ─────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────

    /// `POST /fundraisers/campaigns`
    pub async fn add_campaign(&self, input: &CampaignInput) -> Result<Campaign> {
        let token = self.state.check("add_campaign", self.session.require_token())?;
        self.state
            .run(
                "add_campaign",
                self.api
                    .post::<Campaign, _>("/fundraisers/campaigns", input, Some(&token)),
                |s, campaign: &Campaign| s.campaigns.push(campaign.clone()),
            )
            .await
    }

    /// `PUT /fundraisers/campaigns/{id}`
    pub async fn edit_campaign(&self, id: &str, input: &CampaignInput) -> Result<Campaign> {
        let token = self.require("edit_campaign", id)?;
        let path = self.state.check("edit_campaign", api::path(&["fundraisers", "campaigns", id]))?;
        self.state
            .run(
                "edit_campaign",
                self.api.put::<Campaign, _>(&path, input, Some(&token)),
                |s, campaign: &Campaign| replace_campaign(s, id, campaign),
            )
            .await
    }

    /// `DELETE /fundraisers/campaigns/{id}`
    pub async fn delete_campaign(&self, id: &str) -> Result<()> {
        let token = self.require("delete_campaign", id)?;
        let path = self.state.check(
            "delete_campaign",
            api::path(&["fundraisers", "campaigns", id]),
        )?;
        self.state
            .run("delete_campaign", self.api.delete(&path, Some(&token)), |s, _| {
                s.campaigns.retain(|c| !c.id.matches(id));
                s.favorites.retain(|c| !c.id.matches(id));
                if s.current_campaign.as_ref().is_some_and(|c| c.id.matches(id)) {
                    s.current_campaign = None;
                }
            })
            .await
    }

    /// `POST /fundraisers/campaigns/{id}/cancel`
    pub async fn cancel_campaign(&self, id: &str) -> Result<Campaign> {
        let token = self.require("cancel_campaign", id)?;
        let path = self.state.check(
            "cancel_campaign",
            api::path(&["fundraisers", "campaigns", id, "cancel"]),
        )?;
        self.state
            .run(
                "cancel_campaign",
                self.api.post::<Campaign, _>(&path, &Value::Null, Some(&token)),
                |s, campaign: &Campaign| replace_campaign(s, id, campaign),
            )
            .await
    }

    /// `POST /fundraisers/campaigns/{id}/favorite`, then re-fetch favourites.
    pub async fn favorite_campaign(&self, id: &str) -> Result<Vec<Campaign>> {
        self.toggle_favorite(id, true).await
    }

    /// `DELETE /fundraisers/campaigns/{id}/favorite`, then re-fetch favourites.
    pub async fn unfavorite_campaign(&self, id: &str) -> Result<Vec<Campaign>> {
        self.toggle_favorite(id, false).await
    }

    async fn toggle_favorite(&self, id: &str, favorite: bool) -> Result<Vec<Campaign>> {
        let op = if favorite {
            "favorite_campaign"
        } else {
            "unfavorite_campaign"
        };
        let token = self.require(op, id)?;
        let path = self.state.check(op, api::path(&["fundraisers", "campaigns", id, "favorite"]))?;

        let request = async {
            if favorite {
                self.api
                    .post::<Value, _>(&path, &Value::Null, Some(&token))
                    .await
                    .map(|_| ())
            } else {
                self.api.delete(&path, Some(&token)).await
            }
        };
        self.state
            .run(op, request, |s, _| {
                let mark = |c: &mut Campaign| {
                    if c.id.matches(id) {
                        c.is_favorited = favorite;
                    }
                };
                s.campaigns.iter_mut().for_each(mark);
                s.current_campaign.iter_mut().for_each(mark);
            })
            .await?;

        // The backend recomputes favourite-derived fields, so the list is
        // re-read rather than patched.
        self.fetch_favorited_campaigns().await
    }

    /// Token check plus the non-empty id every single-campaign write needs.
    fn require(&self, op: &'static str, id: &str) -> Result<String> {
        let token = self.state.check(op, self.session.require_token())?;
        if id.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition(CAMPAIGN_ID_NOT_FOUND));
        }
        Ok(token)
    }
}

fn replace_campaign(state: &mut CampaignState, id: &str, updated: &Campaign) {
    for campaign in state.campaigns.iter_mut().filter(|c| c.id.matches(id)) {
        *campaign = updated.clone();
    }
    if let Some(current) = state.current_campaign.as_mut().filter(|c| c.id.matches(id)) {
        *current = updated.clone();
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::testing::{api, signed_in, signed_out, BEARER};

    const TWO_CAMPAIGNS: &str = r#"[
        {"id": 1, "title": "Clean water", "goal_amount": "5000.00"},
        {"id": 2, "title": "School roof", "goal_amount": "1200.00"}
    ]"#;

    #[tokio::test]
    async fn fetch_campaigns_replaces_slice_with_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fundraisers/campaigns")
            .match_header("authorization", BEARER)
            .with_status(200)
            .with_body(TWO_CAMPAIGNS)
            .expect(2)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        let first = store.fetch_campaigns().await.unwrap();
        let after_first = store.snapshot();
        let second = store.fetch_campaigns().await.unwrap();
        let after_second = store.snapshot();

        let expected: Vec<Campaign> = serde_json::from_str(TWO_CAMPAIGNS).unwrap();
        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(after_first.data.campaigns, expected);
        assert_eq!(after_second.data.campaigns, expected);
        assert!(!after_second.loading);
        assert_eq!(after_second.error, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_campaigns() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/fundraisers/campaigns")
            .with_status(200)
            .with_body(TWO_CAMPAIGNS)
            .expect(1)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        store.fetch_campaigns().await.unwrap();
        ok.assert_async().await;
        ok.remove_async().await;

        server
            .mock("GET", "/fundraisers/campaigns")
            .with_status(500)
            .with_body(r#"{"error":"boom"}"#)
            .create_async()
            .await;

        let err = store.fetch_campaigns().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        let snap = store.snapshot();
        assert_eq!(snap.data.campaigns.len(), 2);
        assert_eq!(snap.error.as_deref(), Some("boom"));
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn signed_out_fetch_short_circuits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_out());
        let err = store.fetch_campaigns().await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("Authentication token is missing")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn public_listing_sends_sort_and_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fundraisers/campaigns/all")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sort_by".into(), "goal_amount".into()),
                Matcher::UrlEncoded("sort_order".into(), "asc".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("page_size".into(), "10".into()),
                Matcher::UrlEncoded("category".into(), "health".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{ "id": 5, "title": "Clinic" }],
                    "count": 11,
                    "current_page": 2,
                    "total_pages": 2
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_out());
        let mut query = CampaignQuery {
            sort_by: "goal_amount".to_string(),
            sort_order: SortOrder::Asc,
            page: 2,
            page_size: 10,
            ..CampaignQuery::default()
        };
        query.filters.insert("category".to_string(), "health".to_string());
        query.filters.insert("search".to_string(), String::new());

        let campaigns = store.fetch_all_campaigns(&query).await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(
            store.snapshot().data.pagination,
            Some(Pagination {
                current_page: 2,
                total_pages: 2
            })
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_id_is_rejected_before_request() {
        let server = mockito::Server::new_async().await;
        let store = CampaignStore::new(api(&server), signed_in());
        let err = store.fetch_campaign_by_id("").await.unwrap_err();
        assert_eq!(err.to_string(), "Campaign ID not found");
        let err = store.delete_campaign(" ").await.unwrap_err();
        assert_eq!(err.to_string(), "Campaign ID not found");
    }

    #[tokio::test]
    async fn edit_and_delete_update_list_by_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fundraisers/campaigns")
            .with_status(200)
            .with_body(TWO_CAMPAIGNS)
            .create_async()
            .await;
        server
            .mock("PUT", "/fundraisers/campaigns/1")
            .match_header("authorization", BEARER)
            .with_status(200)
            .with_body(r#"{"id": 1, "title": "Clean water for all"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/fundraisers/campaigns/2")
            .with_status(204)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        store.fetch_campaigns().await.unwrap();

        let input = CampaignInput {
            title: "Clean water for all".to_string(),
            ..CampaignInput::default()
        };
        store.edit_campaign("1", &input).await.unwrap();
        store.delete_campaign("2").await.unwrap();

        let campaigns = store.snapshot().data.campaigns;
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].title, "Clean water for all");
    }

    #[tokio::test]
    async fn favorite_marks_record_and_refetches_favorites() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fundraisers/campaigns/1")
            .with_status(200)
            .with_body(r#"{"id": 1, "title": "Clean water", "is_favorited": false}"#)
            .create_async()
            .await;
        let favorite = server
            .mock("POST", "/fundraisers/campaigns/1/favorite")
            .match_header("authorization", BEARER)
            .with_status(201)
            .with_body(r#"{"detail":"Campaign favorited"}"#)
            .create_async()
            .await;
        let refetch = server
            .mock("GET", "/fundraisers/campaigns/favorites")
            .with_status(200)
            .with_body(r#"[{"id": 1, "title": "Clean water", "is_favorited": true}]"#)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        store.fetch_campaign_by_id("1").await.unwrap();
        let favorites = store.favorite_campaign("1").await.unwrap();

        assert_eq!(favorites.len(), 1);
        let snap = store.snapshot();
        assert!(snap.data.current_campaign.unwrap().is_favorited);
        assert_eq!(snap.data.favorites, favorites);
        favorite.assert_async().await;
        refetch.assert_async().await;
    }

    #[tokio::test]
    async fn cancel_replaces_record_with_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fundraisers/campaigns")
            .with_status(200)
            .with_body(TWO_CAMPAIGNS)
            .create_async()
            .await;
        server
            .mock("POST", "/fundraisers/campaigns/2/cancel")
            .with_status(200)
            .with_body(r#"{"id": 2, "title": "School roof", "status": "cancelled"}"#)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        store.fetch_campaigns().await.unwrap();
        store.cancel_campaign("2").await.unwrap();

        let campaigns = store.snapshot().data.campaigns;
        assert_eq!(campaigns[1].status.as_deref(), Some("cancelled"));
        assert_eq!(campaigns[0].status, None);
    }

    #[tokio::test]
    async fn statistics_slice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/fundraisers/campaigns/statistics")
            .with_status(200)
            .with_body(r#"{"total_campaigns": 4, "total_raised": "10500.50", "total_donors": 37}"#)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        let stats = store.fetch_campaign_statistics().await.unwrap();
        assert_eq!(stats.total_campaigns, Some(4));
        assert_eq!(store.snapshot().data.statistics, Some(stats));
    }

    #[tokio::test]
    async fn campaign_id_cannot_reach_a_sibling_route() {
        let mut server = mockito::Server::new_async().await;
        let sibling = server
            .mock("DELETE", "/fundraisers/campaigns/7/cancel")
            .expect(0)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/fundraisers/campaigns/7%2Fcancel")
            .match_header("authorization", BEARER)
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let store = CampaignStore::new(api(&server), signed_in());
        let err = store.delete_campaign("7/cancel").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let err = store.delete_campaign("..").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid path segment '..'");
        assert_eq!(
            store.snapshot().error.as_deref(),
            Some("Invalid path segment '..'")
        );
        sibling.assert_async().await;
        delete.assert_async().await;
    }
}
