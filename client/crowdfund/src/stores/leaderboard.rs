//! Platform and per-campaign leaderboards with their ranked entries.

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{Leaderboard, LeaderboardEntry, Listing};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardState {
    pub leaderboards: Vec<Leaderboard>,
    /// Leaderboard of the campaign last asked for.
    pub campaign_leaderboard: Option<Leaderboard>,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone)]
pub struct LeaderboardStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<LeaderboardState>,
}

impl LeaderboardStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("leaderboard"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<LeaderboardState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<LeaderboardState> {
        self.state.subscribe()
    }

    /// `GET /leaderboard/leaderboards`
    pub async fn fetch_leaderboards(&self) -> Result<Vec<Leaderboard>> {
        let token = self.session.token();
        self.state
            .run(
                "fetch_leaderboards",
                async {
                    let listing: Listing<Leaderboard> = self
                        .api
                        .get("/leaderboard/leaderboards", token.as_deref())
                        .await?;
                    Ok(listing.into_parts().0)
                },
                |s, boards: &Vec<Leaderboard>| s.leaderboards = boards.clone(),
            )
            .await
    }

    /// `GET /leaderboard/campaign/{campaign_id}`
    pub async fn fetch_campaign_leaderboard(&self, campaign_id: &str) -> Result<Leaderboard> {
        if campaign_id.trim().is_empty() {
            return self.state.reject(
                "fetch_campaign_leaderboard",
                ClientError::precondition("Campaign ID not found"),
            );
        }
        let token = self.session.token();
        let path = self.state.check(
            "fetch_campaign_leaderboard",
            api::path(&["leaderboard", "campaign", campaign_id]),
        )?;
        self.state
            .run(
                "fetch_campaign_leaderboard",
                self.api.get::<Leaderboard>(&path, token.as_deref()),
                |s, board: &Leaderboard| s.campaign_leaderboard = Some(board.clone()),
            )
            .await
    }

    /// `GET /leaderboard_entry/leaderboard/{leaderboard_id}`
    pub async fn fetch_leaderboard_entries(
        &self,
        leaderboard_id: &str,
    ) -> Result<Vec<LeaderboardEntry>> {
        if leaderboard_id.trim().is_empty() {
            return self.state.reject(
                "fetch_leaderboard_entries",
                ClientError::precondition("Leaderboard ID not found"),
            );
        }
        let token = self.session.token();
        let path = self.state.check(
            "fetch_leaderboard_entries",
            api::path(&["leaderboard_entry", "leaderboard", leaderboard_id]),
        )?;
        self.state
            .run(
                "fetch_leaderboard_entries",
                async {
                    let listing: Listing<LeaderboardEntry> =
                        self.api.get(&path, token.as_deref()).await?;
                    Ok(listing.into_parts().0)
                },
                |s, entries: &Vec<LeaderboardEntry>| s.entries = entries.clone(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api, signed_out};

    #[tokio::test]
    async fn reads_boards_and_entries() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leaderboard/leaderboards")
            .with_status(200)
            .with_body(r#"[{"id": 1, "name": "Top backers", "campaign": 12}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/leaderboard/campaign/12")
            .with_status(200)
            .with_body(r#"{"id": 1, "name": "Top backers", "campaign": "12"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/leaderboard_entry/leaderboard/1")
            .with_status(200)
            .with_body(
                r#"{"results": [
                    {"rank": 1, "points": 900, "user": {"id": 4, "username": "ada"}},
                    {"rank": 2, "points": 400, "amount": "120.50"}
                ]}"#,
            )
            .create_async()
            .await;

        let store = LeaderboardStore::new(api(&server), signed_out());
        store.fetch_leaderboards().await.unwrap();
        let board = store.fetch_campaign_leaderboard("12").await.unwrap();
        let entries = store.fetch_leaderboard_entries("1").await.unwrap();

        assert!(board.campaign.as_ref().is_some_and(|c| c.matches("12")));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, Some(1));
        let snap = store.snapshot();
        assert_eq!(snap.data.leaderboards.len(), 1);
        assert_eq!(snap.data.campaign_leaderboard, Some(board));
    }

    #[tokio::test]
    async fn missing_board_keeps_previous_entries() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leaderboard_entry/leaderboard/1")
            .with_status(200)
            .with_body(r#"[{"rank": 1, "points": 10}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/leaderboard_entry/leaderboard/99")
            .with_status(404)
            .with_body(r#"{"detail": "Leaderboard not found"}"#)
            .create_async()
            .await;

        let store = LeaderboardStore::new(api(&server), signed_out());
        store.fetch_leaderboard_entries("1").await.unwrap();
        store.fetch_leaderboard_entries("99").await.unwrap_err();

        let snap = store.snapshot();
        assert_eq!(snap.data.entries.len(), 1);
        assert_eq!(snap.error.as_deref(), Some("Leaderboard not found"));
    }
}
