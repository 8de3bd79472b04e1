//! Comments on a campaign. Anyone may comment; without a session the
//! backend needs an email address instead of a token.

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{Comment, CommentInput, Listing};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;
use crate::stores::rewards::{require_campaign, require_id};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentState {
    pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct CommentStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<CommentState>,
}

impl CommentStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("comments"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<CommentState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<CommentState> {
        self.state.subscribe()
    }

    /// `GET /fundraisers/campaigns/{campaign_id}/comments`
    pub async fn fetch_comments(&self, campaign_id: &str) -> Result<Vec<Comment>> {
        require_campaign(&self.state, "fetch_comments", campaign_id)?;
        let token = self.session.token();
        let path = self.state.check(
            "fetch_comments",
            api::path(&["fundraisers", "campaigns", campaign_id, "comments"]),
        )?;
        self.state
            .run(
                "fetch_comments",
                async {
                    let listing: Listing<Comment> = self.api.get(&path, token.as_deref()).await?;
                    Ok(listing.into_parts().0)
                },
                |s, comments: &Vec<Comment>| s.comments = comments.clone(),
            )
            .await
    }

    /// `POST /fundraisers/campaigns/{campaign_id}/comments`
    pub async fn create_comment(&self, campaign_id: &str, input: &CommentInput) -> Result<Comment> {
        let op = "create_comment";
        require_campaign(&self.state, op, campaign_id)?;
        if input.content.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition("Comment cannot be empty"));
        }
        let token = self.session.token();
        let anonymous_without_email = token.is_none()
            && input
                .email
                .as_deref()
                .map_or(true, |email| email.trim().is_empty());
        if anonymous_without_email {
            return self.state.reject(
                op,
                ClientError::precondition("Email is required to comment anonymously"),
            );
        }

        let path = self.state.check(
            op,
            api::path(&["fundraisers", "campaigns", campaign_id, "comments"]),
        )?;
        self.state
            .run(
                op,
                self.api.post::<Comment, _>(&path, input, token.as_deref()),
                |s, comment: &Comment| s.comments.push(comment.clone()),
            )
            .await
    }

    /// `PUT /fundraisers/campaigns/{campaign_id}/comments/{comment_id}`
    pub async fn update_comment(
        &self,
        campaign_id: &str,
        comment_id: &str,
        input: &CommentInput,
    ) -> Result<Comment> {
        let token = self
            .state
            .check("update_comment", self.session.require_token())?;
        require_campaign(&self.state, "update_comment", campaign_id)?;
        require_id(&self.state, "update_comment", comment_id, "Comment ID not found")?;
        let path = self.state.check(
            "update_comment",
            api::path(&["fundraisers", "campaigns", campaign_id, "comments", comment_id]),
        )?;
        self.state
            .run(
                "update_comment",
                self.api.put::<Comment, _>(&path, input, Some(&token)),
                |s, comment: &Comment| {
                    for existing in s.comments.iter_mut().filter(|c| c.id.matches(comment_id)) {
                        *existing = comment.clone();
                    }
                },
            )
            .await
    }

    /// `DELETE /fundraisers/campaigns/{campaign_id}/comments/{comment_id}`
    pub async fn delete_comment(&self, campaign_id: &str, comment_id: &str) -> Result<()> {
        let token = self
            .state
            .check("delete_comment", self.session.require_token())?;
        require_campaign(&self.state, "delete_comment", campaign_id)?;
        require_id(&self.state, "delete_comment", comment_id, "Comment ID not found")?;
        let path = self.state.check(
            "delete_comment",
            api::path(&["fundraisers", "campaigns", campaign_id, "comments", comment_id]),
        )?;
        self.state
            .run("delete_comment", self.api.delete(&path, Some(&token)), |s, _| {
                s.comments.retain(|c| !c.id.matches(comment_id))
            })
            .await
    }
}
