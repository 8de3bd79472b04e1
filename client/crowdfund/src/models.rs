//! Records mirrored from backend JSON responses.
//!
//! The client adds no identity or indexing of its own. Fields the backend
//! sends that are not modelled here are kept in each record's `extra` map so
//! that nothing is lost between parse and display.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type Extra = Map<String, Value>;

// ─────────────────────────────────────────────────────────
// Scalars
// ─────────────────────────────────────────────────────────

/// Backend identifier. The API is inconsistent about sending ids as JSON
/// numbers or strings, so both are accepted and compared textually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_to_string(deserializer).map(Id)
    }
}

/// Monetary amount as sent by the backend (decimal string or number).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(pub String);

impl Amount {
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Amount(s.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_to_string(deserializer).map(Amount)
    }
}

fn scalar_to_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

// ─────────────────────────────────────────────────────────
// Auth / users
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<Id>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self
                .username
                .clone()
                .or_else(|| self.email.clone())
                .unwrap_or_else(|| "anonymous".to_string()),
        }
    }
}

/// Body returned by the backend on a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(alias = "access", alias = "access_token")]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Option<Id>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Campaigns and their children
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub goal_amount: Option<Amount>,
    pub current_amount: Option<Amount>,
    pub transferred_amount: Option<Amount>,
    pub currency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub permissions: Vec<String>,
    pub promotions: Vec<Value>,
    pub rewards: Vec<Reward>,
    pub updates: Vec<Update>,
    pub comments: Vec<Comment>,
    #[serde(alias = "favorited")]
    pub is_favorited: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Campaign {
    /// Whole days from `today` until the campaign's end date; negative once it
    /// has ended. `None` when the backend sent no parseable end date.
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        let end = self.end_date.as_deref()?;
        let date_part = end.get(..10).unwrap_or(end);
        let end = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        Some((end - today).num_days())
    }
}

/// Payload for creating or editing a campaign.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignInput {
    pub title: String,
    pub description: String,
    pub goal_amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignStatistics {
    pub total_campaigns: Option<u64>,
    pub active_campaigns: Option<u64>,
    pub total_raised: Option<Amount>,
    pub total_donors: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reward {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "minimum_amount")]
    pub amount: Option<Amount>,
    pub quantity: Option<u64>,
    pub claimed: Option<u64>,
    pub estimated_delivery: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewardInput {
    pub title: String,
    pub description: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Update {
    pub id: Id,
    pub title: Option<String>,
    pub content: String,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub user: Option<User>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentInput {
    pub content: String,
    /// Required when commenting without a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Donations
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Donation {
    pub id: Id,
    pub amount: Option<Amount>,
    /// `None` for anonymous donations.
    pub donor: Option<User>,
    pub campaign: Option<Id>,
    pub status: Option<String>,
    pub reference: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationRequest {
    pub email: String,
    pub amount: String,
    pub fundraiser_id: String,
}

/// Where the payment processor wants the donor sent next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    #[serde(alias = "authorizationUrl")]
    pub authorization_url: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
}

/// The authorization is sent either bare or wrapped in a `data` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AuthorizationBody {
    Wrapped { data: PaymentAuthorization },
    Bare(PaymentAuthorization),
}

impl From<AuthorizationBody> for PaymentAuthorization {
    fn from(body: AuthorizationBody) -> Self {
        match body {
            AuthorizationBody::Wrapped { data } => data,
            AuthorizationBody::Bare(auth) => auth,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Transfers
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipient {
    pub id: Option<Id>,
    pub recipient_code: String,
    pub name: Option<String>,
    pub account_number: Option<String>,
    pub bank_code: Option<String>,
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipientInput {
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub id: Id,
    pub amount: Option<Amount>,
    pub status: Option<String>,
    pub reference: Option<String>,
    pub recipient: Option<Value>,
    pub reason: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferInput {
    pub amount: String,
    pub recipient_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bank {
    pub name: String,
    pub code: String,
    #[serde(flatten)]
    pub extra: Extra,
}

// ─────────────────────────────────────────────────────────
// Read-only aggregates
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leaderboard {
    pub id: Id,
    pub name: Option<String>,
    pub campaign: Option<Id>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardEntry {
    pub id: Option<Id>,
    pub rank: Option<u64>,
    pub user: Option<User>,
    pub points: Option<i64>,
    pub amount: Option<Amount>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointBalance {
    #[serde(alias = "points")]
    pub total_points: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackerReward {
    pub id: Id,
    pub reward: Option<Value>,
    pub campaign: Option<Id>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: Id,
    pub title: String,
    pub content: Option<String>,
    pub author: Option<Value>,
    pub published_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ─────────────────────────────────────────────────────────
// Listings
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

/// A paginated listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "results", alias = "data", alias = "articles", alias = "campaigns")]
    pub items: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default, alias = "currentPage", alias = "page")]
    pub current_page: Option<u32>,
    #[serde(default, alias = "totalPages")]
    pub total_pages: Option<u32>,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Option<Pagination> {
        Some(Pagination {
            current_page: self.current_page?,
            total_pages: self.total_pages?,
        })
    }
}

/// Either a bare JSON array or a [`Page`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Paged(Page<T>),
}

impl<T> Listing<T> {
    pub fn into_parts(self) -> (Vec<T>, Option<Pagination>) {
        match self {
            Listing::Plain(items) => (items, None),
            Listing::Paged(page) => {
                let pagination = page.pagination();
                (page.items, pagination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let a: Id = serde_json::from_value(json!(7)).unwrap();
        let b: Id = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(a, b);
        assert!(a.matches("7"));
        assert!(serde_json::from_value::<Id>(json!(null)).is_err());
    }

    #[test]
    fn campaign_keeps_unknown_fields() {
        let campaign: Campaign = serde_json::from_value(json!({
            "id": 1,
            "title": "Clean water",
            "goal_amount": "5000.00",
            "current_amount": 1200,
            "favorited": true,
            "category": "health"
        }))
        .unwrap();

        assert_eq!(campaign.id.as_str(), "1");
        assert_eq!(campaign.goal_amount.as_ref().and_then(Amount::as_f64), Some(5000.0));
        assert_eq!(campaign.current_amount, Some(Amount::from("1200")));
        assert!(campaign.is_favorited);
        assert_eq!(campaign.extra.get("category"), Some(&json!("health")));
    }

    #[test]
    fn days_remaining_from_end_date() {
        let campaign = Campaign {
            end_date: Some("2024-03-10T00:00:00Z".to_string()),
            ..Campaign::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(campaign.days_remaining(today), Some(9));

        let open_ended = Campaign::default();
        assert_eq!(open_ended.days_remaining(today), None);
    }

    #[test]
    fn listing_accepts_plain_and_paged() {
        let plain: Listing<Article> =
            serde_json::from_value(json!([{ "id": 1, "title": "a" }])).unwrap();
        let (items, pagination) = plain.into_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(pagination, None);

        let paged: Listing<Article> = serde_json::from_value(json!({
            "articles": [{ "id": 1, "title": "a" }, { "id": 2, "title": "b" }],
            "currentPage": 2,
            "totalPages": 5
        }))
        .unwrap();
        let (items, pagination) = paged.into_parts();
        assert_eq!(items.len(), 2);
        assert_eq!(
            pagination,
            Some(Pagination {
                current_page: 2,
                total_pages: 5
            })
        );
    }

    #[test]
    fn authorization_wrapped_or_bare() {
        let wrapped: AuthorizationBody = serde_json::from_value(json!({
            "data": { "authorization_url": "https://pay.test/abc", "reference": "ref-1" }
        }))
        .unwrap();
        let auth = PaymentAuthorization::from(wrapped);
        assert_eq!(auth.authorization_url, "https://pay.test/abc");
        assert_eq!(auth.reference.as_deref(), Some("ref-1"));

        let bare: AuthorizationBody =
            serde_json::from_value(json!({ "authorizationUrl": "https://pay.test/xyz" })).unwrap();
        assert_eq!(
            PaymentAuthorization::from(bare).authorization_url,
            "https://pay.test/xyz"
        );
    }
}
