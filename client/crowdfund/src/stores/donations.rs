//! Donations: listing, the redirect-based payment hand-off, and verification
//! once the payment processor sends the donor back.
//!
//! The flow has two halves that never share a call stack:
//!
//! ```text
//! create_donation_transaction ──► navigator → processor page
//!                                         │
//!         processor redirects back with ?reference=… / ?trxref=…
//!                                         ▼
//!                               verify_transaction(reference)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::api::{self, ApiClient};
use crate::errors::{ClientError, Result};
use crate::models::{AuthorizationBody, Donation, DonationRequest, Listing, PaymentAuthorization};
use crate::navigation::Navigator;
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationState {
    pub donations: Vec<Donation>,
    /// The last authorization handed to the navigator.
    pub pending_payment: Option<PaymentAuthorization>,
}

/// Query parameters the processor appends when redirecting back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReturn {
    pub reference: String,
}

impl PaymentReturn {
    /// `reference` wins over `trxref` when both are present; blanks are ignored.
    pub fn from_query(query: &HashMap<String, String>) -> Option<Self> {
        ["reference", "trxref"]
            .iter()
            .filter_map(|key| query.get(*key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(|reference| PaymentReturn {
                reference: reference.to_string(),
            })
    }
}

#[derive(Clone)]
pub struct DonationStore {
    api: ApiClient,
    session: SessionReader,
    navigator: Arc<dyn Navigator>,
    state: Store<DonationState>,
}

impl DonationStore {
    pub fn new(api: ApiClient, session: SessionReader, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            session,
            navigator,
            state: Store::new("donations"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<DonationState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<DonationState> {
        self.state.subscribe()
    }

    /// `GET /fundraisers/campaigns/{id}/donations`
    pub async fn fetch_donations(&self, campaign_id: &str) -> Result<Vec<Donation>> {
        if campaign_id.trim().is_empty() {
            return self
                .state
                .reject("fetch_donations", ClientError::precondition("Campaign ID not found"));
        }
        let token = self.session.token();
        let path = self.state.check(
            "fetch_donations",
            api::path(&["fundraisers", "campaigns", campaign_id, "donations"]),
        )?;
        self.state
            .run(
                "fetch_donations",
                async {
                    let listing: Listing<Donation> = self.api.get(&path, token.as_deref()).await?;
                    Ok(listing.into_parts().0)
                },
                |s, donations: &Vec<Donation>| s.donations = donations.clone(),
            )
            .await
    }

    /// `GET /fundraisers/donations` (donations made by the signed-in user).
    pub async fn fetch_my_donations(&self) -> Result<Vec<Donation>> {
        let token = self
            .state
            .check("fetch_my_donations", self.session.require_token())?;
        self.state
            .run(
                "fetch_my_donations",
                async {
                    let listing: Listing<Donation> =
                        self.api.get("/fundraisers/donations", Some(&token)).await?;
                    Ok(listing.into_parts().0)
                },
                |s, donations: &Vec<Donation>| s.donations = donations.clone(),
            )
            .await
    }

    /// `POST /fundraisers/campaigns/{campaign_id}/donations`, then send the
    /// navigator to the processor's authorization page.
    ///
    /// Anonymous donors are allowed; the token is attached when present.
    pub async fn create_donation_transaction(
        &self,
        email: &str,
        amount: &str,
        fundraiser_id: &str,
        campaign_id: &str,
    ) -> Result<PaymentAuthorization> {
        let op = "create_donation_transaction";
        if campaign_id.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition("Campaign ID not found"));
        }
        if email.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition("Email is required to donate"));
        }
        match amount.trim().parse::<f64>() {
            Ok(value) if value > 0.0 => {}
            _ => {
                return self
                    .state
                    .reject(op, ClientError::precondition("Donation amount must be positive"))
            }
        }

        let token = self.session.token();
        let path = self.state.check(
            op,
            api::path(&["fundraisers", "campaigns", campaign_id, "donations"]),
        )?;
        let body = DonationRequest {
            email: email.trim().to_string(),
            amount: amount.trim().to_string(),
            fundraiser_id: fundraiser_id.to_string(),
        };

        let authorization = self
            .state
            .run(
                op,
                async {
                    let response: AuthorizationBody =
                        self.api.post(&path, &body, token.as_deref()).await?;
                    Ok(PaymentAuthorization::from(response))
                },
                |s, auth: &PaymentAuthorization| s.pending_payment = Some(auth.clone()),
            )
            .await?;

        info!(
            "Redirecting donor to payment page for campaign {campaign_id} (reference {:?})",
            authorization.reference
        );
        self.navigator.navigate(&authorization.authorization_url);
        Ok(authorization)
    }

    /// `GET /fundraisers/donations/verify/{reference}`; the verified donation
    /// is appended, or replaces an earlier copy with the same id.
    pub async fn verify_transaction(&self, reference: &str) -> Result<Donation> {
        let reference = reference.trim();
        if reference.is_empty() {
            return self.state.reject(
                "verify_transaction",
                ClientError::precondition("Payment reference is missing"),
            );
        }
        let token = self.session.token();
        let path = self.state.check(
            "verify_transaction",
            api::path(&["fundraisers", "donations", "verify", reference]),
        )?;
        self.state
            .run(
                "verify_transaction",
                self.api.get::<Donation>(&path, token.as_deref()),
                |s, donation: &Donation| {
                    let known = !donation.id.as_str().is_empty();
                    match s.donations.iter_mut().find(|d| known && d.id == donation.id) {
                        Some(existing) => *existing = donation.clone(),
                        None => s.donations.push(donation.clone()),
                    }
                    if s
                        .pending_payment
                        .as_ref()
                        .is_some_and(|p| p.reference.as_deref() == donation.reference.as_deref())
                    {
                        s.pending_payment = None;
                    }
                },
            )
            .await
    }
}
