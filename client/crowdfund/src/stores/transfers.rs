//! Payout plumbing for campaign owners: banks, transfer recipients and the
//! transfers made to them. The two-step payout itself lives in
//! [`crate::saga`].

use crate::api::ApiClient;
use crate::errors::{ClientError, Result};
use crate::models::{Bank, Listing, Recipient, RecipientInput, Transfer, TransferInput};
use crate::store::{Snapshot, Store, Subscription};
use crate::stores::auth::SessionReader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferState {
    pub transfers: Vec<Transfer>,
    pub recipients: Vec<Recipient>,
    pub banks: Vec<Bank>,
}

#[derive(Clone)]
pub struct TransferStore {
    api: ApiClient,
    session: SessionReader,
    state: Store<TransferState>,
}

impl TransferStore {
    pub fn new(api: ApiClient, session: SessionReader) -> Self {
        Self {
            api,
            session,
            state: Store::new("transfers"),
        }
    }

    pub fn snapshot(&self) -> Snapshot<TransferState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> Subscription<TransferState> {
        self.state.subscribe()
    }

    /// `GET /fundraisers/transfers`
    pub async fn fetch_transfers(&self) -> Result<Vec<Transfer>> {
        let token = self
            .state
            .check("fetch_transfers", self.session.require_token())?;
        self.state
            .run(
                "fetch_transfers",
                async {
                    let listing: Listing<Transfer> =
                        self.api.get("/fundraisers/transfers", Some(&token)).await?;
                    Ok(listing.into_parts().0)
                },
                |s, transfers: &Vec<Transfer>| s.transfers = transfers.clone(),
            )
            .await
    }

    /// `GET /fundraisers/transfers/recipients`
    pub async fn fetch_recipients(&self) -> Result<Vec<Recipient>> {
        let token = self
            .state
            .check("fetch_recipients", self.session.require_token())?;
        self.state
            .run(
                "fetch_recipients",
                async {
                    let listing: Listing<Recipient> = self
                        .api
                        .get("/fundraisers/transfers/recipients", Some(&token))
                        .await?;
                    Ok(listing.into_parts().0)
                },
                |s, recipients: &Vec<Recipient>| s.recipients = recipients.clone(),
            )
            .await
    }

    /// `GET /fundraisers/transfers/banks`
    pub async fn fetch_banks(&self) -> Result<Vec<Bank>> {
        let token = self.session.token();
        self.state
            .run(
                "fetch_banks",
                async {
                    let listing: Listing<Bank> = self
                        .api
                        .get("/fundraisers/transfers/banks", token.as_deref())
                        .await?;
                    Ok(listing.into_parts().0)
                },
                |s, banks: &Vec<Bank>| s.banks = banks.clone(),
            )
            .await
    }

    /// `POST /fundraisers/transfers/recipients`. Only registers the
    /// recipient; sending money is a separate [`initiate_transfer`] call.
    ///
    /// [`initiate_transfer`]: TransferStore::initiate_transfer
    pub async fn create_transfer_recipient(&self, input: &RecipientInput) -> Result<Recipient> {
        let op = "create_transfer_recipient";
        let token = self.state.check(op, self.session.require_token())?;
        if input.account_number.trim().is_empty() || input.bank_code.trim().is_empty() {
            return self.state.reject(
                op,
                ClientError::precondition("Account number and bank code are required"),
            );
        }
        self.state
            .run(
                op,
                self.api
                    .post::<Recipient, _>("/fundraisers/transfers/recipients", input, Some(&token)),
                |s, recipient: &Recipient| s.recipients.push(recipient.clone()),
            )
            .await
    }

    /// `POST /fundraisers/transfers/initiate`
    pub async fn initiate_transfer(&self, input: &TransferInput) -> Result<Transfer> {
        let op = "initiate_transfer";
        let token = self.state.check(op, self.session.require_token())?;
        if input.recipient_code.trim().is_empty() {
            return self
                .state
                .reject(op, ClientError::precondition("Recipient code is required"));
        }
        self.state
            .run(
                op,
                self.api
                    .post::<Transfer, _>("/fundraisers/transfers/initiate", input, Some(&token)),
                |s, transfer: &Transfer| s.transfers.push(transfer.clone()),
            )
            .await
    }
}
