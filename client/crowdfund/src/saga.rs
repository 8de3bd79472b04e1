//! Two-step campaign payout: register a transfer recipient, then send the
//! money to it.
//!
//! ```text
//! Pending ──create recipient──► RecipientCreated ──initiate transfer──► Completed
//!    │                                 │
//!    └──────────── Failed { step, recipient } ◄──────────┘
//! ```
//!
//! ## Resilience
//!
//! * Recipient creation retries any retryable error (network failure, 429,
//!   5xx) with exponential back-off, up to `max_attempts` attempts.
//! * The transfer step moves money, so it is only sent again after a 429 or
//!   503. A network failure or other 5xx may hide a transfer the backend
//!   already accepted; the saga fails at that step instead.
//! * Any other error fails the saga at that step.
//! * The backend has no way to delete a recipient and recipients can be
//!   reused, so a failure after the first step keeps the recipient.
//!   [`PayoutSaga::resume`] then continues with the transfer step only.

use std::time::Duration;

use tracing::{info, warn};

use crate::errors::{ClientError, Result};
use crate::models::{Recipient, RecipientInput, Transfer, TransferInput};
use crate::stores::transfers::TransferStore;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutStep {
    CreateRecipient,
    InitiateTransfer,
}

impl PayoutStep {
    fn may_retry(self, err: &ClientError) -> bool {
        match self {
            Self::CreateRecipient => err.is_retryable(),
            // Resending after a lost response would pay out twice.
            Self::InitiateTransfer => err.was_not_processed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayoutStage {
    Pending,
    RecipientCreated(Recipient),
    Completed {
        recipient: Recipient,
        transfer: Transfer,
    },
    Failed {
        step: PayoutStep,
        /// Present when the first step had already succeeded.
        recipient: Option<Recipient>,
        error: String,
    },
}

/// What the campaign owner asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutRequest {
    pub recipient: RecipientInput,
    pub amount: String,
    pub reason: Option<String>,
    pub campaign_id: Option<String>,
}

pub struct PayoutSaga {
    transfers: TransferStore,
    request: PayoutRequest,
    stage: PayoutStage,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl PayoutSaga {
    pub fn new(transfers: TransferStore, request: PayoutRequest, max_attempts: u32) -> Self {
        Self {
            transfers,
            request,
            stage: PayoutStage::Pending,
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_secs(INITIAL_BACKOFF_SECS),
        }
    }

    /// Start from an already registered recipient, skipping the first step.
    pub fn with_recipient(
        transfers: TransferStore,
        request: PayoutRequest,
        recipient: Recipient,
        max_attempts: u32,
    ) -> Self {
        let mut saga = Self::new(transfers, request, max_attempts);
        saga.stage = PayoutStage::RecipientCreated(recipient);
        saga
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn stage(&self) -> &PayoutStage {
        &self.stage
    }

    /// Drive the saga until it completes or fails.
    pub async fn run(&mut self) -> Result<Transfer> {
        loop {
            match &self.stage {
                PayoutStage::Completed { transfer, .. } => return Ok(transfer.clone()),
                PayoutStage::Failed { error, .. } => {
                    return Err(ClientError::precondition(format!("Payout failed: {error}")))
                }
                _ => {}
            }
            self.advance().await?;
        }
    }

    /// Perform the next step. Terminal stages are left as they are.
    ///
    /// The step's own error is returned when it fails; the saga is then in
    /// [`PayoutStage::Failed`].
    pub async fn advance(&mut self) -> Result<&PayoutStage> {
        match self.stage.clone() {
            PayoutStage::Pending => {
                let input = self.request.recipient.clone();
                let transfers = self.transfers.clone();
                let outcome = self
                    .with_retry(PayoutStep::CreateRecipient, || {
                        let transfers = transfers.clone();
                        let input = input.clone();
                        async move { transfers.create_transfer_recipient(&input).await }
                    })
                    .await;
                match outcome {
                    Ok(recipient) => {
                        info!("Payout recipient {} registered", recipient.recipient_code);
                        self.stage = PayoutStage::RecipientCreated(recipient);
                    }
                    Err(e) => return Err(self.fail(PayoutStep::CreateRecipient, None, e)),
                }
            }
            PayoutStage::RecipientCreated(recipient) => {
                let input = TransferInput {
                    amount: self.request.amount.clone(),
                    recipient_code: recipient.recipient_code.clone(),
                    reason: self.request.reason.clone(),
                    campaign_id: self.request.campaign_id.clone(),
                };
                let transfers = self.transfers.clone();
                let outcome = self
                    .with_retry(PayoutStep::InitiateTransfer, || {
                        let transfers = transfers.clone();
                        let input = input.clone();
                        async move { transfers.initiate_transfer(&input).await }
                    })
                    .await;
                match outcome {
                    Ok(transfer) => {
                        info!(
                            "Payout of {} to {} initiated",
                            self.request.amount, recipient.recipient_code
                        );
                        self.stage = PayoutStage::Completed {
                            recipient,
                            transfer,
                        };
                    }
                    Err(e) => {
                        return Err(self.fail(PayoutStep::InitiateTransfer, Some(recipient), e))
                    }
                }
            }
            PayoutStage::Completed { .. } | PayoutStage::Failed { .. } => {}
        }
        Ok(&self.stage)
    }

    /// Re-enter a failed saga at the step that failed, keeping any recipient
    /// already created, and run it to the end.
    pub async fn resume(&mut self) -> Result<Transfer> {
        if let PayoutStage::Failed { recipient, .. } = &self.stage {
            self.stage = match recipient.clone() {
                Some(recipient) => PayoutStage::RecipientCreated(recipient),
                None => PayoutStage::Pending,
            };
        }
        self.run().await
    }

    async fn with_retry<T, F, Fut>(&self, step: PayoutStep, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let max_backoff = Duration::from_secs(MAX_BACKOFF_SECS);
        let mut tries = 0;

        loop {
            tries += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if step.may_retry(&e) && tries < self.max_attempts => {
                    warn!(
                        "Payout step {step:?} failed (attempt {tries}/{}, will retry in {backoff:?}): {e}",
                        self.max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fail(
        &mut self,
        step: PayoutStep,
        recipient: Option<Recipient>,
        err: ClientError,
    ) -> ClientError {
        warn!("Payout failed at {step:?}: {err}");
        self.stage = PayoutStage::Failed {
            step,
            recipient,
            error: err.to_string(),
        };
        err
    }
}
