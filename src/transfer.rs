use crate::credentials::CredentialScheme;
use crate::errors::ServiceError;
use crate::models::{Account, AccountView, TransferOutcome, TransferRequest};
use crate::store::Collection;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Validates and executes a funds movement between two accounts.
///
/// A request passes through an ordered sequence of gates; the first failing
/// gate decides the error and nothing is committed. The gates, the two
/// balance mutations, and the persist all run inside the accounts
/// collection's critical section, so no observer can see a half-applied
/// transfer.
#[derive(Clone)]
pub struct TransferEngine {
    accounts: Collection<Account>,
    credentials: Arc<dyn CredentialScheme>,
}

impl TransferEngine {
    pub fn new(accounts: Collection<Account>, credentials: Arc<dyn CredentialScheme>) -> Self {
        Self {
            accounts,
            credentials,
        }
    }

    pub async fn transfer(
        &self,
        request: &TransferRequest,
        requesting_user_id: &str,
    ) -> Result<TransferOutcome, ServiceError> {
        // Gate 1: well-formedness
        let from_number = require_field(&request.from_account_number)?;
        let to_number = require_field(&request.to_account_number)?;
        let password = require_field(&request.transfer_password)?;
        let amount = request.amount.ok_or(ServiceError::InvalidInput)?;

        let credentials = self.credentials.clone();
        let requesting_user_id = requesting_user_id.to_owned();

        let outcome = self
            .accounts
            .update(move |accounts| {
                // Gate 2: both accounts must exist
                let from_idx = accounts
                    .iter()
                    .position(|a| a.account_number == from_number)
                    .ok_or(ServiceError::AccountNotFound)?;
                let to_idx = accounts
                    .iter()
                    .position(|a| a.account_number == to_number)
                    .ok_or(ServiceError::AccountNotFound)?;

                // Gate 3: only the owner may move funds out of an account
                if accounts[from_idx].user_id != requesting_user_id {
                    return Err(ServiceError::Forbidden);
                }

                // Gate 4: distinct accounts
                if accounts[from_idx].id == accounts[to_idx].id {
                    return Err(ServiceError::SameAccount);
                }

                // Gates 5 and 6: transfer password configured and correct
                let stored = accounts[from_idx]
                    .transfer_password
                    .as_deref()
                    .ok_or(ServiceError::TransferPasswordNotSet)?;
                if !credentials.matches(password, stored) {
                    return Err(ServiceError::TransferPasswordIncorrect);
                }

                // Gate 7: positive amount
                if amount <= Decimal::ZERO {
                    return Err(ServiceError::NonPositiveAmount);
                }

                // Gate 8: sufficient funds
                if accounts[from_idx].balance < amount {
                    return Err(ServiceError::InsufficientFunds);
                }

                // Both mutations land in the same collection write. Rounded
                // to two places to keep balances free of accumulated drift.
                accounts[from_idx].balance =
                    (accounts[from_idx].balance - amount).round_dp(2);
                accounts[to_idx].balance =
                    (accounts[to_idx].balance + amount).round_dp(2);

                Ok(TransferOutcome {
                    from_account: AccountView::from(&accounts[from_idx]),
                    to_account: AccountView::from(&accounts[to_idx]),
                })
            })
            .await?;

        tracing::info!(
            from = %outcome.from_account.account_number,
            to = %outcome.to_account.account_number,
            %amount,
            "Transfer committed"
        );

        Ok(outcome)
    }
}

fn require_field(field: &Option<String>) -> Result<&str, ServiceError> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ServiceError::InvalidInput),
    }
}
