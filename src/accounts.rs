use crate::credentials::CredentialScheme;
use crate::errors::ServiceError;
use crate::models::Account;
use crate::store::Collection;
use anyhow::anyhow;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

// Keeps number generation from spinning forever if the space fills up
const MAX_NUMBER_ATTEMPTS: usize = 64;

/// Account lookups, ownership-checked balance reads, account creation, and
/// transfer-password management over the accounts collection.
#[derive(Clone)]
pub struct AccountService {
    accounts: Collection<Account>,
    credentials: Arc<dyn CredentialScheme>,
}

impl AccountService {
    pub fn new(accounts: Collection<Account>, credentials: Arc<dyn CredentialScheme>) -> Self {
        Self {
            accounts,
            credentials,
        }
    }

    /// Create the zero-balance account a registration brings with it. The
    /// account number is drawn at random and retried until it is unique
    /// within the collection.
    pub async fn create_for_user(&self, user_id: &str) -> Result<Account, ServiceError> {
        let user_id = user_id.to_owned();

        self.accounts
            .update(move |accounts| {
                let mut rng = rand::thread_rng();
                let number = (0..MAX_NUMBER_ATTEMPTS)
                    .map(|_| generate_account_number(&mut rng))
                    .find(|candidate| {
                        !accounts.iter().any(|a| &a.account_number == candidate)
                    })
                    .ok_or_else(|| {
                        ServiceError::Internal(anyhow!("account number space exhausted"))
                    })?;

                let account = Account::new(user_id, number);
                accounts.push(account.clone());

                tracing::info!(
                    account_id = %account.id,
                    account_number = %account.account_number,
                    "Created account"
                );

                Ok(account)
            })
            .await
    }

    pub async fn by_user_id(&self, user_id: &str) -> Result<Account, ServiceError> {
        let accounts = self.accounts.snapshot().await?;
        accounts
            .into_iter()
            .find(|a| a.user_id == user_id)
            .ok_or(ServiceError::NotFound)
    }

    pub async fn by_number(&self, account_number: &str) -> Result<Account, ServiceError> {
        let accounts = self.accounts.snapshot().await?;
        accounts
            .into_iter()
            .find(|a| a.account_number == account_number)
            .ok_or(ServiceError::NotFound)
    }

    pub async fn by_id(&self, id: &str) -> Result<Account, ServiceError> {
        let accounts = self.accounts.snapshot().await?;
        accounts
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(ServiceError::NotFound)
    }

    /// Balance of an account, only for its owner. Balances are never exposed
    /// across users.
    pub async fn balance(
        &self,
        account_id: &str,
        requesting_user_id: &str,
    ) -> Result<Decimal, ServiceError> {
        let account = self.by_id(account_id).await?;

        if account.user_id != requesting_user_id {
            return Err(ServiceError::Forbidden);
        }

        Ok(account.balance)
    }

    /// Set or overwrite the transfer password on an owned account.
    pub async fn set_transfer_password(
        &self,
        account_number: &str,
        password: &str,
        requesting_user_id: &str,
    ) -> Result<(), ServiceError> {
        if account_number.is_empty() || !is_valid_transfer_password(password) {
            return Err(ServiceError::InvalidInput);
        }

        let stored = self.credentials.protect(password);
        let account_number = account_number.to_owned();
        let requesting_user_id = requesting_user_id.to_owned();

        self.accounts
            .update(move |accounts| {
                let account = find_owned_mut(accounts, &account_number, &requesting_user_id)?;
                account.transfer_password = Some(stored);
                Ok(())
            })
            .await
    }

    /// Replace an existing transfer password, checking the old one first.
    pub async fn change_transfer_password(
        &self,
        account_number: &str,
        old_password: &str,
        new_password: &str,
        requesting_user_id: &str,
    ) -> Result<(), ServiceError> {
        if account_number.is_empty()
            || old_password.is_empty()
            || !is_valid_transfer_password(new_password)
        {
            return Err(ServiceError::InvalidInput);
        }

        let credentials = self.credentials.clone();
        let stored = credentials.protect(new_password);
        let account_number = account_number.to_owned();
        let old_password = old_password.to_owned();
        let new_password = new_password.to_owned();
        let requesting_user_id = requesting_user_id.to_owned();

        self.accounts
            .update(move |accounts| {
                let account = find_owned_mut(accounts, &account_number, &requesting_user_id)?;

                let current = account
                    .transfer_password
                    .as_deref()
                    .ok_or(ServiceError::TransferPasswordNotSet)?;
                if !credentials.matches(&old_password, current) {
                    return Err(ServiceError::IncorrectOldPassword);
                }
                if credentials.matches(&new_password, current) {
                    return Err(ServiceError::SameAsOld);
                }

                account.transfer_password = Some(stored);
                Ok(())
            })
            .await
    }

    /// Check a transfer password on an owned account without revealing the
    /// stored value.
    pub async fn verify_transfer_password(
        &self,
        account_number: &str,
        password: &str,
        requesting_user_id: &str,
    ) -> Result<bool, ServiceError> {
        if account_number.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput);
        }

        let account = self.by_number(account_number).await?;
        if account.user_id != requesting_user_id {
            return Err(ServiceError::Forbidden);
        }

        let current = account
            .transfer_password
            .as_deref()
            .ok_or(ServiceError::TransferPasswordNotSet)?;

        Ok(self.credentials.matches(password, current))
    }
}

fn find_owned_mut<'a>(
    accounts: &'a mut [Account],
    account_number: &str,
    requesting_user_id: &str,
) -> Result<&'a mut Account, ServiceError> {
    let account = accounts
        .iter_mut()
        .find(|a| a.account_number == account_number)
        .ok_or(ServiceError::NotFound)?;

    if account.user_id != requesting_user_id {
        return Err(ServiceError::Forbidden);
    }

    Ok(account)
}

/// Transfer passwords are numeric, at least four digits.
fn is_valid_transfer_password(password: &str) -> bool {
    password.len() >= 4 && password.chars().all(|c| c.is_ascii_digit())
}

/// Externally addressable number in the `NNNNN-D` shape the upstream data
/// uses: five digits, a dash, one check digit.
fn generate_account_number<R: Rng>(rng: &mut R) -> String {
    format!("{}-{}", rng.gen_range(10000..100000), rng.gen_range(0..10))
}
