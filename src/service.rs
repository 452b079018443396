use crate::accounts::AccountService;
use crate::credentials::{CredentialScheme, Plaintext};
use crate::errors::ServiceError;
use crate::models::{Account, AccountView, Session, TransferOutcome, TransferRequest, User, UserView};
use crate::store::{Collection, JsonFileStore};
use crate::token::TokenAuthenticator;
use crate::transfer::TransferEngine;
use crate::users::{Registration, UserService};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The service facade the wire layer talks to. Every protected operation
/// verifies the bearer token before touching any store.
#[derive(Clone)]
pub struct LedgerService {
    authenticator: Arc<TokenAuthenticator>,
    users: UserService,
    accounts: AccountService,
    transfers: TransferEngine,
}

impl LedgerService {
    /// Service over JSON files in `data_dir` (`users.json`, `accounts.json`),
    /// with plaintext credential storage matching the upstream data files.
    pub fn open(data_dir: &Path, secret: &str, token_ttl: Duration) -> Self {
        let users: Collection<User> = Collection::new(Arc::new(JsonFileStore::new(
            "users",
            data_dir.join("users.json"),
        )));
        let accounts: Collection<Account> = Collection::new(Arc::new(JsonFileStore::new(
            "accounts",
            data_dir.join("accounts.json"),
        )));
        let authenticator = Arc::new(TokenAuthenticator::new(secret, token_ttl));

        Self::with_collections(users, accounts, authenticator, Arc::new(Plaintext))
    }

    /// Wire the service out of explicit parts. Tests use this with in-memory
    /// collections they keep handles to.
    pub fn with_collections(
        users: Collection<User>,
        accounts: Collection<Account>,
        authenticator: Arc<TokenAuthenticator>,
        credentials: Arc<dyn CredentialScheme>,
    ) -> Self {
        let account_service = AccountService::new(accounts.clone(), credentials.clone());
        let transfers = TransferEngine::new(accounts, credentials.clone());
        let user_service = UserService::new(
            users,
            account_service.clone(),
            authenticator.clone(),
            credentials,
        );

        Self {
            authenticator,
            users: user_service,
            accounts: account_service,
            transfers,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, ServiceError> {
        self.users.register(username, email, password).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        self.users.login(username, password).await
    }

    pub async fn logout(&self, token: Option<&str>) -> Result<(), ServiceError> {
        self.authenticator.verify(token).await?;
        if let Some(token) = token {
            self.users.logout(token).await;
        }
        Ok(())
    }

    /// Identity bound to the presented token.
    pub async fn me(&self, token: Option<&str>) -> Result<UserView, ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        Ok(UserView::from(&claims))
    }

    pub async fn account_for_user(
        &self,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<AccountView, ServiceError> {
        let claims = self.authenticator.verify(token).await?;

        // The view carries the balance, so the lookup is owner-only
        if claims.sub != user_id {
            return Err(ServiceError::Forbidden);
        }

        let account = self.accounts.by_user_id(user_id).await?;
        Ok(AccountView::from(&account))
    }

    pub async fn balance(
        &self,
        token: Option<&str>,
        account_id: &str,
    ) -> Result<Decimal, ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        self.accounts.balance(account_id, &claims.sub).await
    }

    pub async fn set_transfer_password(
        &self,
        token: Option<&str>,
        account_number: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        self.accounts
            .set_transfer_password(account_number, password, &claims.sub)
            .await
    }

    pub async fn change_transfer_password(
        &self,
        token: Option<&str>,
        account_number: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        self.accounts
            .change_transfer_password(account_number, old_password, new_password, &claims.sub)
            .await
    }

    pub async fn verify_transfer_password(
        &self,
        token: Option<&str>,
        account_number: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        self.accounts
            .verify_transfer_password(account_number, password, &claims.sub)
            .await
    }

    pub async fn transfer(
        &self,
        token: Option<&str>,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, ServiceError> {
        let claims = self.authenticator.verify(token).await?;
        self.transfers.transfer(request, &claims.sub).await
    }
}
