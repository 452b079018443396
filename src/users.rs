use crate::accounts::AccountService;
use crate::credentials::CredentialScheme;
use crate::errors::ServiceError;
use crate::models::{AccountView, Session, User, UserView};
use crate::store::Collection;
use crate::token::TokenAuthenticator;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Registration {
    pub token: String,
    pub user: UserView,
    pub account: AccountView,
}

/// Registration, login, and logout against the users collection.
#[derive(Clone)]
pub struct UserService {
    users: Collection<User>,
    accounts: AccountService,
    authenticator: Arc<TokenAuthenticator>,
    credentials: Arc<dyn CredentialScheme>,
}

impl UserService {
    pub fn new(
        users: Collection<User>,
        accounts: AccountService,
        authenticator: Arc<TokenAuthenticator>,
        credentials: Arc<dyn CredentialScheme>,
    ) -> Self {
        Self {
            users,
            accounts,
            authenticator,
            credentials,
        }
    }

    /// Create a user plus their single zero-balance account and issue a
    /// session token. Username and email must both be unused.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, ServiceError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput);
        }

        let user = User::new(
            username.to_owned(),
            email.to_owned(),
            self.credentials.protect(password),
        );

        let user = self
            .users
            .update({
                let user = user.clone();
                let username = username.to_owned();
                let email = email.to_owned();
                move |users| {
                    if users
                        .iter()
                        .any(|u| u.username == username || u.email == email)
                    {
                        return Err(ServiceError::DuplicateUser);
                    }
                    users.push(user.clone());
                    Ok(user)
                }
            })
            .await?;

        let account = self.accounts.create_for_user(&user.id).await?;
        let token = self.authenticator.issue(&user)?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");

        Ok(Registration {
            token,
            user: UserView::from(&user),
            account: AccountView::from(&account),
        })
    }

    /// Exchange a username/password pair for a session token. A failed login
    /// never says which of the two was wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput);
        }

        let users = self.users.snapshot().await?;
        let user = users
            .iter()
            .find(|u| u.username == username && self.credentials.matches(password, &u.password))
            .ok_or(ServiceError::InvalidCredentials)?;

        let token = self.authenticator.issue(user)?;

        tracing::info!(user_id = %user.id, "Login");

        Ok(Session {
            token,
            user: UserView::from(user),
        })
    }

    /// Revoke the presented token for the rest of the process lifetime.
    pub async fn logout(&self, token: &str) {
        self.authenticator.revoke(token).await;
    }
}
