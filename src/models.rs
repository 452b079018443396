use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl User {
    pub fn new(username: String, email: String, password: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_password: Option<String>,
}

impl Account {
    /// New accounts start at zero with no transfer password configured.
    pub fn new(user_id: String, account_number: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            account_number,
            balance: Decimal::ZERO,
            transfer_password: None,
        }
    }
}

/// Claims embedded in a signed session token. `jti` makes every issued token
/// distinct, so revoking one session never touches another issued in the
/// same second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub jti: String,
    #[serde(with = "unix_time_serde")]
    pub iat: SystemTime,
    #[serde(with = "unix_time_serde")]
    pub exp: SystemTime,
}

mod unix_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH)
            .map_err(|_| serde::ser::Error::custom("SystemTime before Unix epoch"))?;
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

/// A funds-movement request as submitted by a client. All fields optional so
/// missing input is rejected by the engine, not the deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "fromAccountNumber", default)]
    pub from_account_number: Option<String>,
    #[serde(rename = "toAccountNumber", default)]
    pub to_account_number: Option<String>,
    #[serde(default)]
    pub transfer_password: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Account as exposed to clients; never carries the transfer password.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    pub balance: Decimal,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            user_id: account.user_id.clone(),
            account_number: account.account_number.clone(),
            balance: account.balance,
        }
    }
}

/// User as exposed to clients; never carries the login password.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&Claims> for UserView {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            username: claims.username.clone(),
            email: claims.email.clone(),
        }
    }
}

/// Both sides of a committed transfer, after the balances moved.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    #[serde(rename = "fromAccount")]
    pub from_account: AccountView,
    #[serde(rename = "toAccount")]
    pub to_account: AccountView,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserView,
}
