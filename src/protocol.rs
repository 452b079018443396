use crate::errors::ServiceError;
use crate::models::{Session, TransferOutcome, TransferRequest, UserView};
use crate::users::Registration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One request line: an op tag, its fields, and the bearer token for
/// protected operations.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub op: Op,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Register {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    Login {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    Logout,
    Me,
    GetAccount {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    GetBalance {
        #[serde(rename = "accountId", default)]
        account_id: Option<String>,
    },
    SetTransferPassword {
        #[serde(rename = "accountNumber", default)]
        account_number: Option<String>,
        #[serde(default)]
        transfer_password: Option<String>,
    },
    ChangeTransferPassword {
        #[serde(rename = "accountNumber", default)]
        account_number: Option<String>,
        #[serde(default)]
        old_transfer_password: Option<String>,
        #[serde(default)]
        new_transfer_password: Option<String>,
    },
    VerifyTransferPassword {
        #[serde(rename = "accountNumber", default)]
        account_number: Option<String>,
        #[serde(default)]
        transfer_password: Option<String>,
    },
    Transfer {
        #[serde(flatten)]
        request: TransferRequest,
    },
}

/// One response line. `status` follows the HTTP mapping; `code` carries the
/// machine-readable codes clients branch on (wrong vs. unset transfer
/// password).
#[derive(Debug, Serialize)]
pub struct Response {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: Option<serde_json::Value>,
}

impl Response {
    pub fn ok(status: u16, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status,
                code: None,
                error: None,
                body: Some(value),
            },
            Err(e) => Self::failure(&ServiceError::Internal(e.into())),
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        Self {
            status: err.status(),
            code: err.code(),
            error: Some(err.to_string()),
            body: None,
        }
    }
}

#[derive(Serialize)]
pub struct RegisterBody {
    pub message: &'static str,
    #[serde(flatten)]
    pub registration: Registration,
}

#[derive(Serialize)]
pub struct LoginBody {
    pub message: &'static str,
    #[serde(flatten)]
    pub session: Session,
}

#[derive(Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct MeBody {
    pub user: UserView,
}

#[derive(Serialize)]
pub struct BalanceBody {
    pub balance: Decimal,
}

#[derive(Serialize)]
pub struct VerifyBody {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct TransferBody {
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: TransferOutcome,
}
