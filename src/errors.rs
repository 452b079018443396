use thiserror::Error;

/// Failures of the token authentication layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("token revoked")]
    Revoked,
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("invalid input")]
    InvalidInput,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("username or email already registered")]
    DuplicateUser,
    #[error("account not found")]
    NotFound,
    #[error("source or destination account not found")]
    AccountNotFound,
    #[error("access to this account denied")]
    Forbidden,
    #[error("cannot transfer to the same account")]
    SameAccount,
    #[error("transfer password not set")]
    TransferPasswordNotSet,
    #[error("transfer password incorrect")]
    TransferPasswordIncorrect,
    #[error("current transfer password incorrect")]
    IncorrectOldPassword,
    #[error("new transfer password must differ from the current one")]
    SameAsOld,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(err)
    }
}

impl ServiceError {
    /// HTTP status the wire layer reports for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidInput
            | ServiceError::DuplicateUser
            | ServiceError::SameAccount
            | ServiceError::NonPositiveAmount
            | ServiceError::InsufficientFunds => 400,
            ServiceError::Auth(_)
            | ServiceError::InvalidCredentials
            | ServiceError::TransferPasswordNotSet
            | ServiceError::TransferPasswordIncorrect
            | ServiceError::IncorrectOldPassword
            | ServiceError::SameAsOld => 401,
            ServiceError::Forbidden => 403,
            ServiceError::NotFound | ServiceError::AccountNotFound => 404,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Machine-readable code for errors clients branch on.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ServiceError::TransferPasswordIncorrect => Some("P401"),
            ServiceError::TransferPasswordNotSet => Some("P404"),
            _ => None,
        }
    }
}
