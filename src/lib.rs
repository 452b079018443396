pub mod accounts;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod server;
pub mod service;
pub mod store;
pub mod token;
pub mod transfer;
pub mod users;

pub use errors::{AuthError, ServiceError};
pub use models::{Account, AccountView, Claims, TransferOutcome, TransferRequest, User, UserView};
pub use service::LedgerService;
pub use store::{Collection, InMemoryStore, JsonFileStore};
