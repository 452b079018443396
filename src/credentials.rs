/// Seam for credential comparison. Login passwords and transfer passwords go
/// through this trait only, so a hashing scheme can replace plaintext storage
/// without touching the auth or transfer logic.
pub trait CredentialScheme: Send + Sync {
    /// Form in which a raw credential is stored.
    fn protect(&self, raw: &str) -> String;
    /// Whether a raw credential matches a stored one.
    fn matches(&self, raw: &str, stored: &str) -> bool;
}

/// Stores credentials as-is. Matches the upstream data files.
pub struct Plaintext;

impl CredentialScheme for Plaintext {
    fn protect(&self, raw: &str) -> String {
        raw.to_owned()
    }

    fn matches(&self, raw: &str, stored: &str) -> bool {
        raw == stored
    }
}
