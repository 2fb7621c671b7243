use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to generate salt: {0}")]
    Salt(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// One-way, salted password hashing.
///
/// `matches` never fails: an unparsable stored hash simply does not match.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    fn matches(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id (v0x13) producing PHC strings.
#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::fill(&mut salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;

        let phc = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?
            .to_string();

        Ok(phc)
    }

    fn matches(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Argon2Hasher {
    let params = Params::new(
        Params::MIN_M_COST,
        Params::MIN_T_COST,
        Params::MIN_P_COST,
        None,
    )
    .unwrap();
    Argon2Hasher::new(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_match() {
        let hasher = cheap_hasher();
        let phc = hasher.hash("pw1").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(hasher.matches("pw1", &phc));
        assert!(!hasher.matches("pw2", &phc));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = cheap_hasher();
        let a = hasher.hash("pw1").unwrap();
        let b = hasher.hash("pw1").unwrap();

        assert_ne!(a, b);
        assert!(hasher.matches("pw1", &a));
        assert!(hasher.matches("pw1", &b));
    }

    #[test]
    fn unparsable_hash_never_matches() {
        let hasher = cheap_hasher();
        assert!(!hasher.matches("pw1", "pw1"));
        assert!(!hasher.matches("", ""));
    }
}
