use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Errors from token issuing / verification.
///
/// For the request pipeline all of these mean the same thing: no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token")]
    Signing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly signed bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Claims of a token whose signature has been checked. Expiry is NOT checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signer/verifier over a process-wide shared secret.
///
/// - Key material is intentionally not printable via Debug.
/// - Rotating the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is a separate step (`is_expired`)
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a token for `subject` valid from now until now + `ttl`.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        // JWT timestamps are whole seconds; truncate so the returned times match the claims.
        let issued_at =
            DateTime::from_timestamp(Utc::now().timestamp(), 0).ok_or(TokenError::Signing)?;
        let expires_at = issued_at + ttl;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Signing
        })?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// Parse and check the signature. Does not look at `exp` beyond requiring it.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(VerifiedToken {
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// `verify` followed by the expiry check: the full validity rule.
    pub fn verify_current(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let verified = self.verify(token)?;
        if is_expired(verified.expires_at) {
            return Err(TokenError::Expired);
        }
        Ok(verified)
    }
}

/// A token is usable only while now < expires_at.
pub fn is_expired(expires_at: DateTime<Utc>) -> bool {
    Utc::now() >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies_with_same_subject() {
        let codec = TokenCodec::new(SECRET);
        let issued = codec.issue("a@x.com", Duration::hours(10)).unwrap();

        let verified = codec.verify(&issued.token).unwrap();
        assert_eq!(verified.subject, "a@x.com");
        assert_eq!(verified.issued_at, issued.issued_at);
        assert_eq!(verified.expires_at, issued.expires_at);
        assert_eq!(verified.expires_at - verified.issued_at, Duration::hours(10));
        assert!(!is_expired(verified.expires_at));
    }

    #[test]
    fn expired_token_still_has_valid_signature_but_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let issued = codec.issue("a@x.com", Duration::seconds(-60)).unwrap();

        let verified = codec.verify(&issued.token).unwrap();
        assert!(is_expired(verified.expires_at));
        assert_eq!(
            codec.verify_current(&issued.token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_another_secret_fails_signature_check() {
        let ours = TokenCodec::new(SECRET);
        let theirs = TokenCodec::new(b"another-secret-another-secret-!!");

        for subject in ["a@x.com", "admin@x.com", "x"] {
            let forged = theirs.issue(subject, Duration::hours(1)).unwrap();
            assert_eq!(ours.verify(&forged.token), Err(TokenError::InvalidSignature));
        }
    }

    #[test]
    fn garbage_and_truncated_tokens_are_rejected() {
        let codec = TokenCodec::new(SECRET);
        let issued = codec.issue("a@x.com", Duration::hours(1)).unwrap();

        assert_eq!(codec.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));

        let truncated = &issued.token[..issued.token.len() - 1];
        assert!(codec.verify(truncated).is_err());
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let codec = TokenCodec::new(SECRET);
        let a = codec.issue("a@x.com", Duration::hours(1)).unwrap();
        let b = codec.issue("b@x.com", Duration::hours(1)).unwrap();

        // header.payload(b).signature(a)
        let a_parts: Vec<&str> = a.token.split('.').collect();
        let b_parts: Vec<&str> = b.token.split('.').collect();
        let spliced = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);

        assert_eq!(codec.verify(&spliced), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn is_expired_compares_against_now() {
        assert!(is_expired(Utc::now() - Duration::seconds(1)));
        assert!(!is_expired(Utc::now() + Duration::minutes(5)));
    }
}
