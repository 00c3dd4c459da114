// crates/gridreg-services/src/token.rs
// ============================================================================
// Module: Session Tokens
// Description: Signed, time-limited session claim sets.
// Purpose: Issue and verify login tokens for in-process session state.
// Dependencies: base64, ed25519-dalek, gridreg-core, serde_json, sha2
// ============================================================================

//! ## Overview
//! A session token is a JSON claim set signed with an Ed25519 key derived
//! from the configured secret. Tokens are consumed only by this application;
//! no external party verifies them. Wire form is
//! `base64(claims) "." base64(signature)`. Verification checks the
//! signature first, then the expiry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::Verifier;
use gridreg_core::Role;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::UserId;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Claim set carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Authenticated username.
    pub username: String,
    /// Role at login time.
    pub role: Role,
    /// Expiry as unix seconds.
    pub exp: i64,
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Issues and verifies session tokens.
///
/// # Invariants
/// - The signing key is derived deterministically from the secret, so every
///   process sharing the secret verifies the same tokens.
pub struct TokenSigner {
    /// Ed25519 signing key.
    signing_key: SigningKey,
}

impl TokenSigner {
    /// Derives the signer from the configured secret.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut seed = [0_u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Issues a token for the claim set.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when the claims cannot be
    /// serialized.
    pub fn issue(&self, claims: &SessionClaims) -> ServiceResult<String> {
        let body = serde_json::to_vec(claims)
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        let signature = self.signing_key.sign(&body);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Permission`] for malformed tokens, bad
    /// signatures, or expired claims. `now` is unix seconds.
    pub fn verify(&self, token: &str, now: i64) -> ServiceResult<SessionClaims> {
        let invalid = || ServiceError::Permission("invalid session token".to_string());
        let (body_part, signature_part) = token.split_once('.').ok_or_else(invalid)?;
        let body = URL_SAFE_NO_PAD.decode(body_part).map_err(|_| invalid())?;
        let signature_bytes = URL_SAFE_NO_PAD.decode(signature_part).map_err(|_| invalid())?;
        let signature_array: [u8; 64] =
            signature_bytes.try_into().map_err(|_| invalid())?;
        let signature = Signature::from_bytes(&signature_array);
        self.signing_key
            .verifying_key()
            .verify(&body, &signature)
            .map_err(|_| invalid())?;
        let claims: SessionClaims =
            serde_json::from_slice(&body).map_err(|_| invalid())?;
        if claims.exp <= now {
            return Err(ServiceError::Permission("session token expired".to_string()));
        }
        Ok(claims)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use gridreg_core::Role;
    use gridreg_core::ServiceError;
    use gridreg_core::UserId;

    use super::SessionClaims;
    use super::TokenSigner;

    fn claims(exp: i64) -> SessionClaims {
        SessionClaims {
            user_id: UserId::from_raw(1).unwrap_or_else(|| unreachable!("nonzero")),
            username: "alice".to_string(),
            role: Role::Admin,
            exp,
        }
    }

    #[test]
    fn round_trips_before_expiry() {
        let signer = TokenSigner::from_secret("secret");
        let token = signer
            .issue(&claims(1_000))
            .unwrap_or_else(|_| unreachable!("issue succeeds"));
        let verified = signer.verify(&token, 999);
        assert_eq!(verified.map(|claim| claim.username), Ok("alice".to_string()));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::from_secret("secret");
        let token = signer
            .issue(&claims(1_000))
            .unwrap_or_else(|_| unreachable!("issue succeeds"));
        assert!(matches!(signer.verify(&token, 1_000), Err(ServiceError::Permission(_))));
    }

    #[test]
    fn foreign_secret_fails_verification() {
        let signer = TokenSigner::from_secret("secret");
        let other = TokenSigner::from_secret("other");
        let token = signer
            .issue(&claims(1_000))
            .unwrap_or_else(|_| unreachable!("issue succeeds"));
        assert!(other.verify(&token, 1).is_err());
    }

    #[test]
    fn tampered_body_fails_verification() {
        let signer = TokenSigner::from_secret("secret");
        let token = signer
            .issue(&claims(1_000))
            .unwrap_or_else(|_| unreachable!("issue succeeds"));
        let tampered = format!("A{token}");
        assert!(signer.verify(&tampered, 1).is_err());
    }
}
