//! RSA key handling for legacy token credentials.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

const GENERATED_KEY_BITS: usize = 2048;

/// Freshly minted legacy token material.
#[derive(Clone)]
pub struct TokenCredentials {
    /// Token identifier, `T` followed by 32 hex characters.
    pub token_id: String,
    /// Base64 SPKI DER public key to register with the server.
    pub public_key: String,
    /// Base64 PKCS#1 DER private key kept by the client.
    pub private_key: String,
}

/// Body sent to a content server to register a generated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaimRequest {
    /// Token identifier.
    pub token: String,
    /// Base64 SPKI DER public key.
    pub public_key: String,
    /// Owning user id.
    pub user_id: i64,
}

/// Server response pointing the user at the claim page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaimResponse {
    /// Browser URL that completes the claim.
    pub token_claim_url: String,
}

impl TokenCredentials {
    /// Claim request for `user_id`.
    #[must_use]
    pub fn claim_request(&self, user_id: i64) -> TokenClaimRequest {
        TokenClaimRequest {
            token: self.token_id.clone(),
            public_key: self.public_key.clone(),
            user_id,
        }
    }
}

/// Generate a token id and a 2048-bit RSA key pair.
///
/// # Errors
///
/// Returns [`AuthError::SigningFailure`] if key generation or encoding fails.
pub fn generate_token_credentials() -> AuthResult<TokenCredentials> {
    let mut rng = rsa::rand_core::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, GENERATED_KEY_BITS)
        .map_err(|err| AuthError::signing("generate RSA key pair", err))?;

    let mut id_bytes = [0_u8; 16];
    rand::rng().fill(&mut id_bytes);
    let token_id = format!("T{}", hex::encode(id_bytes));

    let private_der = private_key
        .to_pkcs1_der()
        .map_err(|err| AuthError::signing("encode private key", err))?;
    let public_der = private_key
        .to_public_key()
        .to_public_key_der()
        .map_err(|err| AuthError::signing("encode public key", err))?;

    Ok(TokenCredentials {
        token_id,
        public_key: STANDARD.encode(public_der.as_bytes()),
        private_key: STANDARD.encode(private_der.as_bytes()),
    })
}

/// Decode a base64 PKCS#1 DER RSA private key.
///
/// # Errors
///
/// Returns [`AuthError::SigningFailure`] for bad base64 or an unparseable key.
pub fn parse_private_key(encoded: &str) -> AuthResult<RsaPrivateKey> {
    let der = STANDARD
        .decode(encoded.trim())
        .map_err(|err| AuthError::signing("decode base64 private key", err))?;
    RsaPrivateKey::from_pkcs1_der(&der).map_err(|err| AuthError::signing("parse private key", err))
}
