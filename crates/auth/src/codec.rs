//! Signed session tokens: `base64url(header).base64url(claims).base64url(signature)`.
//!
//! Issuing goes through `jsonwebtoken::encode`. Parsing is done in stages so
//! each failure maps to exactly one [`AuthError`]:
//!
//! 1. structure (three base64url segments, a JSON header) → `MalformedToken`
//! 2. expiry read from the unverified payload → `TokenExpired`
//! 3. header algorithm + signature → `InvalidSignature`
//! 4. typed claims and time window → `MalformedToken`
//!
//! Signature comparison is delegated to `jsonwebtoken::crypto::verify`, which
//! compares HMAC tags in constant time.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, crypto};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{AuthError, Claims, Identity, claims::validate_claims};

/// Key material for the configured algorithm.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared secret for the `HS*` family.
    Secret(Vec<u8>),

    /// PEM-encoded key pair for RSA, EC and Ed25519 algorithms.
    Pem { private: Vec<u8>, public: Vec<u8> },
}

impl core::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyMaterial::Secret(_) => f.write_str("KeyMaterial::Secret(..)"),
            KeyMaterial::Pem { .. } => f.write_str("KeyMaterial::Pem(..)"),
        }
    }
}

/// Tokens cannot be produced. Fatal at startup, never per-request recoverable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("token signing failed: {0}")]
    Sign(String),
}

/// A freshly issued token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

pub struct TokenCodec {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(
        algorithm: Algorithm,
        keys: &KeyMaterial,
        lifetime: Duration,
    ) -> Result<Self, SigningError> {
        let lifetime_secs = i64::try_from(lifetime.as_secs())
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| {
                SigningError::KeyUnavailable("token lifetime must be at least one second".into())
            })?;

        let (encoding, decoding) = load_keys(algorithm, keys)?;

        Ok(Self {
            algorithm,
            encoding,
            decoding,
            lifetime_secs,
        })
    }

    /// HMAC-SHA256 codec over a shared secret.
    pub fn hs256(secret: impl Into<Vec<u8>>, lifetime: Duration) -> Result<Self, SigningError> {
        Self::new(Algorithm::HS256, &KeyMaterial::Secret(secret.into()), lifetime)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs.unsigned_abs())
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, SigningError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SigningError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: identity.subject().to_string(),
            role: identity.role().clone(),
            iat,
            exp: iat.saturating_add(self.lifetime_secs),
            jti: Uuid::now_v7().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| SigningError::Sign(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        self.parse_at(token, Utc::now())
    }

    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken);
        };

        let header_bytes = decode_segment(header_b64)?;
        let payload = decode_segment(payload_b64)?;
        decode_segment(signature_b64)?;

        let header: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| AuthError::MalformedToken)?;

        if let Ok(expiry) = serde_json::from_slice::<ExpiryOnly>(&payload) {
            if expiry.exp <= now.timestamp() {
                return Err(AuthError::TokenExpired);
            }
        }

        if header.alg != self.algorithm {
            return Err(AuthError::InvalidSignature);
        }

        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        let verified = crypto::verify(
            signature_b64,
            signing_input.as_bytes(),
            &self.decoding,
            self.algorithm,
        )
        .unwrap_or(false);
        if !verified {
            return Err(AuthError::InvalidSignature);
        }

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;
        validate_claims(&claims, now)?;

        Ok(claims)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    if segment.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedToken)
}

fn load_keys(
    algorithm: Algorithm,
    keys: &KeyMaterial,
) -> Result<(EncodingKey, DecodingKey), SigningError> {
    let unavailable = |e: jsonwebtoken::errors::Error| SigningError::KeyUnavailable(e.to_string());

    match (algorithm, keys) {
        (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, KeyMaterial::Secret(secret)) => {
            if secret.is_empty() {
                return Err(SigningError::KeyUnavailable("HMAC secret is empty".into()));
            }
            Ok((
                EncodingKey::from_secret(secret),
                DecodingKey::from_secret(secret),
            ))
        }
        (
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
            KeyMaterial::Pem { private, public },
        ) => Ok((
            EncodingKey::from_rsa_pem(private).map_err(unavailable)?,
            DecodingKey::from_rsa_pem(public).map_err(unavailable)?,
        )),
        (Algorithm::ES256 | Algorithm::ES384, KeyMaterial::Pem { private, public }) => Ok((
            EncodingKey::from_ec_pem(private).map_err(unavailable)?,
            DecodingKey::from_ec_pem(public).map_err(unavailable)?,
        )),
        (Algorithm::EdDSA, KeyMaterial::Pem { private, public }) => Ok((
            EncodingKey::from_ed_pem(private).map_err(unavailable)?,
            DecodingKey::from_ed_pem(public).map_err(unavailable)?,
        )),
        (alg, material) => Err(SigningError::KeyUnavailable(format!(
            "{alg:?} cannot be used with {material:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::TimeDelta;
    use proptest::prelude::*;

    const LIFETIME: Duration = Duration::from_secs(3600);

    fn codec() -> TokenCodec {
        TokenCodec::hs256(b"test-secret".to_vec(), LIFETIME).unwrap()
    }

    fn alice() -> Identity {
        Identity::new("alice@example.com", Role::USER)
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    fn encode_json(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    proptest! {
        #[test]
        fn parse_returns_what_issue_embedded(
            subject in "[a-z]{1,12}@[a-z]{1,8}\\.[a-z]{2,3}",
            admin in any::<bool>(),
        ) {
            let codec = codec();
            let role = if admin { Role::ADMIN } else { Role::USER };
            let identity = Identity::new(subject.clone(), role.clone());

            let issued = codec.issue(&identity).unwrap();
            let claims = codec.parse(&issued.token).unwrap();

            prop_assert_eq!(claims.identity(), identity);
            prop_assert_eq!(claims.exp - claims.iat, LIFETIME.as_secs() as i64);
        }
    }

    #[test]
    fn every_issuance_is_unique() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.issue_at(&alice(), now).unwrap();
        let b = codec.issue_at(&alice(), now).unwrap();
        assert_ne!(a.token, b.token);
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn wire_format_is_three_base64url_segments() {
        let issued = codec().issue(&alice()).unwrap();
        let parts = segments(&issued.token);
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
        assert_eq!(payload["sub"], "alice@example.com");
        assert_eq!(payload["role"], "user");
        assert!(payload["iat"].is_i64());
        assert!(payload["exp"].is_i64());
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let issued_at = Utc::now() - TimeDelta::hours(2);
        let issued = codec.issue_at(&alice(), issued_at).unwrap();

        assert_eq!(codec.parse(&issued.token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn token_is_expired_exactly_at_exp() {
        let codec = codec();
        let now = Utc::now();
        let issued = codec.issue_at(&alice(), now).unwrap();
        let at_exp = issued.claims.expires_at().unwrap();

        assert_eq!(codec.parse_at(&issued.token, at_exp), Err(AuthError::TokenExpired));
        assert!(codec.parse_at(&issued.token, at_exp - TimeDelta::seconds(1)).is_ok());
    }

    #[test]
    fn expiry_wins_over_a_bad_signature() {
        let codec = codec();
        let other = TokenCodec::hs256(b"someone-else".to_vec(), LIFETIME).unwrap();
        let issued = other
            .issue_at(&alice(), Utc::now() - TimeDelta::hours(2))
            .unwrap();

        assert_eq!(codec.parse(&issued.token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn altered_payload_fails_signature() {
        let codec = codec();
        let issued = codec.issue(&alice()).unwrap();
        let parts = segments(&issued.token);

        let mut payload = serde_json::to_value(&issued.claims).unwrap();
        payload["role"] = serde_json::json!("admin");
        let forged = format!("{}.{}.{}", parts[0], encode_json(&payload), parts[2]);

        assert_eq!(codec.parse(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn altered_signature_fails_signature() {
        let codec = codec();
        let issued = codec.issue(&alice()).unwrap();
        let parts = segments(&issued.token);

        let mut sig: Vec<char> = parts[2].chars().collect();
        sig[5] = if sig[5] == 'A' { 'B' } else { 'A' };
        let forged = format!("{}.{}.{}", parts[0], parts[1], sig.into_iter().collect::<String>());

        assert_eq!(codec.parse(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn token_signed_with_another_secret_fails_signature() {
        let other = TokenCodec::hs256(b"someone-else".to_vec(), LIFETIME).unwrap();
        let issued = other.issue(&alice()).unwrap();

        assert_eq!(codec().parse(&issued.token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn algorithm_downgrade_is_rejected() {
        let hs512 = TokenCodec::new(
            Algorithm::HS512,
            &KeyMaterial::Secret(b"test-secret".to_vec()),
            LIFETIME,
        )
        .unwrap();
        let issued = hs512.issue(&alice()).unwrap();

        assert_eq!(codec().parse(&issued.token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn unsigned_alg_none_is_malformed() {
        let header = encode_json(&serde_json::json!({ "alg": "none", "typ": "JWT" }));
        let payload = encode_json(&serde_json::json!({
            "sub": "mallory@example.com",
            "role": "admin",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 600,
            "jti": "x",
        }));
        let token = format!("{header}.{payload}.c2ln");

        assert_eq!(codec().parse(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let codec = codec();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.???.###", "..", "e30.e30."] {
            assert_eq!(codec.parse(token), Err(AuthError::MalformedToken), "token {token:?}");
        }
    }

    #[test]
    fn empty_secret_is_a_signing_error() {
        let err = TokenCodec::hs256(Vec::new(), LIFETIME).unwrap_err();
        assert!(matches!(err, SigningError::KeyUnavailable(_)));
    }

    #[test]
    fn mismatched_key_material_is_a_signing_error() {
        let err = TokenCodec::new(
            Algorithm::RS256,
            &KeyMaterial::Secret(b"secret".to_vec()),
            LIFETIME,
        )
        .unwrap_err();
        assert!(matches!(err, SigningError::KeyUnavailable(_)));
    }

    #[test]
    fn debug_output_hides_keys() {
        let rendered = format!("{:?}", KeyMaterial::Secret(b"hunter2".to_vec()));
        assert!(!rendered.contains("hunter2"));
    }
}
