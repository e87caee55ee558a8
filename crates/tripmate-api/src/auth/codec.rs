// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed token encoding and verification.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tripmate_core::{AuthError, AuthResult};

use super::Claims;

// =============================================================================
// TokenCodecConfig
// =============================================================================

/// Token signing configuration.
#[derive(Clone)]
pub struct TokenCodecConfig {
    /// HMAC secret.
    pub secret: String,
    /// Token issuer.
    pub issuer: String,
    /// HMAC algorithm.
    pub algorithm: Algorithm,
    /// Access token lifetime.
    pub access_lifetime: Duration,
    /// Refresh token lifetime.
    pub refresh_lifetime: Duration,
}

impl Default for TokenCodecConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "tripmate".to_string(),
            algorithm: Algorithm::HS256,
            access_lifetime: Duration::from_secs(30 * 60),
            refresh_lifetime: Duration::from_secs(420 * 60),
        }
    }
}

impl TokenCodecConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets both token lifetimes.
    pub fn with_lifetimes(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_lifetime = access;
        self.refresh_lifetime = refresh;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::internal("token signing secret is not configured"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("Token signing secret is shorter than recommended (32 bytes)");
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::internal(format!(
                "unsupported signing algorithm {:?}",
                self.algorithm
            )));
        }
        if self.access_lifetime.is_zero() || self.refresh_lifetime.is_zero() {
            return Err(AuthError::internal("token lifetimes must be positive"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenCodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodecConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

/// Parses an HMAC algorithm name.
pub fn parse_algorithm(name: &str) -> AuthResult<Algorithm> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::internal(format!(
            "unsupported signing algorithm '{}'",
            other
        ))),
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Signs and verifies compact `header.payload.signature` tokens.
///
/// Stateless apart from the process-wide secret. Signature comparison is
/// constant time. Expiry is checked against the caller's clock with no leeway.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<TokenCodecConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a new codec with the given configuration.
    pub fn new(config: TokenCodecConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Builds access token claims issued at `now`.
    pub fn access_claims(
        &self,
        subject: &str,
        roles: Vec<String>,
        session_id: &str,
        now: i64,
    ) -> Claims {
        Claims::access(
            subject,
            roles,
            session_id,
            now,
            self.access_lifetime_secs(),
        )
        .with_issuer(&self.config.issuer)
    }

    /// Builds refresh token claims issued at `now`.
    pub fn refresh_claims(&self, subject: &str, session_id: &str, now: i64) -> Claims {
        Claims::refresh(subject, session_id, now, self.refresh_lifetime_secs())
            .with_issuer(&self.config.issuer)
    }

    /// Signs claims into a token.
    pub fn issue(&self, claims: &Claims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to create token: {}", e)))
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies a token against the given Unix time.
    pub fn verify_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)?;

        if claims.iss.as_deref() != Some(self.config.issuer.as_str()) {
            return Err(AuthError::malformed_token("unexpected issuer"));
        }
        if claims.is_expired_at(now) {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Returns the issuer stamped into every token.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_lifetime_secs(&self) -> i64 {
        self.config.access_lifetime.as_secs() as i64
    }

    /// Returns the refresh token lifetime in seconds.
    pub fn refresh_lifetime_secs(&self) -> i64 {
        self.config.refresh_lifetime.as_secs() as i64
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .finish()
    }
}

/// Maps decoder failures onto the verification taxonomy.
fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::SignatureMismatch,
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidToken => AuthError::malformed_token("not a compact token"),
        ErrorKind::InvalidAlgorithm => AuthError::malformed_token("unexpected algorithm"),
        ErrorKind::Base64(_) => AuthError::malformed_token("invalid base64url segment"),
        ErrorKind::Json(_) => AuthError::malformed_token("invalid claims payload"),
        ErrorKind::Utf8(_) => AuthError::malformed_token("invalid utf-8 in token"),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::malformed_token(format!("missing claim '{}'", claim))
        }
        _ => AuthError::malformed_token(err.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenCodecConfig::new(SECRET)).unwrap()
    }

    fn user_claims(codec: &TokenCodec, now: i64) -> Claims {
        codec.access_claims("a@x.com", vec!["USER".to_string()], "sid-1", now)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = user_claims(&codec, now);

        let token = codec.issue(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(verified.principal().identity, "a@x.com");
        assert_eq!(verified.principal().roles, vec!["USER"]);
    }

    #[test]
    fn test_expiry_is_exact() {
        let codec = codec();
        let issued = 1_700_000_000;
        let claims = user_claims(&codec, issued);
        let t0 = claims.exp;
        let token = codec.issue(&claims).unwrap();

        assert!(codec.verify_at(&token, t0 - 1).is_ok());
        assert_eq!(codec.verify_at(&token, t0 + 1), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_payload_bit_flip_is_signature_mismatch() {
        let codec = codec();
        let token = codec
            .issue(&user_claims(&codec, Utc::now().timestamp()))
            .unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(segments[1]).unwrap();

        for byte in [0, payload.len() / 2, payload.len() - 1] {
            for bit in [0u8, 3, 7] {
                let mut tampered = payload.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!(
                    "{}.{}.{}",
                    segments[0],
                    URL_SAFE_NO_PAD.encode(&tampered),
                    segments[2]
                );

                assert_eq!(codec.verify(&forged), Err(AuthError::SignatureMismatch));
            }
        }
    }

    #[test]
    fn test_wrong_secret_is_signature_mismatch() {
        let issuer =
            TokenCodec::new(TokenCodecConfig::new("secret-one-for-testing-purposes-0000")).unwrap();
        let verifier =
            TokenCodec::new(TokenCodecConfig::new("secret-two-for-testing-purposes-0000")).unwrap();

        let token = issuer
            .issue(&user_claims(&issuer, Utc::now().timestamp()))
            .unwrap();

        assert_eq!(verifier.verify(&token), Err(AuthError::SignatureMismatch));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        for token in ["", "invalid.token.here", "only-one-segment", "a.b"] {
            assert!(matches!(
                codec.verify(token),
                Err(AuthError::MalformedToken { .. })
            ));
        }
    }

    #[test]
    fn test_foreign_issuer_is_malformed() {
        let ours = codec();
        let theirs =
            TokenCodec::new(TokenCodecConfig::new(SECRET).with_issuer("someone-else")).unwrap();
        let token = theirs
            .issue(&user_claims(&theirs, Utc::now().timestamp()))
            .unwrap();

        assert!(matches!(
            ours.verify(&token),
            Err(AuthError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_refresh_claims_use_refresh_lifetime() {
        let codec = TokenCodec::new(TokenCodecConfig::new(SECRET).with_lifetimes(
            Duration::from_secs(60),
            Duration::from_secs(3600),
        ))
        .unwrap();

        let refresh = codec.refresh_claims("a@x.com", "sid", 0);
        assert_eq!(refresh.exp, 3600);
        assert_eq!(codec.access_claims("a@x.com", vec![], "sid", 0).exp, 60);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new(TokenCodecConfig::default()).is_err());
        assert!(parse_algorithm("RS256").is_err());
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
    }
}
