use crate::error::AppError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token, the user's id.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Caller supplied claims. Never contains the reserved keys above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject: Uuid,
    pub claims: Claims,
}

/// Anything able to turn a bearer token into an authenticated subject.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedToken, AppError>;
}

/// Signs and verifies HMAC JWTs with one algorithm fixed at construction.
#[derive(Clone)]
pub struct TokenSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(algorithm: Algorithm, secret: &[u8], ttl: Duration) -> Result<Self, AppError> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AppError::internal(format!(
                "unsupported signing algorithm {:?}",
                algorithm
            )));
        }
        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Signs a token for `subject` that expires after the configured TTL.
    pub fn issue(&self, subject: Uuid, extra_claims: Map<String, Value>) -> Result<IssuedToken, AppError> {
        self.sign(&subject.to_string(), extra_claims, self.ttl)
    }

    /// Signs `extra_claims` plus `sub`, `iat` and `exp = now + ttl`.
    ///
    /// Reserved claims always win over keys of the same name in `extra_claims`.
    pub fn sign(
        &self,
        subject: &str,
        mut extra_claims: Map<String, Value>,
        ttl: Duration,
    ) -> Result<IssuedToken, AppError> {
        for key in RESERVED_CLAIMS {
            extra_claims.remove(key);
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::internal("token expiry overflows"))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            extra: extra_claims,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

        // Expires is carried with second precision, like `exp`.
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::internal("token expiry out of range"))?;

        Ok(IssuedToken { token, expires_at })
    }
}

impl TokenVerifier for TokenSigner {
    /// Every failure is `AppError::Unauthorized`; the cause is only logged.
    fn verify(&self, token: &str) -> Result<VerifiedToken, AppError> {
        let header = decode_header(token)?;
        if header.alg != self.algorithm {
            log::debug!(
                "rejecting token signed with {:?}, expected {:?}",
                header.alg,
                self.algorithm
            );
            return Err(AppError::Unauthorized);
        }

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        let subject = Uuid::parse_str(&claims.sub).map_err(|e| {
            log::debug!("rejecting token with malformed subject: {}", e);
            AppError::Unauthorized
        })?;

        Ok(VerifiedToken { subject, claims })
    }
}
