//! # Actor Claims
//!
//! Every bill and refund records who did it. The counter passes an access
//! token; the engine decodes it to an [`Actor`] before touching anything.
//!
//! ## Token Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Header:  { "alg": "HS256", "typ": "JWT" }                              │
//! │  Payload: {                                                             │
//! │    "sub":   "user-uuid",        ← Actor::id, stamped on the bill       │
//! │    "role":  "cashier",          ← admin | cashier                      │
//! │    "email": "asha@splash.park",                                        │
//! │    "iat":   1700000000,                                                 │
//! │    "exp":   1700043200,         ← a shift, by default                  │
//! │    "jti":   "token-uuid"                                                │
//! │  }                                                                      │
//! │  Signature: HMAC-SHA256(header.payload, secret)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tokens are issued by the back office; [`ClaimsReader::issue`] exists so the
//! counter can mint one for a local operator and for tests.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Why a token did not produce an actor.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing access token")]
    MissingToken,

    #[error("access token has expired")]
    Expired,

    #[error("invalid access token: {0}")]
    Invalid(String),

    #[error("could not issue token: {0}")]
    Issue(String),
}

/// What the holder of a token is allowed to do at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            other => Err(AuthError::Invalid(format!("unknown role '{}'", other))),
        }
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub email: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    email: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Decodes (and, for local operators, issues) HS256 access tokens.
#[derive(Clone)]
pub struct ClaimsReader {
    secret: String,
}

impl fmt::Debug for ClaimsReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsReader").finish_non_exhaustive()
    }
}

impl ClaimsReader {
    pub fn new(secret: impl Into<String>) -> Self {
        ClaimsReader {
            secret: secret.into(),
        }
    }

    /// Decodes a token into the actor it names.
    ///
    /// Signature and expiry are both checked.
    pub fn decode(&self, token: &str) -> Result<Actor, AuthError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid(e.to_string()),
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::Invalid("token has no subject".to_string()));
        }

        Ok(Actor {
            id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }

    /// Issues a token for `actor`, valid for `lifetime`.
    pub fn issue(&self, actor: &Actor, lifetime: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.id.clone(),
            role: actor.role,
            email: actor.email.clone(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Issue(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> Actor {
        Actor {
            id: "cashier-1".to_string(),
            role: Role::Cashier,
            email: "asha@splash.park".to_string(),
        }
    }

    #[test]
    fn test_issue_and_decode() {
        let reader = ClaimsReader::new("test-secret");
        let token = reader.issue(&cashier(), Duration::hours(1)).unwrap();

        let actor = reader.decode(&token).unwrap();
        assert_eq!(actor, cashier());
        assert!(!actor.is_admin());

        let bearer = format!("Bearer {}", token);
        assert_eq!(reader.decode(&bearer).unwrap().id, "cashier-1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = ClaimsReader::new("one")
            .issue(&cashier(), Duration::hours(1))
            .unwrap();
        let err = ClaimsReader::new("two").decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let reader = ClaimsReader::new("test-secret");
        // Past the default 60s leeway.
        let token = reader.issue(&cashier(), Duration::minutes(-5)).unwrap();
        assert!(matches!(reader.decode(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_missing_and_garbage_tokens() {
        let reader = ClaimsReader::new("test-secret");
        assert!(matches!(reader.decode("  "), Err(AuthError::MissingToken)));
        assert!(matches!(reader.decode("not.a.jwt"), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("manager".parse::<Role>().is_err());
    }
}
