use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

// Requester tier. Closed set - each tier gets its own ceiling in the
// rate limit policy instead of probing an ad hoc user dict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Unauthenticated,
    Authenticated,
    Admin,
}

// What the limiter keys on. Computed once per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub key: String,
    pub tier: Tier,
}

// Access token claims as issued by the auth service (HS256, sub + exp,
// admin flag optional)
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    is_admin: bool,
}

// Turns a request into an Identity. The gateway only classifies here -
// rejecting bad tokens with a 401 is the auth upstream's call.
pub struct IdentityClassifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityClassifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn classify(&self, headers: &HeaderMap, client_addr: Option<SocketAddr>) -> Identity {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match auth_header {
            Some(value) => match self.decode(value) {
                Some(claims) => {
                    let tier = if claims.is_admin {
                        Tier::Admin
                    } else {
                        Tier::Authenticated
                    };
                    Identity {
                        key: format!("user:{}", claims.sub),
                        tier,
                    }
                }
                // Header present but not a usable token. Key on a digest of
                // the value so credentials never end up as store keys.
                None => Identity {
                    key: format!("token:{}", digest(value)),
                    tier: Tier::Unauthenticated,
                },
            },
            None => Identity {
                key: format!("ip:{}", client_ip(headers, client_addr)),
                tier: Tier::Unauthenticated,
            },
        }
    }

    fn decode(&self, header_value: &str) -> Option<Claims> {
        let token = header_value.strip_prefix("Bearer ")?;
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

// Client address: first X-Forwarded-For hop if the gateway sits behind a
// load balancer, else the socket peer. "unknown" keeps the key non-empty
// when neither is available (e.g. router driven directly in tests).
pub fn client_ip(headers: &HeaderMap, client_addr: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| client_addr.map(|a| a.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

// Hash of header material (same digest the auth service uses for tokens)
fn digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value);
    format!("{:x}", hasher.finalize())
}
