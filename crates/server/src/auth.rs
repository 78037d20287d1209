//! Bearer-token authorization.
//!
//! [`Authorizer`] is the seam between the HTTP layer and the identity
//! provider: it turns the raw credential into a [`Decision`] and nothing
//! else. [`JwtAuthorizer`] verifies HS256 tokens signed with a shared secret
//! or RS256 tokens signed by a realm key, and reads Keycloak-style role
//! claims.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use configs::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use service::policy::{Decision, Operation, PolicyTable, Role, RoleSet};
use tracing::debug;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub trait Authorizer: Send + Sync {
    /// `bearer` is the credential after the `Bearer ` prefix, if any header was sent.
    fn authorize(&self, bearer: Option<&str>) -> Decision;
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    realm_access: Option<RealmAccess>,
    #[serde(default)]
    roles: Vec<String>,
}

pub struct JwtAuthorizer {
    key: DecodingKey,
    validation: Validation,
    user_role: String,
    admin_role: String,
}

impl JwtAuthorizer {
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let (key, alg) = match (&cfg.jwt_secret, &cfg.realm_public_key) {
            (Some(secret), None) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, Some(realm_key)) => {
                let pem = realm_key_pem(realm_key);
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).context("auth.realm_public_key is not an RSA public key")?;
                (key, Algorithm::RS256)
            }
            _ => return Err(anyhow!("auth: exactly one of jwt_secret or realm_public_key is required")),
        };
        let mut validation = Validation::new(alg);
        if let Some(iss) = &cfg.issuer {
            validation.set_issuer(&[iss]);
        }
        match &cfg.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Ok(Self { key, validation, user_role: cfg.user_role.clone(), admin_role: cfg.admin_role.clone() })
    }

    fn roles(&self, claims: &Claims) -> RoleSet {
        let granted: HashSet<&str> = claims
            .realm_access
            .iter()
            .flat_map(|ra| ra.roles.iter())
            .chain(claims.roles.iter())
            .map(String::as_str)
            .collect();
        [(self.user_role.as_str(), Role::User), (self.admin_role.as_str(), Role::Admin)]
            .into_iter()
            .filter(|(name, _)| granted.contains(name))
            .map(|(_, role)| role)
            .collect()
    }
}

impl Authorizer for JwtAuthorizer {
    fn authorize(&self, bearer: Option<&str>) -> Decision {
        let Some(token) = bearer else {
            return Decision::anonymous();
        };
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => {
                let roles = self.roles(&data.claims);
                debug!(sub = ?data.claims.sub, ?roles, "bearer token accepted");
                Decision::Allowed(roles)
            }
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                Decision::Denied
            }
        }
    }
}

/// Identity providers show the realm key as bare base64 DER; wrap it into PEM.
fn realm_key_pem(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("-----BEGIN") {
        return key.to_string();
    }
    let body: String = key.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in body.as_bytes().chunks(64) {
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

/// The authorization decision for the current request.
#[derive(Debug, Clone)]
pub struct Caller(pub Decision);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).map(|v| v.to_str().unwrap_or_default().trim());
        let bearer = header.map(|h| match h.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => h,
        });
        Ok(Caller(state.authorizer.authorize(bearer)))
    }
}

/// Applies the policy table to a caller.
#[derive(Clone)]
pub struct Gate {
    policy: Arc<PolicyTable>,
}

impl Gate {
    pub fn new(policy: PolicyTable) -> Self { Self { policy: Arc::new(policy) } }

    pub fn check(&self, collection: &str, op: Operation, caller: &Caller) -> Result<(), JsonApiError> {
        self.policy.check(collection, op, &caller.0).map_err(|e| {
            debug!(collection, op = %op, reason = %e, "access denied");
            JsonApiError::from(e)
        })
    }
}
