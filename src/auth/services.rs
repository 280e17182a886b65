use std::time::Duration;

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::auth::repo_types::{NewUser, Role, User};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Checks the shape of a signup and hashes its password.
pub fn prepare_new_user(
    name: &str,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> AppResult<NewUser> {
    let name = name.trim();
    let username = username.trim();
    let email = normalize_email(email);

    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(AppError::validation("Invalid username"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }

    Ok(NewUser {
        name: name.to_string(),
        username: username.to_string(),
        email,
        password_hash: hash_password(password)?,
        role,
    })
}

/// Creates the configured admin account if no account owns that email yet.
pub async fn ensure_bootstrap_admin(state: &AppState) -> AppResult<()> {
    let Some(admin) = state.config.bootstrap_admin.clone() else {
        return Ok(());
    };
    let email = normalize_email(&admin.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        debug!(%email, "bootstrap admin already present");
        return Ok(());
    }
    let username = email.split('@').next().unwrap_or("admin").to_string();
    let new = prepare_new_user("Administrator", &username, &email, &admin.password, Role::Admin)?;
    let user = state.store.create_user(new).await?;
    info!(user_id = %user.id, %email, "bootstrap admin created");
    Ok(())
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, role: Role, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, role, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, role, TokenKind::Refresh)
    }

    /// Access and refresh token for a user, in that order.
    pub fn sign_pair(&self, user: &User) -> anyhow::Result<(String, String)> {
        Ok((
            self.sign_access(user.id, user.role)?,
            self.sign_refresh(user.id, user.role)?,
        ))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}


#[cfg(test)]
mod jwt_tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, Role::Admin).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn sign_and_verify_refresh_token_and_verify_refresh() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id, Role::User).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4(), Role::User).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_audience() {
        let good_keys = make_keys();
        let mut bad_keys = make_keys();
        bad_keys.audience = "someone-else".into();
        let token = good_keys
            .sign_access(Uuid::new_v4(), Role::User)
            .expect("sign access");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("clerk@shop.example"));
        assert!(!is_valid_email("clerk@shop"));
        assert!(!is_valid_email("cl erk@shop.example"));
    }
}
