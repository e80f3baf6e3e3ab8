//! Registration, login, and token resolution.
//!
//! Credentials are hashed with Argon2id and stored as PHC strings; the
//! bearer token is an opaque value minted at registration. Login failures
//! never reveal whether the username or the password was wrong.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{AuthUser, EngineError, ResultEngine, users};

use super::{Engine, require_field, with_tx};

const MIN_PASSWORD_CHARS: usize = 8;

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl Engine {
    /// Creates a user with a hashed credential and returns a fresh token.
    ///
    /// Username collisions are checked case-sensitively inside the same
    /// transaction as the insert.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<String> {
        let username = require_field(username, "username")?.to_string();
        let password = password.ok_or_else(|| {
            EngineError::validation("password", "This field is required.")
        })?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(EngineError::validation(
                "password",
                "Password must be at least 8 characters long.",
            ));
        }

        let hash = hash_password(password)?;
        let token = new_token();

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::validation(
                    "username",
                    "A user with this username already exists.",
                ));
            }

            let user = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(hash.clone()),
                token: ActiveValue::Set(Some(token.clone())),
            };
            user.insert(&db_tx).await?;
            Ok(token.clone())
        })
    }

    /// Verifies a credential and returns the user's token, issuing one if
    /// the user has none yet.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<String> {
        let (Some(username), Some(password)) = (username, password) else {
            return Err(EngineError::InvalidCredentials);
        };
        let username = username.to_string();
        let password = password.to_string();

        with_tx!(self, |db_tx| {
            let Some(user) = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::InvalidCredentials);
            };
            if !verify_password(&password, &user.password) {
                return Err(EngineError::InvalidCredentials);
            }

            match user.token.clone() {
                Some(token) => Ok(token),
                None => {
                    let token = new_token();
                    let mut user: users::ActiveModel = user.into();
                    user.token = ActiveValue::Set(Some(token.clone()));
                    user.update(&db_tx).await?;
                    Ok(token)
                }
            }
        })
    }

    /// Resolves a bearer token to its user, if any.
    pub async fn user_by_token(&self, token: &str) -> ResultEngine<Option<AuthUser>> {
        let user = users::Entity::find()
            .filter(users::Column::Token.eq(token.to_string()))
            .one(&self.database)
            .await?;
        Ok(user.map(|user| AuthUser {
            username: user.username,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery", &hash));
        assert!(!verify_password("wrong-horse-battery", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hashes() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }
}
