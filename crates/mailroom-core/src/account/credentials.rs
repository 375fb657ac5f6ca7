//! Salted password hashes.
//!
//! Passwords are stored as Argon2id PHC strings, so the salt and the
//! parameters travel with the hash. [`check_login`] gives the same answer,
//! and does the same amount of work, whether the username or the password
//! was wrong.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::{debug, warn};

use super::model::{User, UserQuery};
use crate::store::UserStore;
use crate::{Error, Result};

/// Hash compared against when the user does not exist.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$yIUSt+uZ0NPJxDH7bHyXo2btPj8URCfIkTB+dfGd3tM";

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns an error if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Returns true if `password` matches the PHC string `hash`.
///
/// A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        warn!("stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Looks a user up by login name, then by address, and checks the password.
///
/// Returns `None` for an unknown user and for a wrong password alike.
///
/// # Errors
///
/// Returns an error only if the user store fails.
pub async fn check_login<S: UserStore + ?Sized>(
    users: &S,
    login: &str,
    password: &str,
) -> Result<Option<User>> {
    let user = match users.get_user(UserQuery::Username(login)).await? {
        Some(user) => Some(user),
        None if login.contains('@') => users.get_user(UserQuery::Email(login)).await?,
        None => None,
    };

    match user {
        Some(user) if verify_password(password, &user.password_hash) => {
            debug!(user = %user.id, "credentials accepted");
            Ok(Some(user))
        }
        Some(_) => Ok(None),
        None => {
            verify_password(password, DUMMY_HASH);
            Ok(None)
        }
    }
}
