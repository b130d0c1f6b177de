use crate::{error::ModelResult, models::User};
use argon2::Argon2;
use password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Argon2 PHC string stored in `users.password_hash`.
pub fn hash_password(password: impl AsRef<[u8]>) -> ModelResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_ref(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

impl User {
    /// False for a wrong password as well as for a stored hash that does not parse.
    pub fn check_password(&self, password: impl AsRef<[u8]>) -> bool {
        PasswordHash::new(&self.password_hash).map_or(false, |parsed| {
            Argon2::default()
                .verify_password(password.as_ref(), &parsed)
                .is_ok()
        })
    }
}
