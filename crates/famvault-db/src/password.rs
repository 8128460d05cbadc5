//! Argon2id password hashing for stored credentials.
//!
//! OWASP parameters (memory: 19 MiB, iterations: 2, parallelism: 1) with
//! a fresh random salt per hash. When a pepper is configured it is
//! prepended to the password; verification must use the same pepper.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};

use crate::error::DbError;

/// Hash `password` into a PHC-format Argon2id string.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Password(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Password(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_argon2id_phc_string() {
        let hash = hash_password("secret", None).unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn salts_differ_per_call() {
        let a = hash_password("secret", Some("pepper")).unwrap();
        let b = hash_password("secret", Some("pepper")).unwrap();
        assert_ne!(a, b);
    }
}
