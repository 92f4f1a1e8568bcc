use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn verify_password(hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// Startup check so a bad PHC string fails fast instead of on first login
pub fn validate_hash(hash: &str) -> anyhow::Result<()> {
    PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;
    Ok(())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

// Low-cost hash so handler tests don't spend seconds in argon2
#[cfg(test)]
pub fn cheap_hash(password: &str) -> String {
    let params = argon2::Params::new(1024, 1, 1, None).unwrap();
    let argon = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon.hash_password(password.as_bytes(), &salt).unwrap().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("trucks-and-trailers").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "trucks-and-trailers").unwrap());
        assert!(!verify_password(&hash, "Trucks-and-trailers").unwrap());
    }

    #[test]
    fn verify_uses_params_from_hash() {
        let hash = cheap_hash("owner-pass");
        assert!(verify_password(&hash, "owner-pass").unwrap());
        assert!(!verify_password(&hash, "owner-pas").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "x").is_err());
    }

    #[test]
    fn validate_hash_accepts_phc_and_rejects_garbage() {
        assert!(validate_hash(&cheap_hash("owner-pass")).is_ok());
        assert!(validate_hash("not-a-phc-string").is_err());
        assert!(validate_hash("").is_err());
    }
}
