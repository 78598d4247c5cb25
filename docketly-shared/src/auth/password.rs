/// Password hashing with Argon2id
///
/// Login passwords are stored as PHC strings (`$argon2id$v=19$m=...`), so the
/// parameters travel with the hash and verification needs no configuration.
///
/// # Parameters
///
/// - Memory: 64 MB
/// - Iterations: 3
/// - Parallelism: 4 lanes
/// - Output: 32 bytes
///
/// # Example
///
/// ```
/// use docketly_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Scaffold42")?;
/// assert!(verify_password("Scaffold42", &hash)?);
/// assert!(!verify_password("scaffold42", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Length of generated temporary passwords
const TEMPORARY_PASSWORD_LEN: usize = 12;

// No 0/O, 1/l/I: temporary passwords get read out over the phone
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Returns `Ok(false)` for a wrong password and `Err` only when the stored
/// hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks the password policy
///
/// At least 8 characters with an uppercase letter, a lowercase letter and a
/// digit.
///
/// ```
/// use docketly_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("Formwork7").is_ok());
/// assert!(validate_password_strength("formwork7").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Generates a random password that satisfies [`validate_password_strength`]
///
/// Used when an admin creates an account without choosing a password. The
/// value goes out in the account-created email.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();

    let mut chars: Vec<u8> = vec![
        UPPER[rng.gen_range(0..UPPER.len())],
        LOWER[rng.gen_range(0..LOWER.len())],
        DIGITS[rng.gen_range(0..DIGITS.len())],
    ];

    let pool: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
    while chars.len() < TEMPORARY_PASSWORD_LEN {
        chars.push(pool[rng.gen_range(0..pool.len())]);
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("Formwork7").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Formwork7").expect("Hash should succeed");

        assert!(verify_password("Formwork7", &hash).expect("Verify should succeed"));
        assert!(!verify_password("formwork7", &hash).expect("Verify should succeed"));
        assert!(!verify_password("", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "").is_err());

        // Parses as a PHC string but carries no digest; never a match
        assert!(!matches!(verify_password("password", "$argon2id$invalid"), Ok(true)));
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("Formwork7").is_ok());
        assert!(validate_password_strength("Concrete2026").is_ok());

        let err = validate_password_strength("Sh0rt").unwrap_err();
        assert!(err.contains("at least 8 characters"));

        let err = validate_password_strength("lowercase1").unwrap_err();
        assert!(err.contains("uppercase letter"));

        let err = validate_password_strength("UPPERCASE1").unwrap_err();
        assert!(err.contains("lowercase letter"));

        let err = validate_password_strength("NoDigitsHere").unwrap_err();
        assert!(err.contains("digit"));
    }

    #[test]
    fn test_temporary_password_meets_policy() {
        for _ in 0..50 {
            let password = generate_temporary_password();
            assert_eq!(password.len(), TEMPORARY_PASSWORD_LEN);
            assert!(validate_password_strength(&password).is_ok(), "{}", password);
            assert!(!password.contains(['0', 'O', '1', 'l', 'I']));
        }
    }

    #[test]
    fn test_temporary_passwords_differ() {
        assert_ne!(generate_temporary_password(), generate_temporary_password());
    }
}
