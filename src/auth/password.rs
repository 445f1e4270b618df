use crate::error::AppError;
use bcrypt::{hash, verify};

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// bcrypt hashing with a fixed cost.
///
/// All methods are CPU bound; run them through `actix_web::web::block` from handlers.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    decoy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let decoy_hash = hash(DECOY_PASSWORD, cost)?;
        Ok(Self { cost, decoy_hash })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
    }

    /// Returns `false` on mismatch and on a malformed stored hash alike.
    pub fn verify_password(&self, password: &str, hashed_password: &str) -> bool {
        match verify(password, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("stored password hash could not be verified: {}", e);
                false
            }
        }
    }

    /// Spends the same work as a real comparison, for logins with an unknown username.
    pub fn burn(&self, password: &str) {
        let _ = verify(password, &self.decoy_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4).unwrap()
    }

    #[test]
    fn test_password_hashing_and_verification() {
        let hasher = hasher();
        let password = "test_password123";
        let hashed = hasher.hash_password(password).unwrap();

        assert_ne!(hashed, password);
        assert!(hasher.verify_password(password, &hashed));
        assert!(!hasher.verify_password("wrong_password", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash_password("same").unwrap();
        let second = hasher.hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        assert!(!hasher().verify_password("test_password123", "invalidhashformat"));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        assert!(matches!(
            PasswordHasher::new(2),
            Err(AppError::InternalServer(_))
        ));
    }
}
