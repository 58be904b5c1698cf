//! 密码值对象
//!
//! Argon2 加盐哈希；慢哈希成本满足交互式登录延迟预算下的离线爆破抗性

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// 哈希后的密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// 从明文密码创建哈希密码
    pub fn from_plain(plain_password: &str) -> Result<Self, PasswordError> {
        validate(plain_password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(Self(password_hash))
    }

    /// 验证明文密码是否匹配
    pub fn verify(&self, plain_password: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// 验证密码强度
fn validate(password: &str) -> Result<(), PasswordError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Password 错误
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password is too short (minimum {0} characters)")]
    TooShort(usize),

    #[error("Password is too long (maximum {0} characters)")]
    TooLong(usize),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl From<PasswordError> for stockdesk_errors::AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed(msg) | PasswordError::InvalidHash(msg) => {
                stockdesk_errors::AppError::internal(msg)
            }
            other => stockdesk_errors::AppError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = HashedPassword::from_plain("correct-horse-9").unwrap();

        assert!(hashed.verify("correct-horse-9").unwrap());
        assert!(!hashed.verify("wrong-password").unwrap());
    }

    #[test]
    fn test_too_short_rejected() {
        let err = HashedPassword::from_plain("short").unwrap_err();
        assert!(matches!(err, PasswordError::TooShort(_)));
    }

    #[test]
    fn test_display_redacts_hash() {
        let hashed = HashedPassword::from_plain("correct-horse-9").unwrap();
        assert_eq!(format!("{}", hashed), "[REDACTED]");
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = HashedPassword::from_plain("correct-horse-9").unwrap();
        let b = HashedPassword::from_plain("correct-horse-9").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }
}
