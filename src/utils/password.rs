use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// 校验新密码：长度、不能全为数字、不能与用户名相同
pub fn validate_password(password: &str, username: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::ValidationError(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "This password is entirely numeric.".to_string(),
        ));
    }

    if !username.is_empty() && password.to_lowercase() == username.to_lowercase() {
        return Err(AppError::ValidationError(
            "The password is too similar to the username.".to_string(),
        ));
    }

    Ok(())
}

/// 两次输入必须一致
pub fn ensure_passwords_match(first: &str, second: &str, message: &str) -> AppResult<()> {
    if first != second {
        return Err(AppError::ValidationError(message.to_string()));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::InternalError(format!("密码哈希失败: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash).map_err(|e| AppError::InternalError(format!("密码验证失败: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("sunset-boulevard", "norma").is_ok());
        assert!(validate_password("short", "norma").is_err()); // 太短
        assert!(validate_password("1234567890", "norma").is_err()); // 全数字
        assert!(validate_password("NormaDesmond", "normadesmond").is_err()); // 与用户名相同
    }

    #[test]
    fn test_ensure_passwords_match() {
        assert!(ensure_passwords_match("abc", "abc", "mismatch").is_ok());
        let err = ensure_passwords_match("abc", "abd", "mismatch").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "mismatch"));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Password123";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("WrongPassword", &hashed).unwrap());
    }
}
