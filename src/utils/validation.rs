use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_USERNAME_LENGTH: usize = 150;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

/// 用户名：必填，最多 150 个字符，仅允许字母、数字和 @/./+/-/_
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::ValidationError(
            "Username is required.".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters."
        )));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::ValidationError(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        ));
    }
    Ok(())
}

/// 校验去除首尾空白后的文本长度，返回去空白后的值
pub fn validate_text_length(value: &str, field: &str, min: usize, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(AppError::ValidationError(format!(
            "{field} must be at least {min} characters long."
        )));
    }
    if len > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max} characters long."
        )));
    }
    Ok(trimmed.to_string())
}

/// 将可选文本规范化：空白字符串视为未填写
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b@c+d-e_f").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
        assert!(validate_username(&"x".repeat(150)).is_ok());
    }

    #[test]
    fn test_validate_text_length_trims() {
        assert_eq!(
            validate_text_length("  hello  ", "Title", 5, 10).unwrap(),
            "hello"
        );
        assert!(validate_text_length(" hi ", "Title", 5, 10).is_err());
        assert!(validate_text_length("abcdefghijk", "Title", 1, 10).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  Nolan ")), Some("Nolan".to_string()));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
    }
}
