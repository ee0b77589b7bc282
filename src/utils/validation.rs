use crate::utils::error::{Ev3Error, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Ev3Error::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(Ev3Error::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(Ev3Error::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| Ev3Error::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Ev3Error::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 指令參數的範圍檢查，失敗時回傳 InvalidArgumentError
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(Ev3Error::InvalidArgumentError {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// The brick stores names and file paths as NUL-terminated ASCII.
pub fn validate_brick_string(name: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() || value.len() > max_len {
        return Err(Ev3Error::InvalidArgumentError {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("Length must be between 1 and {}", max_len),
        });
    }
    if !value.is_ascii() || value.contains('\0') {
        return Err(Ev3Error::InvalidArgumentError {
            name: name.to_string(),
            value: value.to_string(),
            reason: "Only ASCII characters without NUL are allowed".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range("speed", 100, -100, 100).is_ok());
        assert!(validate_range("speed", -101, -100, 100).is_err());
        assert!(validate_range("frequency", 250u16, 250, 10000).is_ok());
        assert!(validate_range("frequency", 10001u16, 250, 10000).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("connection.timeout_ms", 500, 1).is_ok());
        assert!(validate_positive_number("connection.timeout_ms", 0, 1).is_err());
    }

    #[test]
    fn test_validate_brick_string() {
        assert!(validate_brick_string("name", "EV3", 12).is_ok());
        assert!(validate_brick_string("name", "", 12).is_err());
        assert!(validate_brick_string("name", "a-very-long-brick-name", 12).is_err());
        assert!(validate_brick_string("name", "caf\u{e9}", 12).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("connection.device", "/dev/rfcomm0").is_ok());
        assert!(validate_path("connection.device", "").is_err());
    }
}
