use crate::error::AppError;

pub fn validate_schedule_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::Validation("Schedule name cannot be empty".into()));
    }

    if name.len() > 100 {
        return Err(AppError::Validation(
            "Schedule name cannot be longer than 100 characters".into(),
        ));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(AppError::Validation(
            "Schedule name cannot contain line breaks".into(),
        ));
    }

    Ok(())
}

/// Chat ids are kept as strings: either a numeric Telegram chat id
/// (groups and supergroups are negative) or an `@channelname`.
pub fn validate_chat_id(chat_id: &str) -> Result<(), AppError> {
    let chat_id = chat_id.trim();

    if chat_id.is_empty() {
        return Err(AppError::Validation("Chat ID cannot be empty".into()));
    }

    if let Some(username) = chat_id.strip_prefix('@') {
        if username.is_empty() {
            return Err(AppError::Validation("Channel username cannot be empty".into()));
        }
        return Ok(());
    }

    let numeric: i64 = chat_id
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid chat ID: '{chat_id}'")))?;

    if numeric == 0 {
        return Err(AppError::Validation("Chat ID cannot be zero".into()));
    }

    // Supergroup ids start around -1000000000000; reject values beyond
    // Telegram's known ranges.
    if numeric < -2_000_000_000_000 {
        return Err(AppError::Validation("Chat ID out of valid range".into()));
    }

    Ok(())
}

pub fn validate_training_date(date: &str) -> Result<chrono::NaiveDate, AppError> {
    date.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid training date: '{date}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_schedule_name_valid() {
        assert!(validate_schedule_name("Вторник 19:00").is_ok());
        assert!(validate_schedule_name("Main group schedule").is_ok());
        assert!(validate_schedule_name("  Trimmed  ").is_ok());
    }

    #[test]
    fn test_validate_schedule_name_empty() {
        assert!(validate_schedule_name("").is_err());
        assert!(validate_schedule_name("   ").is_err());
    }

    #[test]
    fn test_validate_schedule_name_too_long() {
        let long_name = "a".repeat(101);
        assert!(validate_schedule_name(&long_name).is_err());

        let max_name = "a".repeat(100);
        assert!(validate_schedule_name(&max_name).is_ok());
    }

    #[test]
    fn test_validate_schedule_name_line_breaks() {
        assert!(validate_schedule_name("Name\nwith\nnewlines").is_err());
    }

    #[test]
    fn test_validate_chat_id_valid() {
        assert!(validate_chat_id("12345").is_ok());
        assert!(validate_chat_id("-12345").is_ok());
        assert!(validate_chat_id("-1001234567890").is_ok());
        assert!(validate_chat_id("@volleychat").is_ok());
    }

    #[test]
    fn test_validate_chat_id_invalid() {
        assert!(validate_chat_id("").is_err());
        assert!(validate_chat_id("0").is_err());
        assert!(validate_chat_id("@").is_err());
        assert!(validate_chat_id("not-a-chat").is_err());
        assert!(validate_chat_id("-3000000000000").is_err());
    }

    #[test]
    fn test_validate_training_date() {
        assert!(validate_training_date("2026-02-15").is_ok());
        assert!(validate_training_date("15.02.2026").is_err());
        assert!(validate_training_date("2026-13-01").is_err());
        assert!(validate_training_date("").is_err());
    }
}
