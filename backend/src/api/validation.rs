use chrono::NaiveDateTime;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// Limit must sit in [1, MAX_LIMIT].
pub fn validate_limit(limit: i64) -> Result<(), String> {
    if limit < 1 || limit > MAX_LIMIT {
        return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
    }
    Ok(())
}

/// When both ends are given, the range must not be inverted.
pub fn validate_date_range(
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> Result<(), String> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err("'from' must be less than or equal to 'to'".to_string());
        }
    }
    Ok(())
}

/// First failing check wins; runs before any store access.
pub fn validate_query(
    limit: i64,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> Result<(), String> {
    validate_limit(limit)?;
    validate_date_range(from, to)
}
