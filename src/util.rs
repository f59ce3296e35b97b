use crate::error::PrepError;

/// Trim `value` and require its length (in chars) to be within `min..=max`.
pub fn validate_bounded_string(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, PrepError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(PrepError::invalid(field, format!("must be at least {min} characters")));
    }
    if len > max {
        return Err(PrepError::invalid(field, format!("must be at most {max} characters")));
    }
    Ok(trimmed.to_string())
}

/// A finite, non-negative quantity (stock counts, PAR levels, batch counts).
pub fn validate_quantity(value: f64, field: &'static str) -> Result<f64, PrepError> {
    if !value.is_finite() {
        return Err(PrepError::invalid(field, "must be a number"));
    }
    if value < 0.0 {
        return Err(PrepError::invalid(field, "must not be negative"));
    }
    Ok(value)
}

/// Units produced per batch. Missing means one.
pub fn validate_batch_yield(value: Option<f64>) -> Result<f64, PrepError> {
    match value {
        None => Ok(1.0),
        Some(v) if v.is_finite() && v >= 1.0 => Ok(v),
        Some(_) => Err(PrepError::invalid("batch_yield", "must be at least 1")),
    }
}
