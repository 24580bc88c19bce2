use crate::utils::error::{AppError, Result};

/// Cleans up a decimal typed on a phone keypad or a Spanish keyboard.
///
/// Commas become dots, anything that is not a digit or a dot is dropped,
/// and only the first dot survives. Redundant leading zeros are removed and
/// a bare leading dot gets a `0` in front. Returns an empty string when
/// nothing numeric is left.
pub fn normalize_decimal_input(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seen_dot = false;

    for ch in text.chars() {
        match ch {
            '0'..='9' => out.push(ch),
            '.' | ',' if !seen_dot => {
                seen_dot = true;
                out.push('.');
            }
            _ => {}
        }
    }

    if out.is_empty() || out == "." {
        return String::new();
    }

    let int_len = out.find('.').unwrap_or(out.len());
    let leading_zeros = out[..int_len].chars().take_while(|c| *c == '0').count();
    // keep one zero when the integer part is all zeros
    let strip = if leading_zeros == int_len {
        leading_zeros.saturating_sub(1)
    } else {
        leading_zeros
    };
    out.drain(..strip);

    if out.starts_with('.') {
        out.insert(0, '0');
    }
    out
}

/// Parses one circumference field. The raw entry is trimmed and normalised
/// first; empty, negative or non-finite values are rejected.
pub fn parse_measurement(field: &str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidMeasurement {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "value is required".to_string(),
        });
    }
    if trimmed.starts_with('-') {
        return Err(AppError::InvalidMeasurement {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "value must not be negative".to_string(),
        });
    }

    let normalized = normalize_decimal_input(trimmed);
    let value: f64 = normalized.parse().map_err(|_| AppError::InvalidMeasurement {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "value is not a number".to_string(),
    })?;

    if !value.is_finite() {
        return Err(AppError::InvalidMeasurement {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "value is out of range".to_string(),
        });
    }
    Ok(value)
}

/// True when the field holds something other than whitespace.
pub fn is_filled(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
