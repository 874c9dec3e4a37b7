//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every operation enforces the same rules.

use crate::{EngineError, ResultEngine};

/// Trim a display name and check its length (in characters).
pub(crate) fn normalize_name(value: &str, label: &str, min: usize, max: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(EngineError::InvalidName(format!(
            "{label} name must be {min}..={max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Validate a `#RRGGBB` colour.
pub(crate) fn validate_color(value: Option<&str>) -> ResultEngine<Option<String>> {
    let Some(color) = normalize_optional_text(value) else {
        return Ok(None);
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(EngineError::InvalidArgument(format!(
            "invalid color '{color}': expected #RRGGBB"
        )));
    }
    Ok(Some(color))
}

/// Validate an icon identifier (emoji or short name).
pub(crate) fn validate_icon(value: Option<&str>) -> ResultEngine<Option<String>> {
    let icon = normalize_optional_text(value);
    if let Some(icon) = &icon
        && icon.chars().count() > 50
    {
        return Err(EngineError::InvalidArgument(
            "icon must be at most 50 characters".to_string(),
        ));
    }
    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(normalize_name("  Food ", "category", 2, 100).unwrap(), "Food");
        assert!(normalize_name("F", "category", 2, 100).is_err());
        assert!(normalize_name("   ", "goal", 1, 100).is_err());
    }

    #[test]
    fn color_requires_hex_triplet() {
        assert_eq!(
            validate_color(Some("#FF5722")).unwrap().as_deref(),
            Some("#FF5722")
        );
        assert_eq!(validate_color(None).unwrap(), None);
        assert!(validate_color(Some("FF5722")).is_err());
        assert!(validate_color(Some("#GG0000")).is_err());
    }
}
