//! Partial-update helpers.
//!
//! Update payloads carry `Option<T>` per field: `None` means the client did not
//! send the field. Two policies exist for text fields:
//!
//! - [`apply_nonblank`]: only a non-blank value overwrites, so a field can never
//!   be cleared through a patch (names, titles).
//! - [`apply_present`]: any sent value overwrites, including the empty string,
//!   so optional attributes can be cleared (photo, end date).

/// Overwrite `target` with `value` when it is present and not blank.
///
/// Returns whether `target` changed.
pub fn apply_nonblank(target: &mut String, value: Option<String>) -> bool {
    match value {
        Some(v) if !v.trim().is_empty() && *target != v => {
            *target = v;
            true
        }
        _ => false,
    }
}

/// Overwrite `target` with `value` whenever it is present.
///
/// Returns whether `target` changed.
pub fn apply_present<T: PartialEq>(target: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *target != v => {
            *target = v;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonblank_keeps_on_absent_or_blank() {
        let mut name = String::from("Rina");
        assert!(!apply_nonblank(&mut name, None));
        assert!(!apply_nonblank(&mut name, Some("  ".into())));
        assert_eq!(name, "Rina");
        assert!(apply_nonblank(&mut name, Some("Rina P.".into())));
        assert_eq!(name, "Rina P.");
    }

    #[test]
    fn test_present_can_clear() {
        let mut photo = String::from("https://cdn/x.png");
        assert!(!apply_present(&mut photo, None));
        assert!(apply_present(&mut photo, Some(String::new())));
        assert!(photo.is_empty());

        let mut flag = false;
        assert!(apply_present(&mut flag, Some(true)));
        assert!(!apply_present(&mut flag, Some(true)));
    }
}
