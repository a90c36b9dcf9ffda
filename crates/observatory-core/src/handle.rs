//! Social handle validation for share-card credits.
//!
//! A handle is 1 to 15 ASCII letters, digits, or underscores. A single
//! leading `@` is accepted on input and stripped.

/// Longest accepted handle.
pub const MAX_HANDLE_LEN: usize = 15;

/// Why a handle was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    /// Nothing left after stripping the `@`.
    #[error("handle is empty")]
    Empty,

    /// More than [`MAX_HANDLE_LEN`] characters.
    #[error("handle is longer than 15 characters")]
    TooLong,

    /// A character outside `[A-Za-z0-9_]`.
    #[error("handle may only contain letters, digits, and underscores")]
    InvalidCharacter,
}

/// Check a bare handle (no `@`).
///
/// # Errors
///
/// Returns the first [`HandleError`] that applies.
pub fn validate_handle(handle: &str) -> Result<(), HandleError> {
    if handle.is_empty() {
        return Err(HandleError::Empty);
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(HandleError::InvalidCharacter);
    }
    // All characters are ASCII here, so bytes == chars.
    if handle.len() > MAX_HANDLE_LEN {
        return Err(HandleError::TooLong);
    }
    Ok(())
}

/// Trim whitespace, strip one leading `@`, and validate.
///
/// # Errors
///
/// Returns a [`HandleError`] if the remaining text is not a valid handle.
pub fn normalize_handle(raw: &str) -> Result<String, HandleError> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('@').unwrap_or(trimmed);
    validate_handle(bare)?;
    Ok(bare.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_handles() {
        for h in ["a", "A_1", "observer_2026", "abcdefghijklmno"] {
            assert_eq!(validate_handle(h), Ok(()), "{h}");
        }
    }

    #[test]
    fn rejects_empty_and_long() {
        assert_eq!(validate_handle(""), Err(HandleError::Empty));
        assert_eq!(
            validate_handle("abcdefghijklmnop"),
            Err(HandleError::TooLong)
        );
    }

    #[test]
    fn rejects_other_characters() {
        for h in ["with space", "dash-ed", "dot.ted", "émile", "@inner", "a!"] {
            assert_eq!(validate_handle(h), Err(HandleError::InvalidCharacter), "{h}");
        }
    }

    #[test]
    fn normalize_strips_one_at_sign() {
        assert_eq!(normalize_handle(" @watcher "), Ok("watcher".to_owned()));
        assert_eq!(normalize_handle("@@watcher"), Err(HandleError::InvalidCharacter));
        assert_eq!(normalize_handle("@"), Err(HandleError::Empty));
    }
}
