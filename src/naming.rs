//! Note title and scope name rules
//!
//! Titles and scope names become file and directory names directly, so they
//! must not contain path separators or characters reserved on common
//! filesystems.

/// Characters that may not appear in a title or scope name
pub const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Whether `name` can be used as a note title or scope directory name.
///
/// Leading or trailing whitespace is rejected rather than stripped; callers
/// that accept user input trim it first.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && name != "."
        && name != ".."
        && !name.contains(RESERVED_CHARS)
        && !name.chars().any(char::is_control)
}
