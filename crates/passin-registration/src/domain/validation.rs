//! Syntactic checks for registration input.

/// Minimum number of characters in an attendee name.
pub const MIN_NAME_CHARS: usize = 4;

/// Returns `true` if `name` has at least [`MIN_NAME_CHARS`] characters.
///
/// Whitespace counts; the name is stored exactly as given.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_CHARS
}

/// Basic email shape check.
///
/// - exactly one `@`, with non-empty local and domain parts
/// - the domain has at least one dot, no empty labels
/// - length between 3 and 254 characters
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local_char =
        |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain_char = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local_char) || !domain.chars().all(valid_domain_char) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
