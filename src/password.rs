//! Client-side format check applied to the credentials table's password
//! column before a new row is saved.

/// Stateless password rule. The accepted shape is deliberately narrow: fewer
/// than 8 characters, at least two decimal digits and at least one character
/// that is not a digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    /// Upper bound (exclusive) on the number of characters.
    pub const MAX_LEN: usize = 8;
    /// Minimum number of decimal digits.
    pub const MIN_DIGITS: usize = 2;

    pub fn is_valid(candidate: &str) -> bool {
        if candidate.chars().count() >= Self::MAX_LEN {
            return false;
        }

        let digits = candidate.chars().filter(char::is_ascii_digit).count();
        let has_non_digit = candidate.chars().any(|ch| !ch.is_ascii_digit());
        digits >= Self::MIN_DIGITS && has_non_digit
    }
}

#[cfg(test)]
mod tests {
    use super::PasswordPolicy;

    #[test]
    fn accepts_short_mixed_passwords() {
        assert!(PasswordPolicy::is_valid("12a"));
        assert!(PasswordPolicy::is_valid("a1b2"));
        assert!(PasswordPolicy::is_valid("ab12cd3"));
    }

    #[test]
    fn rejects_too_few_digits() {
        assert!(!PasswordPolicy::is_valid("a1"));
        assert!(!PasswordPolicy::is_valid("1a"));
        assert!(!PasswordPolicy::is_valid("abc"));
        assert!(!PasswordPolicy::is_valid(""));
    }

    #[test]
    fn rejects_eight_or_more_characters() {
        assert!(!PasswordPolicy::is_valid("12345678"));
        assert!(!PasswordPolicy::is_valid("abcd1234"));
        assert!(!PasswordPolicy::is_valid("abcdefg12"));
    }

    #[test]
    fn rejects_digits_only() {
        assert!(!PasswordPolicy::is_valid("1234567"));
        assert!(!PasswordPolicy::is_valid("12"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Seven characters, more than eight bytes.
        assert!(PasswordPolicy::is_valid("пар12ль"));
    }
}
