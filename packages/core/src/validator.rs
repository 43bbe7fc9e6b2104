//! Registration-time handle validation.

/// Policy that accepts or rejects handles when a waiter is populated.
///
/// Never consulted while scanning.
pub trait HandleValidator {
    /// Returns `None` if `handle` is acceptable, or the reason it is not.
    fn validate(&self, handle: &str) -> Option<String>;
}

/// Validator that accepts every handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl HandleValidator for AcceptAll {
    fn validate(&self, _handle: &str) -> Option<String> {
        None
    }
}

impl<F> HandleValidator for F
where
    F: Fn(&str) -> Option<String>,
{
    fn validate(&self, handle: &str) -> Option<String> {
        self(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_accepts() {
        assert_eq!(AcceptAll.validate(""), None);
        assert_eq!(AcceptAll.validate("anything"), None);
    }

    #[test]
    fn closures_validate() {
        let no_digits = |h: &str| {
            h.chars()
                .any(|c| c.is_ascii_digit())
                .then(|| "digits not allowed".to_string())
        };
        assert_eq!(no_digits.validate("abc"), None);
        assert_eq!(
            no_digits.validate("a1"),
            Some("digits not allowed".to_string())
        );
    }
}
