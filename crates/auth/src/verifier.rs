//! Credential verification boundary.
//!
//! Which hashing scheme protects stored credentials is a deployment choice
//! and lives outside this crate; the toolkit only ever asks "does this
//! plaintext match this stored reference?".

/// Compares a presented plaintext against a stored reference value.
///
/// Implementations must treat an empty plaintext or an empty reference as
/// automatic failure.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, plaintext: &str, reference: &str) -> bool;
}

/// Raw equality comparison.
///
/// Useful for API keys and for tests; production password deployments should
/// wire a hash comparison through [`FnVerifier`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainVerifier;

impl CredentialVerifier for PlainVerifier {
    fn verify(&self, plaintext: &str, reference: &str) -> bool {
        if plaintext.trim().is_empty() || reference.trim().is_empty() {
            return false;
        }
        plaintext == reference
    }
}

/// Adapts any comparison function (bcrypt check, HMAC comparison, ...) to the
/// verifier interface, keeping the empty-input guard in one place.
pub struct FnVerifier<F>(F);

impl<F> FnVerifier<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    pub fn new(verify: F) -> Self {
        Self(verify)
    }
}

impl<F> CredentialVerifier for FnVerifier<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, plaintext: &str, reference: &str) -> bool {
        if plaintext.trim().is_empty() || reference.trim().is_empty() {
            return false;
        }
        (self.0)(plaintext, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_verifier_compares_exactly() {
        assert!(PlainVerifier.verify("secret", "secret"));
        assert!(!PlainVerifier.verify("secret", "other"));
    }

    #[test]
    fn empty_inputs_always_fail() {
        assert!(!PlainVerifier.verify("", "secret"));
        assert!(!PlainVerifier.verify("secret", ""));
        assert!(!PlainVerifier.verify("  ", "  "));

        let always_yes = FnVerifier::new(|_, _| true);
        assert!(!always_yes.verify("", "reference"));
        assert!(!always_yes.verify("plaintext", ""));
    }

    #[test]
    fn fn_verifier_delegates() {
        let reversed = FnVerifier::new(|plain: &str, reference: &str| {
            plain.chars().rev().collect::<String>() == reference
        });
        assert!(reversed.verify("abc", "cba"));
        assert!(!reversed.verify("abc", "abc"));
    }
}
