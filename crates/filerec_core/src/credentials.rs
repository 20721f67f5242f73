//! The injected hashing capability.

/// Checks a plain-text secret against a stored hash.
///
/// The record store consumes this as an opaque collaborator when
/// validating credentials (see
/// [`Record::verify_secret`](crate::Record::verify_secret)); it never
/// implements hashing itself. Implementations typically wrap whatever
/// password hashing scheme the host application uses.
pub trait HashVerifier {
    /// Returns `true` if `plain` matches the stored `hash`.
    fn check(&self, plain: &str, hash: &str) -> bool;
}

impl<F> HashVerifier for F
where
    F: Fn(&str, &str) -> bool,
{
    fn check(&self, plain: &str, hash: &str) -> bool {
        self(plain, hash)
    }
}
