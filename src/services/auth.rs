//! Credential check against the configured allow-list.
//!
//! Both sides are reduced to SHA-512 digests before comparison, so the
//! comparison always runs over 64 bytes whatever the credential length. Every
//! entry is compared on every call and the results are folded without
//! branching, so timing does not reveal which entry matched.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use rand::RngCore;
use sha2::{Digest, Sha512};
use std::sync::Arc;

type Digest512 = [u8; 64];

/// Random bytes behind a generated credential.
const CREDENTIAL_BYTES: usize = 9;

/// Fresh credential suitable for the allow-list: 9 CSPRNG bytes, URL-safe
/// base64 (12 characters, never padded).
pub fn generate_credential() -> String {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

#[derive(Clone)]
pub struct Authenticator {
    identities: Arc<[Digest512]>,
}

impl Authenticator {
    /// Build from the allow-listed identities.
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identities: identities
                .into_iter()
                .map(|id| hash(id.as_ref()))
                .collect(),
        }
    }

    /// True iff `credential` equals at least one allow-listed identity.
    pub fn authenticate(&self, credential: &str) -> bool {
        let presented = hash(credential);
        let mut matched = 0u8;
        for identity in self.identities.iter() {
            matched |= constant_time_eq(&presented, identity) as u8;
        }
        matched == 1
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("identities", &self.identities.len())
            .finish()
    }
}

fn hash(value: &str) -> Digest512 {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(value.as_bytes()));
    out
}

/// Constant-time comparison of two digests.
fn constant_time_eq(a: &Digest512, b: &Digest512) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_listed_identity() {
        let auth = Authenticator::new(["first-user", "gZM9Vl62YYTP", "last-user"]);
        assert!(auth.authenticate("first-user"));
        assert!(auth.authenticate("gZM9Vl62YYTP"));
        assert!(auth.authenticate("last-user"));
    }

    #[test]
    fn rejects_unknown_and_near_misses() {
        let auth = Authenticator::new(["gZM9Vl62YYTP"]);
        assert!(!auth.authenticate(""));
        assert!(!auth.authenticate("gZM9Vl62YYT"));
        assert!(!auth.authenticate("gZM9Vl62YYTPx"));
        assert!(!auth.authenticate("GZM9VL62YYTP"));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let auth = Authenticator::new(Vec::<String>::new());
        assert!(!auth.authenticate(""));
        assert!(!auth.authenticate("anything"));
    }

    #[test]
    fn duplicate_entries_still_authenticate() {
        let auth = Authenticator::new(["same", "same"]);
        assert!(auth.authenticate("same"));
        assert!(!auth.authenticate("other"));
    }

    #[test]
    fn debug_output_hides_identities() {
        let auth = Authenticator::new(["top-secret"]);
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn generated_credentials_authenticate() {
        let credential = generate_credential();
        assert_eq!(credential.len(), 12);
        assert!(!credential.contains('='));
        assert_ne!(credential, generate_credential());

        let auth = Authenticator::new([credential.as_str()]);
        assert!(auth.authenticate(&credential));
    }

    #[test]
    fn constant_time_eq_detects_single_bit() {
        let a = [0u8; 64];
        let mut b = [0u8; 64];
        assert!(constant_time_eq(&a, &b));
        b[63] = 1;
        assert!(!constant_time_eq(&a, &b));
    }
}
