//! Handshake origin policy.
//!
//! Browsers send an `Origin` header on WebSocket handshakes; other clients
//! usually do not. [`OriginPolicy::AllowList`] rejects handshakes whose
//! origin is not listed and lets header-less handshakes through.
//! [`OriginPolicy::AllowAll`] accepts every origin and must not be exposed
//! beyond a trusted network.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// OriginPolicy
// ============================================================================

/// Which handshake origins are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept everything.
    #[default]
    AllowAll,
    /// Accept only these origins, stored as `scheme://host[:port]`.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Builds an allow-list, normalizing each origin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an entry is not an absolute URL with a host.
    pub fn allow_list<I, S>(origins: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        origins
            .into_iter()
            .map(|origin| {
                let origin = origin.as_ref();
                normalize(origin)
                    .ok_or_else(|| Error::config(format!("invalid origin in allow-list: {origin}")))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::AllowList)
    }

    /// Returns `true` if a handshake with this `Origin` header is accepted.
    #[must_use]
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::AllowAll, _) | (Self::AllowList(_), None) => true,
            (Self::AllowList(allowed), Some(origin)) => {
                normalize(origin).is_some_and(|o| allowed.contains(&o))
            }
        }
    }

    /// Returns `true` for [`OriginPolicy::AllowAll`].
    #[inline]
    #[must_use]
    pub const fn is_allow_all(&self) -> bool {
        matches!(self, Self::AllowAll)
    }
}

/// `https://Example.com:443/path` becomes `https://example.com`.
fn normalize(origin: &str) -> Option<String> {
    let origin = Url::parse(origin).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let policy = OriginPolicy::default();
        assert!(policy.is_allow_all());
        assert!(policy.allows(Some("https://evil.example")));
        assert!(policy.allows(None));
    }

    #[test]
    fn test_allow_list_normalizes() {
        let policy =
            OriginPolicy::allow_list(["https://App.example.com:443/index.html", "http://localhost:3000"])
                .expect("valid");
        assert_eq!(
            policy,
            OriginPolicy::AllowList(vec![
                "https://app.example.com".to_string(),
                "http://localhost:3000".to_string(),
            ])
        );
        assert!(policy.allows(Some("https://app.example.com")));
        assert!(policy.allows(Some("http://localhost:3000")));
        assert!(!policy.allows(Some("http://localhost:3001")));
        assert!(!policy.allows(Some("null")));
    }

    #[test]
    fn test_allow_list_without_header() {
        let policy = OriginPolicy::allow_list(["https://app.example.com"]).expect("valid");
        assert!(policy.allows(None));
    }

    #[test]
    fn test_invalid_entry() {
        let err = OriginPolicy::allow_list(["not a url"]).expect_err("invalid");
        assert!(matches!(err, Error::Config { .. }));
    }
}
