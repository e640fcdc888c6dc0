use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when a string is not a canonical branded id.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed {kind} id: {value}")]
pub struct MalformedId {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! branded_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7()))
            }

            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Accepts only `<prefix>_<uuid>` with a lowercase hyphenated UUID.
            pub fn parse_canonical(s: &str) -> Result<Self, MalformedId> {
                let malformed = || MalformedId {
                    kind: $prefix,
                    value: s.to_owned(),
                };
                let rest = s
                    .strip_prefix($prefix)
                    .and_then(|r| r.strip_prefix('_'))
                    .ok_or_else(malformed)?;
                let uuid = Uuid::try_parse(rest).map_err(|_| malformed())?;
                if uuid.hyphenated().to_string() != rest {
                    return Err(malformed());
                }
                Ok(Self(s.to_owned()))
            }

            pub fn is_canonical(s: &str) -> bool {
                Self::parse_canonical(s).is_ok()
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = MalformedId;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_canonical(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

branded_id!(SessionId, "sess");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_prefix() {
        let id = SessionId::new();
        assert!(id.as_str().starts_with("sess_"), "got: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_are_canonical() {
        let id = SessionId::new();
        assert!(SessionId::is_canonical(id.as_str()));
        let parsed: SessionId = id.as_str().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_wrong_prefix() {
        let uuid = Uuid::now_v7();
        assert!(!SessionId::is_canonical(&format!("conn_{uuid}")));
        assert!(!SessionId::is_canonical("sess-0190b7a2-2f0e-7c3a-9d6e-1f2a3b4c5d6e"));
    }

    #[test]
    fn rejects_long_non_id_strings() {
        // Length alone must never make a string look like an id.
        assert!(!SessionId::is_canonical("a-very-long-preference-string"));
        assert!(!SessionId::is_canonical("sess_not-a-uuid-at-all-but-long"));
        assert!(!SessionId::is_canonical("new"));
        assert!(!SessionId::is_canonical(""));
    }

    #[test]
    fn rejects_non_hyphenated_uuid() {
        let uuid = Uuid::now_v7();
        let simple = format!("sess_{}", uuid.simple());
        assert!(!SessionId::is_canonical(&simple));
        let upper = format!("sess_{}", uuid.hyphenated().to_string().to_uppercase());
        assert!(!SessionId::is_canonical(&upper));
    }

    #[test]
    fn malformed_error_names_value() {
        let err = SessionId::parse_canonical("bogus").unwrap_err();
        assert_eq!(err.to_string(), "malformed sess id: bogus");
    }

    #[test]
    fn from_raw_preserves_value() {
        let id = SessionId::from_raw("custom-id-123");
        assert_eq!(id.as_str(), "custom-id-123");
    }

    #[test]
    fn monotonic_ordering() {
        let ids: Vec<SessionId> = (0..100).map(|_| SessionId::new()).collect();
        for w in ids.windows(2) {
            assert!(w[0] < w[1], "not monotonic: {} >= {}", w[0], w[1]);
        }
    }
}
