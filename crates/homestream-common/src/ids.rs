//! Typed ID wrappers for type safety across homestream.
//!
//! Folder ids come from configuration; media and collection ids are assigned
//! by the metadata provider and never change once recorded.

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Return the raw numeric value.
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a configured library folder.
    FolderId
);

numeric_id!(
    /// Provider-assigned identifier of a movie or TV show.
    MediaId
);

numeric_id!(
    /// Provider-assigned identifier of a movie collection.
    CollectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = MediaId::from(1396);
        assert_eq!(id.to_string(), "1396");
        assert_eq!("1396".parse::<MediaId>().unwrap(), id);
        assert!("abc".parse::<MediaId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = CollectionId::from(10);
        assert_eq!(serde_json::to_string(&id).unwrap(), "10");
        let back: CollectionId = serde_json::from_str("10").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering_and_raw() {
        assert!(FolderId::from(1) < FolderId::from(2));
        assert_eq!(u64::from(FolderId::from(7)), 7);
        assert_eq!(FolderId::from(7).get(), 7);
    }
}
