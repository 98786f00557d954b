//! Row identifiers.
//!
//! Every record is keyed by an auto-incrementing integer assigned by the
//! store. Each table gets its own newtype so ids cannot be mixed up.

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row id.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

row_id!(
    /// Identifier of a local user (owned by the host application).
    UserId
);
row_id!(CustomerTokenId);
row_id!(TransactionId);
row_id!(BankAccountId);
row_id!(RecipientId);
row_id!(TransferId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let id: TransactionId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!("abc".parse::<RecipientId>().is_err());
    }
}
