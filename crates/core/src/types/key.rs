//! Opaque string correlation keys.
//!
//! Use the `define_key!` macro to create validated string wrappers that
//! prevent accidentally mixing keys from different entity types (e.g.
//! passing a product id where a session id is expected).

/// Errors that can occur when parsing an opaque key.
#[derive(thiserror::Error, Debug, Clone)]
pub enum KeyError {
    /// The input string is empty.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Name of the key type being parsed.
        kind: &'static str,
    },
    /// The input string is too long.
    #[error("{kind} must be at most {max} characters")]
    TooLong {
        /// Name of the key type being parsed.
        kind: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// Macro to define a validated opaque string key.
///
/// Creates a newtype wrapper around `String` with:
/// - `parse()` validation (non-empty, bounded length)
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`, `FromStr`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with the
///   `postgres` feature), delegating to `String`
///
/// # Example
///
/// ```
/// use greenbasket_core::SessionId;
///
/// let session = SessionId::parse("sess-d81e1a40").unwrap();
/// assert_eq!(session.as_str(), "sess-d81e1a40");
/// assert!(SessionId::parse("").is_err());
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Maximum length accepted for this key.
            pub const MAX_LENGTH: usize = 128;

            /// Parse a key from a string.
            ///
            /// # Errors
            ///
            /// Returns [`KeyError::Empty`] for an empty input and
            /// [`KeyError::TooLong`] for inputs over [`Self::MAX_LENGTH`]
            /// characters. The value is otherwise opaque: issuance and
            /// uniqueness are owned by the collaborator that minted it.
            pub fn parse(s: &str) -> Result<Self, $crate::types::key::KeyError> {
                if s.is_empty() {
                    return Err($crate::types::key::KeyError::Empty { kind: $kind });
                }
                if s.len() > Self::MAX_LENGTH {
                    return Err($crate::types::key::KeyError::TooLong {
                        kind: $kind,
                        max: Self::MAX_LENGTH,
                    });
                }
                Ok(Self(s.to_owned()))
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the key and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::key::KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                // Database values are assumed valid
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// The session correlation key. Issued by an external identity collaborator;
// the cart service only ever treats it as an opaque lookup key.
define_key!(SessionId, "session id");

// Catalog product identifier, opaque to the cart service.
define_key!(ProductId, "product id");
