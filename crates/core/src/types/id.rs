//! Newtype IDs for type-safe entity references.
//!
//! Every TechMart entity is addressed by a positive integer. The `define_id!`
//! macro creates wrappers that cannot be mixed up and that validate path
//! input before it ever reaches a store.

/// Errors that can occur when parsing an entity ID from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is not an integer.
    #[error("invalid id '{0}': must be a positive integer")]
    NotANumber(String),
    /// The input is zero or negative.
    #[error("invalid id {0}: must be a positive integer")]
    NotPositive(i64),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_i32()`, `next()` and a validating `parse()`
/// - `FromStr` (same rules as `parse()`), `Display`, `From<i32>`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use techmart_core::define_id;
/// define_id!(WidgetId);
///
/// let id = WidgetId::parse("42").unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert!(WidgetId::parse("0").is_err());
/// assert!(WidgetId::parse("abc").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// The ID immediately after this one.
            #[must_use]
            pub const fn next(&self) -> Self {
                Self(self.0.saturating_add(1))
            }

            /// Parse an ID from path or query text.
            ///
            /// # Errors
            ///
            /// Returns `IdError` if the text is not an integer or is not
            /// strictly positive.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| $crate::types::id::IdError::NotANumber(s.to_owned()))?;
                if value <= 0 {
                    return Err($crate::types::id::IdError::NotPositive(value));
                }
                i32::try_from(value)
                    .map(Self)
                    .map_err(|_| $crate::types::id::IdError::NotANumber(s.to_owned()))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProductId);
define_id!(UserId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(DealId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        assert_eq!(ProductId::parse("301671").unwrap(), ProductId::new(301_671));
        assert_eq!(ProductId::parse(" 7 ").unwrap().as_i32(), 7);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            ProductId::parse("abc"),
            Err(IdError::NotANumber(_))
        ));
        assert!(matches!(ProductId::parse("1.5"), Err(IdError::NotANumber(_))));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert_eq!(ProductId::parse("0"), Err(IdError::NotPositive(0)));
        assert_eq!(ProductId::parse("-4"), Err(IdError::NotPositive(-4)));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(ProductId::parse("99999999999").is_err());
    }

    #[test]
    fn test_next() {
        assert_eq!(ProductId::new(301_671).next(), ProductId::new(301_672));
        assert_eq!(ProductId::new(i32::MAX).next(), ProductId::new(i32::MAX));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&OrderId::new(12)).unwrap();
        assert_eq!(json, "12");
        let id: UserId = serde_json::from_str("5").unwrap();
        assert_eq!(id, UserId::new(5));
    }
}
