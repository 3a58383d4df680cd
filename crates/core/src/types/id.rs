//! Newtype IDs for type-safe entity references.
//!
//! The backend API identifies every entity with an opaque string (a document
//! object id). Use the `define_id!` macro to create wrappers that prevent
//! accidentally passing an order id where a product id is expected.

/// Error returned when an ID string is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("id cannot be empty")]
pub struct EmptyIdError;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` (rejects blank input), `as_str()`, `Display`
/// - `AsRef<str>` so IDs can be interpolated into request paths
///
/// # Example
///
/// ```rust
/// # use bestdeal_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::parse("665f1c").unwrap();
/// assert_eq!(widget.as_str(), "665f1c");
///
/// // These are different types, so this won't compile:
/// // let _: GadgetId = widget;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns [`EmptyIdError`]($crate::types::id::EmptyIdError) when
            /// the input is blank.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::types::id::EmptyIdError> {
                let id = id.trim();
                if id.is_empty() {
                    return Err($crate::types::id::EmptyIdError);
                }
                Ok(Self(id.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::EmptyIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(BrandId);
define_id!(OrderId);
define_id!(UserId);
define_id!(TicketId);
define_id!(BannerId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = ProductId::parse("  abc123 ").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(OrderId::parse(""), Err(EmptyIdError));
        assert_eq!(OrderId::parse("   "), Err(EmptyIdError));
    }

    #[test]
    fn test_serde_is_transparent() {
        let id: UserId = serde_json::from_str("\"u-1\"").unwrap();
        assert_eq!(id.as_str(), "u-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u-1\"");
    }
}
