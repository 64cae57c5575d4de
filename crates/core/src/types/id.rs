//! Newtype IDs for identifiers issued by the upstream platform.
//!
//! The platform hands out identifiers as either JSON strings or JSON numbers
//! depending on the endpoint. Both are normalized to their string form so a
//! vendor id read from the profile endpoint can be substituted verbatim into
//! catalog URL templates.

/// Macro to define a type-safe upstream ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `From<String>`, `From<&str>` and `AsRef<str>` implementations
/// - `from_json()` accepting a JSON string or number
///
/// # Example
///
/// ```rust
/// # use marketlink_core::define_id;
/// define_id!(ShopId);
/// define_id!(WarehouseId);
///
/// let shop = ShopId::new("42");
/// let warehouse = WarehouseId::new("42");
///
/// // These are different types, so this won't compile:
/// // let _: ShopId = warehouse;
/// # let _ = (shop, warehouse);
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
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Read an ID from a JSON value that may be a string or a number.
            ///
            /// Returns `None` for any other JSON type and for blank strings.
            #[must_use]
            pub fn from_json(value: &::serde_json::Value) -> Option<Self> {
                match value {
                    ::serde_json::Value::String(s) if !s.trim().is_empty() => {
                        Some(Self(s.trim().to_owned()))
                    }
                    ::serde_json::Value::Number(n) => Some(Self(n.to_string())),
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Identifiers issued by the upstream platform
define_id!(ExternalUserId);
define_id!(VendorId);
