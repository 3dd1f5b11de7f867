//! Macro for implementing Display and FromStr for wire-label enums
//!
//! Several domain enums travel as short lowercase labels (`"ar"`,
//! `"assignment"`). This macro keeps `Display` and `FromStr` in sync with a
//! single label table and parses case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use balance_domain::impl_wire_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Email,
//!     Push,
//! }
//!
//! impl_wire_label_conversions!(Channel {
//!     Email => "email",
//!     Push => "push",
//! });
//!
//! assert_eq!(Channel::Push.to_string(), "push");
//! assert_eq!("EMAIL".parse::<Channel>(), Ok(Channel::Email));
//! ```

/// Implements Display and FromStr for a label-backed enum
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase label
#[macro_export]
macro_rules! impl_wire_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
