//! Macro for implementing Display and FromStr for stored tag enums
//!
//! Node kinds and attendee responses are persisted as lowercase text columns.
//! The macro keeps the string form identical in both directions.
//!
//! # Example
//!
//! ```rust
//! use tidesync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Visibility {
//!     Public,
//!     Private,
//! }
//!
//! impl_domain_status_conversions!(Visibility {
//!     Public => "public",
//!     Private => "private",
//! });
//!
//! assert_eq!(Visibility::Private.to_string(), "private");
//! assert_eq!("PUBLIC".parse::<Visibility>(), Ok(Visibility::Public));
//! ```

/// Implements `Display` and case-insensitive `FromStr` for a fieldless enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
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
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
