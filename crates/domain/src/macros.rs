//! Macro for implementing Display and FromStr for domain enums
//!
//! Generates `as_str`, `Display` and case-insensitive `FromStr` from a
//! single variant-to-string table.
//!
//! # Example
//!
//! ```rust
//! use faultline_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Tier {
//!     Production,
//!     Staging,
//! }
//!
//! impl_domain_status_conversions!(Tier {
//!     Production => "production",
//!     Staging => "staging",
//! });
//!
//! assert_eq!(Tier::Staging.to_string(), "staging");
//! assert_eq!("PRODUCTION".parse::<Tier>(), Ok(Tier::Production));
//! ```

/// Implements `as_str`, Display and FromStr for fieldless enums
///
/// # Features
///
/// - Case-insensitive parsing (e.g., "STAGING", "staging", "Staging" all work)
/// - Consistent lowercase string output
/// - Descriptive error messages with enum name
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable string form of this value
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
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
