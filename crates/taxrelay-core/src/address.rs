//! Host address -> remote address normalisation.
//!
//! One mapping is used for both protocol generations:
//!
//! | host                  | remote        |
//! |-----------------------|---------------|
//! | `address_line1`       | `line1`       |
//! | `address_line2`       | `line2`       |
//! | `locality`            | `city`        |
//! | `administrative_area` | `region`      |
//! | `postal_code`         | `postal_code` |
//! | `country_code`        | `country`     |

use crate::model::PostalAddress;

/// An address in the remote service's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn normalize(source: &PostalAddress) -> Self {
        Self {
            line1: source.address_line1.trim().to_string(),
            line2: source
                .address_line2
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            city: source.locality.trim().to_string(),
            region: source.administrative_area.trim().to_string(),
            postal_code: source.postal_code.trim().to_string(),
            country: source.country_code.trim().to_ascii_uppercase(),
        }
    }
}

impl From<&PostalAddress> for Address {
    fn from(source: &PostalAddress) -> Self {
        Self::normalize(source)
    }
}
