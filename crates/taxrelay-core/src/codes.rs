//! Remote-service enumerations: customer usage types, document types and
//! result severity levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a customer may be exempt from, or subject to special, tax treatment.
///
/// Serialised as the single-letter code the remote service expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerUsageType {
    #[serde(rename = "A")]
    FederalGovernment,
    #[serde(rename = "B")]
    StateLocalGovernment,
    #[serde(rename = "C")]
    TribalGovernment,
    #[serde(rename = "D")]
    ForeignGovernment,
    #[serde(rename = "E")]
    CharitableOrganization,
    #[serde(rename = "F")]
    ReligiousEducation,
    #[serde(rename = "G")]
    Resale,
    #[serde(rename = "H")]
    AgriculturalProduction,
    #[serde(rename = "I")]
    IndustrialProductionManufacturing,
    #[serde(rename = "J")]
    DirectPayPermit,
    #[default]
    #[serde(rename = "K")]
    DirectMail,
    #[serde(rename = "L")]
    Other,
}

impl CustomerUsageType {
    pub const ALL: [CustomerUsageType; 12] = [
        Self::FederalGovernment,
        Self::StateLocalGovernment,
        Self::TribalGovernment,
        Self::ForeignGovernment,
        Self::CharitableOrganization,
        Self::ReligiousEducation,
        Self::Resale,
        Self::AgriculturalProduction,
        Self::IndustrialProductionManufacturing,
        Self::DirectPayPermit,
        Self::DirectMail,
        Self::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::FederalGovernment => "A",
            Self::StateLocalGovernment => "B",
            Self::TribalGovernment => "C",
            Self::ForeignGovernment => "D",
            Self::CharitableOrganization => "E",
            Self::ReligiousEducation => "F",
            Self::Resale => "G",
            Self::AgriculturalProduction => "H",
            Self::IndustrialProductionManufacturing => "I",
            Self::DirectPayPermit => "J",
            Self::DirectMail => "K",
            Self::Other => "L",
        }
    }
}

impl FromStr for CustomerUsageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| format!("unknown customer usage type: {s:?}"))
    }
}

/// Nature of the transaction being taxed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    SalesOrder,
    #[default]
    SalesInvoice,
    ReturnOrder,
    ReturnInvoice,
    PurchaseOrder,
    PurchaseInvoice,
}

impl DocumentType {
    pub const ALL: [Self; 6] = [
        Self::SalesOrder,
        Self::SalesInvoice,
        Self::ReturnOrder,
        Self::ReturnInvoice,
        Self::PurchaseOrder,
        Self::PurchaseInvoice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SalesOrder => "SalesOrder",
            Self::SalesInvoice => "SalesInvoice",
            Self::ReturnOrder => "ReturnOrder",
            Self::ReturnInvoice => "ReturnInvoice",
            Self::PurchaseOrder => "PurchaseOrder",
            Self::PurchaseInvoice => "PurchaseInvoice",
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown document type: {s:?}"))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result code attached to every remote response.
///
/// Only [`SeverityLevel::Success`] counts as a successful calculation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeverityLevel {
    Success,
    Warning,
    Error,
    Exception,
    /// A code this crate does not know about, kept verbatim.
    Unknown(String),
}

impl SeverityLevel {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "Success" => Self::Success,
            "Warning" => Self::Warning,
            "Error" => Self::Error,
            "Exception" => Self::Exception,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Exception => "Exception",
            Self::Unknown(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_type_codes_are_a_through_l() {
        let codes: String = CustomerUsageType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, "ABCDEFGHIJKL");
    }

    #[test]
    fn usage_type_default_is_direct_mail() {
        assert_eq!(CustomerUsageType::default(), CustomerUsageType::DirectMail);
        assert_eq!(
            serde_json::to_string(&CustomerUsageType::default()).unwrap(),
            "\"K\""
        );
    }

    #[test]
    fn usage_type_from_str_is_case_insensitive() {
        assert_eq!("g".parse::<CustomerUsageType>(), Ok(CustomerUsageType::Resale));
        assert!("Z".parse::<CustomerUsageType>().is_err());
    }

    #[test]
    fn severity_only_success_is_success() {
        assert!(SeverityLevel::parse("Success").is_success());
        assert!(!SeverityLevel::parse("Warning").is_success());
        assert!(!SeverityLevel::parse("Error").is_success());
        let odd = SeverityLevel::parse("Partial");
        assert_eq!(odd, SeverityLevel::Unknown("Partial".into()));
        assert_eq!(odd.to_string(), "Partial");
    }

    #[test]
    fn document_type_serialises_by_name() {
        assert_eq!(
            serde_json::to_string(&DocumentType::SalesInvoice).unwrap(),
            "\"SalesInvoice\""
        );
        assert_eq!(DocumentType::ReturnOrder.to_string(), "ReturnOrder");
    }

    #[test]
    fn document_type_from_str_ignores_case() {
        assert_eq!("salesorder".parse::<DocumentType>(), Ok(DocumentType::SalesOrder));
        assert_eq!(" ReturnInvoice ".parse::<DocumentType>(), Ok(DocumentType::ReturnInvoice));
        assert!("Invoice".parse::<DocumentType>().is_err());
    }
}
