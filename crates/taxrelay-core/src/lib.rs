//! Tax calculation pipeline: host order -> tax request -> remote result -> adjustment.

pub mod address;
pub mod calculator;
pub mod codes;
pub mod config;
mod error;
pub mod gateway;
pub mod lines;
pub mod model;
pub mod registry;
pub mod request;
pub mod settings;

pub use address::Address;
pub use calculator::{Outcome, SkipReason, TaxCalculator};
pub use codes::{CustomerUsageType, DocumentType, SeverityLevel};
pub use config::{Environment, LogFlags, Protocol, ServiceConfig};
pub use error::{FailureKind, TaxError, TaxServiceError};
pub use gateway::{TaxGateway, TaxResult};
pub use lines::{LineItem, LineItemBuilder};
pub use model::{Adjustment, AdjustmentKind, Order, PostalAddress, Price};
pub use registry::ConfigRegistry;
pub use request::{ProfileKind, TaxRequest, TaxRequestAssembler};
pub use settings::TaxServiceSettings;
