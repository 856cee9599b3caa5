//! JSON client for the REST generation of the tax service.
//!
//! `POST {url}/transactions/create` with basic auth (account, license); the
//! response's `totalTax` is the calculated tax.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use taxrelay_core::{
    Address, CustomerUsageType, DocumentType, LineItem, ServiceConfig, SeverityLevel, TaxGateway,
    TaxRequest, TaxResult, TaxServiceError,
};
use tracing::{debug, info};

use crate::http::{WIRE_TARGET, build_client, client_id, transport_error, with_timeout};

const CLIENT_HEADER: &str = "X-Avalara-Client";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionModel<'a> {
    #[serde(rename = "type")]
    kind: DocumentType,
    company_code: &'a str,
    code: &'a str,
    date: String,
    customer_code: &'a str,
    entity_use_code: CustomerUsageType,
    currency_code: &'a str,
    addresses: AddressesModel<'a>,
    lines: Vec<LineModel<'a>>,
}

#[derive(Serialize)]
struct AddressesModel<'a> {
    #[serde(rename = "ShipFrom")]
    ship_from: AddressModel<'a>,
    #[serde(rename = "ShipTo")]
    ship_to: AddressModel<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressModel<'a> {
    line1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    line2: Option<&'a str>,
    city: &'a str,
    region: &'a str,
    postal_code: &'a str,
    country: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LineModel<'a> {
    number: String,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    amount: Decimal,
    item_code: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_code: Option<&'a str>,
}

impl<'a> From<&'a Address> for AddressModel<'a> {
    fn from(a: &'a Address) -> Self {
        Self {
            line1: &a.line1,
            line2: a.line2.as_deref(),
            city: &a.city,
            region: &a.region,
            postal_code: &a.postal_code,
            country: &a.country,
        }
    }
}

impl<'a> From<&'a LineItem> for LineModel<'a> {
    fn from(l: &'a LineItem) -> Self {
        Self {
            number: l.number.to_string(),
            quantity: l.quantity,
            amount: l.amount,
            item_code: &l.item_code,
            description: &l.description,
            tax_code: l.tax_code.as_deref(),
        }
    }
}

impl<'a> From<&'a TaxRequest> for TransactionModel<'a> {
    fn from(r: &'a TaxRequest) -> Self {
        Self {
            kind: r.document_type,
            company_code: &r.company_code,
            code: &r.document_code,
            date: r.date.format("%Y-%m-%d").to_string(),
            customer_code: &r.customer_code,
            entity_use_code: r.customer_usage_type,
            currency_code: &r.currency_code,
            addresses: AddressesModel {
                ship_from: (&r.origin).into(),
                ship_to: (&r.destination).into(),
            },
            lines: r.lines.iter().map(LineModel::from).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResult {
    #[serde(default)]
    total_tax: Option<Decimal>,
}

#[derive(Deserialize)]
struct ErrorResult {
    error: ErrorInfo,
}

#[derive(Deserialize)]
struct ErrorInfo {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct PingResult {
    #[serde(default)]
    authenticated: bool,
}

/// REST generation client.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    pub fn new() -> Result<Self, TaxServiceError> {
        Ok(Self::with_client(build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// The JSON body that [`send`](TaxGateway::send) would post.
    pub fn render(request: &TaxRequest) -> Result<String, TaxServiceError> {
        serde_json::to_string_pretty(&TransactionModel::from(request))
            .map_err(|e| TaxServiceError::transport(format!("could not encode request: {e}")).with_source(e))
    }
}

impl TaxGateway for RestClient {
    fn send(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<TaxResult, TaxServiceError> {
        let url = config.tax_endpoint();
        let body = serde_json::to_string(&TransactionModel::from(request))
            .map_err(|e| TaxServiceError::transport(format!("could not encode request: {e}")).with_source(e))?;

        if config.log.request {
            info!(target: WIRE_TARGET, config_id = %config.id, url = %url, body = %body, "outbound tax request");
        }
        info!(
            url = %url,
            document = %request.document_code,
            lines = request.lines.len(),
            "posting transaction"
        );

        let builder = self
            .client
            .post(&url)
            .basic_auth(&config.account, Some(&config.license))
            .header(CLIENT_HEADER, client_id(config))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let resp = with_timeout(builder, config)
            .send()
            .map_err(|e| transport_error(&url, e))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| transport_error(&url, e))?;

        if config.log.response {
            info!(target: WIRE_TARGET, config_id = %config.id, status = status.as_u16(), body = %text, "inbound tax response");
        }

        let result = interpret_transaction(status, &text);
        if let Err(e) = &result {
            debug!(status = status.as_u16(), error = %e, "transaction rejected");
        }
        result
    }

    fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError> {
        let url = config.ping_endpoint();
        info!(url = %url, "checking authorization");

        let builder = self
            .client
            .get(&url)
            .basic_auth(&config.account, Some(&config.license))
            .header(CLIENT_HEADER, client_id(config));
        let resp = with_timeout(builder, config)
            .send()
            .map_err(|e| transport_error(&url, e))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| transport_error(&url, e))?;
        interpret_ping(status, &text)
    }
}

/// Classify a `transactions/create` response.
///
/// HTTP errors are transport failures; a 2xx body without a usable non-zero
/// `totalTax` is a remote calculation failure.
fn interpret_transaction(status: StatusCode, body: &str) -> Result<TaxResult, TaxServiceError> {
    if !status.is_success() {
        return Err(http_error(status, body));
    }

    let parsed: TransactionResult = serde_json::from_str(body)
        .map_err(|e| TaxServiceError::malformed(format!("invalid JSON: {e}")).with_source(e))?;
    match parsed.total_tax {
        Some(total) if !total.is_zero() => Ok(TaxResult {
            total_tax: total,
            result_code: SeverityLevel::Success,
        }),
        Some(_) => Err(TaxServiceError::remote("remote service returned a zero totalTax")),
        None => Err(TaxServiceError::malformed("no totalTax in response")),
    }
}

fn interpret_ping(status: StatusCode, body: &str) -> Result<bool, TaxServiceError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(http_error(status, body));
    }
    let parsed: PingResult = serde_json::from_str(body)
        .map_err(|e| TaxServiceError::malformed(format!("invalid JSON: {e}")).with_source(e))?;
    Ok(parsed.authenticated)
}

/// Transport error for a non-2xx status, using the service's error body when present.
fn http_error(status: StatusCode, body: &str) -> TaxServiceError {
    let detail = serde_json::from_str::<ErrorResult>(body)
        .ok()
        .map(|r| r.error)
        .and_then(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(code),
            (None, None) => None,
        })
        .unwrap_or_else(|| body.chars().take(200).collect());
    TaxServiceError::transport(format!("server returned {status}: {detail}"))
        .with_code(status.as_u16().to_string())
}
