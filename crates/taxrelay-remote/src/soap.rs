//! SOAP 1.1 client for the document-style generation of the tax service.
//!
//! Credentials travel in a WS-Security `UsernameToken`, the client's version
//! tags in a `Profile` header. A calculation succeeds only when the
//! response's `ResultCode` is `Success`.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use taxrelay_core::{
    Address, LineItem, ServiceConfig, SeverityLevel, TaxGateway, TaxRequest, TaxResult,
    TaxServiceError,
};
use tracing::{debug, info};

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::http::{WIRE_TARGET, build_client, transport_error, with_timeout};

const SERVICES_NS: &str = "http://avatax.avalara.com/services";
const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
const PASSWORD_TEXT: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";

const REDACTED: &str = "***";

const ORIGIN_CODE: &str = "Origin";
const DESTINATION_CODE: &str = "Destination";

/// SOAP generation client.
#[derive(Clone)]
pub struct SoapClient {
    client: Client,
}

impl SoapClient {
    pub fn new() -> Result<Self, TaxServiceError> {
        Ok(Self::with_client(build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// The `GetTax` envelope that [`send`](TaxGateway::send) would post,
    /// with the license masked.
    pub fn render(request: &TaxRequest, config: &ServiceConfig) -> String {
        redacted_envelope(config, &get_tax_body(request))
    }

    fn call(&self, config: &ServiceConfig, action: &str, body: &str) -> Result<Reply, TaxServiceError> {
        let url = config.tax_endpoint();
        let envelope = envelope(config, body);

        if config.log.request {
            let logged = redacted_envelope(config, body);
            info!(target: WIRE_TARGET, config_id = %config.id, url = %url, body = %logged, "outbound tax request");
        } else if config.trace {
            let logged = redacted_envelope(config, body);
            debug!(target: WIRE_TARGET, config_id = %config.id, body = %logged, "soap request");
        }

        let builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{SERVICES_NS}/{action}\""))
            .body(envelope);
        let resp = with_timeout(builder, config)
            .send()
            .map_err(|e| transport_error(&url, e))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| transport_error(&url, e))?;

        if config.log.response {
            info!(target: WIRE_TARGET, config_id = %config.id, status = status.as_u16(), body = %text, "inbound tax response");
        } else if config.trace {
            debug!(target: WIRE_TARGET, config_id = %config.id, body = %text, "soap response");
        }

        // Faults arrive with a 500 status, so look for one before the status.
        let reply = match Reply::parse(&text) {
            Ok(reply) => reply,
            Err(e) if !status.is_success() => {
                return Err(TaxServiceError::transport(format!("server returned {status}"))
                    .with_code(status.as_u16().to_string())
                    .with_source(e));
            }
            Err(e) => return Err(e),
        };
        if let Some(fault) = &reply.fault {
            return Err(TaxServiceError::transport(format!("SOAP fault: {}", fault.message))
                .with_code(fault.code.clone()));
        }
        if !status.is_success() {
            return Err(TaxServiceError::transport(format!("server returned {status}"))
                .with_code(status.as_u16().to_string()));
        }
        Ok(reply)
    }
}

impl TaxGateway for SoapClient {
    fn send(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<TaxResult, TaxServiceError> {
        info!(
            url = %config.tax_endpoint(),
            document = %request.document_code,
            lines = request.lines.len(),
            "calling GetTax"
        );
        let reply = self.call(config, "GetTax", &get_tax_body(request))?;
        let result = reply.into_tax_result();
        if let Err(e) = &result {
            debug!(code = e.code().unwrap_or_default(), error = %e, "GetTax rejected");
        }
        result
    }

    fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError> {
        info!(url = %config.tax_endpoint(), "calling IsAuthorized");
        let body = format!(
            "<IsAuthorized xmlns=\"{SERVICES_NS}\"><Operations>GetTax</Operations></IsAuthorized>"
        );
        let reply = self.call(config, "IsAuthorized", &body)?;
        Ok(reply
            .result_code
            .is_some_and(|code| SeverityLevel::parse(&code).is_success()))
    }
}

// ── Envelope construction ──

fn push_element(out: &mut String, name: &str, value: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn envelope(config: &ServiceConfig, body: &str) -> String {
    envelope_with_password(config, &escape(config.license.as_str()), body)
}

/// The envelope as it is logged: the license is masked.
fn redacted_envelope(config: &ServiceConfig, body: &str) -> String {
    envelope_with_password(config, REDACTED, body)
}

fn envelope_with_password(config: &ServiceConfig, password: &str, body: &str) -> String {
    let mut out = String::with_capacity(1024 + body.len());
    out.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    out.push_str(&format!(
        "<soap:Envelope xmlns:soap=\"{SOAP_NS}\" xmlns:wsse=\"{WSSE_NS}\"><soap:Header>"
    ));
    out.push_str("<wsse:Security soap:mustUnderstand=\"1\"><wsse:UsernameToken>");
    push_element(&mut out, "wsse:Username", &config.account);
    out.push_str(&format!("<wsse:Password Type=\"{PASSWORD_TEXT}\">"));
    out.push_str(password);
    out.push_str("</wsse:Password></wsse:UsernameToken></wsse:Security>");
    out.push_str(&format!("<Profile xmlns=\"{SERVICES_NS}\">"));
    push_element(&mut out, "Client", &config.client);
    push_element(&mut out, "Adapter", &config.adapter);
    push_element(&mut out, "Name", &config.name);
    out.push_str("</Profile></soap:Header><soap:Body>");
    out.push_str(body);
    out.push_str("</soap:Body></soap:Envelope>");
    out
}

fn push_address(out: &mut String, code: &str, a: &Address) {
    out.push_str("<BaseAddress>");
    push_element(out, "AddressCode", code);
    push_element(out, "Line1", &a.line1);
    push_element(out, "Line2", a.line2.as_deref().unwrap_or_default());
    push_element(out, "City", &a.city);
    push_element(out, "Region", &a.region);
    push_element(out, "PostalCode", &a.postal_code);
    push_element(out, "Country", &a.country);
    out.push_str("</BaseAddress>");
}

fn push_line(out: &mut String, line: &LineItem) {
    out.push_str("<Line>");
    push_element(out, "No", &line.number.to_string());
    push_element(out, "OriginCode", ORIGIN_CODE);
    push_element(out, "DestinationCode", DESTINATION_CODE);
    push_element(out, "ItemCode", &line.item_code);
    if let Some(tax_code) = &line.tax_code {
        push_element(out, "TaxCode", tax_code);
    }
    push_element(out, "Qty", &line.quantity.to_string());
    push_element(out, "Amount", &line.amount.to_string());
    push_element(out, "Description", &line.description);
    out.push_str("</Line>");
}

fn get_tax_body(r: &TaxRequest) -> String {
    let mut out = String::with_capacity(512 + 256 * r.lines.len());
    out.push_str(&format!("<GetTax xmlns=\"{SERVICES_NS}\"><GetTaxRequest>"));
    push_element(&mut out, "CompanyCode", &r.company_code);
    push_element(&mut out, "DocType", r.document_type.as_str());
    push_element(&mut out, "DocCode", &r.document_code);
    push_element(&mut out, "DocDate", &r.date.format("%Y-%m-%d").to_string());
    push_element(&mut out, "CustomerCode", &r.customer_code);
    push_element(&mut out, "CustomerUsageType", r.customer_usage_type.code());
    push_element(&mut out, "CurrencyCode", &r.currency_code);
    push_element(&mut out, "OriginCode", ORIGIN_CODE);
    push_element(&mut out, "DestinationCode", DESTINATION_CODE);
    out.push_str("<Addresses>");
    push_address(&mut out, ORIGIN_CODE, &r.origin);
    push_address(&mut out, DESTINATION_CODE, &r.destination);
    out.push_str("</Addresses><Lines>");
    for line in &r.lines {
        push_line(&mut out, line);
    }
    out.push_str("</Lines>");
    push_element(&mut out, "DetailLevel", "Tax");
    out.push_str("</GetTaxRequest></GetTax>");
    out
}

// ── Response parsing ──

#[derive(Debug, PartialEq, Eq)]
struct Fault {
    code: String,
    message: String,
}

/// The handful of fields read from any response envelope.
#[derive(Debug, Default, PartialEq, Eq)]
struct Reply {
    result_code: Option<String>,
    total_tax: Option<String>,
    summary: Option<String>,
    fault: Option<Fault>,
}

impl Reply {
    fn parse(xml: &str) -> Result<Self, TaxServiceError> {
        let mut reader = Reader::from_str(xml);
        let mut path: Vec<String> = Vec::new();
        let mut reply = Reply::default();
        let mut fault_code = None;
        let mut fault_string = None;
        let mut saw_envelope = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    saw_envelope |= name == "Envelope";
                    path.push(name);
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Text(t)) => {
                    let Some(current) = path.last() else { continue };
                    let text = t
                        .unescape()
                        .map_err(|e| TaxServiceError::malformed(format!("bad XML text: {e}")).with_source(e))?
                        .trim()
                        .to_string();
                    if text.is_empty() {
                        continue;
                    }
                    let slot = match current.as_str() {
                        "ResultCode" => &mut reply.result_code,
                        "TotalTax" => &mut reply.total_tax,
                        "Summary" => &mut reply.summary,
                        "faultcode" => &mut fault_code,
                        "faultstring" => &mut fault_string,
                        _ => continue,
                    };
                    // First occurrence wins; nested messages repeat these names.
                    if slot.is_none() {
                        *slot = Some(text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(TaxServiceError::malformed(format!("invalid XML: {e}")).with_source(e));
                }
            }
        }

        if !saw_envelope {
            return Err(TaxServiceError::malformed("no SOAP envelope in response"));
        }
        if fault_code.is_some() || fault_string.is_some() {
            reply.fault = Some(Fault {
                code: fault_code.unwrap_or_else(|| "soap:Server".to_string()),
                message: fault_string.unwrap_or_default(),
            });
        }
        Ok(reply)
    }

    fn into_tax_result(self) -> Result<TaxResult, TaxServiceError> {
        let code = self
            .result_code
            .ok_or_else(|| TaxServiceError::malformed("no ResultCode in response"))?;
        let severity = SeverityLevel::parse(&code);
        if !severity.is_success() {
            let detail = self.summary.unwrap_or_else(|| "no message".to_string());
            return Err(TaxServiceError::remote(format!("remote service returned {severity}: {detail}"))
                .with_code(code));
        }
        let total = self
            .total_tax
            .ok_or_else(|| TaxServiceError::malformed("no TotalTax in response"))?;
        let total_tax: Decimal = total
            .parse()
            .map_err(|e| TaxServiceError::malformed(format!("TotalTax {total:?} is not a number")).with_source(e))?;
        Ok(TaxResult {
            total_tax,
            result_code: severity,
        })
    }
}
