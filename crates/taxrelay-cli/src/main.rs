use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use taxrelay_core::{
    ConfigRegistry, CustomerUsageType, DocumentType, Environment, LogFlags, Order, Outcome,
    Protocol, ProfileKind, SkipReason, TaxCalculator, TaxRequestAssembler, TaxServiceSettings,
};
use taxrelay_remote::RemoteTaxClient;

#[derive(Parser)]
#[command(name = "taxrelay", version, about = "Calculate sales tax for an order through a remote tax service")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    /// Log at debug level (includes SOAP traces).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Calculate tax for an order and print the resulting adjustment.
    Calculate {
        /// Order JSON document.
        #[arg(long)]
        order: PathBuf,
        /// Print the order with the tax adjustment applied, as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the request body that `calculate` would send, without sending it.
    Request {
        #[arg(long)]
        order: PathBuf,
    },
    /// Check that the remote service accepts the configured credentials.
    Check,
}

/// Service settings, each with an environment fallback.
#[derive(Args)]
struct ServiceArgs {
    #[arg(long, env = "TAXRELAY_ACCOUNT", default_value = "", global = true)]
    account: String,
    #[arg(long, env = "TAXRELAY_LICENSE", default_value = "", hide_env_values = true, global = true)]
    license: String,
    #[arg(long, env = "TAXRELAY_COMPANY_CODE", default_value = "", global = true)]
    company_code: String,
    /// `test` or `live`; anything else selects live.
    #[arg(long, env = "TAXRELAY_MODE", default_value = "test", global = true)]
    mode: Environment,
    /// `rest` or `soap`.
    #[arg(long, env = "TAXRELAY_PROTOCOL", default_value = "rest", global = true)]
    protocol: Protocol,
    /// Override the base URL selected by `--mode`.
    #[arg(long, env = "TAXRELAY_URL", global = true)]
    url: Option<String>,
    /// Tax against the shipping profile and add shipments as freight lines.
    #[arg(long, env = "TAXRELAY_INCLUDE_SHIPPING", global = true)]
    include_shipping: bool,
    /// Log SOAP envelopes at debug level.
    #[arg(long, env = "TAXRELAY_TRACE", global = true)]
    trace: bool,
    /// Wire bodies to log: `request`, `response` or both, comma separated.
    #[arg(long, env = "TAXRELAY_LOG", global = true)]
    log: Option<LogFlags>,
    /// Request timeout in seconds; 0 waits indefinitely.
    #[arg(long, env = "TAXRELAY_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,
    #[arg(long, env = "TAXRELAY_PLUGIN_ID", default_value = "taxrelay", global = true)]
    plugin_id: String,
    /// Customer usage (exemption) code, A to L.
    #[arg(long, env = "TAXRELAY_USAGE_TYPE", default_value = "K", global = true)]
    usage_type: CustomerUsageType,
    #[arg(long, env = "TAXRELAY_DOCUMENT_TYPE", default_value = "SalesInvoice", global = true)]
    document_type: DocumentType,
}

impl ServiceArgs {
    fn into_settings(self) -> TaxServiceSettings {
        TaxServiceSettings {
            plugin_id: self.plugin_id,
            account: self.account,
            license: self.license,
            company_code: self.company_code,
            include_shipping: self.include_shipping,
            trace: self.trace,
            log: self.log.unwrap_or_default(),
            mode: self.mode,
            protocol: self.protocol,
            url: self.url,
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            customer_usage_type: self.usage_type,
            document_type: self.document_type,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
    tracing::debug!("taxrelay v{}", env!("CARGO_PKG_VERSION"));

    let settings = cli.service.into_settings();
    match cli.command {
        Command::Calculate { order, json } => calculate(settings, &order, json),
        Command::Request { order } => render_request(&settings, &order),
        Command::Check => check(settings),
    }
}

fn read_order(path: &Path) -> anyhow::Result<Order> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading order from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing order {}", path.display()))
}

fn calculator(settings: TaxServiceSettings) -> anyhow::Result<TaxCalculator<RemoteTaxClient>> {
    let registry = Arc::new(ConfigRegistry::new());
    settings
        .register(&registry)
        .context("registering tax service config")?;
    let client = RemoteTaxClient::new().context("building HTTP client")?;
    Ok(TaxCalculator::new(settings, registry, client))
}

fn skipped_message(reason: SkipReason) -> String {
    match reason {
        SkipReason::MissingAddress(ProfileKind::Billing) => {
            "order has no billing address; no tax calculated".to_string()
        }
        SkipReason::MissingAddress(ProfileKind::Shipping) => {
            "order has no shipping address; no tax calculated".to_string()
        }
    }
}

fn calculate(settings: TaxServiceSettings, path: &Path, json: bool) -> anyhow::Result<()> {
    let mut order = read_order(path)?;
    let calc = calculator(settings)?;

    let outcome = calc
        .execute(&mut order)
        .with_context(|| format!("calculating tax for order {}", order.order_number))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&order)?);
        return Ok(());
    }
    match outcome {
        Outcome::Skipped(reason) => eprintln!("{}", skipped_message(reason)),
        Outcome::Computed(adj) => println!(
            "{}: {} {} (order {})",
            adj.label, adj.amount.number, adj.amount.currency_code, order.order_number
        ),
    }
    Ok(())
}

fn render_request(settings: &TaxServiceSettings, path: &Path) -> anyhow::Result<()> {
    let order = read_order(path)?;
    let Some(request) = TaxRequestAssembler::new(settings).assemble(&order) else {
        let kind = ProfileKind::for_order(&order, settings.include_shipping);
        bail!("{}", skipped_message(SkipReason::MissingAddress(kind)));
    };
    let config = settings.service_config();
    let client = RemoteTaxClient::new().context("building HTTP client")?;
    let body = client
        .render(&request, &config)
        .context("rendering tax request")?;
    eprintln!("POST {}", config.tax_endpoint());
    println!("{body}");
    Ok(())
}

fn check(settings: TaxServiceSettings) -> anyhow::Result<()> {
    let calc = calculator(settings)?;
    if calc
        .check_authorization()
        .context("checking authorization")?
    {
        println!("authorized");
        Ok(())
    } else {
        bail!("credentials were rejected by the tax service")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("taxrelay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_onto_settings() {
        let cli = parse(&[
            "--account",
            "1100",
            "--license",
            "secret",
            "--company-code",
            "ABC",
            "--mode",
            "live",
            "--protocol",
            "soap",
            "--include-shipping",
            "--log",
            "request,response",
            "--timeout-secs",
            "0",
            "--usage-type",
            "g",
            "--document-type",
            "SalesOrder",
            "check",
        ]);
        assert!(matches!(cli.command, Command::Check));
        let s = cli.service.into_settings();
        assert_eq!(s.account, "1100");
        assert_eq!(s.company_code, "ABC");
        assert_eq!(s.mode, Environment::Live);
        assert_eq!(s.protocol, Protocol::Soap);
        assert!(s.include_shipping);
        assert_eq!(s.log, LogFlags::all());
        assert_eq!(s.timeout, None);
        assert_eq!(s.customer_usage_type, CustomerUsageType::Resale);
        assert_eq!(s.document_type, DocumentType::SalesOrder);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn flags_after_subcommand() {
        let cli = parse(&["request", "--order", "order.json", "--protocol", "soap"]);
        let Command::Request { order } = &cli.command else {
            panic!("expected request");
        };
        assert_eq!(order, Path::new("order.json"));
        assert_eq!(cli.service.protocol, Protocol::Soap);
    }

    #[test]
    fn unknown_usage_type_is_rejected() {
        let r = Cli::try_parse_from(["taxrelay", "--usage-type", "Z", "check"]);
        assert!(r.is_err());
    }
}
