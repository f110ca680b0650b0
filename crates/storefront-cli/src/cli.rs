//! Argument parsing and command dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use storefront_api_models::ProductPriceType;
use storefront_config::{
    ClientConfig, ENV_ACCESS_TOKEN, ENV_API_URL, ENV_LOG_JSON, ENV_LOG_LEVEL, ENV_TIMEOUT_SECS,
    ENV_USER_AGENT,
};
use storefront_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::orders::{
    handle_orders_get, handle_orders_invoice, handle_orders_list, handle_orders_stats,
};
use crate::commands::whoami::handle_whoami;

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let config = match cli.client_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };
    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::from_json_flag(config.log_json),
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let trace_id = Uuid::new_v4();
    let span = tracing::info_span!("command", name = command_name, trace_id = %trace_id);
    let Cli {
        output, command, ..
    } = cli;
    let result = async move {
        let ctx = AppContext::from_config(&config, output)?;
        dispatch(command, &ctx).await
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            eprintln!("error: {}", err.display_message());
            tracing::debug!(command = command_name, exit_code, "command failed");
            exit_code
        }
    }
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    let rendered = match command {
        Command::Orders(orders) => match orders {
            OrdersCommand::Get(args) => handle_orders_get(ctx, args).await?,
            OrdersCommand::Invoice(args) => handle_orders_invoice(ctx, args).await?,
            OrdersCommand::Stats(args) => handle_orders_stats(ctx, args).await?,
            OrdersCommand::List(args) => handle_orders_list(ctx, args).await?,
        },
        Command::Whoami => handle_whoami(ctx).await?,
    };
    println!("{rendered}");
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Command-line client for the Storefront API")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = ENV_API_URL, value_parser = parse_url)]
    api_url: Option<String>,
    #[arg(long, global = true, env = ENV_ACCESS_TOKEN, hide_env_values = true)]
    access_token: Option<String>,
    #[arg(long = "timeout", global = true, env = ENV_TIMEOUT_SECS)]
    timeout_secs: Option<String>,
    #[arg(long, global = true, env = ENV_USER_AGENT)]
    user_agent: Option<String>,
    #[arg(long, global = true, env = ENV_LOG_LEVEL)]
    log_level: Option<String>,
    #[arg(long, global = true, env = ENV_LOG_JSON)]
    log_json: Option<String>,
    #[arg(
        long = "format",
        alias = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    /// Resolve flags (with their environment fallbacks) into a validated config.
    pub(crate) fn client_config(&self) -> Result<ClientConfig, storefront_config::ConfigError> {
        ClientConfig::from_lookup(|name| {
            let value = match name {
                ENV_API_URL => &self.api_url,
                ENV_ACCESS_TOKEN => &self.access_token,
                ENV_TIMEOUT_SECS => &self.timeout_secs,
                ENV_USER_AGENT => &self.user_agent,
                ENV_LOG_LEVEL => &self.log_level,
                ENV_LOG_JSON => &self.log_json,
                _ => return None,
            };
            value.clone()
        })
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Inspect orders.
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Show the user the access token belongs to.
    Whoami,
}

#[derive(Subcommand, Debug)]
pub(crate) enum OrdersCommand {
    /// Fetch one order.
    Get(OrderIdArgs),
    /// Fetch the invoice of one order.
    Invoice(OrderIdArgs),
    /// Show earnings and order counts per period.
    Stats(OrdersStatsArgs),
    /// List orders.
    List(OrdersListArgs),
}

#[derive(Args, Debug)]
pub(crate) struct OrderIdArgs {
    #[arg(help = "Order identifier")]
    pub(crate) id: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OrdersStatsArgs {
    #[arg(long)]
    pub(crate) organization_id: Option<String>,
    #[arg(long)]
    pub(crate) product_id: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OrdersListArgs {
    #[arg(long)]
    pub(crate) organization_id: Option<String>,
    #[arg(long)]
    pub(crate) product_id: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) price_type: Option<PriceTypeArg>,
    #[arg(long)]
    pub(crate) user_id: Option<String>,
    #[arg(long)]
    pub(crate) page: Option<u32>,
    #[arg(long)]
    pub(crate) limit: Option<u32>,
    #[arg(
        long = "sort",
        allow_hyphen_values = true,
        help = "Sort field, repeatable; prefix with '-' for descending"
    )]
    pub(crate) sorting: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PriceTypeArg {
    OneTime,
    Recurring,
}

impl From<PriceTypeArg> for ProductPriceType {
    fn from(value: PriceTypeArg) -> Self {
        match value {
            PriceTypeArg::OneTime => Self::OneTime,
            PriceTypeArg::Recurring => Self::Recurring,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Orders(OrdersCommand::Get(_)) => "orders_get",
        Command::Orders(OrdersCommand::Invoice(_)) => "orders_invoice",
        Command::Orders(OrdersCommand::Stats(_)) => "orders_stats",
        Command::Orders(OrdersCommand::List(_)) => "orders_list",
        Command::Whoami => "whoami",
    }
}
