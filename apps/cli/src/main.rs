//! Switchyard CLI - offline tooling for the routing decision engine
//!
//! The `syd` binary validates routing configuration files, lists aliases,
//! and explains routing decisions without running a gateway.

mod catalog_source;
mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use catalog_source::CatalogSource;
use commands::{aliases, estimate, route, validate};

/// Switchyard CLI - inspect and exercise routing configuration
#[derive(Parser, Debug)]
#[command(
    name = "syd",
    author,
    version,
    about = "Switchyard - routing and cost/policy decisions for LLM providers",
    long_about = "Switchyard (syd) validates routing catalogs and shows which provider a \
                  request would be routed to, with its fallbacks and estimated cost."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(flatten)]
    source: CatalogSource,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a routing configuration
    ///
    /// Reports every violation found, not just the first one.
    Validate,

    /// List aliases and their candidates
    Aliases(aliases::AliasesArgs),

    /// Show the routing plan for a request
    ///
    /// Prints the plan as JSON, exactly as it would be recorded for audit.
    Route(route::RouteArgs),

    /// Estimate the cost of a request on a specific model
    Estimate(estimate::EstimateArgs),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so `route` output stays valid JSON.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Validate => validate::execute(&args.source),
        Command::Aliases(cmd) => aliases::execute(&args.source, &cmd),
        Command::Route(cmd) => route::execute(&args.source, &cmd),
        Command::Estimate(cmd) => estimate::execute(&args.source, &cmd),
    }
}
