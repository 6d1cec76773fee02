use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calcbt")]
#[command(about = "Event-driven, bar-based historical backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest from a layered YAML config and print the terminal summary.
    Run {
        /// Layered config paths in merge order (base -> overrides).
        #[arg(required = true)]
        config: Vec<String>,
    },

    /// Run a backtest with retention=all and zero latency, dumping the full
    /// lattice history to a JSON file.
    DumpJson {
        /// Layered config paths in merge order.
        #[arg(required = true, long = "config")]
        config: Vec<String>,

        /// Destination JSON file.
        #[arg(long)]
        out: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run { config } => {
            let mut strategy = calcbt_strategy::Strategy::new(calcbt_config::load_config(&config)?)?;
            let summary = strategy.run().context("backtest run failed")?;
            println!("bars_processed={}", summary.bars_processed);
            println!("final_buying_power={}", summary.final_buying_power);
            println!("final_total_value={}", summary.final_total_value);
            println!("max_drawdown={}", summary.max_drawdown);
            println!("fill_count={}", summary.fill_count);
        }

        Commands::DumpJson { config, out } => {
            let config = calcbt_config::load_config(&config)?;
            calcbt_util::dump_json(config, &out)?;
            println!("wrote {out}");
        }
    }

    Ok(())
}
