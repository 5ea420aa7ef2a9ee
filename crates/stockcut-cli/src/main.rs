use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use stockcut_core::export::{write_pattern_table, write_slitting_rows};
use stockcut_core::{Diagnostic, PackingRequest, SlittingRequest};
use tracing_subscriber::EnvFilter;

mod settings;

use settings::SettingsStore;

#[derive(Parser)]
#[command(name = "stockcut")]
#[command(about = "Stock cutting optimizer - bar packing and coil slitting", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./stockcut.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack cut lengths onto stock bars
    Pack {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the pattern table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Choose slitting patterns for coil stock
    Slit {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the assignment rows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set {
        #[arg(long)]
        stock_length: Option<u32>,
        #[arg(long)]
        reserved_length: Option<u32>,
        /// Candidate patterns kept per combination size
        #[arg(long)]
        per_size: Option<usize>,
        /// Solver time limit per thickness group
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = SettingsStore::new(cli.config);

    match cli.command {
        Commands::Pack { input, output, csv } => pack_command(&store, input, output, csv)?,
        Commands::Slit { input, output, csv } => slit_command(&store, input, output, csv)?,
        Commands::Config { action } => config_command(&store, action)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "stockcut_core=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_request<T: DeserializeOwned>(input: &Path) -> Result<T> {
    let content = std::fs::read_to_string(input)?;
    let is_yaml = matches!(
        input.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let request = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(request)
}

fn pack_command(
    store: &SettingsStore,
    input: PathBuf,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔍 Loading cut list...".bright_blue());

    let config = store.load()?;
    let request: PackingRequest = read_request(&input)?;
    println!(
        "  {} cut rows",
        request.cuts.len().to_string().bright_white().bold()
    );
    println!();

    println!("{}", "🚀 Packing bars...".bright_blue());
    let result = request.run(&config)?;

    println!();
    println!("{}", "✅ Packing complete!".bright_green().bold());
    println!();

    println!("{}", "📊 Results:".bright_yellow().bold());
    println!(
        "  Stock: {} mm ({} mm reserved, {} mm usable)",
        result.stock.stock_length,
        result.stock.reserved_length,
        result.summary.effective_length.to_string().bright_white()
    );
    println!(
        "  Bars required: {}",
        result.summary.total_bars.to_string().bright_white().bold()
    );
    println!(
        "  Total waste: {} mm",
        result.summary.total_waste.to_string().bright_white()
    );
    println!(
        "  Utilization: {:.1}%",
        result.summary.utilization_percentage
    );

    if !result.patterns.is_empty() {
        println!();
        println!("  Cutting patterns:");
        for group in &result.patterns {
            let cuts: Vec<String> = group.cuts.iter().map(u32::to_string).collect();
            println!(
                "    {}. {} × [{}]  waste {} mm",
                group.index,
                group.occurrence_count.to_string().bright_white().bold(),
                cuts.join(", ").bright_cyan(),
                group.waste
            );
        }
    }

    print_diagnostics(&result.diagnostics);
    println!();

    if let Some(csv_path) = csv {
        let file = std::fs::File::create(&csv_path)?;
        write_pattern_table(&result.patterns, file)?;
        println!(
            "📄 Saved pattern table to {}",
            csv_path.display().to_string().bright_white()
        );
    }

    write_json(&result, output)
}

fn slit_command(
    store: &SettingsStore,
    input: PathBuf,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔍 Loading orders and coils...".bright_blue());

    let config = store.load()?;
    let request: SlittingRequest = read_request(&input)?;
    println!(
        "  {} order rows, {} filler rows, {} coils",
        request.orders.len().to_string().bright_white().bold(),
        request.fillers.len().to_string().bright_white().bold(),
        request.coils.len().to_string().bright_white().bold()
    );
    println!();

    println!("{}", "🚀 Solving slitting patterns...".bright_blue());
    let result = request.run(&config)?;

    println!();
    println!("{}", "✅ Slitting complete!".bright_green().bold());
    println!();

    println!("{}", "📊 Results:".bright_yellow().bold());
    for row in &result.assignments {
        println!(
            "    • {} {}: {}  waste {} mm",
            row.thickness_bucket.to_string().bright_white(),
            row.unit_id.bright_white(),
            row.pattern.bright_cyan(),
            row.waste
        );
    }
    println!();
    println!(
        "  Coils used: {} ({} unused)",
        result.summary.units_used.to_string().bright_white().bold(),
        result.summary.units_unused
    );
    println!(
        "  Thickness groups: {} solved, {} skipped",
        result.summary.groups_solved, result.summary.groups_skipped
    );
    println!(
        "  Total waste: {} mm ({:.1}% utilization)",
        result.summary.total_waste.to_string().bright_white(),
        result.summary.utilization_percentage
    );

    print_diagnostics(&result.diagnostics);
    println!();

    if let Some(csv_path) = csv {
        let file = std::fs::File::create(&csv_path)?;
        write_slitting_rows(&result.assignments, file)?;
        println!(
            "📄 Saved slitting rows to {}",
            csv_path.display().to_string().bright_white()
        );
    }

    write_json(&result, output)
}

fn config_command(store: &SettingsStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = store.load()?;
            println!(
                "{} {}",
                "⚙️  Settings from".bright_blue(),
                store.path().display().to_string().bright_white()
            );
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            stock_length,
            reserved_length,
            per_size,
            timeout_ms,
        } => {
            let mut config = store.load()?;
            if let Some(value) = stock_length {
                config.stock.stock_length = value;
            }
            if let Some(value) = reserved_length {
                config.stock.reserved_length = value;
            }
            if let Some(value) = per_size {
                config.patterns.per_size = value;
            }
            if let Some(value) = timeout_ms {
                config.solver.timeout_ms = value;
            }
            store.save(&config)?;
            println!(
                "💾 Saved settings to {}",
                store.path().display().to_string().bright_white()
            );
        }
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!();
    println!("{}", "⚠️  Warnings:".bright_yellow().bold());
    for diagnostic in diagnostics {
        println!(
            "    • [{}] {}",
            diagnostic.scope.bright_white(),
            diagnostic.message.yellow()
        );
    }
}

fn write_json<T: serde::Serialize>(result: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }
    Ok(())
}
