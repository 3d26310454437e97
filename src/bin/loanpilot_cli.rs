//! LoanPilot Command Line Interface
//!
//! A CLI for asking eligibility questions against the program matrix.
//!
//! # Usage
//!
//! ```bash
//! # One-off query
//! loanpilot_cli query "show programs for Prime"
//!
//! # Query with a borrower profile and a program selection
//! loanpilot_cli query "match programs" --credit-score 680 --ltv 85 \
//!     --select "PRMG/Prime Connect" --select "PRMG/Plus Connect"
//!
//! # Interactive session (context carries across queries)
//! loanpilot_cli repl
//!
//! # Catalog summary
//! loanpilot_cli stats
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use loanpilot::{
    global_engine, BorrowerProfile, QueryContext, QueryEngine, QueryOutcome, Servicer,
};

#[derive(Parser)]
#[command(name = "loanpilot_cli")]
#[command(version = "0.1.0")]
#[command(about = "Query lending programs, parameters, and borrower eligibility")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query
    Query {
        /// The question, e.g. "find citizenship across programs"
        text: Vec<String>,

        /// Select a program into the session context (repeatable)
        #[arg(long = "select")]
        selected: Vec<String>,

        /// Scope the context to a servicer: prime or loanstream
        #[arg(long)]
        servicer: Option<String>,

        #[command(flatten)]
        borrower: BorrowerArgs,
    },

    /// Interactive session; selections and auto-selects carry across queries
    Repl,

    /// List every program in the catalog
    Programs,

    /// Show catalog statistics and fingerprint
    Stats,
}

#[derive(clap::Args)]
struct BorrowerArgs {
    #[arg(long)]
    credit_score: Option<f64>,

    #[arg(long)]
    loan_amount: Option<f64>,

    #[arg(long)]
    ltv: Option<f64>,

    #[arg(long)]
    cltv: Option<f64>,

    #[arg(long)]
    dti: Option<f64>,

    /// Reserves in months
    #[arg(long)]
    reserves: Option<f64>,

    /// Purchase, Cash Out, or Rate & Term
    #[arg(long)]
    transaction_type: Option<String>,

    /// Owner Occupied, Second Home, or Investment
    #[arg(long)]
    occupancy: Option<String>,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let engine = global_engine().await?;

    match cli.command {
        Commands::Query {
            text,
            selected,
            servicer,
            borrower,
        } => {
            let query = text.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("query text is empty");
            }
            let mut context = QueryContext::new();
            for name in &selected {
                context.select_program(Servicer::from_program_name(name), name);
            }
            if let Some(raw) = &servicer {
                context.select_servicer(raw.parse().map_err(anyhow::Error::msg)?);
            }
            let profile = borrower_profile(&borrower);
            let outcome = engine.run_query(&query, &context, profile.as_ref()).await;
            print_outcome(&outcome, cli.format)?;
        }
        Commands::Repl => repl(engine, cli.format).await?,
        Commands::Programs => cmd_programs(engine, cli.format)?,
        Commands::Stats => cmd_stats(engine, cli.format)?,
    }
    Ok(())
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn borrower_profile(args: &BorrowerArgs) -> Option<BorrowerProfile> {
    let mut profile = BorrowerProfile::new();
    if let Some(v) = args.credit_score {
        profile.set("borrower_credit_score", v);
    }
    if let Some(v) = args.loan_amount {
        profile.set("loan_amount", v);
    }
    if let Some(v) = args.ltv {
        profile.set("ltv", v);
    }
    if let Some(v) = args.cltv {
        profile.set("cltv", v);
    }
    if let Some(v) = args.dti {
        profile.set("dti", v);
    }
    if let Some(v) = args.reserves {
        profile.set("reserves", v);
    }
    if let Some(v) = &args.transaction_type {
        profile.set("transaction_type", v.as_str());
    }
    if let Some(v) = &args.occupancy {
        profile.set("occupancy", v.as_str());
    }
    if profile.is_empty() {
        None
    } else {
        Some(profile)
    }
}

fn print_outcome(outcome: &QueryOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Text => {
            println!("{outcome}");
        }
        OutputFormat::Pretty => {
            if let Some(capability) = outcome.capability {
                let similarity = outcome
                    .similarity
                    .map(|s| format!(" ({s:.2})"))
                    .unwrap_or_default();
                println!("{}{}", capability.name().cyan().bold(), similarity.dimmed());
            }
            if outcome.result.is_error() {
                println!("{}", outcome.to_string().yellow());
            } else {
                println!("{outcome}");
            }
        }
    }
    Ok(())
}

fn cmd_programs(engine: &QueryEngine, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = engine.catalog();
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = catalog
                .programs()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "servicer": p.servicer(),
                        "name": p.name(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            for program in catalog.programs() {
                println!("[{}] {}", program.servicer(), program.name());
            }
        }
    }
    Ok(())
}

fn cmd_stats(engine: &QueryEngine, format: OutputFormat) -> anyhow::Result<()> {
    let stats = engine.stats();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text | OutputFormat::Pretty => {
            println!("programs:   {}", stats.programs);
            println!("  Prime:      {}", stats.prime_programs);
            println!("  LoanStream: {}", stats.loanstream_programs);
            println!("attributes: {}", stats.attribute_keys);
            println!("catalog:    {}", stats.fingerprint);
        }
    }
    Ok(())
}

// =============================================================================
// REPL
// =============================================================================

async fn repl(engine: &QueryEngine, format: OutputFormat) -> anyhow::Result<()> {
    println!(
        "{} {} programs loaded, catalog {}",
        "loanpilot".cyan().bold(),
        engine.catalog().len(),
        engine.catalog().short_fingerprint()
    );
    println!("Type a question, :select <program>, :context, :clear, or :quit");

    let mut editor = DefaultEditor::new()?;
    let mut context = QueryContext::new();

    loop {
        match editor.readline("loanpilot> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if let Some(command) = line.strip_prefix(':') {
                    if !repl_command(command, &mut context) {
                        break;
                    }
                    continue;
                }

                let outcome = engine.run_query(line, &context, None).await;
                print_outcome(&outcome, format)?;

                // Fold the auto-select directive back into the session.
                if let Some((servicer, name)) = &outcome.auto_select {
                    context.select_program(*servicer, name.clone());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Handle a `:command`; returns false when the session should end.
fn repl_command(command: &str, context: &mut QueryContext) -> bool {
    let (verb, rest) = match command.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (command, ""),
    };
    match verb {
        "quit" | "exit" | "q" => return false,
        "select" if !rest.is_empty() => {
            context.select_program(Servicer::from_program_name(rest), rest);
            println!("selected {rest}");
        }
        "clear" => {
            *context = QueryContext::new();
            println!("context cleared");
        }
        "context" => {
            if context.is_empty() {
                println!("(empty)");
            } else {
                for (servicer, name) in &context.selected_programs {
                    println!("program: [{servicer}] {name}");
                }
                for servicer in &context.selected_servicers {
                    println!("servicer: {servicer}");
                }
            }
        }
        _ => println!("commands: :select <program>, :context, :clear, :quit"),
    }
    true
}
