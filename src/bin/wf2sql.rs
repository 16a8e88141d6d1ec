//! wf2sql — WebFOCUS to SQL CLI
//!
//! # Usage
//!
//! ```bash
//! # Translate a file with the keyword classifier
//! wf2sql report.fex
//!
//! # Read from stdin, ask the language model instead
//! cat report.fex | wf2sql - --backend llm
//!
//! # Show how each line was classified
//! wf2sql explain report.fex
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wf2sql::prelude::*;

#[derive(Parser)]
#[command(name = "wf2sql")]
#[command(version)]
#[command(about = "Translate WebFOCUS report requests into SQL Server queries", long_about = None)]
#[command(after_help = "EXAMPLES:
    wf2sql report.fex
    wf2sql -e 'TABLE FILE SALES
SUM AMOUNT
BY REGION
END'
    cat report.fex | wf2sql - --backend llm --model gpt-4o")]
struct Cli {
    /// WebFOCUS source file, or '-' for stdin
    input: Option<String>,

    /// Inline WebFOCUS source instead of a file
    #[arg(short = 'e', long = "code", conflicts_with = "input")]
    code: Option<String>,

    /// Translation backend (default: `backend` from the config file, else rules)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Keep WebFOCUS operators (EQ, GT, MISSING, ...) as written
    #[arg(long)]
    no_substitute: bool,

    /// Config file (defaults: ./wf2sql.toml, then the user config dir)
    #[arg(short, long, env = "WF2SQL_CONFIG")]
    config: Option<PathBuf>,

    /// Model id for the llm backend
    #[arg(short, long)]
    model: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Rules,
    Llm,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Rules => Backend::Rules,
            BackendArg::Llm => Backend::Llm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how each line is classified, then the SQL
    Explain {
        /// WebFOCUS source file, or '-' for stdin
        input: String,
    },
    /// Interactive mode: type a request, finish it with END
    Repl,
    /// Show the recognized statements
    Keywords,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Explain { input }) => explain(input, &cli),
        Some(Commands::Repl) => run_repl(&cli),
        Some(Commands::Keywords) => {
            show_keywords();
            Ok(())
        }
        None => match source_arg(&cli) {
            Some(src) => translate(src, &cli).await,
            None => {
                println!("{}", "wf2sql — WebFOCUS to SQL Server".cyan().bold());
                println!();
                println!("Usage: wf2sql <FILE|-> [OPTIONS]");
                println!();
                println!("Try: wf2sql --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        if e.downcast_ref::<TranslateError>().is_some_and(TranslateError::is_validation) {
            println!("{} {}", "⚠".yellow(), e.to_string().yellow());
            return;
        }
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "wf2sql=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

enum Source<'a> {
    Inline(&'a str),
    Path(&'a str),
}

fn source_arg(cli: &Cli) -> Option<Source<'_>> {
    match (&cli.code, &cli.input) {
        (Some(code), _) => Some(Source::Inline(code)),
        (None, Some(path)) => Some(Source::Path(path)),
        (None, None) => None,
    }
}

fn read_source(src: Source<'_>) -> Result<String> {
    match src {
        Source::Inline(code) => Ok(code.to_string()),
        Source::Path("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(TranslateError::from)?;
            Ok(buf)
        }
        Source::Path(path) => std::fs::read_to_string(path)
            .map_err(TranslateError::from)
            .with_context(|| format!("Failed to read {}", path)),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if cli.no_substitute {
        config.rules.substitute_operators = false;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    Ok(config)
}

async fn translate(src: Source<'_>, cli: &Cli) -> Result<()> {
    let source = read_source(src)?;
    let config = load_config(cli)?;
    let engine = Engine::from_config(config.backend, &config)?;

    if cli.verbose {
        eprintln!("{} {}", "Backend:".dimmed(), engine.backend().cyan());
    }

    let sql = engine.translate(&source).await?;

    let rendered = match cli.format {
        OutputFormat::Text => sql,
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "backend": config.backend,
            "sql": sql,
        }))?,
    };

    emit(cli, &rendered)
}

fn emit(cli: &Cli, rendered: &str) -> Result<()> {
    match &cli.output {
        Some(path) => write_output(path, rendered),
        None => {
            println!("{}", rendered);
            Ok(())
        }
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, format!("{}\n", content))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
    Ok(())
}

fn explain(input: &str, cli: &Cli) -> Result<()> {
    let source = read_source(Source::Path(input))?;
    if source.trim().is_empty() {
        return Err(TranslateError::EmptyInput.into());
    }
    let config = load_config(cli)?;
    let rules = RuleTranslator::new(config.rules);

    if let OutputFormat::Json = cli.format {
        let lines = rules.explain(&source);
        let parts = rules.classifier().accumulate(strip_comments(&source));
        let rendered = serde_json::to_string_pretty(&serde_json::json!({
            "lines": lines,
            "sql": parts.to_sql(),
            "parts": parts,
        }))?;
        return emit(cli, &rendered);
    }

    println!("{}", "WebFOCUS Request Explanation".cyan().bold());
    println!();
    println!(
        "{:>4}  {:14} {}",
        "Line".white().bold(),
        "Statement".white().bold(),
        "Source".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for line in rules.explain(&source) {
        let label = match line.kind {
            LineKind::Unhandled(_) => line.kind.label().yellow(),
            _ => line.kind.label().cyan(),
        };
        println!("{:>4}  {:14} {}", line.line_no, label, line.text.white());
        let fragment = line.kind.to_sql();
        if !fragment.is_empty() {
            println!("{:>4}  {:14} {} {}", "", "", "→".dimmed(), fragment.dimmed());
        }
    }

    println!();
    println!("{}", "Generated SQL:".green().bold());
    for l in rules.to_sql(&source).lines() {
        println!("  {}", l.white());
    }
    Ok(())
}

fn run_repl(cli: &Cli) -> Result<()> {
    use rustyline::DefaultEditor;
    use rustyline::error::ReadlineError;

    let config = load_config(cli)?;
    let rules = RuleTranslator::new(config.rules);

    println!("{}", "wf2sql REPL — Interactive Mode".cyan().bold());
    println!("{}", "Type a request; END (or .run) translates it.".dimmed());
    println!();

    let mut rl = DefaultEditor::new().context("Failed to initialize REPL")?;

    let history_path = dirs::home_dir()
        .map(|p| p.join(".wf2sql_history"))
        .unwrap_or_default();
    let _ = rl.load_history(&history_path);

    let mut buffer: Vec<String> = Vec::new();

    loop {
        let prompt = if buffer.is_empty() { "wf2sql> " } else { "   ...> " };
        match rl.readline(&prompt.cyan().bold().to_string()) {
            Ok(line) => {
                let trimmed = line.trim();
                match trimmed {
                    ".exit" | ".quit" => {
                        println!("{}", "Goodbye!".green());
                        break;
                    }
                    ".help" => {
                        show_repl_help();
                        continue;
                    }
                    ".clear" => {
                        print!("\x1B[2J\x1B[1;1H");
                        continue;
                    }
                    ".reset" => {
                        buffer.clear();
                        continue;
                    }
                    _ => {}
                }

                if !trimmed.is_empty() && trimmed != ".run" {
                    let _ = rl.add_history_entry(trimmed);
                    buffer.push(line.clone());
                }

                let finished =
                    trimmed == ".run" || rules.classifier().classify_line(trimmed) == LineKind::End;
                if !finished {
                    continue;
                }

                let source = buffer.join("\n");
                buffer.clear();
                if source.trim().is_empty() {
                    println!("{} {}", "⚠".yellow(), TranslateError::EmptyInput.to_string().yellow());
                    continue;
                }
                println!();
                for l in rules.to_sql(&source).lines() {
                    println!("{} {}", "→".green(), l.white().bold());
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

fn show_repl_help() {
    println!("{}", "REPL Commands:".cyan().bold());
    println!("  {}   - Translate the lines typed so far", ".run".yellow());
    println!("  {} - Drop the lines typed so far", ".reset".yellow());
    println!("  {} - Clear screen", ".clear".yellow());
    println!("  {}  - Exit the REPL", ".exit".yellow());
    println!();
    println!("{}", "Example:".cyan().bold());
    println!("  TABLE FILE SALES");
    println!("  SUM AMOUNT");
    println!("  BY REGION");
    println!("  END");
    println!();
}

fn show_keywords() {
    println!("{}", "Recognized WebFOCUS Statements".cyan().bold());
    println!();

    let keywords = [
        ("TABLE FILE t", "anywhere", "Source table", "FROM t"),
        ("WHERE c", "prefix", "Filter condition", "WHERE c"),
        ("IF c", "prefix", "Filter condition", "WHERE c"),
        ("PRINT a b", "prefix", "Detail columns", "SELECT a, b"),
        ("BY c", "prefix", "Sort/group field", "SELECT c ... GROUP BY c"),
        ("SUM x", "anywhere", "Aggregate", "SELECT SUM(x)"),
        ("JOIN t ON c", "anywhere", "Join", "JOIN t ON c"),
        ("ON TABLE HOLD AS h", "prefix", "Hold file", "JOIN h ON t.ID = h.ID"),
        ("END", "anywhere", "End of request", "(stop)"),
    ];

    println!(
        "{:20} {:10} {:18} {}",
        "Statement".white().bold(),
        "Match".white().bold(),
        "Meaning".white().bold(),
        "SQL".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for (stmt, position, meaning, sql) in keywords {
        println!(
            "{:20} {:10} {:18} {}",
            stmt.cyan().bold(),
            position.dimmed(),
            meaning.white(),
            sql.yellow()
        );
    }

    println!();
    println!(
        "{}",
        "Operators: EQ =, NE <>, GT >, LT <, GE >=, LE <=, MISSING IS NULL".dimmed()
    );
}
