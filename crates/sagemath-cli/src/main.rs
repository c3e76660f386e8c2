use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sagemath_lsp_core::runner::DEFAULT_INTERPRETER;
use sagemath_lsp_core::{
    executor_command, inject_files, load_language_data, DataPaths, ExecutionMode, MatchCase,
    RunRequest,
};
use tracing_subscriber::EnvFilter;

mod query;
mod settings;

/// sage-tools - build and run helpers for SageMath editor support
#[derive(Parser)]
#[command(name = "sage-tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and run helpers for SageMath editor support", long_about = "SageMath editor tooling\n\nProvides the pieces that live outside the language server:\n  - Generating the TextMate grammar from the symbol file\n  - Running Sage files\n  - Code Runner integration\n  - Offline symbol lookups")]
struct Cli {
    /// Log verbosity (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject the symbol list into the grammar template
    InjectGrammar {
        /// Symbol file
        #[arg(long, default_value = "data/sagemath_symbols.json")]
        symbols: PathBuf,
        /// Grammar template containing the placeholders
        #[arg(long, default_value = "syntaxes/sagemath.tmLanguage.template.json")]
        template: PathBuf,
        /// Where to write the final grammar
        #[arg(long, default_value = "syntaxes/sagemath.tmLanguage.json")]
        output: PathBuf,
    },
    /// Run a Sage file
    Run {
        /// Path to the .sage file
        file: PathBuf,
        /// Delete the generated <file>.py afterwards
        #[arg(long)]
        clean: bool,
        /// Interpreter to invoke
        #[arg(long, default_value = DEFAULT_INTERPRETER)]
        interpreter: String,
    },
    /// Print the Code Runner command for an execution mode
    ExecutorCommand {
        /// runOnly or runAndClean
        #[arg(long)]
        mode: Option<String>,
    },
    /// Set the `.sage` entry of Code Runner's executor map in a settings file
    ExecutorMap {
        /// settings.json to update (comments are accepted but not kept)
        #[arg(long)]
        settings: PathBuf,
        /// runOnly or runAndClean
        #[arg(long)]
        mode: Option<String>,
    },
    /// Show the documentation for a symbol
    Lookup {
        /// Exact symbol name
        name: String,
        #[arg(long, default_value = "data/sagemath_symbols.json")]
        symbols: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List symbols and keywords starting with a prefix
    Complete {
        /// Prefix (may be empty)
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long, default_value = "data/sagemath_symbols.json")]
        symbols: PathBuf,
        #[arg(long)]
        keywords: Option<PathBuf>,
        /// Match the prefix case-insensitively
        #[arg(long)]
        ignore_case: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::InjectGrammar {
            symbols,
            template,
            output,
        } => inject_grammar_command(&symbols, &template, &output),
        Commands::Run {
            file,
            clean,
            interpreter,
        } => run_command(file, clean, interpreter),
        Commands::ExecutorCommand { mode } => {
            println!("{}", executor_command(ExecutionMode::from_setting(mode.as_deref())));
            Ok(ExitCode::SUCCESS)
        }
        Commands::ExecutorMap { settings, mode } => executor_map_command(&settings, mode),
        Commands::Lookup {
            name,
            symbols,
            json,
        } => lookup_command(&name, symbols, json),
        Commands::Complete {
            prefix,
            symbols,
            keywords,
            ignore_case,
            json,
        } => complete_command(&prefix, symbols, keywords, ignore_case, json),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn inject_grammar_command(
    symbols: &std::path::Path,
    template: &std::path::Path,
    output: &std::path::Path,
) -> Result<ExitCode> {
    let injection = inject_files(symbols, template, output)?;
    println!(
        "Updated {} successfully! ({} placeholders replaced)",
        output.display(),
        injection.total_replacements()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_command(file: PathBuf, clean: bool, interpreter: String) -> Result<ExitCode> {
    let mode = if clean {
        ExecutionMode::RunAndClean
    } else {
        ExecutionMode::RunOnly
    };
    let request = RunRequest::new(file, mode)?.with_interpreter(interpreter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let output = runtime.block_on(request.execute())?;

    print!("{}", output.stdout);
    eprint!("{}", output.stderr);
    if let Some(removed) = &output.removed {
        tracing::info!("removed {}", removed.display());
    }

    Ok(match output.code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

fn executor_map_command(path: &std::path::Path, mode: Option<String>) -> Result<ExitCode> {
    let mode = ExecutionMode::from_setting(mode.as_deref());
    settings::update_settings_file(path, mode)?;
    println!("Set .sage executor to `{}` in {}", executor_command(mode), path.display());
    Ok(ExitCode::SUCCESS)
}

fn lookup_command(name: &str, symbols: PathBuf, json: bool) -> Result<ExitCode> {
    let (data, _) = load_language_data(&DataPaths {
        symbols: Some(symbols),
        keywords: None,
    });

    let Some(entry) = query::lookup(&data, name) else {
        eprintln!("{name}: not found");
        return Ok(ExitCode::FAILURE);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{} ({})", entry.name, entry.kind);
        println!();
        println!("{}", entry.doc.unwrap_or_default());
    }
    Ok(ExitCode::SUCCESS)
}

fn complete_command(
    prefix: &str,
    symbols: PathBuf,
    keywords: Option<PathBuf>,
    ignore_case: bool,
    json: bool,
) -> Result<ExitCode> {
    let (data, _) = load_language_data(&DataPaths {
        symbols: Some(symbols),
        keywords,
    });
    let case = if ignore_case {
        MatchCase::Insensitive
    } else {
        MatchCase::Sensitive
    };

    let entries = query::complete(&data, prefix, case);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", query::format_completions(&entries));
    }
    Ok(ExitCode::SUCCESS)
}
