use clap::{Parser as ClapParser, Subcommand};
use quill_lang::cli::{self, CliError, RunOptions, RunResult};
use quill_lang::{to_json, to_json_pretty};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "quill")]
#[command(about = "Quill - A Lisp-like language for querying and editing JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against a JSON document
    Run {
        /// The script source
        script: String,

        /// JSON document (reads from stdin if piped and neither --input nor --file is given)
        #[arg(short, long)]
        input: Option<String>,

        /// Read the JSON document from a file
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,

        /// Bind a variable, as name=JSON (repeatable)
        #[arg(long = "var", value_name = "NAME=JSON")]
        vars: Vec<String>,

        /// Argument conversion policy
        #[arg(long, default_value = "strict", value_parser = ["strict", "pedantic", "humane"])]
        coalescer: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,

        /// Print the final document instead of the script's value
        #[arg(long)]
        show_document: bool,
    },

    /// List functions, or show the forms of one function
    Docs {
        /// Function name
        function: Option<String>,
    },
}

/// Installs a tracing subscriber when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            script,
            input,
            file,
            vars,
            coalescer,
            pretty,
            syntax_only,
            show_document,
        } => read_input(input, file).and_then(|input| {
            let options = RunOptions {
                script,
                script_name: "<script>".to_string(),
                input,
                variables: vars,
                coalescer,
                syntax_only,
            };
            run(&options, pretty, show_document)
        }),
        Commands::Docs { function: None } => {
            print!("{}", cli::docs_overview());
            Ok(())
        }
        Commands::Docs { function: Some(name) } => cli::function_doc(&name).map(|doc| print!("{doc}")),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> Result<Option<String>, CliError> {
    match (input, file) {
        (Some(s), _) => Ok(Some(s)),
        (None, Some(path)) => Ok(Some(fs::read_to_string(path)?)),
        (None, None) if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer).filter(|b| !b.trim().is_empty()))
        }
        (None, None) => Ok(None),
    }
}

fn run(options: &RunOptions, pretty: bool, show_document: bool) -> Result<(), CliError> {
    match cli::execute_run(options)? {
        RunResult::SyntaxValid => println!("Syntax is valid"),
        RunResult::Success { value, document } => {
            let shown = if show_document { &document } else { &value };
            let json = if pretty { to_json_pretty(shown) } else { to_json(shown) };
            println!("{json}");
        }
    }
    Ok(())
}
