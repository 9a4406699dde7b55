//! folio - Markdown/MDX to sanitized HTML

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio::render::{to_html, toc_to_html};
use folio::{Config, Pipeline};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Render Markdown/MDX posts to sanitized HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio post.mdx post.html        Render a post
    folio post.mdx --toc            Print the table of contents
    folio post.mdx --toc --json     Print the table of contents as JSON
    cat post.md | folio -           Render from stdin

Set FOLIO_LOG (or RUST_LOG) to e.g. `debug` for pipeline logs.")]
struct Cli {
    /// Input file, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (stdout if omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<String>,

    /// Print the table of contents instead of the body
    #[arg(long)]
    toc: bool,

    /// With --toc, print JSON instead of HTML
    #[arg(long, requires = "toc")]
    json: bool,

    /// Leave Drive and YouTube links as plain links
    #[arg(long)]
    no_embeds: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_env("FOLIO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> folio::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if cli.no_embeds {
        config.embeds = false;
    }

    let source = read_input(&cli.input)?;
    let rendered = Pipeline::new(&config).render(&source)?;

    let output = if cli.json {
        serde_json::to_string_pretty(&rendered.toc)
            .map_err(io::Error::from)?
            + "\n"
    } else if cli.toc {
        toc_to_html(&rendered.toc, None)
    } else {
        to_html(&rendered.tree)
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, output)?;
            if !cli.quiet {
                eprintln!(
                    "Rendered {} -> {} ({} headings)",
                    cli.input,
                    path,
                    folio::transform::flatten_ids(&rendered.toc).len()
                );
            }
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(input)
    }
}
