use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use annonce_core::{
    ExtractedRecord, ExtractionRequest, Extractor, ExtractorConfig, ProviderKeys, parse_listing, parse_listing_text,
};
use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rate-limit bucket used for every CLI request.
const CLIENT_KEY: &str = "cli";

/// Output format for extracted listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Extract structured real-estate listings from listing pages
#[derive(Parser, Debug)]
#[command(name = "annonce")]
#[command(version)]
#[command(about = "Extract structured real-estate listings from listing pages", long_about = None)]
struct Args {
    /// Listing URL, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Treat file or stdin input as pasted listing text instead of HTML
    #[arg(long)]
    text: bool,

    /// Page URL of a local HTML file, used for URL-based hints
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Timeout applied to every transport, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for direct requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Core fields (price, surface) a record needs to be accepted
    #[arg(long, default_value = "2", value_name = "NUM", value_parser = clap::value_parser!(u8).range(1..=2))]
    min_core_fields: u8,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_url(&self) -> bool {
        self.input.contains("://")
    }

    fn config(&self) -> ExtractorConfig {
        let mut builder = ExtractorConfig::builder().min_core_fields(usize::from(self.min_core_fields));
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder.build()
    }
}

fn init_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("annonce_core=debug"))
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

async fn extract_url(args: &Args) -> anyhow::Result<String> {
    let keys = ProviderKeys::from_env();
    let extractor = Extractor::from_keys(args.config(), &keys).context("Failed to build HTTP clients")?;

    if args.verbose {
        echo::print_availability(&extractor.availability());
        echo::print_step(1, 2, &format!("Extracting {}", args.input.bright_white().underline()));
    }

    let started = Instant::now();
    let response = match extractor.extract(&ExtractionRequest::new(&args.input, CLIENT_KEY)).await {
        Ok(response) => response,
        Err(err) => {
            if let Some(hint) = err.hint() {
                echo::print_warning(hint);
            }
            return Err(anyhow::Error::new(err).context("Extraction failed"));
        }
    };

    if args.verbose {
        echo::print_outcomes(&response.outcomes);
        echo::print_timing("Extraction", started.elapsed());
        echo::print_step(2, 2, "Writing output");
    }

    Ok(match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)?,
        OutputFormat::Text => echo::render_record(&response.data, response.fields_extracted, Some(&response.message)),
    })
}

fn extract_offline(args: &Args) -> anyhow::Result<String> {
    if args.verbose {
        let source = if args.input == "-" { "stdin" } else { args.input.as_str() };
        echo::print_step(1, 3, &format!("Reading from {}", source.bright_white()));
    }
    let content = read_input(&args.input)?;

    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(content.len()).bright_white());
        echo::print_step(2, 3, if args.text { "Parsing listing text" } else { "Parsing listing page" });
    }

    let started = Instant::now();
    let record: ExtractedRecord = if args.text {
        parse_listing_text(&content)
    } else {
        parse_listing(&content, args.base_url.as_deref()).context("Failed to parse listing")?
    };
    let fields_extracted = record.fields_extracted();
    let sufficient = record.is_sufficient(args.config().min_core_fields);

    if args.verbose {
        echo::print_timing("Parsing", started.elapsed());
        echo::print_step(3, 3, "Writing output");
    }
    if !sufficient {
        echo::print_warning("Price and surface were not both found; the record is incomplete");
    }

    Ok(match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "success": sufficient,
            "data": record,
            "fieldsExtracted": fields_extracted,
        }))?,
        OutputFormat::Text => echo::render_record(&record, fields_extracted, None),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
    }

    let output = if args.is_url() { extract_url(&args).await? } else { extract_offline(&args)? };

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}
