mod echo;
mod render;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use sift_core::{Document, PartialPipelineConfig, Pipeline, ProfileExtractor, SiteProfile};
use tracing_subscriber::EnvFilter;

use echo::{
    format_size, print_banner, print_extraction_details, print_info, print_report, print_step, print_success,
    print_timing, print_warning,
};
use render::{OutputFormat, render};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract the main content of an HTML document
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(author = "Sift Contributors")]
#[command(version)]
#[command(about = "Extract main content from HTML documents with quality-gated fallbacks", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (markdown, html, text, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Source URL of the document, used to match site profiles
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Minimum gate score a non-final stage must reach (0-100)
    #[arg(long, value_name = "NUM")]
    min_quality: Option<u32>,

    /// Pipeline deadline in milliseconds (0 disables)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// JSON file with pipeline settings; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional site profile (JSON), may be repeated
    #[arg(long, value_name = "FILE")]
    profile: Vec<PathBuf>,

    /// Skip the site-specific stage
    #[arg(long)]
    no_site_specific: bool,

    /// Skip the semantic stage
    #[arg(long)]
    no_semantic: bool,

    /// Skip the readability-style stage
    #[arg(long)]
    no_readability: bool,

    /// Skip the heuristic stage
    #[arg(long)]
    no_heuristic: bool,

    /// Print the quality report of the winning stage to stderr
    #[arg(long)]
    report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Settings from `--config`, with command-line flags applied over them
    fn pipeline_config(&self) -> anyhow::Result<PartialPipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                PartialPipelineConfig::from_json(&json)
                    .with_context(|| format!("Invalid config file: {}", path.display()))?
            }
            None => PartialPipelineConfig::default(),
        };

        let disabled = [
            (self.no_site_specific, &mut config.enable_site_specific),
            (self.no_semantic, &mut config.enable_semantic),
            (self.no_readability, &mut config.enable_readability),
            (self.no_heuristic, &mut config.enable_heuristic),
        ];
        for (flag, field) in disabled {
            if flag {
                *field = Some(false);
            }
        }

        if self.min_quality.is_some() {
            config.minimum_quality_score = self.min_quality;
        }
        if self.timeout_ms.is_some() {
            config.timeout_ms = self.timeout_ms;
        }
        if self.verbose {
            config.debug = Some(true);
        }
        Ok(config)
    }

    fn pipeline(&self) -> anyhow::Result<Pipeline> {
        let mut pipeline = Pipeline::new();
        for path in &self.profile {
            let profile = SiteProfile::from_file(path)?;
            if self.verbose {
                print_info(&format!("Loaded site profile {}", profile.name.bright_white()));
            }
            let extractor = ProfileExtractor::new(profile)
                .with_context(|| format!("Invalid site profile: {}", path.display()))?;
            pipeline = pipeline.with_site_extractor(extractor);
        }
        Ok(pipeline)
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sift_cli=debug,sift_core=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        setup_logging();
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = args.pipeline_config()?;
    let pipeline = args.pipeline()?;

    if args.verbose {
        let message = if args.input == "-" {
            "Reading from stdin".to_string()
        } else {
            format!("Reading from file {}", args.input.bright_white())
        };
        print_step(1, 4, &message);
    }

    let html = read_input(&args.input)?;

    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        eprintln!();
        print_step(2, 4, "Parsing HTML document");
    }

    let started = Instant::now();
    let doc = match &args.url {
        Some(url) => Document::parse_with_url(&html, url).context("Failed to parse HTML")?,
        None => Document::parse(&html, None).context("Failed to parse HTML")?,
    };

    if args.verbose {
        print_timing("Parse", started.elapsed());
        let metadata = doc.extract_metadata();
        if let Some(title) = metadata.title {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        if let Some(site_name) = metadata.site_name {
            eprintln!("  {} {}", "Site:".dimmed(), site_name.bright_white());
        }
        if let Some(language) = metadata.language {
            eprintln!("  {} {}", "Language:".dimmed(), language.bright_white());
        }
        eprintln!();
        print_step(3, 4, "Running extraction pipeline");
    }

    let result = pipeline.execute(&doc, config).context("Failed to extract content")?;

    if args.verbose {
        print_extraction_details(&result);
        if !result.fallbacks_used.is_empty() {
            print_warning(&format!("{} stage(s) fell through", result.fallbacks_used.len()));
        }
    }

    if args.report {
        print_report(&result);
    }

    let output = render(&result, args.format)?;

    if args.verbose {
        print_step(4, 4, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
