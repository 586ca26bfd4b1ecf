use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use pagemark_core::{
    PageOptions, Pipeline, PipelineConfig, PipelineResult, SiteTable, suggested_filename, to_json,
};
use tracing_subscriber::EnvFilter;

mod echo;
mod fetch;

use echo::{
    format_size, print_banner, print_detail, print_error, print_info, print_step, print_success, print_timing,
    print_warning,
};
use fetch::{FetchConfig, Source, fetch_file, fetch_stdin, fetch_url};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used with `--verbose` when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "pagemark_core=debug,pagemark=debug";

/// Output format for the conversion result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, json", s)),
        }
    }
}

/// Save web pages as clean Markdown notes
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(version)]
#[command(about = "Save web pages as clean Markdown notes", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Page URL for file or stdin input (used for the Source line and site rules)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE", conflicts_with = "save_dir")]
    output: Option<PathBuf>,

    /// Write the note into DIR, named after the page title
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Leave images out of the Markdown
    #[arg(long)]
    no_images: bool,

    /// JSON file with extra site rules (default: ~/.config/pagemark/sites.json if present)
    #[arg(long, value_name = "FILE")]
    sites: Option<PathBuf>,

    /// Minimum text length for a content candidate
    #[arg(long, value_name = "NUM")]
    min_chars: Option<usize>,

    /// Minimum share of body text a generic candidate must hold
    #[arg(long, value_name = "RATIO")]
    min_ratio: Option<f64>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    if !verbose {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// User site rules from `--sites`, or from the default path when it exists.
fn load_user_sites(path: Option<&Path>) -> anyhow::Result<Option<SiteTable>> {
    match path {
        Some(path) => {
            let table =
                SiteTable::load(path).with_context(|| format!("Failed to load site rules: {}", path.display()))?;
            Ok(Some(table))
        }
        None => match SiteTable::default_user_path().filter(|path| path.exists()) {
            Some(path) => match SiteTable::load(&path) {
                Ok(table) => Ok(Some(table)),
                Err(e) => {
                    print_warning(&format!("Ignoring {}: {}", path.display(), e));
                    Ok(None)
                }
            },
            None => Ok(None),
        },
    }
}

fn build_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder();
    if let Some(user) = load_user_sites(args.sites.as_deref())? {
        builder = builder.sites(SiteTable::builtin().with_user_rules(user));
    }
    if let Some(min_chars) = args.min_chars {
        builder = builder.min_text_len(min_chars);
    }
    if let Some(min_ratio) = args.min_ratio {
        if !(0.0..=1.0).contains(&min_ratio) {
            bail!("--min-ratio must be between 0 and 1, got {min_ratio}");
        }
        builder = builder.min_body_ratio(min_ratio);
    }
    Ok(builder.build())
}

fn render(result: &PipelineResult, format: OutputFormat) -> anyhow::Result<Option<String>> {
    match format {
        OutputFormat::Json => Ok(Some(to_json(result, true).context("Failed to render JSON")?)),
        OutputFormat::Markdown => Ok(result.markdown().map(str::to_string)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = build_config(&args)?;
    let source = Source::from_input(&args.input)?;
    let started = Instant::now();

    let (html, page_url) = match &source {
        Source::Url(url) => {
            if args.verbose {
                print_step(1, 3, &format!("Fetching from {}", url.as_str().bright_white().underline()));
            }
            let fetch_config = FetchConfig {
                timeout: args.timeout,
                user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
            };
            let html = fetch_url(url, &fetch_config).await?;
            (html, Some(args.url.clone().unwrap_or_else(|| url.to_string())))
        }
        Source::File(path) => {
            if args.verbose {
                print_step(1, 3, &format!("Reading from file {}", path.bright_white()));
            }
            (fetch_file(path)?, args.url.clone())
        }
        Source::Stdin => {
            if args.verbose {
                print_step(1, 3, "Reading from stdin");
            }
            (fetch_stdin()?, args.url.clone())
        }
    };

    if args.verbose {
        print_detail("Size", &format_size(html.len()));
        print_timing("Load", started.elapsed());
        eprintln!();
        print_step(2, 3, "Converting to Markdown");
    }

    let converting = Instant::now();
    let options = PageOptions { include_images: !args.no_images };
    let result = Pipeline::with_config(config).run_html(&html, page_url.as_deref(), &options);

    if args.verbose {
        if let PipelineResult::Success { title, markdown, .. } = &result {
            print_detail("Title", title);
            print_detail("Markdown", &format_size(markdown.len()));
        }
        print_timing("Convert", converting.elapsed());
        eprintln!();
        print_step(3, 3, "Writing output");
    }

    if let Some(output) = render(&result, args.format)? {
        let target = match (&args.output, &args.save_dir, &result) {
            (Some(path), _, _) => Some(path.clone()),
            (None, Some(dir), PipelineResult::Success { title, .. }) => {
                fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;
                let path = dir.join(suggested_filename(title));
                match args.format {
                    OutputFormat::Markdown => Some(path),
                    OutputFormat::Json => Some(path.with_extension("json")),
                }
            }
            _ => None,
        };

        match target {
            Some(path) => {
                fs::write(&path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
                print_success(&format!("Output written to {}", path.display().bright_white()));
            }
            None => println!("{}", output),
        }
    }

    if let PipelineResult::Failure { message } = &result {
        print_error(message);
        bail!("Extraction failed");
    }

    Ok(())
}
