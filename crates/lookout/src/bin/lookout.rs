// ABOUTME: CLI binary for the Lookout link preview engine.
// ABOUTME: Previews URLs or local HTML files and prints the resulting Links as JSON or markdown.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use lookout::{Client, Link};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    #[value(alias = "md")]
    Markdown,
}

#[derive(Parser, Debug)]
#[command(name = "lookout")]
#[command(about = "Build link previews for URLs")]
struct Args {
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    format: Format,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Accept-Language sent with requests
    #[arg(long = "lang")]
    lang: Option<String>,

    /// User-Agent sent with page requests
    #[arg(long = "user-agent")]
    user_agent: Option<String>,

    /// Timeout per network call, in seconds
    #[arg(long = "timeout", default_value_t = 15)]
    timeout: u64,

    /// HTML file to preview (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// URL context for HTML file parsing (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// URLs to preview (fetch mode)
    #[arg()]
    urls: Vec<String>,
}

fn format_output(links: &[Link], format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Json if links.len() == 1 => serde_json::to_string_pretty(&links[0]),
        Format::Json => serde_json::to_string_pretty(links),
        Format::Markdown => Ok(links
            .iter()
            .map(Link::format_markdown)
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    if args.html.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(1);
    }

    let mut builder = Client::builder().timeout(Duration::from_secs(args.timeout));
    if let Some(lang) = &args.lang {
        builder = builder.request_language(lang.as_str());
    }
    if let Some(agent) = &args.user_agent {
        builder = builder.user_agent(agent.as_str());
    }
    let client = builder.build();

    let start = Instant::now();
    let mut links: Vec<Link> = Vec::new();
    let mut had_error = false;

    match (&args.html, &args.url) {
        (Some(html_path), Some(url)) => match fs::read_to_string(html_path) {
            Ok(html) => match client.parse_html(&html, url).await {
                Ok(link) => links.push(link),
                Err(e) => {
                    eprintln!("error parsing HTML: {}", e);
                    had_error = true;
                }
            },
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                had_error = true;
            }
        },
        (Some(_), None) => {
            eprintln!("error: --url is required when using --html");
            return ExitCode::from(1);
        }
        (None, _) => {
            if args.urls.is_empty() {
                eprintln!("error: at least one URL is required, or use --html with --url");
                return ExitCode::from(1);
            }
            for url in &args.urls {
                match client.get(url).await {
                    Ok(link) => links.push(link),
                    Err(e) => {
                        eprintln!("error previewing {}: {}", url, e);
                        had_error = true;
                    }
                }
            }
        }
    }

    let elapsed = start.elapsed();

    if !links.is_empty() {
        match format_output(&links, args.format) {
            Ok(output) => {
                if let Some(output_path) = &args.output {
                    if let Err(e) = fs::write(output_path, &output) {
                        eprintln!("error writing to {:?}: {}", output_path, e);
                        had_error = true;
                    }
                } else {
                    println!("{}", output);
                }
            }
            Err(e) => {
                eprintln!("error serializing output: {}", e);
                had_error = true;
            }
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
