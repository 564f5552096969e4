//! Web UI binary for img2caption.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CaptionConfig` and starts the upload server.

use anyhow::{Context, Result};
use clap::Parser;
use img2caption::{resolve_captioner, web, CaptionConfig};
use std::io;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address (http://127.0.0.1:8080)
  img2caption

  # Serve publicly on port 3000
  img2caption --host 0.0.0.0 --port 3000

  # Use a specific model, three caption candidates per image
  img2caption --model gpt-4.1 --provider openai --num-sequences 3

  # Local model via Ollama, stricter upload budget
  img2caption --provider ollama --model llava --max-upload-mb 5

SUPPORTED PROVIDERS & MODELS:
  Provider     Model                  Input $/1M  Output $/1M  Vision
  ─────────    ─────────────────────  ──────────  ───────────  ──────
  openai       gpt-4.1-nano (default) $0.10       $0.40        ✓
  openai       gpt-4.1-mini           $0.40       $1.60        ✓
  openai       gpt-4.1                $2.00       $8.00        ✓
  anthropic    claude-sonnet-4-20250514         $3.00       $15.00       ✓
  gemini       gemini-2.0-flash       $0.10       $0.40        ✓
  ollama       llava, llama3.2-vision free        free         ✓

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY         OpenAI API key
  ANTHROPIC_API_KEY      Anthropic API key
  GEMINI_API_KEY         Google Gemini API key
  IMG2CAPTION_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  IMG2CAPTION_MODEL      Override model ID

SETUP:
  1. Set API key:  export OPENAI_API_KEY=sk-...
  2. Serve:        img2caption
  3. Open:         http://127.0.0.1:8080
"#;

/// Serve a web UI that captions uploaded images using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "img2caption",
    version,
    about = "Caption uploaded images using Vision LLMs",
    long_about = "Serve a small web UI that generates natural-language captions for uploaded \
images using Vision Language Models. Supports OpenAI, Anthropic, Google Gemini, and any \
OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "IMG2CAPTION_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "IMG2CAPTION_PORT", default_value_t = 8080)]
    port: u16,

    /// VLM model ID (e.g. gpt-4.1-nano, gpt-4.1, llava).
    #[arg(
        long,
        env = "IMG2CAPTION_MODEL",
        long_help = "Vision LLM model to use. Default: gpt-4.1-nano ($0.10/$0.40 per 1M tokens).\n\
          Popular choices: gpt-4.1-mini ($0.40/$1.60), claude-sonnet-4-20250514 ($3/$15), llava (free, local)."
    )]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "IMG2CAPTION_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Maximum upload size in megabytes.
    #[arg(long, env = "IMG2CAPTION_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: usize,

    /// Maximum image dimension after resize, in pixels.
    #[arg(long, env = "IMG2CAPTION_MAX_DIMENSION", default_value_t = 1024,
          value_parser = clap::value_parser!(u32).range(64..=8192))]
    max_dimension: u32,

    /// Maximum caption length in tokens.
    #[arg(long, env = "IMG2CAPTION_MAX_LENGTH", default_value_t = 50)]
    max_length: usize,

    /// Beam count for beam-search backends.
    #[arg(long, env = "IMG2CAPTION_NUM_BEAMS", default_value_t = 5)]
    num_beams: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "IMG2CAPTION_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Top-k sampling cutoff.
    #[arg(long, env = "IMG2CAPTION_TOP_K", default_value_t = 50)]
    top_k: u32,

    /// Nucleus (top-p) sampling cutoff.
    #[arg(long, env = "IMG2CAPTION_TOP_P", default_value_t = 0.95)]
    top_p: f32,

    /// Caption candidates to request per image.
    #[arg(short, long, env = "IMG2CAPTION_NUM_SEQUENCES", default_value_t = 1)]
    num_sequences: usize,

    /// Per-generation-call timeout in seconds.
    #[arg(long, env = "IMG2CAPTION_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Connect to the provider at startup instead of on the first upload.
    #[arg(long, env = "IMG2CAPTION_EAGER")]
    eager: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2CAPTION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2CAPTION_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = CaptionConfig::builder()
        .max_upload_mb(cli.max_upload_mb)
        .max_dimension(cli.max_dimension)
        .max_length(cli.max_length)
        .num_beams(cli.num_beams)
        .temperature(cli.temperature)
        .top_k(cli.top_k)
        .top_p(cli.top_p)
        .num_sequences(cli.num_sequences)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }

    let config = builder.build().context("Invalid configuration")?;

    // By default the captioner is built lazily on the first upload, so the
    // server starts even before an API key is exported. --eager fails fast.
    if cli.eager {
        let captioner =
            resolve_captioner(&config).context("Failed to connect to a VLM provider")?;
        if !cli.quiet {
            eprintln!("✔ Captioner ready: {}", captioner.name());
        }
    }

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cli.host, cli.port))?;

    if !cli.quiet {
        eprintln!("✨ img2caption serving on http://{addr}");
    }

    web::serve(addr, config).await.context("Server failed")?;

    Ok(())
}
