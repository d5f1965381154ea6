use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prodex_client::{HttpPipeline, build_pipeline};
use prodex_core::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "prodex", version, about = "Extract structured product data from product pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a product page and extract its data with an LLM
    Extract {
        /// Product page URL
        #[arg(short, long)]
        url: String,

        /// OpenAI API key
        #[arg(short, long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// LLM model to use (overrides PRODEX_MODEL)
        #[arg(short, long)]
        model: Option<String>,

        /// OpenAI-compatible API base URL (overrides PRODEX_BASE_URL)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Coerce the result into the full product shape
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Prompt template: `name@version`, `name@latest`, or a file path
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Print the reduced page text that would be sent to the model
    Reduce {
        /// Product page URL
        #[arg(short, long)]
        url: String,
    },

    /// Print the rendered prompt without calling the model
    Prompt {
        /// Product page URL
        #[arg(short, long)]
        url: String,

        /// Prompt template: `name@version`, `name@latest`, or a file path
        #[arg(short, long)]
        template: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let environment = std::env::var("PRODEX_ENV").unwrap_or_else(|_| "development".to_string());
    let _ = dotenvy::from_filename(format!(".env.{environment}"));
    let _ = dotenvy::dotenv();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(format!("prodex={log_level}").parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Extract {
            url,
            api_key,
            model,
            base_url,
            normalize,
            template,
        } => {
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            config.normalize_output |= normalize;
            if template.is_some() {
                config.prompt_template = template;
            }
            cmd_extract(&pipeline(&config)?, &url, &api_key).await?;
        }
        Commands::Reduce { url } => {
            cmd_reduce(&pipeline(&config)?, &url).await?;
        }
        Commands::Prompt { url, template } => {
            if template.is_some() {
                config.prompt_template = template;
            }
            cmd_prompt(&pipeline(&config)?, &url).await?;
        }
    }

    Ok(())
}

fn pipeline(config: &PipelineConfig) -> Result<HttpPipeline> {
    build_pipeline(config).context("Failed to set up extraction pipeline")
}

async fn cmd_extract(pipeline: &HttpPipeline, url: &str, api_key: &str) -> Result<()> {
    let product = pipeline.extract(url, api_key).await?;
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

async fn cmd_reduce(pipeline: &HttpPipeline, url: &str) -> Result<()> {
    let content = pipeline.reduce_url(url).await?;
    tracing::info!("Reduced to {} characters", content.chars().count());
    println!("{content}");
    Ok(())
}

async fn cmd_prompt(pipeline: &HttpPipeline, url: &str) -> Result<()> {
    let content = pipeline.reduce_url(url).await?;
    let prompt = pipeline.prompt_builder().build(url, &content);
    tracing::info!(
        template = pipeline.prompt_builder().template().name(),
        "Rendered prompt"
    );
    println!("{prompt}");
    Ok(())
}
