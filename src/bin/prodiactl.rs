use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use prodia_tools::ratio::{image_dimensions, select_closest_ratio};
use prodia_tools::{Config, ToolCall, ToolContext, ToolRegistry};

#[derive(Parser, Debug)]
#[command(name = "prodiactl", about = "CLI for Prodia tools", version)]
struct Cli {
    /// Override PRODIA_URL
    #[arg(global = true, long)]
    prodia_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available tools
    Tools {
        /// Print full schemas as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invoke a tool and print the markdown image
    Call {
        /// Tool name, e.g. drawPainting
        name: String,
        /// Tool params as a JSON object
        #[arg(long, value_name = "JSON", default_value = "{}")]
        params: String,
        /// Caller origin used to build the hosted URL
        #[arg(long, default_value = "")]
        origin: String,
        /// Print the raw `{ "url": ... }` output instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Closest aspect ratio for a size or an image file
    Ratio {
        #[arg(long, conflicts_with = "file")]
        width: Option<u32>,
        #[arg(long, conflicts_with = "file")]
        height: Option<u32>,
        /// Image file to measure
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(url) = cli.prodia_url {
        conf.prodia_url = url;
    }

    match cli.command {
        Commands::Tools { json } => {
            let registry = ToolRegistry::builtin();
            if json {
                println!("{}", serde_json::to_string_pretty(&registry.schemas())?);
            } else {
                for schema in registry.schemas() {
                    let name = schema["name"].as_str().unwrap_or_default();
                    let description = schema["description"].as_str().unwrap_or_default();
                    println!("{}\t{}", name, description);
                }
            }
            Ok(())
        }
        Commands::Call { name, params, origin, json } => {
            let params: Value = serde_json::from_str(&params)?;
            let call = ToolCall::new(params, origin);
            let ctx = ToolContext::from_config(&conf);
            match ToolRegistry::builtin().invoke(&name, &call, &ctx).await {
                Ok(out) => {
                    if json {
                        println!("{}", serde_json::to_string(&out)?);
                    } else {
                        println!("![image]({})", out.url);
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Ratio { width, height, file } => {
            let label = match file {
                Some(path) => {
                    let bytes = tokio::fs::read(&path).await?;
                    let dims = image_dimensions(&bytes);
                    if dims.is_none() {
                        eprintln!("Warning: could not read dimensions of {}", path.display());
                    }
                    select_closest_ratio(dims.map(|d| d.0), dims.map(|d| d.1))
                }
                None => select_closest_ratio(width, height),
            };
            println!("{}", label);
            Ok(())
        }
    }
}
