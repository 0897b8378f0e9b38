use anyhow::{Context, Result};
use clap::*;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use vecto::{AnalogyPair, Modality, Model, Vecto};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the embedding models offered by the service
    Models {},
    /// Manage vector spaces
    Spaces {
        #[command(subcommand)]
        command: SpaceCommands,
    },
    /// Ingest a text into a vector space
    Ingest {
        space: String,
        text: String,
        /// Attributes stored with the text, as JSON
        #[arg(long, default_value = "null")]
        attributes: String,
    },
    /// Look up the nearest neighbours of a text
    Lookup {
        space: String,
        query: String,
        #[arg(long, default_value_t = 5)]
        top_k: u32,
    },
    /// Find items that relate to the query the way end relates to start
    Analogy {
        space: String,
        query: String,
        start: String,
        end: String,
        #[arg(long, default_value_t = 5)]
        top_k: u32,
    },
}

#[derive(Subcommand)]
enum SpaceCommands {
    /// List every vector space
    List {},
    /// Create a vector space unless one with that name exists
    Create {
        name: String,
        #[arg(long, default_value = "CLIP")]
        model: Model,
        #[arg(long, default_value = "TEXT")]
        modality: Modality,
    },
    /// Delete a vector space and all its entries
    Delete { name: String },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if dotenv::dotenv().is_err() {
        warn!("didn't load a .env file")
    }

    let args = Cli::parse();
    let client = Vecto::from_env().context("failed to create client")?;

    match args.command {
        Commands::Models {} => {
            print_json(&client.list_models().await?)?;
        }
        Commands::Spaces { command } => match command {
            SpaceCommands::List {} => {
                print_json(&client.list_vector_spaces().await?)?;
            }
            SpaceCommands::Create {
                name,
                model,
                modality,
            } => {
                let space = client.vector_space(name);
                if space.exists().await? {
                    println!("vector space already exists");
                } else {
                    space
                        .create(model, modality)
                        .await
                        .context("failed to create vector space")?;
                }
                print_json(&space.id().await)?;
            }
            SpaceCommands::Delete { name } => {
                client
                    .vector_space(name)
                    .delete()
                    .await
                    .context("failed to delete vector space")?;
            }
        },
        Commands::Ingest {
            space,
            text,
            attributes,
        } => {
            let attributes: Value =
                serde_json::from_str(&attributes).context("attributes are not valid JSON")?;
            let response = client
                .vector_space(space)
                .ingest_text(text, attributes)
                .await?;
            print_json(&response)?;
        }
        Commands::Lookup {
            space,
            query,
            top_k,
        } => {
            let results = client
                .vector_space(space)
                .lookup_text(&query, top_k)
                .await?;
            print_json(&results)?;
        }
        Commands::Analogy {
            space,
            query,
            start,
            end,
            top_k,
        } => {
            let results = client
                .vector_space(space)
                .compute_text_analogy(&query, AnalogyPair::new(start, end), top_k)
                .await?;
            print_json(&results)?;
        }
    }

    Ok(())
}
