use clap::{Parser, Subcommand};
use cms_files::config::ClientConfig;
use cms_files::infrastructure::setup_files;
use cms_files::models::{Attributes, FileRecord};
use cms_files::services::upload::{LocalFile, UploadSource};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage files stored in the content backend", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file by id
    Get { id: u64 },

    /// Print the first file whose field matches a value
    Find { field: String, value: String },

    /// Upload a local path, a URL, or base64 content
    Upload {
        source: String,

        #[arg(short, long)]
        folder: Option<u64>,

        #[arg(long)]
        filename: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Comma separated
        #[arg(long)]
        tags: Option<String>,
    },

    /// Resolve and store a file's image dimensions
    Dimensions { id: u64 },

    /// Delete a file by id
    Delete { id: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cms_files=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let files = setup_files(&config)?;

    match args.command {
        Command::Get { id } => match files.find(id).await? {
            Some(record) => print_record(&record)?,
            None => {
                error!("File {} not found", id);
                std::process::exit(1);
            }
        },
        Command::Find { field, value } => {
            let record = files.resolve_route_binding(&value, Some(field.as_str())).await?;
            print_record(&record)?;
        }
        Command::Upload {
            source,
            folder,
            filename,
            name,
            description,
            tags,
        } => {
            let mut attributes = Attributes::new();
            for (key, value) in [
                ("filename", filename),
                ("name", name),
                ("description", description),
                ("tags", tags),
            ] {
                if let Some(value) = value {
                    attributes.insert(key.to_string(), Value::String(value));
                }
            }

            let source = if Path::new(&source).is_file() {
                UploadSource::Local(LocalFile::new(&source))
            } else {
                UploadSource::from_string(source)
            };

            let record = files.upload(source, attributes, folder).await?;
            info!("Uploaded file {:?}", record.id());
            print_record(&record)?;
        }
        Command::Dimensions { id } => {
            let mut record = files.find_or_fail(id).await?;
            let resolution = files.resolve_resolution(&mut record).await?;
            info!("File {} resolution: {}", id, resolution);
            print_record(&record)?;
        }
        Command::Delete { id } => {
            let record = files.find_or_fail(id).await?;
            if files.delete(&record).await? {
                info!("Deleted file {}", id);
            }
        }
    }

    Ok(())
}

fn print_record(record: &FileRecord) -> anyhow::Result<()> {
    let mut attributes = record.to_attributes();
    for key in ["extension", "resolution"] {
        attributes.insert(key.to_string(), record.attribute(key));
    }
    println!("{}", serde_json::to_string_pretty(&attributes)?);
    Ok(())
}
