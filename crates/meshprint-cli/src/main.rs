//! MeshPrint CLI - Generate 3D models and forward them to print ordering.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use meshprint_client::{
    DirectFetcher, GenerationClient, ModelFetcher, Orchestrator, PollConfig, Poller, RelayClient,
    Session, UploadClient, UploadSource,
};
use meshprint_core::{
    ApiKey, ArtStyle, CreationRequest, GenerationTask, PublishableKey, TaskId, TaskStatus,
};

/// MeshPrint CLI - generative 3D and print-ordering uploads
#[derive(Parser)]
#[command(name = "meshprint")]
#[command(about = "CLI for generative 3D tasks and print uploads", long_about = None)]
struct Cli {
    /// Generation service base URL
    #[arg(long, default_value = "https://api.meshy.ai")]
    generation_url: String,

    /// Upload service base URL
    #[arg(long, default_value = "https://api.formlabs.com/form-now")]
    upload_url: String,

    /// Generation service API key (falls back to MESHY_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Upload service publishable key (falls back to FORMNOW_PUBLISHABLE_KEY)
    #[arg(long)]
    publishable_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a generation task and poll it to completion
    Generate {
        #[command(subcommand)]
        mode: GenerateMode,

        /// Give up after this many status queries
        #[arg(long, default_value_t = 900)]
        max_attempts: u32,
    },

    /// Poll an existing task until it reaches a terminal state
    Watch {
        /// Task ID
        id: String,

        /// Give up after this many status queries
        #[arg(long, default_value_t = 900)]
        max_attempts: u32,
    },

    /// Upload a mesh to the print-ordering service
    Upload {
        /// Local STL or OBJ file
        #[arg(long, conflicts_with = "from_url")]
        file: Option<PathBuf>,

        /// Remote model URL, fetched before the upload handshake
        #[arg(long)]
        from_url: Option<String>,

        /// File name to register when using --from-url
        #[arg(long, default_value = "meshprint-model.obj")]
        name: String,

        /// Fetch remote models through this relay instead of directly
        #[arg(long)]
        relay_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum GenerateMode {
    /// Generate from a text prompt
    Text {
        /// Prompt text (at most 600 characters)
        #[arg(short, long)]
        prompt: String,

        /// Art style: realistic or sculpture
        #[arg(long, default_value = "realistic")]
        art_style: String,
    },

    /// Generate from a single reference image URL
    Image {
        /// Image URL
        #[arg(short, long)]
        url: String,
    },

    /// Generate from one to four reference image URLs
    MultiImage {
        /// Image URLs, in display order
        #[arg(short, long, num_args = 1..)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { mode, max_attempts } => {
            let key = resolve_key(cli.api_key, "--api-key", "MESHY_API_KEY")?;
            let request = build_request(mode)?;
            generate(&cli.generation_url, ApiKey::new(key), request, max_attempts).await?;
        }
        Commands::Watch { id, max_attempts } => {
            let key = resolve_key(cli.api_key, "--api-key", "MESHY_API_KEY")?;
            let client = Arc::new(GenerationClient::new(&cli.generation_url));
            watch_task(client, TaskId::new(id), ApiKey::new(key), max_attempts).await?;
        }
        Commands::Upload {
            file,
            from_url,
            name,
            relay_url,
        } => {
            let key = resolve_key(
                cli.publishable_key,
                "--publishable-key",
                "FORMNOW_PUBLISHABLE_KEY",
            )?;
            upload(&cli.upload_url, relay_url, file, from_url, name, PublishableKey::new(key))
                .await?;
        }
    }

    Ok(())
}

fn resolve_key(
    flag: Option<String>,
    flag_name: &str,
    env_name: &str,
) -> Result<String, String> {
    flag.or_else(|| std::env::var(env_name).ok())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| format!("missing credential: pass {flag_name} or set {env_name}"))
}

fn build_request(mode: GenerateMode) -> Result<CreationRequest, Box<dyn std::error::Error>> {
    let request = match mode {
        GenerateMode::Text { prompt, art_style } => CreationRequest::TextToModel {
            prompt,
            art_style: parse_art_style(&art_style)?,
        },
        GenerateMode::Image { url } => CreationRequest::ImageToModel { image_url: url },
        GenerateMode::MultiImage { urls } => CreationRequest::MultiImageToModel {
            image_urls: urls.into(),
        },
    };
    // Reject bad input here, before any network call.
    request.validate()?;
    Ok(request)
}

fn parse_art_style(value: &str) -> Result<ArtStyle, String> {
    match value {
        "realistic" => Ok(ArtStyle::Realistic),
        "sculpture" => Ok(ArtStyle::Sculpture),
        other => Err(format!(
            "unknown art style '{other}' (expected realistic or sculpture)"
        )),
    }
}

async fn generate(
    generation_url: &str,
    key: ApiKey,
    request: CreationRequest,
    max_attempts: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(GenerationClient::new(generation_url));

    let task_id = client.create(&request, &key).await?;
    println!("Task created: {}", task_id);

    watch_task(client, task_id, key, max_attempts).await
}

async fn watch_task(
    client: Arc<GenerationClient>,
    task_id: TaskId,
    key: ApiKey,
    max_attempts: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = Poller::spawn(
        client,
        task_id,
        key,
        PollConfig {
            max_attempts: Some(max_attempts),
            ..PollConfig::default()
        },
    );
    let mut updates = handle.updates();

    let mut session = Session::new();
    session.start_polling(handle);

    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if let Some(task) = snapshot {
                if task.status.is_active() {
                    println!(
                        "{:>11}  {:>3}%  queue position {}",
                        format!("{:?}", task.status),
                        task.progress,
                        task.preceding_tasks
                    );
                }
            }
        }
    });

    let outcome = match session.wait().await {
        Some(result) => result?,
        None => return Err("no polling loop active".into()),
    };
    printer.abort();

    print_task(&outcome);
    match outcome.status {
        TaskStatus::Succeeded => Ok(()),
        TaskStatus::Canceled => Err("task was cancelled at the service".into()),
        _ => Err(outcome
            .error_message()
            .unwrap_or("generation failed")
            .into()),
    }
}

fn print_task(task: &GenerationTask) {
    println!("Task {}:", task.id);
    println!("  status:   {:?}", task.status);
    println!("  progress: {}%", task.progress);

    let formats = [
        ("glb", &task.model_urls.glb),
        ("fbx", &task.model_urls.fbx),
        ("obj", &task.model_urls.obj),
        ("mtl", &task.model_urls.mtl),
        ("usdz", &task.model_urls.usdz),
    ];
    for (format, url) in formats {
        if let Some(url) = url {
            println!("  {:<5} {}", format!("{format}:"), url);
        }
    }
    if let Some(message) = task.error_message() {
        println!("  error:    {}", message);
    }
}

async fn upload(
    upload_url: &str,
    relay_url: Option<String>,
    file: Option<PathBuf>,
    from_url: Option<String>,
    name: String,
    key: PublishableKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = match (file, from_url) {
        (Some(path), _) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or("invalid file name")?
                .to_owned();
            let bytes = tokio::fs::read(&path).await?;
            UploadSource::File { file_name, bytes }
        }
        (None, Some(url)) => UploadSource::Remote {
            url,
            file_name: name,
        },
        (None, None) => return Err("either --file or --from-url is required".into()),
    };

    let fetcher: Arc<dyn ModelFetcher> = match relay_url {
        Some(url) => Arc::new(RelayClient::new(&url)),
        None => Arc::new(DirectFetcher::new()),
    };
    let orchestrator = Orchestrator::new(Arc::new(UploadClient::new(upload_url)), fetcher);

    let mut progress = orchestrator.progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            println!("{:?}...", *progress.borrow_and_update());
        }
    });

    let record = orchestrator.upload(source, &key).await?;
    printer.abort();

    println!("Upload complete: {}", record.id);
    if let Some(url) = &record.redirect_url {
        println!("Order your print at: {}", url);
    }

    Ok(())
}
