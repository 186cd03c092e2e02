use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use mekboard::{
    Config, create_app,
    posts::{ForumManager, PostsError},
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Inspect the post store
    #[command(subcommand)]
    Posts(PostsCommands),
}

#[derive(Subcommand, Debug)]
enum PostsCommands {
    /// List all posts, newest first
    List {
        /// Path to the post store (defaults to the configured one)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Show a single post with its comments
    Show {
        /// Post id
        id: String,
        /// Path to the post store (defaults to the configured one)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Posts(posts_cmd)) => handle_posts_command(posts_cmd, &config).await,
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        None => {
            // Default to serve command if no subcommand specified
            let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok());
            run_server(config, port, None, None).await
        }
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        let config = toml_edit::de::from_str::<Config>(&config_content)?;
        info!("Configuration loaded from: {:?}", config_path);
        Ok(config)
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

fn forum_for(config: &Config, store: Option<PathBuf>) -> ForumManager {
    let mut posts_config = config.forum.clone();
    if let Some(store) = store {
        posts_config.store_path = store;
    }
    ForumManager::new(posts_config)
}

async fn handle_posts_command(
    cmd: PostsCommands,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        PostsCommands::List { store } => {
            let forum = forum_for(config, store);
            let posts = forum.list_posts().await?;
            let store_path = forum.store().path().display();

            if posts.is_empty() {
                println!("No posts in {}", store_path);
                return Ok(());
            }

            println!("Posts in {}:", store_path);
            for post in posts {
                println!(
                    "  {}  {}  {:?} by {} ({} likes, {} comments)",
                    post.id,
                    post.timestamp,
                    post.title,
                    post.author,
                    post.likes,
                    post.comment_count
                );
            }
        }
        PostsCommands::Show { id, store } => {
            let forum = forum_for(config, store);
            let post = forum
                .get_post(&id)
                .await?
                .ok_or(PostsError::PostNotFound(id))?;

            println!("{}", post.title);
            println!("by {} on {}, {} likes", post.author, post.timestamp, post.likes);
            println!();
            println!("{}", post.content);
            println!();
            println!("{} comments", post.comment_count());
            for comment in &post.comments {
                println!("  [{}] {}: {}", comment.timestamp, comment.author, comment.text);
            }
        }
    }

    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Post store: {:?}", config.forum.store_path);
    info!("Template directory: {:?}", config.templates.directory);
    info!(
        "Static files directory: {:?}",
        config.static_files.directory
    );

    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let app = create_app(config).await;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
