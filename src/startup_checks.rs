use crate::Config;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create store directory: {0}")]
    StoreDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Templates directory does not exist")]
    TemplatesDirectoryMissing,
}

impl StartupCheckError {
    /// The server cannot persist posts without its store directory.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::StoreDirectoryCreationFailed(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let store_path = &config.forum.store_path;
    if let Some(store_dir) = store_path.parent()
        && !store_dir.as_os_str().is_empty()
    {
        if !store_dir.exists() {
            info!("Store directory does not exist, creating: {:?}", store_dir);
            if let Err(e) = tokio::fs::create_dir_all(store_dir).await {
                error!("Failed to create store directory {:?}: {}", store_dir, e);
                errors.push(StartupCheckError::StoreDirectoryCreationFailed(e));
            } else {
                info!("Store directory created successfully");
            }
        } else {
            info!("Store directory exists: {:?}", store_dir);
        }
    }

    if store_path.exists() {
        info!("Post store found: {:?}", store_path);
    } else {
        info!(
            "Post store {:?} does not exist yet, it will be created on the first post",
            store_path
        );
    }

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.exists() {
        warn!("Templates directory does not exist: {:?}", templates_dir);
        warn!("This may cause issues with page rendering");
        errors.push(StartupCheckError::TemplatesDirectoryMissing);
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
    }

    let static_dir = Path::new(&config.static_files.directory);
    if !static_dir.exists() {
        warn!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
