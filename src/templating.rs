use chrono::Datelike;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

type Partials = liquid::partials::EagerCompiler<liquid::partials::InMemorySource>;

const PARTIALS_DIR: &str = "partials";

/// Liquid renderer over a template directory.
///
/// Pages are addressed by their path relative to the directory (for example
/// `pages/home.html.liquid`); every `*.liquid` file in `partials/` is
/// available to `{% include %}` under its file name.
pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    async fn load_partials(&self) -> Partials {
        let mut partials = Partials::empty();
        let partials_dir = self.template_dir.join(PARTIALS_DIR);

        let mut entries = match tokio::fs::read_dir(&partials_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No partials directory at {:?}: {}", partials_dir, e);
                return partials;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|name| name.to_str())
                && name.ends_with(".liquid")
            {
                match self.load_template(&format!("{}/{}", PARTIALS_DIR, name)).await {
                    Ok(content) => {
                        partials.add(name.to_string(), content);
                    }
                    Err(e) => error!("Failed to load partial {}: {}", name, e),
                }
            }
        }

        partials
    }

    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;
        let partials = self.load_partials().await;

        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(partials)
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        let mut full_globals = globals;
        if !full_globals.contains_key("current_year") {
            full_globals.insert(
                "current_year".into(),
                liquid::model::Value::scalar(chrono::Local::now().year() as i64),
            );
        }

        template
            .render(&full_globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }
}
