//! Command implementations.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};
use url::Url;

use docsearch_service::{IndexPayload, QueryTranslator, SearchFacade};
use docsearch_types::Settings;

use crate::cli::IndexArgs;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    index_path_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(index_path) = index_path_override {
        settings.index_path = index_path.to_string();
    }

    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn file_url(path: &str) -> Result<Url> {
    let absolute = Path::new(path)
        .canonicalize()
        .with_context(|| format!("Cannot read {}", path))?;
    Url::from_file_path(&absolute).map_err(|_| anyhow!("{} is not an absolute path", absolute.display()))
}

/// Build the ingestion payload described by the CLI arguments.
pub fn build_payload(args: &IndexArgs) -> Result<IndexPayload> {
    let (mut payload, content_url) = match (&args.file, &args.location) {
        (Some(path), _) => {
            let url = file_url(path)?;
            (IndexPayload::from_locator(url.clone()), Some(url))
        }
        (None, Some(location)) => (IndexPayload::from_locator(location.clone()), None),
        (None, None) => return Err(anyhow!("Either --file or --location is required")),
    };

    payload.media_type = args.media_type.clone();
    payload.locations.resource = args.resource_location.clone();
    payload.locations.file = args.file_location.clone();
    payload.locations.irm = args.irm_location.clone();
    payload.locations.metacard = args.metacard_location.clone();
    payload.title = args.title.clone();
    payload.country_code = args.country_code.clone();
    payload.keyword = args.keyword.clone();
    payload.icid = args.icid.clone();
    payload.created = args.created;
    payload.modified = args.modified;
    payload.expiration = args.expiration;

    if !payload.has_locator() {
        if let Some(url) = content_url {
            debug!(file_location = %url, "Using the content file as fileLocation");
            payload.locations.file = Some(url);
        }
    }

    Ok(payload)
}

pub async fn handle_index(settings: &Settings, args: IndexArgs) -> Result<()> {
    let payload = build_payload(&args)?;
    let facade = SearchFacade::from_settings(settings).context("Failed to open search index")?;

    facade
        .index(&args.id, payload)
        .await
        .with_context(|| format!("Failed to index {}", args.id))?;

    println!("Indexed {}", args.id);
    Ok(())
}

pub async fn handle_find(
    settings: &Settings,
    query: &str,
    retrieve_endpoint: Option<String>,
) -> Result<()> {
    let mut settings = settings.clone();
    if retrieve_endpoint.is_some() {
        settings.retrieve_endpoint = retrieve_endpoint;
    }

    let facade = SearchFacade::from_settings(&settings).context("Failed to open search index")?;
    let locators = facade.find(query).await.context("Query failed")?;

    let mut locators: Vec<String> = locators.into_iter().map(String::from).collect();
    locators.sort();
    info!(count = locators.len(), "Found documents");
    for locator in locators {
        println!("{}", locator);
    }
    Ok(())
}

pub fn handle_translate(settings: &Settings, query: &str) -> Result<()> {
    let translator = QueryTranslator::new(settings.max_query_length);
    let rendered = translator
        .translate(query)
        .context("Failed to translate query")?;
    println!("{}", rendered);
    Ok(())
}
