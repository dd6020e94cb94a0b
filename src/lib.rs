use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Arc;

pub mod dictionary;
pub mod enhancement;
pub mod error;
pub mod history;
pub mod languages;
pub mod logging;
pub mod output;
mod paths;
pub mod providers;
pub mod resolver;
pub mod sequence;
pub mod server;
pub mod session;
pub mod settings;
pub mod speech;
pub mod store;

pub use enhancement::{EnhancementClient, EnhancementRequest, ModelReply};
pub use error::TranslatorError;
pub use languages::{Language, LanguagePair};
pub use providers::{Backend, Gemini, ProviderKind};
pub use resolver::{Resolver, TranslationRequest, TranslationResult};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lang: String,
    pub source_lang: String,
    pub key: Option<String>,
    pub save_key: Option<String>,
    pub clear_key: bool,
    pub enhance: bool,
    pub grammar: bool,
    pub pronunciation: bool,
    pub show_histories: bool,
    pub clear_histories: bool,
    pub settings_path: Option<String>,
}

/// Loads settings and the on-disk store, and returns a ready session.
pub async fn open_session(config: &Config) -> Result<Session> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(paths::store_path()));
    Session::init(settings, store, config.key.clone()).await
}

pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let session = open_session(&config).await?;
    run_with_session(&session, &config, input).await
}

/// One CLI invocation against an existing session: management flags first, then the
/// translation (with the requested learning aids) of `input`.
pub async fn run_with_session(
    session: &Session,
    config: &Config,
    input: Option<String>,
) -> Result<String> {
    if let Some(output) = run_management(session, config)? {
        return Ok(output);
    }

    let input = input.unwrap_or_default();
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("stdin is empty"));
    }

    let translation = session
        .translate(input, &config.source_lang, &config.lang)
        .await
        .map_err(|err| anyhow!(output::format_error(&err)))?;
    let mut sections = vec![output::display_translation(&translation.result)];
    let source = translation.pair.source.code();
    let target = translation.pair.target.code();

    if config.enhance && !translation.result.is_miss() && !translation.result.is_unchanged() {
        let reply = session
            .enhance(input, &translation.result.text, source, target)
            .await;
        sections.push(match reply {
            Ok(reply) => output::format_enhancement(&reply, &translation.result.text),
            Err(err) => output::format_error(&err),
        });
    }
    if config.grammar {
        sections.push(match session.explain_grammar(input, source).await {
            Ok(reply) => output::format_grammar(&reply),
            Err(err) => output::format_error(&err),
        });
    }
    if config.pronunciation {
        sections.push(match session.pronunciation_help(input, source).await {
            Ok(reply) => output::format_pronunciation(&reply),
            Err(err) => output::format_error(&err),
        });
    }

    Ok(sections.join("\n\n"))
}

fn run_management(session: &Session, config: &Config) -> Result<Option<String>> {
    let mut lines = Vec::new();
    if let Some(key) = config.save_key.as_deref() {
        session.set_credential(key)?;
        lines.push("Gemini API key saved.".to_string());
    }
    if config.clear_key {
        session.clear_credential()?;
        lines.push("Gemini API key removed.".to_string());
    }
    if config.clear_histories {
        session.history().clear()?;
        lines.push("Translation history cleared.".to_string());
    }
    if config.show_histories {
        lines.push(output::format_histories(&session.history().list()?));
    }
    if lines.is_empty() {
        Ok(None)
    } else {
        Ok(Some(lines.join("\n")))
    }
}
