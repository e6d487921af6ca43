//! Lang command handler

use crate::cli::LangArgs;
use crate::client::ApiClient;
use crate::config::DashConfig;
use crate::i18n::{validate_language_code, LanguageStore, Translations};

/// Translations for the remembered language, or none when they can't be fetched.
pub async fn load_translations(api: &ApiClient, config: &DashConfig) -> Translations {
    let store = LanguageStore::new(&config.locale.state_file);
    let language = store.resolve(&config.locale.default_language);
    match api.locale(&language).await {
        Ok(translations) => translations,
        Err(e) => {
            tracing::warn!(language = %language, error = %e, "Falling back to built-in text");
            Translations::empty(&language)
        }
    }
}

/// Handle `streamdash lang` command
pub async fn handle_lang(
    args: &LangArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let store = LanguageStore::new(&config.locale.state_file);

    let Some(language) = args.language.as_deref() else {
        return Ok(format!(
            "Current language: {}",
            store.resolve(&config.locale.default_language)
        ));
    };

    validate_language_code(language)?;
    let api = ApiClient::new(&config.server)?;
    let translations = api.locale(language).await?;
    store.save(language)?;

    Ok(format!(
        "✓ Language set to {} ({} entries)",
        language,
        translations.len()
    ))
}
