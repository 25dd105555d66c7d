use std::collections::HashMap;

use eyre::eyre;
use log::warn;
use rust_embed::RustEmbed;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(RustEmbed)]
#[folder = "src/lang/"]
struct Translations;

/// Keys for every user-facing reply string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, AsRefStr, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LangKey {
    PurgeAmountInvalid,
    PurgeHistoryFail,
    PurgeSuccess,
    PurgeFail,
}

/// Translation table for a single language, embedded at compile time.
pub struct Lang {
    entries: HashMap<String, String>,
}

impl Lang {
    pub fn load(language: &str) -> eyre::Result<Self> {
        let filename = format!("{}.json", language.to_lowercase());
        let file = Translations::get(&filename)
            .ok_or_else(|| eyre!("no translations for language {:?}", language))?;
        let entries: HashMap<String, String> = serde_json::from_slice(file.data.as_ref())?;
        for key in LangKey::iter() {
            if !entries.contains_key(key.as_ref()) {
                warn!("{} is missing the {} string", filename, key.as_ref());
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: LangKey) -> String {
        match self.entries.get(key.as_ref()) {
            Some(text) => text.clone(),
            None => format!("Missing: {}", key.as_ref()),
        }
    }

    /// Substitutes `{0}`-style indexed and bare `{}` placeholders in order.
    pub fn format(&self, key: LangKey, params: &[&str]) -> String {
        params
            .iter()
            .enumerate()
            .fold(self.get(key), |mut text, (i, param)| {
                text = text.replace(&format!("{{{}}}", i), param);
                if text.contains("{}") {
                    text = text.replacen("{}", param, 1);
                }
                text
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_as_screaming_snake_case() {
        assert_eq!(LangKey::PurgeAmountInvalid.as_ref(), "PURGE_AMOUNT_INVALID");
        assert_eq!(LangKey::PurgeHistoryFail.as_ref(), "PURGE_HISTORY_FAIL");
    }

    #[test]
    fn default_language_has_every_key() {
        let lang = Lang::load(DEFAULT_LANGUAGE).unwrap();
        for key in LangKey::iter() {
            assert!(
                lang.entries.contains_key(key.as_ref()),
                "en.json is missing {}",
                key.as_ref()
            );
        }
    }

    #[test]
    fn unknown_language_is_an_error() {
        assert!(Lang::load("tlh").is_err());
    }

    #[test]
    fn formats_indexed_placeholders() {
        let lang = Lang::load(DEFAULT_LANGUAGE).unwrap();
        let text = lang.format(LangKey::PurgeSuccess, &["7"]);
        assert!(text.contains('7'), "no count in {:?}", text);
        assert!(!text.contains("{0}"));
    }

    #[test]
    fn missing_key_renders_placeholder() {
        let lang = Lang {
            entries: HashMap::new(),
        };
        assert_eq!(lang.get(LangKey::PurgeFail), "Missing: PURGE_FAIL");
    }
}
