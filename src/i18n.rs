//! Localized status text.
//!
//! Tables use the `{"staticContent": {key: {language: text}}}` layout. A
//! built-in English/German table is always available; files loaded at runtime
//! are layered on top of it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::session::{StatusKey, StatusMessage};

/// Language used when the requested one has no entry.
pub const FALLBACK_LANGUAGE: &str = "en";

const BUILTIN_ENTRIES: &[(&str, &str, &str)] = &[
    (
        "status-initial",
        "Press start and place your phone on the roof surface.",
        "Drücken Sie Start und legen Sie Ihr Handy auf die Dachfläche.",
    ),
    (
        "status-measuring",
        "Measuring... hold the phone still.",
        "Messung läuft... Handy ruhig halten.",
    ),
    (
        "gyro-instructions",
        "Keep the phone flat on the surface until the value settles.",
        "Halten Sie das Handy flach auf der Fläche, bis sich der Wert stabilisiert.",
    ),
    ("status-holding", "Hold still...", "Stillhalten..."),
    (
        "status-finished",
        "Measurement complete: ",
        "Messung abgeschlossen: ",
    ),
    (
        "status-success",
        "Pitch sent successfully.",
        "Dachneigung erfolgreich gesendet.",
    ),
    (
        "error-gyro",
        "Orientation sensor not available.",
        "Lagesensor nicht verfügbar.",
    ),
    (
        "error-permission",
        "Permission to access the orientation sensor was denied.",
        "Zugriff auf den Lagesensor wurde verweigert.",
    ),
    (
        "error-request",
        "Could not request sensor permission.",
        "Sensorberechtigung konnte nicht angefordert werden.",
    ),
    ("error-server", "Server error: ", "Serverfehler: "),
    (
        "error-network",
        "Network error, please try again.",
        "Netzwerkfehler, bitte erneut versuchen.",
    ),
];

static BUILTIN: Lazy<StatusCatalog> = Lazy::new(|| {
    let mut catalog = StatusCatalog::default();
    for (key, en, de) in BUILTIN_ENTRIES {
        catalog.insert(key, "en", en);
        catalog.insert(key, "de", de);
    }
    catalog
});

/// Key → language → text table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCatalog {
    #[serde(rename = "staticContent", default)]
    static_content: HashMap<String, HashMap<String, String>>,
}

impl StatusCatalog {
    /// The built-in English/German table.
    pub fn builtin() -> &'static StatusCatalog {
        &BUILTIN
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Built-in table overlaid with the file at `path`.
    ///
    /// A missing or malformed file is logged and the built-in table returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let mut catalog = Self::builtin().clone();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(loaded) => {
                    log::info!("[StatusCatalog] Loaded translations from {:?}", path.as_ref());
                    catalog.merge(loaded);
                }
                Err(err) => log::warn!(
                    "[StatusCatalog] Failed to parse {:?}: {}. Using built-in table.",
                    path.as_ref(),
                    err
                ),
            },
            Err(err) => log::warn!(
                "[StatusCatalog] Failed to read {:?}: {}. Using built-in table.",
                path.as_ref(),
                err
            ),
        }
        catalog
    }

    pub fn insert(&mut self, key: &str, language: &str, text: &str) {
        self.static_content
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), text.to_string());
    }

    /// Entries of `other` win over existing ones.
    pub fn merge(&mut self, other: StatusCatalog) {
        for (key, texts) in other.static_content {
            self.static_content.entry(key).or_default().extend(texts);
        }
    }

    /// Exact lookup, falling back to English.
    pub fn lookup(&self, key: &str, language: &str) -> Option<&str> {
        let texts = self.static_content.get(key)?;
        texts
            .get(language)
            .or_else(|| texts.get(FALLBACK_LANGUAGE))
            .map(String::as_str)
    }

    /// Text for `key`, or the key itself when nothing matches.
    pub fn text(&self, key: &str, language: &str) -> String {
        self.lookup(key, language)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Localized text with the message detail appended.
    pub fn render(&self, message: &StatusMessage, language: &str) -> String {
        let mut text = self.text(message.key.as_key(), language);
        if let Some(detail) = &message.detail {
            text.push_str(detail);
        }
        text
    }

    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .static_content
            .values()
            .flat_map(|texts| texts.keys().cloned())
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }
}
