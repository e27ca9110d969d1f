use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Codes recognized when no catalog file is given.
pub const DEFAULT_CURRENCIES: [&str; 5] = ["chf", "eur", "gbp", "pln", "usd"];

/// Catalog file layout: a JSON object keyed by currency code. The values
/// (exchange rates in the stock `resources/currencies.json`) are ignored;
/// only the key set matters here.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawCatalog(BTreeMap<String, serde_json::Value>);

/// The set of currency codes the lexer registers as keywords.
///
/// Loaded once before lexing begins and passed into the lexer's
/// constructor; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    codes: Vec<String>,
}

impl CurrencyCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        let catalog: RawCatalog =
            serde_json::from_str(&raw).with_context(|| format!("Parsing {}", path.display()))?;
        ensure!(
            !catalog.0.is_empty(),
            "No currencies defined in {}",
            path.display()
        );
        Ok(Self {
            codes: catalog.0.into_keys().collect(),
        })
    }

    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_set() -> Self {
        Self::from_codes(DEFAULT_CURRENCIES)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|known| known == code)
    }
}
