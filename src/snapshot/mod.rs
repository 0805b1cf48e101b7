//! JSON export and additive import of the token settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tokens::{
    validated_fluid, validated_name, validated_static, FluidToken, RootUnitSize, StaticToken,
    TokenError, TokenResult, TokenStore,
};

pub const SNAPSHOT_VERSION: &str = env!("CARGO_PKG_VERSION");

const ROOT_SIZE_KEYS: [&str; 4] = [
    "root_font_size",
    "rootFontSize",
    "rootUnitSize",
    "root_unit_size",
];
const STATIC_KEYS: [&str; 2] = ["static_tokens", "staticTokens"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub root_font_size: RootUnitSize,
    pub tokens: BTreeMap<String, FluidToken>,
    pub static_tokens: BTreeMap<String, StaticToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub fluid_imported: usize,
    pub fluid_skipped: usize,
    pub static_imported: usize,
    pub static_skipped: usize,
    pub root_font_size: Option<RootUnitSize>,
}

/// Accept JSON numbers and numeric strings, like form-encoded exports carry.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn fluid_entry(name: &str, entry: &Value) -> TokenResult<(String, FluidToken)> {
    let malformed = || TokenError::MalformedInput {
        message: format!("fluid token {name:?} needs numeric min and max"),
    };
    let min = entry.get("min").and_then(number).ok_or_else(malformed)?;
    let max = entry.get("max").and_then(number).ok_or_else(malformed)?;
    Ok((validated_name(name)?, validated_fluid(min, max)?))
}

fn static_entry(name: &str, entry: &Value) -> TokenResult<(String, StaticToken)> {
    let value = number(entry)
        .or_else(|| entry.get("value").and_then(number))
        .ok_or_else(|| TokenError::MalformedInput {
            message: format!("static token {name:?} needs a numeric value"),
        })?;
    Ok((validated_name(name)?, validated_static(value)?))
}

/// Insert entries whose sanitized name is free; everything else is skipped.
fn merge_entries<T>(
    target: &mut BTreeMap<String, T>,
    source: Option<&Value>,
    parse: impl Fn(&str, &Value) -> TokenResult<(String, T)>,
) -> (usize, usize) {
    let Some(source) = source.filter(|value| !value.is_null()) else {
        return (0, 0);
    };
    let Some(entries) = source.as_object() else {
        tracing::warn!("ignoring token section that is not an object");
        return (0, 0);
    };

    let (mut imported, mut skipped) = (0, 0);
    for (raw_name, entry) in entries {
        match parse(raw_name, entry) {
            Ok((name, token)) if !target.contains_key(&name) => {
                target.insert(name, token);
                imported += 1;
            }
            Ok((name, _)) => {
                tracing::debug!(%name, "skipping import entry with existing name");
                skipped += 1;
            }
            Err(err) => {
                tracing::debug!(name = %raw_name, %err, "skipping malformed import entry");
                skipped += 1;
            }
        }
    }
    (imported, skipped)
}

impl TokenStore {
    pub fn export_snapshot(&self) -> Snapshot {
        let settings = self.settings();
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            root_font_size: settings.root_font_size,
            tokens: settings.tokens.clone(),
            static_tokens: settings.static_tokens.clone(),
        }
    }

    /// Merge a snapshot payload; existing names win and bad entries are counted as skipped.
    pub fn import_snapshot(&mut self, data: &Value) -> TokenResult<ImportReport> {
        let object = data.as_object().ok_or_else(|| TokenError::MalformedInput {
            message: "import payload must be a JSON object".to_string(),
        })?;

        let mut report = ImportReport::default();
        if let Some(raw) = first_present(object, &ROOT_SIZE_KEYS) {
            match raw.as_str().map(str::parse::<RootUnitSize>) {
                Some(Ok(size)) => report.root_font_size = Some(size),
                _ => tracing::warn!(value = %raw, "ignoring invalid root font size in import"),
            }
        }

        // Work on a copy so the payload is applied as a whole.
        let mut settings = self.settings().clone();
        if let Some(size) = report.root_font_size {
            settings.root_font_size = size;
        }
        (report.fluid_imported, report.fluid_skipped) =
            merge_entries(&mut settings.tokens, object.get("tokens"), fluid_entry);
        (report.static_imported, report.static_skipped) = merge_entries(
            &mut settings.static_tokens,
            first_present(object, &STATIC_KEYS),
            static_entry,
        );
        *self = TokenStore::from_settings(settings);

        tracing::info!(
            fluid_imported = report.fluid_imported,
            fluid_skipped = report.fluid_skipped,
            static_imported = report.static_imported,
            static_skipped = report.static_skipped,
            "imported tokens"
        );
        Ok(report)
    }

    pub fn import_snapshot_str(&mut self, payload: &str) -> TokenResult<ImportReport> {
        let data: Value =
            serde_json::from_str(payload).map_err(|err| TokenError::MalformedInput {
                message: format!("invalid JSON: {err}"),
            })?;
        self.import_snapshot(&data)
    }
}
