use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod error;
mod render;
mod request;

pub use error::{TokenError, TokenKind, TokenResult};
pub use render::{FluidTokenView, StaticTokenView, CSS_UNIT, STATIC_TOKEN_PREFIX};
pub use request::{
    AddFluidToken, AddStaticToken, DeleteToken, EditFluidToken, EditStaticToken,
    RequestOutcome, TokenRequest, UpdateRootUnitSize,
};

/// Pixel size of one `rem`, chosen through the `html` font-size percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RootUnitSize {
    #[serde(rename = "62.5%", alias = "small")]
    #[default]
    SmallBase,
    #[serde(rename = "100%", alias = "large")]
    LargeBase,
}

impl RootUnitSize {
    pub const fn px_per_unit(self) -> f64 {
        match self {
            Self::SmallBase => 10.0,
            Self::LargeBase => 16.0,
        }
    }

    pub const fn css_value(self) -> &'static str {
        match self {
            Self::SmallBase => "62.5%",
            Self::LargeBase => "100%",
        }
    }
}

impl FromStr for RootUnitSize {
    type Err = TokenError;

    fn from_str(value: &str) -> TokenResult<Self> {
        match value.trim() {
            "62.5%" | "small" => Ok(Self::SmallBase),
            "100%" | "large" => Ok(Self::LargeBase),
            _ => Err(TokenError::InvalidRootUnitSize {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidToken {
    pub min: f64,
    pub max: f64,
}

impl FluidToken {
    /// Equal bounds render as a plain value instead of an interpolation.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticToken {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenEntry<T> {
    pub name: String,
    pub token: T,
}

/// The single persisted record: root unit size plus both token mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, alias = "rootFontSize", alias = "rootUnitSize")]
    pub root_font_size: RootUnitSize,
    #[serde(default)]
    pub tokens: BTreeMap<String, FluidToken>,
    #[serde(default, alias = "staticTokens")]
    pub static_tokens: BTreeMap<String, StaticToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub fluid: BTreeMap<String, FluidToken>,
    #[serde(rename = "static")]
    pub statics: BTreeMap<String, StaticToken>,
}

/// Lowercase and keep only `[a-z0-9-]`.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-')
        .collect()
}

pub(crate) fn validated_name(raw: &str) -> TokenResult<String> {
    let name = sanitize_name(raw);
    if name.is_empty() {
        return Err(TokenError::InvalidName {
            raw: raw.to_string(),
        });
    }
    Ok(name)
}

/// Upper bound for any stored size, in rem.
pub const MAX_TOKEN_SIZE: f64 = 10_000.0;

fn require_size(field: &'static str, value: f64) -> TokenResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(TokenError::NonPositive { field, value });
    }
    if value > MAX_TOKEN_SIZE {
        return Err(TokenError::TooLarge {
            field,
            value,
            limit: MAX_TOKEN_SIZE,
        });
    }
    Ok(())
}

pub(crate) fn validated_fluid(min: f64, max: f64) -> TokenResult<FluidToken> {
    require_size("min", min)?;
    require_size("max", max)?;
    if max < min {
        return Err(TokenError::InvalidRange { min, max });
    }
    Ok(FluidToken { min, max })
}

pub(crate) fn validated_static(value: f64) -> TokenResult<StaticToken> {
    require_size("value", value)?;
    Ok(StaticToken { value })
}

/// Owns the settings record and enforces token invariants on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStore {
    settings: Settings,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a persisted record. Entries that break a token invariant are
    /// dropped with a warning; names are re-sanitized and the first of any
    /// colliding pair is kept.
    pub fn from_settings(settings: Settings) -> Self {
        let Settings {
            root_font_size,
            tokens,
            static_tokens,
        } = settings;
        let tokens = revalidate(tokens, TokenKind::Fluid, |token| {
            validated_fluid(token.min, token.max)
        });
        let static_tokens = revalidate(static_tokens, TokenKind::Static, |token| {
            validated_static(token.value)
        });
        Self {
            settings: Settings {
                root_font_size,
                tokens,
                static_tokens,
            },
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn root_unit_size(&self) -> RootUnitSize {
        self.settings.root_font_size
    }

    pub fn fluid_tokens(&self) -> &BTreeMap<String, FluidToken> {
        &self.settings.tokens
    }

    pub fn static_tokens(&self) -> &BTreeMap<String, StaticToken> {
        &self.settings.static_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.settings.tokens.is_empty() && self.settings.static_tokens.is_empty()
    }

    pub fn add_fluid_token(
        &mut self,
        name: &str,
        min: f64,
        max: f64,
    ) -> TokenResult<TokenEntry<FluidToken>> {
        let name = validated_name(name)?;
        let token = validated_fluid(min, max)?;
        if self.settings.tokens.contains_key(&name) {
            return Err(TokenError::Conflict {
                kind: TokenKind::Fluid,
                name,
            });
        }

        self.settings.tokens.insert(name.clone(), token);
        tracing::info!(%name, min, max, "added fluid token");
        Ok(TokenEntry { name, token })
    }

    pub fn edit_fluid_token(
        &mut self,
        original_name: &str,
        new_name: &str,
        min: f64,
        max: f64,
    ) -> TokenResult<TokenEntry<FluidToken>> {
        let new_name = validated_name(new_name)?;
        let token = validated_fluid(min, max)?;
        let original_name = sanitize_name(original_name);
        replace_entry(
            &mut self.settings.tokens,
            TokenKind::Fluid,
            &original_name,
            new_name,
            token,
        )
    }

    pub fn delete_fluid_token(&mut self, name: &str) -> TokenResult<TokenEntry<FluidToken>> {
        remove_entry(&mut self.settings.tokens, TokenKind::Fluid, name)
    }

    pub fn add_static_token(
        &mut self,
        name: &str,
        value: f64,
    ) -> TokenResult<TokenEntry<StaticToken>> {
        let name = validated_name(name)?;
        let token = validated_static(value)?;
        if self.settings.static_tokens.contains_key(&name) {
            return Err(TokenError::Conflict {
                kind: TokenKind::Static,
                name,
            });
        }

        self.settings.static_tokens.insert(name.clone(), token);
        tracing::info!(%name, value, "added static token");
        Ok(TokenEntry { name, token })
    }

    pub fn edit_static_token(
        &mut self,
        original_name: &str,
        new_name: &str,
        value: f64,
    ) -> TokenResult<TokenEntry<StaticToken>> {
        let new_name = validated_name(new_name)?;
        let token = validated_static(value)?;
        let original_name = sanitize_name(original_name);
        replace_entry(
            &mut self.settings.static_tokens,
            TokenKind::Static,
            &original_name,
            new_name,
            token,
        )
    }

    pub fn delete_static_token(&mut self, name: &str) -> TokenResult<TokenEntry<StaticToken>> {
        remove_entry(&mut self.settings.static_tokens, TokenKind::Static, name)
    }

    pub fn update_root_unit_size(&mut self, choice: &str) -> TokenResult<RootUnitSize> {
        let size = choice.parse::<RootUnitSize>()?;
        self.settings.root_font_size = size;
        tracing::info!(root_font_size = size.css_value(), "updated root unit size");
        Ok(size)
    }

    /// Case-insensitive substring match on names; a blank term matches all.
    pub fn search(&self, term: &str) -> SearchResults {
        let needle = term.trim().to_lowercase();
        let matches = |name: &str| needle.is_empty() || name.to_lowercase().contains(&needle);
        SearchResults {
            fluid: self
                .settings
                .tokens
                .iter()
                .filter(|(name, _)| matches(name))
                .map(|(name, token)| (name.clone(), *token))
                .collect(),
            statics: self
                .settings
                .static_tokens
                .iter()
                .filter(|(name, _)| matches(name))
                .map(|(name, token)| (name.clone(), *token))
                .collect(),
        }
    }
}

fn replace_entry<T: Copy>(
    entries: &mut BTreeMap<String, T>,
    kind: TokenKind,
    original_name: &str,
    new_name: String,
    token: T,
) -> TokenResult<TokenEntry<T>> {
    if !entries.contains_key(original_name) {
        return Err(TokenError::NotFound {
            kind,
            name: original_name.to_string(),
        });
    }
    if new_name != original_name && entries.contains_key(&new_name) {
        return Err(TokenError::Conflict {
            kind,
            name: new_name,
        });
    }

    entries.remove(original_name);
    entries.insert(new_name.clone(), token);
    tracing::info!(%kind, from = original_name, to = %new_name, "edited token");
    Ok(TokenEntry {
        name: new_name,
        token,
    })
}

fn remove_entry<T>(
    entries: &mut BTreeMap<String, T>,
    kind: TokenKind,
    name: &str,
) -> TokenResult<TokenEntry<T>> {
    let key = sanitize_name(name);
    let removed = entries.remove(&key).ok_or_else(|| TokenError::NotFound {
        kind,
        name: name.to_string(),
    })?;
    tracing::info!(%kind, name = %key, "deleted token");
    Ok(TokenEntry {
        name: key,
        token: removed,
    })
}

fn revalidate<T>(
    entries: BTreeMap<String, T>,
    kind: TokenKind,
    check: impl Fn(&T) -> TokenResult<T>,
) -> BTreeMap<String, T> {
    let mut kept = BTreeMap::new();
    for (raw_name, token) in entries {
        let checked = validated_name(&raw_name).and_then(|name| Ok((name, check(&token)?)));
        match checked {
            Ok((name, token)) if !kept.contains_key(&name) => {
                kept.insert(name, token);
            }
            Ok((name, _)) => {
                tracing::warn!(
                    %kind,
                    raw = %raw_name,
                    %name,
                    "dropping stored token with duplicate name"
                );
            }
            Err(err) => {
                tracing::warn!(%kind, raw = %raw_name, %err, "dropping invalid stored token");
            }
        }
    }
    kept
}
