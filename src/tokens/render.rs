use serde::Serialize;

use super::{FluidToken, RootUnitSize, StaticToken, TokenResult, TokenStore};
use crate::fluid::{compute_fluid_expression, format_size, FluidResult};
use crate::viewport::ViewportRange;

pub const CSS_UNIT: &str = "rem";
/// Static tokens live under their own prefix so they never shadow a fluid token.
pub const STATIC_TOKEN_PREFIX: &str = "fs-";
const STYLE_TAG_ID: &str = "fdt-css-variables";

/// A fluid token as presented in listings: name, reference and resolved value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluidTokenView {
    pub name: String,
    pub property: String,
    pub reference: String,
    pub value: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticTokenView {
    pub name: String,
    pub property: String,
    pub reference: String,
    pub value: String,
}

fn fluid_value(
    token: &FluidToken,
    viewport: &ViewportRange,
    root: RootUnitSize,
) -> FluidResult<String> {
    let expression = compute_fluid_expression(
        token.min,
        token.max,
        f64::from(viewport.min_px),
        f64::from(viewport.max_px),
        root.px_per_unit(),
        CSS_UNIT,
    )?;
    if token.is_fixed() {
        return Ok(expression);
    }
    Ok(format!(
        "clamp({min}{CSS_UNIT}, {expression}, {max}{CSS_UNIT})",
        min = format_size(token.min)?,
        max = format_size(token.max)?,
    ))
}

fn static_value(token: &StaticToken) -> FluidResult<String> {
    Ok(format!("{}{CSS_UNIT}", format_size(token.value)?))
}

fn static_property(name: &str) -> String {
    format!("--{STATIC_TOKEN_PREFIX}{name}")
}

impl TokenStore {
    /// Render the `html` font-size rule and a `:root` block of custom properties.
    ///
    /// Returns an empty string when neither mapping holds a token.
    pub fn render_css_variables(&self, viewport: &ViewportRange) -> TokenResult<String> {
        if self.is_empty() {
            return Ok(String::new());
        }

        let root = self.root_unit_size();
        let mut lines = Vec::with_capacity(self.fluid_tokens().len() + self.static_tokens().len());
        for (name, token) in self.fluid_tokens() {
            lines.push(format!("  --{name}: {};", fluid_value(token, viewport, root)?));
        }
        for (name, token) in self.static_tokens() {
            lines.push(format!("  {}: {};", static_property(name), static_value(token)?));
        }
        Ok(format!(
            "html {{\n  font-size: {root_font_size};\n}}\n:root {{\n{body}\n}}\n",
            root_font_size = root.css_value(),
            body = lines.join("\n"),
        ))
    }

    /// Same as [`TokenStore::render_css_variables`], wrapped for injection into a page head.
    pub fn render_style_tag(&self, viewport: &ViewportRange) -> TokenResult<String> {
        let css = self.render_css_variables(viewport)?;
        if css.is_empty() {
            return Ok(css);
        }
        Ok(format!("<style id=\"{STYLE_TAG_ID}\">\n{css}</style>\n"))
    }

    pub fn fluid_token_views(&self, viewport: &ViewportRange) -> TokenResult<Vec<FluidTokenView>> {
        let root = self.root_unit_size();
        self.fluid_tokens()
            .iter()
            .map(|(name, token)| {
                Ok(FluidTokenView {
                    name: name.clone(),
                    property: format!("--{name}"),
                    reference: format!("var(--{name})"),
                    value: fluid_value(token, viewport, root)?,
                    min: token.min,
                    max: token.max,
                })
            })
            .collect()
    }

    pub fn static_token_views(&self) -> TokenResult<Vec<StaticTokenView>> {
        self.static_tokens()
            .iter()
            .map(|(name, token)| {
                let property = static_property(name);
                Ok(StaticTokenView {
                    name: name.clone(),
                    reference: format!("var({property})"),
                    property,
                    value: static_value(token)?,
                })
            })
            .collect()
    }
}
