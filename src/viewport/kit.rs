use serde::Deserialize;

use super::ViewportError;

const MOBILE_WITH_SYSTEM_COLORS_PX: u32 = 767;
const MOBILE_FALLBACK_PX: u32 = 320;
const MIN_CONTENT_WIDTH_FALLBACK_PX: u32 = 800;
const CONTENT_WIDTH_FALLBACK_PX: u32 = 1140;

#[derive(Deserialize)]
#[serde(untagged)]
enum PixelValue {
    Number(f64),
    Text(String),
}

impl PixelValue {
    fn to_px(&self) -> Option<u32> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse().ok()?,
        };
        (value.is_finite() && value >= 0.0).then(|| value.trunc() as u32)
    }
}

#[derive(Deserialize)]
struct SizeSetting {
    #[serde(default)]
    size: Option<PixelValue>,
}

#[derive(Deserialize)]
struct KitSettings {
    #[serde(default)]
    viewport_mobile: Option<PixelValue>,
    #[serde(default)]
    system_colors: Option<serde_json::Value>,
    #[serde(default)]
    container_width: Option<SizeSetting>,
    #[serde(default)]
    content_width: Option<SizeSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitBreakpoints {
    pub mobile_px: u32,
    pub desktop_px: u32,
}

fn size_px(setting: Option<&SizeSetting>) -> Option<u32> {
    setting
        .and_then(|setting| setting.size.as_ref())
        .and_then(PixelValue::to_px)
}

pub(super) fn parse_kit_breakpoints(
    kit_json: &str,
    content_width_fallback: Option<u32>,
) -> Result<KitBreakpoints, ViewportError> {
    let kit: KitSettings =
        serde_json::from_str(kit_json).map_err(|err| ViewportError::InvalidKit {
            message: err.to_string(),
        })?;

    let mobile_px = kit
        .viewport_mobile
        .as_ref()
        .and_then(PixelValue::to_px)
        .unwrap_or(if kit.system_colors.is_some() {
            MOBILE_WITH_SYSTEM_COLORS_PX
        } else {
            MOBILE_FALLBACK_PX
        });
    let desktop_px = size_px(kit.container_width.as_ref())
        .or_else(|| size_px(kit.content_width.as_ref()))
        .or_else(|| content_width_fallback.filter(|width| *width > MIN_CONTENT_WIDTH_FALLBACK_PX))
        .unwrap_or(CONTENT_WIDTH_FALLBACK_PX);

    if desktop_px <= mobile_px {
        return Err(ViewportError::InvalidBreakpoints {
            mobile_px,
            desktop_px,
        });
    }

    Ok(KitBreakpoints {
        mobile_px,
        desktop_px,
    })
}
