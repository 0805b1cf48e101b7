//! Linear viewport interpolation for fluid sizes.
//!
//! A fluid size grows from `min_size` at the low end of the viewport range to
//! `max_size` at the high end. The expression produced here is the middle
//! argument of a CSS `clamp()`: `<slope>vw ± <intercept><unit>`.

use thiserror::Error;

pub type FluidResult<T> = std::result::Result<T, FluidError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FluidError {
    #[error("viewport range is empty: min {min_px}px equals max {max_px}px")]
    DegenerateViewport { min_px: f64, max_px: f64 },
    #[error("pixels per unit must be positive, got {px_per_unit}")]
    NonPositiveUnit { px_per_unit: f64 },
    #[error("{value} cannot be represented in thousandths")]
    OutOfRange { value: f64 },
}

/// Largest magnitude whose thousandths still fit in an `i64`.
pub const MAX_FORMATTABLE: f64 = 9.0e15;

/// Fixed-point value in thousandths, rounded half away from zero.
///
/// The input is first snapped to six decimals so that binary noise such as
/// `1.0005 * 1000.0 == 1000.4999999` does not flip the rounding direction.
pub fn round_to_thousandths(value: f64) -> FluidResult<i64> {
    if !value.is_finite() || value.abs() > MAX_FORMATTABLE {
        return Err(FluidError::OutOfRange { value });
    }
    let micro = (value * 1_000_000.0).round();
    Ok((micro / 1_000.0).round() as i64)
}

fn format_magnitude(milli: u64) -> String {
    let whole = milli / 1_000;
    let frac = milli % 1_000;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:03}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Render thousandths as a decimal with trailing zeros trimmed.
pub fn format_thousandths(milli: i64) -> String {
    let magnitude = format_magnitude(milli.unsigned_abs());
    if milli < 0 {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// Format a stored size for CSS output, e.g. `1.5` or `3`.
pub fn format_size(value: f64) -> FluidResult<String> {
    Ok(format_thousandths(round_to_thousandths(value)?))
}

/// Compute the interpolated middle term of a clamp expression.
///
/// Equal sizes short-circuit to the literal size with `unit` attached.
pub fn compute_fluid_expression(
    min_size: f64,
    max_size: f64,
    viewport_min_px: f64,
    viewport_max_px: f64,
    px_per_unit: f64,
    unit: &str,
) -> FluidResult<String> {
    if min_size == max_size {
        return Ok(format!("{}{unit}", format_size(min_size)?));
    }
    if px_per_unit <= 0.0 || !px_per_unit.is_finite() {
        return Err(FluidError::NonPositiveUnit { px_per_unit });
    }
    if viewport_max_px == viewport_min_px {
        return Err(FluidError::DegenerateViewport {
            min_px: viewport_min_px,
            max_px: viewport_max_px,
        });
    }

    let viewport_min_unit = viewport_min_px / px_per_unit;
    let viewport_max_unit = viewport_max_px / px_per_unit;
    let slope = (max_size - min_size) / (viewport_max_unit - viewport_min_unit);
    let intercept = min_size - slope * viewport_min_unit;

    let slope_vw = round_to_thousandths(slope * 100.0)?;
    let intercept = round_to_thousandths(intercept)?;
    tracing::debug!(
        min_size,
        max_size,
        viewport_min_px,
        viewport_max_px,
        slope_vw,
        intercept,
        "computed fluid interpolation"
    );

    let slope_vw = format_thousandths(slope_vw);
    let operator = if intercept < 0 { '-' } else { '+' };
    let expression = format!(
        "{slope_vw}vw {operator} {}{unit}",
        format_magnitude(intercept.unsigned_abs())
    );
    Ok(expression)
}
