use thiserror::Error;

/// Errors raised by the terrain engine. Everything here is a configuration or
/// storage problem; none of the numeric code paths can fail once inputs pass
/// validation.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("colour band list is empty")]
    EmptyBands,
    #[error("colour band {index} has width {width}; widths must be finite and > 0")]
    InvalidBandWidth { index: usize, width: f32 },
    #[error("settings io error: {0}")]
    SettingsIo(#[from] std::io::Error),
    #[error("settings format error: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;

/// Rejects NaN and infinities, then applies `check`.
pub(crate) fn ensure(
    name: &'static str,
    value: f64,
    check: impl Fn(f64) -> bool,
    reason: &'static str,
) -> Result<()> {
    if !value.is_finite() {
        return Err(TerrainError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    if !check(value) {
        return Err(TerrainError::InvalidParameter { name, value, reason });
    }
    Ok(())
}
