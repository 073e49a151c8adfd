//! Single-line level share codes.
//!
//! A share code looks like `uptime:v1:20x11:<payload>` where the payload is
//! the level JSON encoded with unpadded standard base64. The grid dimensions
//! are repeated in clear text so a host can reject a code for the wrong board
//! before decoding it.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thiserror::Error;
use uptime_defence_core::level::Level;

const CODE_DOMAIN: &str = "uptime";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const CODE_HEADER: &str = "uptime:v1";
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding share codes.
#[derive(Debug, Error)]
pub(crate) enum ShareCodeError {
    #[error("share code was empty")]
    Empty,
    #[error("share code is missing the {0} segment")]
    MissingSegment(&'static str),
    #[error("share code prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("share code version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("share code announces a {announced} grid but carries a {actual} level")]
    DimensionsMismatch { announced: String, actual: String },
    #[error("could not decode share code payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("could not parse share code payload")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Encodes `level` into a single-line share code.
pub(crate) fn encode(level: &Level) -> Result<String, ShareCodeError> {
    let json = serde_json::to_vec(level).map_err(ShareCodeError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{CODE_HEADER}:{}x{}:{encoded}",
        level.grid_width, level.grid_height
    ))
}

/// Decodes a level from a share code.
///
/// The level is returned as carried; callers validate it before playing.
pub(crate) fn decode(value: &str) -> Result<Level, ShareCodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareCodeError::Empty);
    }

    let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
    let domain = parts.next().ok_or(ShareCodeError::MissingSegment("prefix"))?;
    let version = parts
        .next()
        .ok_or(ShareCodeError::MissingSegment("version"))?;
    let dimensions = parts
        .next()
        .ok_or(ShareCodeError::MissingSegment("dimensions"))?;
    let payload = parts
        .next()
        .ok_or(ShareCodeError::MissingSegment("payload"))?;

    if domain != CODE_DOMAIN {
        return Err(ShareCodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(ShareCodeError::UnsupportedVersion(version.to_owned()));
    }

    let (columns, rows) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ShareCodeError::InvalidEncoding)?;
    let level: Level = serde_json::from_slice(&bytes).map_err(ShareCodeError::InvalidPayload)?;

    if (level.grid_width, level.grid_height) != (columns, rows) {
        return Err(ShareCodeError::DimensionsMismatch {
            announced: format!("{columns}x{rows}"),
            actual: format!("{}x{}", level.grid_width, level.grid_height),
        });
    }
    Ok(level)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), ShareCodeError> {
    let invalid = || ShareCodeError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_survives_a_round_trip() {
        let level = Level::tutorial();

        let code = encode(&level).expect("encodes");
        assert!(code.starts_with(&format!("{CODE_HEADER}:20x11:")));
        assert!(!code.contains('\n'));

        assert_eq!(decode(&format!("  {code}\n")).expect("decodes"), level);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            decode("castle:v1:20x11:e30"),
            Err(ShareCodeError::InvalidPrefix(prefix)) if prefix == "castle"
        ));
        assert!(matches!(
            decode("uptime:v2:20x11:e30"),
            Err(ShareCodeError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(decode("   "), Err(ShareCodeError::Empty)));
        assert!(matches!(
            decode("uptime:v1:20x11"),
            Err(ShareCodeError::MissingSegment("payload"))
        ));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            decode("uptime:v1:0x11:e30"),
            Err(ShareCodeError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("uptime:v1:wide:e30"),
            Err(ShareCodeError::InvalidDimensions(_))
        ));

        let code = encode(&Level::tutorial()).expect("encodes");
        let tampered = code.replacen(":20x11:", ":21x11:", 1);
        assert!(matches!(
            decode(&tampered),
            Err(ShareCodeError::DimensionsMismatch { .. })
        ));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            decode("uptime:v1:20x11:***"),
            Err(ShareCodeError::InvalidEncoding(_))
        ));
        let not_a_level = STANDARD_NO_PAD.encode(b"{\"gridWidth\":20}");
        assert!(matches!(
            decode(&format!("uptime:v1:20x11:{not_a_level}")),
            Err(ShareCodeError::InvalidPayload(_))
        ));
    }
}
