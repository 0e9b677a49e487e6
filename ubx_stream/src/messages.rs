use crate::error::DecodeError;
use crate::frame::Frame;

/// Geodetic position solution, decoded from UBX-NAV-POSLLH (class 0x01,
/// ID 0x02). Raw fixed-point fields are scaled to physical units: degrees,
/// metres, and whole seconds of GPS time of week.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionGeodetic {
    pub time_of_week_s: i32,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Height above the WGS-84 ellipsoid.
    pub height_ellipsoid_m: f64,
    /// Height above mean sea level.
    pub height_msl_m: f64,
    pub horizontal_accuracy_m: i32,
    pub vertical_accuracy_m: i32,
}

/// Earth-Centered-Earth-Fixed position solution, decoded from
/// UBX-NAV-POSECEF (class 0x01, ID 0x01).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionEcef {
    pub time_of_week_s: i32,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub position_accuracy_m: i32,
}

/// A decoded navigation report.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Report {
    PositionGeodetic(PositionGeodetic),
    PositionEcef(PositionEcef),
}

struct MessageDecoder {
    class: u8,
    id: u8,
    min_payload_len: usize,
    decode: fn(&[u8]) -> Report,
}

/// Supported message kinds. Adding a kind means adding a row here and its
/// field decoder below.
static DECODERS: &[MessageDecoder] = &[
    MessageDecoder {
        class: 0x01,
        id: 0x01,
        min_payload_len: 20,
        decode: decode_position_ecef,
    },
    MessageDecoder {
        class: 0x01,
        id: 0x02,
        min_payload_len: 28,
        decode: decode_position_geodetic,
    },
];

/// Decode a validated frame into a typed report. Frames of unknown kind, or
/// too short for their kind, fail with [`DecodeError::UnsupportedMessage`];
/// the stream is unaffected either way.
pub fn decode(frame: &Frame) -> Result<Report, DecodeError> {
    match DECODERS
        .iter()
        .find(|d| d.class == frame.class() && d.id == frame.id())
    {
        Some(d) if frame.payload().len() >= d.min_payload_len => Ok((d.decode)(frame.payload())),
        _ => Err(DecodeError::UnsupportedMessage {
            class: frame.class(),
            id: frame.id(),
        }),
    }
}

/// Little-endian signed 32-bit field at a fixed payload offset. Two's
/// complement, so negative values need no sign handling of their own.
fn read_i32_le(payload: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ])
}

fn decode_position_geodetic(payload: &[u8]) -> Report {
    Report::PositionGeodetic(PositionGeodetic {
        // iTOW is milliseconds on the wire.
        time_of_week_s: read_i32_le(payload, 0) / 1000,
        // Longitude and latitude are 1e-7 degrees.
        longitude_deg: f64::from(read_i32_le(payload, 4)) / 1e7,
        latitude_deg: f64::from(read_i32_le(payload, 8)) / 1e7,
        // Heights are millimetres.
        height_ellipsoid_m: f64::from(read_i32_le(payload, 12)) / 1000.0,
        height_msl_m: f64::from(read_i32_le(payload, 16)) / 1000.0,
        // Accuracy estimates are millimetres.
        horizontal_accuracy_m: read_i32_le(payload, 20) / 1000,
        vertical_accuracy_m: read_i32_le(payload, 24) / 1000,
    })
}

fn decode_position_ecef(payload: &[u8]) -> Report {
    Report::PositionEcef(PositionEcef {
        time_of_week_s: read_i32_le(payload, 0) / 1000,
        // ECEF coordinates and accuracy are centimetres.
        x_m: f64::from(read_i32_le(payload, 4)) / 100.0,
        y_m: f64::from(read_i32_le(payload, 8)) / 100.0,
        z_m: f64::from(read_i32_le(payload, 12)) / 100.0,
        position_accuracy_m: read_i32_le(payload, 16) / 100,
    })
}
