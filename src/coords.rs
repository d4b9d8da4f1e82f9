/// Coordinate mapping between input events and persisted POI coordinates
///
/// This module handles conversion between:
/// - Raw input events (a tap/click on a rendered image, or a lat/lng from a
///   geographic map surface)
/// - The persisted coordinate representation, which varies by map scheme
/// - On-screen marker positions for the current viewport
///
/// Everything here is pure: no I/O, no store access. The persisted wire shape
/// matches the stored POI documents: `{x,y}` for pixel maps, `{xPct,yPct}` for
/// normalized maps, `{lat,lng}` for geographic maps.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coordinate representation a map uses, fixed at map creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapScheme {
    /// On-screen pixel offsets relative to the rendered image's top-left
    /// corner. Not resolution independent: replaying on a differently-sized
    /// viewport misplaces markers. Kept for maps created this way.
    Pixel,
    /// Fractions of the image bounds in [0,1]; resolution independent
    Normalized,
    /// Latitude/longitude supplied by a geographic map surface
    Geographic,
}

/// A persisted POI coordinate. The variant always matches the parent map's
/// scheme; construction goes through [`to_persisted`] so a mismatch cannot be
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Pixel { x: f64, y: f64 },
    Normalized {
        #[serde(rename = "xPct")]
        x_pct: f64,
        #[serde(rename = "yPct")]
        y_pct: f64,
    },
    Geographic { lat: f64, lng: f64 },
}

impl Coordinate {
    /// The scheme this coordinate belongs to
    pub fn scheme(&self) -> MapScheme {
        match self {
            Coordinate::Pixel { .. } => MapScheme::Pixel,
            Coordinate::Normalized { .. } => MapScheme::Normalized,
            Coordinate::Geographic { .. } => MapScheme::Geographic,
        }
    }
}

/// Rendered size of the background image, in on-screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBounds {
    pub width: f64,
    pub height: f64,
}

impl ImageBounds {
    pub fn new(width: f64, height: f64) -> Self {
        ImageBounds { width, height }
    }
}

/// A marker position in on-screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// A raw input event, before any scheme is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// Tap/click position relative to the rendered image's top-left corner
    Tap { x: f64, y: f64 },
    /// Position reported by a geographic map surface
    Geo { lat: f64, lng: f64 },
}

/// Where a coordinate renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Marker position computed by this mapper
    Screen(ScreenPoint),
    /// Geographic coordinates: the map surface performs the inverse
    /// projection itself, not this mapper
    Surface,
}

/// Convert a raw input event into the coordinate persisted for `scheme`.
///
/// - `pixel`: the tap position verbatim, no scaling
/// - `normalized`: tap position divided by `bounds`, clamped to [0,1]
/// - `geographic`: lat/lng passthrough
///
/// An input kind that does not fit the scheme (a geo fix on a raster map, a
/// tap on a geographic map) is a validation error.
pub fn to_persisted(raw: RawInput, scheme: MapScheme, bounds: ImageBounds) -> Result<Coordinate> {
    match (scheme, raw) {
        (MapScheme::Pixel, RawInput::Tap { x, y }) => Ok(Coordinate::Pixel { x, y }),
        (MapScheme::Normalized, RawInput::Tap { x, y }) => {
            if bounds.width <= 0.0 || bounds.height <= 0.0 {
                return Err(Error::ValidationFailed(format!(
                    "image bounds must be positive, got {}x{}",
                    bounds.width, bounds.height
                )));
            }
            Ok(Coordinate::Normalized {
                x_pct: (x / bounds.width).clamp(0.0, 1.0),
                y_pct: (y / bounds.height).clamp(0.0, 1.0),
            })
        }
        (MapScheme::Geographic, RawInput::Geo { lat, lng }) => {
            Ok(Coordinate::Geographic { lat, lng })
        }
        (scheme, raw) => Err(Error::ValidationFailed(format!(
            "input {:?} does not match map scheme {:?}",
            raw, scheme
        ))),
    }
}

/// Project a stored coordinate onto the current viewport.
///
/// The coordinate carries its own scheme, so no scheme argument is needed.
/// Pixel coordinates come back verbatim (the documented misplacement on a
/// resized viewport is intentional); normalized coordinates are multiplied by
/// the current `bounds`; geographic coordinates return [`Projection::Surface`].
pub fn to_screen(coord: &Coordinate, bounds: ImageBounds) -> Projection {
    match *coord {
        Coordinate::Pixel { x, y } => Projection::Screen(ScreenPoint { x, y }),
        Coordinate::Normalized { x_pct, y_pct } => Projection::Screen(ScreenPoint {
            x: x_pct * bounds.width,
            y: y_pct * bounds.height,
        }),
        Coordinate::Geographic { .. } => Projection::Surface,
    }
}
