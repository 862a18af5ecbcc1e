use crate::layers::geo_util::LatLng;

use super::error::Error;

/// Decimal places carried by the standard polyline encoding (factor 1e5).
pub const POLYLINE_PRECISION: u32 = 5;

/// Decodes an encoded polyline into (lat, lng) points, in encoding order.
pub fn decode(encoded: &str) -> Result<Vec<LatLng>, Error> {
    let line = ::polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| Error::Polyline(e.to_string()))?;
    Ok(line.into_iter().map(LatLng::from).collect())
}
