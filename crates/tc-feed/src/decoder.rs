//! Trade message decoder.
//!
//! Parses upstream JSON trade frames. Only the `p` field (price as a decimal
//! string) is read; everything else in the frame is ignored.

use std::borrow::Cow;

use serde::Deserialize;

#[derive(Deserialize)]
struct TradeFrame<'a> {
    #[serde(borrow)]
    p: Cow<'a, str>,
}

/// Extract the trade price from a raw frame.
///
/// Returns `None` for invalid JSON, a missing or non-string `p`, an
/// unparseable number, or a non-finite value. Never an error: bad frames are
/// just skipped.
pub fn decode(text: &str) -> Option<f64> {
    let frame: TradeFrame<'_> = serde_json::from_str(text).ok()?;
    let price: f64 = fast_float2::parse(frame.p.as_bytes()).ok()?;
    price.is_finite().then_some(price)
}
