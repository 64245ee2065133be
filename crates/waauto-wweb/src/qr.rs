// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR payload rendering for the dashboard pairing flow.
//!
//! The bridge hands over the raw pairing payload; the dashboard wants
//! something it can drop into an `<img src>`. Rendered as SVG so no raster
//! stack is needed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;

use waauto_core::WaautoError;

/// Render a pairing payload as a `data:image/svg+xml;base64,...` URL.
pub fn qr_data_url(payload: &str) -> Result<String, WaautoError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| WaautoError::Channel {
        message: format!("failed to encode QR payload: {e}"),
        source: Some(Box::new(e)),
    })?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(300, 300)
        .quiet_zone(true)
        .build();

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}
