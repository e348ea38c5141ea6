//! QR challenge rendering.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use qrcode::{Color, EcLevel, QrCode};
use wagate_core::error::GatewayError;

const MODULE_SIZE: u32 = 8;
const QUIET_ZONE: u32 = 4;

fn encode(qr_data: &str) -> Result<QrCode, GatewayError> {
    QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| GatewayError::Qr(format!("QR generation failed: {e}")))
}

/// Render a QR challenge as compact Unicode half-blocks for terminal display.
///
/// Two module rows are packed into each text line, so the output is about
/// half the height of a naive renderer.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, GatewayError> {
    let code = encode(qr_data)?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    let is_dark = |row: usize, col: usize| -> bool {
        row < width && col < width && colors[row * width + col] == Color::Dark
    };

    let mut out = String::new();
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}

/// Render a QR challenge as PNG bytes.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, GatewayError> {
    use image::{ImageBuffer, Luma};

    let code = encode(qr_data)?;
    let modules = code.width() as u32;
    let img_size = (modules + QUIET_ZONE * 2) * MODULE_SIZE;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / MODULE_SIZE, y / MODULE_SIZE);
        if cx < QUIET_ZONE || cy < QUIET_ZONE {
            return Luma([255u8]);
        }
        let (mx, my) = (cx - QUIET_ZONE, cy - QUIET_ZONE);
        if mx >= modules || my >= modules {
            return Luma([255u8]);
        }
        match code[(mx as usize, my as usize)] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| GatewayError::Qr(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Render a QR challenge as a `data:image/png;base64,...` URL.
pub fn generate_qr_data_url(qr_data: &str) -> Result<String, GatewayError> {
    let png = generate_qr_image(qr_data)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}
