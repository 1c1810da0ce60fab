// src/services/renderer.rs

use std::{fmt::Write, sync::Arc};

use qrcode::{Color, QrCode};
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{self, fontdb},
};

use crate::{error::AppError, models::certificate::Certificate, utils::html::escape_text};

const WIDTH: i32 = 1650;
const HEIGHT: i32 = 1150;
const QR_SIZE: i32 = 220;
const WATERMARK_TEXT: &str = "PREVIEW – PAYMENT REQUIRED";
const FONT_FAMILY: &str = "DejaVu Sans";

static FONT_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Data printed on a certificate.
#[derive(Debug, Clone)]
pub struct CertificateView<'a> {
    pub certificate: &'a Certificate,
    pub holder_name: &'a str,
    pub certificate_title: &'a str,
    pub verification_url: &'a str,
}

/// Draws certificates as PNG images.
///
/// The page is laid out as SVG and rasterised with the bundled DejaVu fonts,
/// so output does not depend on fonts installed on the host. It is derived
/// from the certificate row every time it is requested, nothing is cached or
/// written to disk.
#[derive(Clone)]
pub struct CertificateRenderer {
    issuer_name: String,
    fonts: Arc<fontdb::Database>,
}

impl CertificateRenderer {
    pub fn new(issuer_name: impl Into<String>) -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_font_data(FONT_REGULAR.to_vec());
        fonts.load_font_data(FONT_BOLD.to_vec());
        fonts.set_sans_serif_family(FONT_FAMILY);

        Self {
            issuer_name: issuer_name.into(),
            fonts: Arc::new(fonts),
        }
    }

    /// Renders the certificate as PNG bytes. `watermark` overlays the unpaid preview marking.
    pub fn render(&self, view: &CertificateView<'_>, watermark: bool) -> Result<Vec<u8>, AppError> {
        let svg = self.compose_svg(view, watermark)?;

        let mut options = usvg::Options {
            font_family: FONT_FAMILY.to_string(),
            ..usvg::Options::default()
        };
        options.fontdb = self.fonts.clone();

        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| AppError::InternalServerError(format!("Certificate layout invalid: {}", e)))?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            AppError::InternalServerError("Certificate canvas allocation failed".to_string())
        })?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| AppError::InternalServerError(format!("PNG encoding failed: {}", e)))
    }

    /// Page layout as an SVG document, before rasterisation.
    fn compose_svg(&self, view: &CertificateView<'_>, watermark: bool) -> Result<String, AppError> {
        let cert = view.certificate;
        let mut svg = String::with_capacity(16 * 1024);

        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
            w = WIDTH,
            h = HEIGHT,
            font = FONT_FAMILY
        );
        svg.push_str(
            r#"<defs><linearGradient id="paper" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="rgb(250,244,236)"/><stop offset="1" stop-color="rgb(232,220,205)"/></linearGradient></defs>"#,
        );
        let _ = write!(
            svg,
            r#"<rect width="{}" height="{}" fill="url(#paper)"/>"#,
            WIDTH, HEIGHT
        );
        let _ = write!(
            svg,
            r#"<rect x="20" y="20" width="{}" height="{}" fill="none" stroke="rgb(160,120,90)" stroke-width="4"/>"#,
            WIDTH - 40,
            HEIGHT - 40
        );

        let center = WIDTH / 2;
        let _ = write!(
            svg,
            r#"<text x="{}" y="170" text-anchor="middle" font-size="48" font-weight="bold" fill="rgb(80,50,30)">{}</text>"#,
            center,
            escape_text(&self.issuer_name)
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="230" text-anchor="middle" font-size="30" fill="rgb(110,80,55)">{}</text>"#,
            center,
            escape_text(view.certificate_title)
        );

        let body_y = 360;
        let body = [
            (body_y, 30, "normal", "rgb(60,40,20)", "This is to certify that".to_string()),
            (body_y + 70, 48, "bold", "rgb(40,25,15)", escape_text(view.holder_name)),
            (
                body_y + 150,
                30,
                "normal",
                "rgb(60,40,20)",
                "has successfully completed the prescribed course and assessment.".to_string(),
            ),
            (
                body_y + 220,
                30,
                "normal",
                "rgb(60,40,20)",
                format!(
                    "Grade: {}     Score: {:.2}%",
                    escape_text(&cert.grade),
                    cert.percentage
                ),
            ),
            (
                body_y + 280,
                22,
                "normal",
                "rgb(90,60,40)",
                format!("Certificate Code: {}", escape_text(&cert.certificate_code)),
            ),
            (
                body_y + 320,
                22,
                "normal",
                "rgb(90,60,40)",
                format!("Date of Issue: {}", cert.issued_at.format("%d %B %Y")),
            ),
        ];
        for (y, size, weight, fill, text) in body {
            let _ = write!(
                svg,
                r#"<text x="350" y="{}" font-size="{}" font-weight="{}" fill="{}" xml:space="preserve">{}</text>"#,
                y, size, weight, fill, text
            );
        }

        svg.push_str(&qr_group(
            view.verification_url,
            WIDTH - 360,
            HEIGHT - 360,
            QR_SIZE,
        )?);

        if watermark {
            svg.push_str(&watermark_group());
        }

        svg.push_str("</svg>");
        Ok(svg)
    }
}

/// Verification QR code as a group of unit squares scaled to `size`.
fn qr_group(data: &str, x: i32, y: i32, size: i32) -> Result<String, AppError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::InternalServerError(format!("QR encoding failed: {}", e)))?;
    let modules = code.width();
    let quiet = 4;
    let span = modules + 2 * quiet;
    let scale = f64::from(size) / span as f64;

    let mut path = String::new();
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let _ = write!(path, "M{} {}h1v1h-1z", i % modules + quiet, i / modules + quiet);
        }
    }

    Ok(format!(
        r#"<g id="verification-qr" transform="translate({x} {y}) scale({scale:.4})"><rect width="{span}" height="{span}" fill="white"/><path d="{path}" fill="black"/></g>"#
    ))
}

/// Tiled diagonal preview marking across the whole page.
fn watermark_group() -> String {
    let mut group = format!(
        r#"<g id="preview-watermark" transform="rotate(-30 {} {})" font-size="64" font-weight="bold" fill="rgb(150,150,150)" fill-opacity="0.3">"#,
        WIDTH / 2,
        HEIGHT / 2
    );
    let mut y = -HEIGHT / 2;
    while y < HEIGHT + HEIGHT / 2 {
        let mut x = -WIDTH;
        while x < WIDTH + WIDTH / 2 {
            let _ = write!(group, r#"<text x="{}" y="{}">{}</text>"#, x, y, WATERMARK_TEXT);
            x += 700;
        }
        y += 450;
    }
    group.push_str("</g>");
    group
}
