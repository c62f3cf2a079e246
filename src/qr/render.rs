//! Raster output for QR codes and appointment tickets. Everything here is
//! pure and synchronous; callers decide where the bytes go.

use std::io::Cursor;

use anyhow::Context;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, ImageFormat, Rgb, RgbImage};
use qrcode::{Color, QrCode};

/// Modules of white border around every code.
const QUIET_ZONE: u32 = 4;
const QR_MODULE_PX: u32 = 8;

pub const TICKET_WIDTH: u32 = 600;
pub const TICKET_HEIGHT: u32 = 860;
pub const HEADER_HEIGHT: u32 = 120;
pub const FOOTER_HEIGHT: u32 = 70;
const LOGO_SIZE: u32 = 96;
const LOGO_MARGIN: u32 = 12;
const QR_MARGIN: u32 = 32;
const TEXT_MARGIN: u32 = 32;
const TEXT_SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;
/// Glyphs are 8x8; rows get a little leading.
const GLYPH_PX: u32 = 8;
const LINE_GAP: u32 = 8;

pub const BRAND: Rgb<u8> = Rgb([0x1f, 0x4e, 0x8c]);
const ACCENT: Rgb<u8> = Rgb([0x5f, 0x6f, 0xff]);
const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

fn encode(payload: &[u8]) -> anyhow::Result<QrCode> {
    QrCode::new(payload).context("payload does not fit in a QR code")
}

fn draw_code(code: &QrCode, module_px: u32) -> RgbImage {
    let modules = code.width() as u32;
    let side = (modules + 2 * QUIET_ZONE) * module_px;
    let mut img = RgbImage::from_pixel(side, side, WHITE);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let i = i as u32;
        let x = (i % modules + QUIET_ZONE) * module_px;
        let y = (i / modules + QUIET_ZONE) * module_px;
        fill_rect(&mut img, x, y, module_px, module_px, BLACK);
    }
    img
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let (max_x, max_y) = (img.width().min(x + w), img.height().min(y + h));
    for py in y..max_y {
        for px in x..max_x {
            img.put_pixel(px, py, color);
        }
    }
}

pub fn encode_png(img: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).context("encode png")?;
    Ok(out.into_inner())
}

/// Square QR code of `payload` with a quiet zone.
pub fn qr_image(payload: &[u8]) -> anyhow::Result<RgbImage> {
    Ok(draw_code(&encode(payload)?, QR_MODULE_PX))
}

/// Text drawn on a ticket: a title in the header, one field per body line
/// above the code, and a footer line (the issue timestamp).
#[derive(Debug, Clone, Copy)]
pub struct TicketText<'a> {
    pub title: &'a str,
    pub lines: &'a [String],
    pub footer: &'a str,
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draws `text` with its top-left corner at (`x`, `y`); characters that
/// would cross the right edge are dropped. Non-ASCII renders as `?`.
fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
    let advance = GLYPH_PX * scale;
    let fits = (img.width().saturating_sub(x) / advance) as usize;
    for (i, c) in text.chars().take(fits).enumerate() {
        let left = x + i as u32 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_PX {
                if bits & (1 << col) != 0 {
                    fill_rect(img, left + col * scale, y + row as u32 * scale, scale, scale, color);
                }
            }
        }
    }
}

fn line_height(scale: u32) -> u32 {
    GLYPH_PX * scale + LINE_GAP
}

/// Fixed layout ticket: brand header with a logo slot and title, the text
/// fields, the QR code centred below them, and a footer with the timestamp.
pub fn ticket_image(payload: &[u8], text: TicketText<'_>, logo: Option<&RgbImage>) -> anyhow::Result<RgbImage> {
    let mut canvas = RgbImage::from_pixel(TICKET_WIDTH, TICKET_HEIGHT, WHITE);

    fill_rect(&mut canvas, 0, 0, TICKET_WIDTH, HEADER_HEIGHT, BRAND);
    fill_rect(&mut canvas, 0, HEADER_HEIGHT, TICKET_WIDTH, 6, ACCENT);
    match logo {
        Some(logo) => {
            let scaled = imageops::resize(logo, LOGO_SIZE, LOGO_SIZE, imageops::FilterType::Triangle);
            imageops::overlay(&mut canvas, &scaled, LOGO_MARGIN.into(), LOGO_MARGIN.into());
        }
        None => fill_rect(&mut canvas, LOGO_MARGIN, LOGO_MARGIN, LOGO_SIZE, LOGO_SIZE, WHITE),
    }
    let title_x = LOGO_MARGIN * 2 + LOGO_SIZE;
    let title_y = (HEADER_HEIGHT - GLYPH_PX * TITLE_SCALE) / 2;
    draw_text(&mut canvas, title_x, title_y, text.title, TITLE_SCALE, WHITE);

    let footer_top = TICKET_HEIGHT - FOOTER_HEIGHT;
    fill_rect(&mut canvas, 0, footer_top - 6, TICKET_WIDTH, 6, ACCENT);
    fill_rect(&mut canvas, 0, footer_top, TICKET_WIDTH, FOOTER_HEIGHT, BRAND);
    let footer_y = footer_top + (FOOTER_HEIGHT - GLYPH_PX * TEXT_SCALE) / 2;
    draw_text(&mut canvas, TEXT_MARGIN, footer_y, text.footer, TEXT_SCALE, WHITE);

    let mut y = HEADER_HEIGHT + 6 + TEXT_MARGIN;
    for line in text.lines {
        draw_text(&mut canvas, TEXT_MARGIN, y, line, TEXT_SCALE, BLACK);
        y += line_height(TEXT_SCALE);
    }

    let code = encode(payload)?;
    let body_top = y;
    let body_bottom = footer_top - 6;
    anyhow::ensure!(body_bottom > body_top + 2 * QR_MARGIN, "too many ticket lines for the layout");
    let body_height = body_bottom - body_top;
    let room = (TICKET_WIDTH - 2 * QR_MARGIN).min(body_height - 2 * QR_MARGIN);
    let module_px = room / (code.width() as u32 + 2 * QUIET_ZONE);
    anyhow::ensure!(module_px > 0, "ticket payload too large for the layout");

    let qr = draw_code(&code, module_px);
    let x = (TICKET_WIDTH - qr.width()) / 2;
    let y = body_top + (body_height - qr.height()) / 2;
    imageops::overlay(&mut canvas, &qr, x.into(), y.into());

    Ok(canvas)
}

/// Decodes a PNG logo into RGB.
pub fn decode_logo(bytes: &[u8]) -> anyhow::Result<RgbImage> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png).context("decode ticket logo")?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_pixels(img: &RgbImage) -> usize {
        img.pixels().filter(|p| **p == BLACK).count()
    }

    #[test]
    fn qr_has_quiet_zone_and_dark_modules() {
        let img = qr_image(br#"{"usertype":"patient","patient_id":9}"#).unwrap();
        assert_eq!(img.width(), img.height());
        assert_eq!(img.width() % QR_MODULE_PX, 0);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert!(dark_pixels(&img) > 0);
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = qr_image(b"hello").unwrap();
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let back = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), img.dimensions());
    }

    fn sample_text(lines: &[String]) -> TicketText<'_> {
        TicketText {
            title: "APPOINTMENT",
            lines,
            footer: "Issued 2024-01-10T10:00:00Z",
        }
    }

    fn count(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) -> usize {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == color)
            .count()
    }

    #[test]
    fn ticket_layout_bands() {
        let img = ticket_image(br#"{"appointment_id":1}"#, sample_text(&[]), None).unwrap();
        assert_eq!(img.dimensions(), (TICKET_WIDTH, TICKET_HEIGHT));
        assert_eq!(*img.get_pixel(TICKET_WIDTH - 1, 0), BRAND);
        assert_eq!(*img.get_pixel(TICKET_WIDTH - 1, TICKET_HEIGHT - 1), BRAND);
        // empty logo slot
        assert_eq!(*img.get_pixel(LOGO_MARGIN + 1, LOGO_MARGIN + 1), WHITE);
        assert!(dark_pixels(&img) > 0);
    }

    #[test]
    fn ticket_draws_the_logo() {
        let logo = RgbImage::from_pixel(10, 10, Rgb([200, 0, 0]));
        let img = ticket_image(b"x", sample_text(&[]), Some(&logo)).unwrap();
        assert_eq!(*img.get_pixel(LOGO_MARGIN + LOGO_SIZE / 2, LOGO_MARGIN + LOGO_SIZE / 2), Rgb([200, 0, 0]));
    }

    #[test]
    fn ticket_prints_title_fields_and_footer() {
        let lines = vec!["Patient: Ann Lee".to_string(), "Date: 2024-01-10  Time: 10:00".to_string()];
        let img = ticket_image(b"x", sample_text(&lines), None).unwrap();

        let title_x = LOGO_MARGIN * 2 + LOGO_SIZE;
        assert!(count(&img, title_x, 0, TICKET_WIDTH, HEADER_HEIGHT, WHITE) > 0);

        let footer_top = TICKET_HEIGHT - FOOTER_HEIGHT;
        assert!(count(&img, 0, footer_top, TICKET_WIDTH, TICKET_HEIGHT, WHITE) > 0);

        let text_top = HEADER_HEIGHT + 6 + TEXT_MARGIN;
        let text_bottom = text_top + 2 * line_height(TEXT_SCALE);
        assert!(count(&img, TEXT_MARGIN, text_top, TICKET_WIDTH, text_bottom, BLACK) > 0);
    }

    #[test]
    fn text_is_clipped_at_the_edge() {
        let mut img = RgbImage::from_pixel(40, 16, WHITE);
        draw_text(&mut img, 0, 0, "AAAAAAAAAA", 1, BLACK);
        // only five 8px glyphs fit in 40px
        assert!(count(&img, 0, 0, 40, 8, BLACK) > 0);
        let mut blank = RgbImage::from_pixel(40, 16, WHITE);
        draw_text(&mut blank, 0, 0, "     ", 1, BLACK);
        assert_eq!(count(&blank, 0, 0, 40, 16, BLACK), 0);
    }

    #[test]
    fn too_many_lines_is_an_error() {
        let lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        assert!(ticket_image(b"x", sample_text(&lines), None).is_err());
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let huge = vec![b'a'; 8_000];
        assert!(qr_image(&huge).is_err());
    }
}
