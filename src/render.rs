//! Headline image cards.
//!
//! Each top story gets a 512×512 gray PNG with its headline wrapped and
//! centered in white. Text is drawn with a TrueType font when one can be
//! loaded, otherwise with the built-in 8×8 bitmap font.

use crate::error::RenderError;
use crate::utils::headline_file_name;
use ab_glyph::{FontVec, PxScale};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument, warn};

pub const CARD_SIZE: u32 = 512;
const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);
const INK: Rgb<u8> = Rgb([255, 255, 255]);
const WRAP_WIDTH: usize = 30;
const LINE_GAP: u32 = 5;
const FONT_PX: f32 = 20.0;
/// Each bitmap font pixel is drawn as a square of this size.
const BITMAP_SCALE: u32 = 2;

/// Font used to draw headline text.
pub enum CardFont {
    TrueType(FontVec),
    Bitmap,
}

impl CardFont {
    /// Load a TrueType/OpenType font, falling back to the bitmap font.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Self {
        let loaded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(font) => {
                info!("Loaded card font");
                CardFont::TrueType(font)
            }
            Err(e) => {
                warn!(error = %e, "Card font unavailable; using built-in bitmap font");
                CardFont::Bitmap
            }
        }
    }

    /// Width and height of `line` when drawn.
    pub fn measure(&self, line: &str) -> (u32, u32) {
        match self {
            CardFont::TrueType(font) => text_size(PxScale::from(FONT_PX), font, line),
            CardFont::Bitmap => {
                let cell = 8 * BITMAP_SCALE;
                (line.chars().count() as u32 * cell, cell)
            }
        }
    }

    /// Draw `line` with its top-left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, line: &str) {
        match self {
            CardFont::TrueType(font) => {
                draw_text_mut(canvas, INK, x, y, PxScale::from(FONT_PX), font, line)
            }
            CardFont::Bitmap => draw_bitmap_line(canvas, x, y, line),
        }
    }
}

fn draw_bitmap_line(canvas: &mut RgbImage, x: i32, y: i32, line: &str) {
    let cell = (8 * BITMAP_SCALE) as i32;
    for (i, c) in line.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let origin_x = x + i as i32 * cell;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1u8 << col) == 0 {
                    continue;
                }
                let px = origin_x + col * BITMAP_SCALE as i32;
                let py = y + row as i32 * BITMAP_SCALE as i32;
                fill_square(canvas, px, py, BITMAP_SCALE);
            }
        }
    }
}

fn fill_square(canvas: &mut RgbImage, x: i32, y: i32, size: u32) {
    for dy in 0..size as i32 {
        for dx in 0..size as i32 {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                canvas.put_pixel(px as u32, py as u32, INK);
            }
        }
    }
}

/// Greedy word wrap at `width` characters; words longer than a line are split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed <= width {
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(&chars);
            current_len += chars.len();
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        while chars.len() > width {
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        current.extend(&chars);
        current_len = chars.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Draws headline cards into one directory.
pub struct HeadlineCard {
    font: Arc<CardFont>,
    dir: PathBuf,
}

impl HeadlineCard {
    pub fn new(font: CardFont, dir: impl Into<PathBuf>) -> Self {
        Self {
            font: Arc::new(font),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Draw the card for `headline` without saving it.
    pub fn draw(&self, headline: &str) -> RgbImage {
        draw_card(&self.font, headline)
    }

    /// Render the card for `headline` and save it as a PNG.
    ///
    /// The file name is derived from the headline; the directory is created
    /// when missing. Drawing and encoding run on the blocking pool.
    #[instrument(level = "info", skip(self), fields(dir = %self.dir.display()))]
    pub async fn render(&self, headline: &str) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| RenderError::Directory {
                path: self.dir.clone(),
                source,
            })?;
        let path = self.dir.join(headline_file_name(headline));

        let font = Arc::clone(&self.font);
        let (text, target) = (headline.to_string(), path.clone());
        spawn_blocking(move || draw_card(&font, &text).save(&target))
            .await?
            .map_err(|source| RenderError::Save {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Saved headline card");
        Ok(path)
    }
}

fn draw_card(font: &CardFont, headline: &str) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CARD_SIZE, CARD_SIZE, BACKGROUND);
    let lines = wrap_words(headline, WRAP_WIDTH);
    let sizes: Vec<(u32, u32)> = lines.iter().map(|l| font.measure(l)).collect();
    let total_height: u32 = sizes.iter().map(|(_, h)| h).sum();

    let mut y = (CARD_SIZE as i32 - total_height as i32) / 2;
    for (line, (width, height)) in lines.iter().zip(&sizes) {
        let x = (CARD_SIZE as i32 - *width as i32) / 2;
        font.draw(&mut canvas, x, y, line);
        y += (*height + LINE_GAP) as i32;
    }
    canvas
}

/// Remove `dir` with everything in it and create it again, empty.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn reset_dir(dir: &Path) -> Result<(), RenderError> {
    let wrap = |source| RenderError::Directory {
        path: dir.to_path_buf(),
        source,
    };
    if fs::try_exists(dir).await.map_err(wrap)? {
        fs::remove_dir_all(dir).await.map_err(wrap)?;
    }
    fs::create_dir_all(dir).await.map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn test_wrap_words_at_width() {
        let lines = wrap_words("Treasury yields climb as traders pare bets on rate cuts", 30);
        assert_eq!(lines, vec!["Treasury yields climb as", "traders pare bets on rate cuts"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn test_wrap_words_splits_long_words() {
        let lines = wrap_words(&format!("ab {}", "x".repeat(65)), 30);
        assert_eq!(lines[0], "ab");
        assert_eq!(lines[1], "x".repeat(30));
        assert_eq!(lines[2], "x".repeat(30));
        assert_eq!(lines[3], "x".repeat(5));
    }

    #[test]
    fn test_wrap_words_empty() {
        assert!(wrap_words("   ", 30).is_empty());
    }

    #[test]
    fn test_missing_font_falls_back_to_bitmap() {
        let font = CardFont::load(Path::new("/definitely/not/here/arial.ttf"));
        assert!(matches!(font, CardFont::Bitmap));
        assert_eq!(font.measure("abc"), (48, 16));
    }

    #[test]
    fn test_invalid_font_file_falls_back_to_bitmap() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.ttf");
        stdfs::write(&path, b"not a font").unwrap();
        assert!(matches!(CardFont::load(&path), CardFont::Bitmap));
    }

    #[test]
    fn test_draw_puts_text_on_gray_card() {
        let card = HeadlineCard::new(CardFont::Bitmap, "unused");
        let img = card.draw("Gold hits record");

        assert_eq!(img.dimensions(), (CARD_SIZE, CARD_SIZE));
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        assert!(img.pixels().any(|p| *p == INK));
        // a single line is vertically centered
        let top_half_ink = (0..240).any(|y| (0..CARD_SIZE).any(|x| *img.get_pixel(x, y) == INK));
        assert!(!top_half_ink);
    }

    #[tokio::test]
    async fn test_render_saves_png_named_after_headline() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("images");
        let card = HeadlineCard::new(CardFont::Bitmap, &dir);

        let path = card.render("Fed: rates on hold?").await.unwrap();

        assert_eq!(path, dir.join("Fed_rates_on_hold.png"));
        let saved = image::open(&path).unwrap();
        assert_eq!(saved.width(), CARD_SIZE);
    }

    #[tokio::test]
    async fn test_render_reports_unusable_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("images");
        stdfs::write(&blocker, b"file, not dir").unwrap();
        let card = HeadlineCard::new(CardFont::Bitmap, &blocker);

        let err = card.render("Anything").await.unwrap_err();
        assert!(matches!(err, RenderError::Directory { .. }));
    }

    #[tokio::test]
    async fn test_reset_dir_empties_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("images");
        stdfs::create_dir_all(&dir).unwrap();
        stdfs::write(dir.join("old.png"), b"stale").unwrap();

        reset_dir(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(stdfs::read_dir(&dir).unwrap().count(), 0);
    }
}
