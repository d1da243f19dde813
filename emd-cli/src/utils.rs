//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use image::{ColorType, GrayImage};
use tracing::{debug, warn};

/// Output formats whose compression would destroy an embedded payload.
const LOSSY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "webp"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Whether writing to `path` would go through a lossy encoder.
pub fn is_lossy(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| LOSSY_EXTENSIONS.contains(&ext.as_str()))
}

/// Refuse output paths whose encoder would alter pixel values.
pub fn ensure_lossless(path: &Path) -> Result<()> {
    if is_lossy(path) {
        bail!(
            "Invalid argument: {} uses a lossy format; use png, bmp or tiff",
            path.display()
        );
    }
    Ok(())
}

/// Build the stego output path from the cover path.
///
/// Transforms `dir/photo.png` into `dir/photo<suffix>.png`. Covers in a lossy
/// format (or without extension) get a `.png` output instead.
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cover");
    let ext = match extension_of(input) {
        Some(ext) if !LOSSY_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => "png".to_string(),
    };
    input.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// Load an image as 8-bit grayscale, converting other color types.
pub fn load_gray(path: &Path, quiet: bool) -> Result<GrayImage> {
    let img =
        image::open(path).with_context(|| format!("Failed to read image: {}", path.display()))?;

    let color = img.color();
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        color = ?color,
        "Loaded image"
    );

    if color != ColorType::L8 {
        warn!(color = ?color, "Converting image to 8-bit grayscale");
        if !quiet {
            eprintln!(
                "{}",
                format!("Image is {color:?}, converting to 8-bit grayscale").yellow()
            );
        }
    }
    Ok(img.into_luma8())
}

/// Save a grayscale image, picking the encoder from the extension.
pub fn save_gray(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("Failed to write image: {}", path.display()))
}

/// Render a payload as text when it is valid UTF-8, otherwise as hex.
pub fn display_payload(payload: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(payload) {
        Ok(text) => (text.to_string(), "utf8"),
        Err(_) => (hex::encode(payload), "hex"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("images/cover.png"), "_EMD"),
            PathBuf::from("images/cover_EMD.png")
        );
        assert_eq!(
            default_output_path(Path::new("scan.BMP"), "_EMD"),
            PathBuf::from("scan_EMD.bmp")
        );
        assert_eq!(
            default_output_path(Path::new("photo.jpg"), "_EMD"),
            PathBuf::from("photo_EMD.png")
        );
        assert_eq!(
            default_output_path(Path::new("noext"), "-x"),
            PathBuf::from("noext-x.png")
        );
    }

    #[test]
    fn test_lossy_outputs_rejected() {
        assert!(ensure_lossless(Path::new("out.png")).is_ok());
        assert!(ensure_lossless(Path::new("out.tiff")).is_ok());
        assert!(ensure_lossless(Path::new("out.JPG")).is_err());
        assert!(ensure_lossless(Path::new("out.webp")).is_err());
    }

    #[test]
    fn test_display_payload() {
        assert_eq!(display_payload(b"HELLO"), ("HELLO".to_string(), "utf8"));
        assert_eq!(
            display_payload(&[0xff, 0x00, 0x10]),
            ("ff0010".to_string(), "hex")
        );
    }
}
