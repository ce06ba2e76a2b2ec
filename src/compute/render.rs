//! Colorizers turning sketch state into RGBA8 frames.

use std::path::Path;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, ImageResult};

use super::ChemicalField;

/// Channels per RGBA8 pixel.
pub const RGBA: usize = 4;

/// Gain applied to the per-pass B change when tinting reaction-diffusion.
const DELTA_TINT: f32 = 64.0;

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Grayscale RGBA from a field in `[0, 1]`.
pub fn grayscale(field: &[f32]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(field.len() * RGBA);
    for &v in field {
        let g = to_u8(v);
        rgba.extend_from_slice(&[g, g, g, 255]);
    }
    rgba
}

/// Reaction-diffusion: `(a − b)·scale` in gray, growing B tinted blue and
/// receding B tinted red.
pub fn reaction_diffusion(field: &ChemicalField, scale: f32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(field.a.len() * RGBA);
    for ((&a, &b), &delta) in field.a.iter().zip(&field.b).zip(&field.delta) {
        let v = ((a - b) * scale).clamp(0.0, 1.0);
        let tint = delta * DELTA_TINT;
        rgba.extend_from_slice(&[
            to_u8(v - tint.min(0.0)),
            to_u8(v),
            to_u8(v + tint.max(0.0)),
            255,
        ]);
    }
    rgba
}

/// Vants: pheromones in gray, cells visited this frame in red.
pub fn vants(pheromones: &[f32], render: &[f32]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pheromones.len() * RGBA);
    for (&p, &r) in pheromones.iter().zip(render) {
        if r > 0.0 {
            rgba.extend_from_slice(&[255, 0, 0, 255]);
        } else {
            let g = to_u8(p);
            rgba.extend_from_slice(&[g, g, g, 255]);
        }
    }
    rgba
}

/// Density grid normalized by its maximum.
pub fn density(grid: &[f32]) -> Vec<u8> {
    let max = grid.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return grayscale(grid);
    }
    let normalized: Vec<f32> = grid.iter().map(|&v| v / max).collect();
    grayscale(&normalized)
}

/// Replicate every pixel into a `factor × factor` block.
pub fn upscale(rgba: &[u8], width: usize, height: usize, factor: usize) -> Vec<u8> {
    if factor <= 1 {
        return rgba.to_vec();
    }
    let out_width = width * factor;
    let mut out = Vec::with_capacity(rgba.len() * factor * factor);
    for y in 0..height {
        let row = &rgba[y * width * RGBA..(y + 1) * width * RGBA];
        let mut scaled = Vec::with_capacity(out_width * RGBA);
        for pixel in row.chunks_exact(RGBA) {
            for _ in 0..factor {
                scaled.extend_from_slice(pixel);
            }
        }
        for _ in 0..factor {
            out.extend_from_slice(&scaled);
        }
    }
    out
}

/// Write an RGBA8 frame as PNG.
pub fn save_png<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
    rgba: &[u8],
) -> ImageResult<()> {
    if rgba.len() != width * height * RGBA {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )));
    }
    image::save_buffer_with_format(
        path,
        rgba,
        width as u32,
        height as u32,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    log::info!("Saved {}x{} snapshot", width, height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_clamps() {
        let rgba = grayscale(&[-1.0, 0.5, 2.0]);
        assert_eq!(rgba, vec![0, 0, 0, 255, 128, 128, 128, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_reaction_diffusion_tint() {
        let field = ChemicalField {
            a: vec![1.0, 0.5, 0.5],
            b: vec![0.0, 0.25, 0.25],
            delta: vec![0.0, 0.01, -0.01],
        };
        let rgba = reaction_diffusion(&field, 2.0);
        assert_eq!(&rgba[0..4], &[255, 255, 255, 255]);
        // (0.5 - 0.25) * 2 = 0.5 base, pushed toward blue then red.
        assert!(rgba[6] > rgba[4]);
        assert!(rgba[8] > rgba[10]);
    }

    #[test]
    fn test_vants_marks_render_red() {
        let rgba = vants(&[1.0, 0.0, 1.0], &[0.0, 0.0, 1.0]);
        assert_eq!(&rgba[0..4], &[255, 255, 255, 255]);
        assert_eq!(&rgba[4..8], &[0, 0, 0, 255]);
        assert_eq!(&rgba[8..12], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_density_normalizes() {
        let rgba = density(&[0.0, 2.0, 4.0]);
        assert_eq!(rgba[0], 0);
        assert_eq!(rgba[4], 128);
        assert_eq!(rgba[8], 255);
        assert!(density(&[0.0, 0.0]).iter().step_by(4).all(|&v| v == 0));
    }

    #[test]
    fn test_upscale_blocks() {
        // 2x1 image: red, green.
        let rgba = [255, 0, 0, 255, 0, 255, 0, 255];
        let out = upscale(&rgba, 2, 1, 2);
        assert_eq!(out.len(), 4 * 2 * RGBA);
        let px = |x: usize, y: usize| &out[(y * 4 + x) * RGBA..(y * 4 + x + 1) * RGBA];
        assert_eq!(px(0, 0), px(1, 1));
        assert_eq!(px(2, 0), &[0, 255, 0, 255]);
        assert_eq!(px(3, 1), &[0, 255, 0, 255]);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_png(&path, 2, 2, &grayscale(&[0.0, 0.25, 0.5, 1.0])).unwrap();
        assert!(path.exists());

        assert!(save_png(dir.path().join("bad.png"), 3, 3, &[0u8; 4]).is_err());
    }
}
