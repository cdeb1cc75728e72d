use crate::video::extract_frame;
use eframe::egui;
use std::path::Path;

/// Load a poster frame for `path` as an egui texture.
pub fn poster_texture(
    ctx: &egui::Context,
    path: &Path,
    seek_fraction: f64,
) -> anyhow::Result<egui::TextureHandle> {
    let frame = extract_frame(path, seek_fraction)?;
    let image = image::load_from_memory(&frame.bytes)?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());

    Ok(ctx.load_texture(
        format!("poster-{}", path.display()),
        color_image,
        egui::TextureOptions::LINEAR,
    ))
}
