use crate::error::RenderError;
use crate::framebuffer::Framebuffer;
use crate::math::Color;
use crate::texture::Image;
use image::{GenericImageView, ImageBuffer, Rgb};
use std::path::Path;

/// Decodes an image file into tightly packed RGB8 bytes for a `Texture`.
/// Decode failure is logged and the caller falls back to `Image::missing()`
/// (debug cyan) rather than aborting the render.
pub fn load_rgb8<P: AsRef<Path>>(path: P) -> Result<Image, RenderError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|e| RenderError::ImageDecode(format!("{}: {e}", path.display())))?;
    let (width, height) = decoded.dimensions();
    let rgb = decoded.to_rgb8();
    Ok(Image::from_rgb8(rgb.into_raw(), width as usize, height as usize))
}

/// Loads a texture, falling back to the debug-cyan placeholder and logging
/// a warning on decode failure instead of propagating.
pub fn load_rgb8_or_missing<P: AsRef<Path>>(path: P) -> Image {
    let path = path.as_ref();
    match load_rgb8(path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("warning: {err}, using debug placeholder");
            Image::missing()
        }
    }
}

/// Tonemapped, quantized framebuffer -> PNG. The only non-`Color`
/// framebuffer instantiation the renderer produces.
pub fn write_png<P: AsRef<Path>>(path: P, fb: &Framebuffer<[u8; 3]>) -> Result<(), RenderError> {
    let width = fb.width();
    let height = fb.height();
    let mut buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = fb.get(x, y);
            buffer.put_pixel(x, y, Rgb([r, g, b]));
        }
    }
    buffer.save(path.as_ref()).map_err(|e| match e {
        image::ImageError::IoError(io_err) => RenderError::ImageEncode(io_err),
        other => RenderError::ImageEncode(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
    })
}

/// Sanity helper: flat `Color` accumulation buffer's average channel value,
/// used by the integration tests to assert a rendered scenario leans
/// toward an expected hue without re-decoding the PNG from disk.
pub fn average_color(fb: &Framebuffer<Color>) -> Color {
    let mut sum = Color::zero();
    let count = (fb.width() * fb.height()) as f64;
    for y in 0..fb.height() {
        for x in 0..fb.width() {
            sum += fb.get(x, y);
        }
    }
    sum / count
}
