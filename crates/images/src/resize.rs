use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use jawn_core::ImageSize;
use tracing::debug;

use crate::error::ImageError;

/// One stored rendition of an image.
#[derive(Debug, Clone)]
pub struct Variant {
    pub size: ImageSize,
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// An image decoded and rendered into every size.
///
/// `variants` always starts with the untouched original. Formats the decoder
/// does not handle (SVG, AVIF) carry only the original and zero dimensions.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub variants: Vec<Variant>,
}

impl ProcessedImage {
    pub fn variant(&self, size: ImageSize) -> Option<&Variant> {
        self.variants.iter().find(|v| v.size == size)
    }
}

/// Decode `data` and produce the thumbnail, medium and large renditions.
///
/// Each variant fits within its bounding box with the aspect ratio kept.
/// Images already inside the box are stored as-is, never upscaled. Variants
/// are re-encoded in the source format.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] when a raster format fails to decode, or
/// [`ImageError::Encode`] when a variant cannot be written.
pub fn process(data: Bytes) -> Result<ProcessedImage, ImageError> {
    let Some(format) = raster_format(&data) else {
        debug!(bytes = data.len(), "not a resizable raster format, keeping original only");
        return Ok(ProcessedImage {
            width: 0,
            height: 0,
            variants: vec![Variant {
                size: ImageSize::Original,
                data,
                width: 0,
                height: 0,
            }],
        });
    };

    let img = image::load_from_memory_with_format(&data, format)
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();

    let mut variants = Vec::with_capacity(ImageSize::ALL.len());
    variants.push(Variant {
        size: ImageSize::Original,
        data: data.clone(),
        width,
        height,
    });

    for size in ImageSize::VARIANTS {
        let Some((max_w, max_h)) = size.bounds() else {
            continue;
        };
        if width <= max_w && height <= max_h {
            variants.push(Variant {
                size,
                data: data.clone(),
                width,
                height,
            });
            continue;
        }
        let resized = img.resize(max_w, max_h, FilterType::Lanczos3);
        let (w, h) = resized.dimensions();
        variants.push(Variant {
            size,
            data: encode(&resized, format, size)?,
            width: w,
            height: h,
        });
    }

    Ok(ProcessedImage {
        width,
        height,
        variants,
    })
}

fn raster_format(data: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(data).ok()? {
        f @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP) => Some(f),
        _ => None,
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, size: ImageSize) -> Result<Bytes, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).map_err(|e| ImageError::Encode {
        size: size.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Bytes::from(buf.into_inner()))
}
