//! Avatar crop geometry, resampling and upload rules.
//!
//! A crop is chosen on a scaled-down display of the picture as a normalized
//! [`CropRegion`]. [`SourceRect::from_display`] maps it back to the picture's
//! natural pixels, and [`crop_to_square`] resamples that rectangle into the
//! fixed square stored as the avatar.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AvatarConfig;
use crate::error::ValidationError;

/// Default side of the stored avatar, in pixels.
pub const DEFAULT_OUTPUT_SIZE: u32 = 300;

/// Share of the displayed width covered by the initial crop.
pub const INITIAL_CROP_PERCENT: u8 = 90;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse `WxH`, e.g. `640x480`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidCropRegion(format!("invalid size '{raw}' (expected WxH)"));
        let (width, height) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Crop rectangle as fractions of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        let values = [x, y, width, height];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(ValidationError::InvalidCropRegion(
                "coordinates must be finite".to_string(),
            ));
        }
        if x < 0.0 || y < 0.0 || width <= 0.0 || height <= 0.0 {
            return Err(ValidationError::InvalidCropRegion(
                "origin must be >= 0 and size > 0".to_string(),
            ));
        }
        if x + width > 1.0 + EPSILON || y + height > 1.0 + EPSILON {
            return Err(ValidationError::InvalidCropRegion(
                "region extends past the image".to_string(),
            ));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Parse `x,y,w,h` with each value a fraction in `0..=1`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let parts: Vec<f64> = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| {
                ValidationError::InvalidCropRegion(format!("invalid crop '{raw}' (expected x,y,w,h)"))
            })?;
        match parts.as_slice() {
            [x, y, width, height] => Self::new(*x, *y, *width, *height),
            _ => Err(ValidationError::InvalidCropRegion(format!(
                "invalid crop '{raw}' (expected x,y,w,h)"
            ))),
        }
    }
}

/// Initial square crop: 90% of the shorter displayed side, centered.
pub fn centered_square_crop(display_width: u32, display_height: u32) -> CropRegion {
    centered_square_crop_with(display_width, display_height, INITIAL_CROP_PERCENT)
}

pub fn centered_square_crop_with(display_width: u32, display_height: u32, percent: u8) -> CropRegion {
    let width = f64::from(display_width.max(1));
    let height = f64::from(display_height.max(1));
    let side = width.min(height) * f64::from(percent.clamp(1, 100)) / 100.0;

    let rel_width = side / width;
    let rel_height = side / height;
    CropRegion {
        x: (1.0 - rel_width) / 2.0,
        y: (1.0 - rel_height) / 2.0,
        width: rel_width,
        height: rel_height,
    }
}

/// Crop rectangle in natural-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    /// Scale a crop made on the displayed image to the natural image.
    pub fn from_display(
        region: &CropRegion,
        display: Size,
        natural: Size,
    ) -> Result<Self, ValidationError> {
        if display.width == 0 || display.height == 0 || natural.width == 0 || natural.height == 0 {
            return Err(ValidationError::InvalidCropRegion(
                "image sizes must be non-zero".to_string(),
            ));
        }
        let display_w = f64::from(display.width);
        let display_h = f64::from(display.height);
        let scale_x = f64::from(natural.width) / display_w;
        let scale_y = f64::from(natural.height) / display_h;

        Ok(Self {
            x: region.x * display_w * scale_x,
            y: region.y * display_h * scale_y,
            width: region.width * display_w * scale_x,
            height: region.height * display_h * scale_y,
        })
    }

    pub fn full(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(size.width),
            height: f64::from(size.height),
        }
    }
}

/// 8-bit RGBA raster, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ValidationError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(ValidationError::InvalidCropRegion(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width.saturating_sub(1)) as usize;
        let y = y.min(self.height.saturating_sub(1)) as usize;
        let offset = (y * self.width as usize + x) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        out
    }

    /// Bilinear sample at a continuous pixel-center coordinate, clamped to
    /// the edges.
    fn sample(&self, x: f64, y: f64) -> [u8; 4] {
        if self.pixels.is_empty() {
            return [0; 4];
        }
        let max_x = f64::from(self.width - 1);
        let max_y = f64::from(self.height - 1);
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (x0, y0) = (x0 as u32, y0 as u32);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x1, y0);
        let p01 = self.pixel(x0, y1);
        let p11 = self.pixel(x1, y1);

        let mut out = [0u8; 4];
        for channel in 0..4 {
            let top = f64::from(p00[channel]) * (1.0 - tx) + f64::from(p10[channel]) * tx;
            let bottom = f64::from(p01[channel]) * (1.0 - tx) + f64::from(p11[channel]) * tx;
            let value = top * (1.0 - ty) + bottom * ty;
            out[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

/// Resample `rect` of `image` into an `output_size` square.
pub fn crop_to_square(image: &RgbaImage, rect: &SourceRect, output_size: u32) -> RgbaImage {
    let output_size = output_size.max(1);
    let step_x = rect.width / f64::from(output_size);
    let step_y = rect.height / f64::from(output_size);

    RgbaImage::from_fn(output_size, output_size, |ox, oy| {
        let sx = rect.x + (f64::from(ox) + 0.5) * step_x - 0.5;
        let sy = rect.y + (f64::from(oy) + 0.5) * step_y - 0.5;
        image.sample(sx, sy)
    })
}

/// Check an upload's content type and size against the avatar settings.
pub fn validate_upload(
    content_type: &str,
    size: u64,
    config: &AvatarConfig,
) -> Result<(), ValidationError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    if !config
        .allowed_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&content_type))
    {
        return Err(ValidationError::UnsupportedImageType(content_type));
    }
    if size > config.max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size,
            max: config.max_bytes,
        });
    }
    Ok(())
}

/// Storage key for a user's new avatar: `{user_id}/{unix_millis}.jpg`.
pub fn avatar_object_path(user_id: &str, at: DateTime<Utc>) -> String {
    format!("{user_id}/{}.jpg", at.timestamp_millis())
}
