//! Image buffers in CPU memory.
//!
//! Samples are stored interleaved, row-major (`rows × columns × channels`).
//! Every channel is treated as an independent scalar signal; the only colour
//! semantics carried here is whether a fourth channel is alpha.

use crate::error::{Result, ShutterError};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Channel layout of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Single scalar channel
    Gray,
    /// Three colour channels
    #[default]
    Rgb,
    /// Three colour channels plus alpha
    Rgba,
}

impl PixelLayout {
    /// Samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the last channel is an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Layout for a given channel count.
    pub fn from_channels(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(ShutterError::invalid(format!(
                "Unsupported channel count: {other}"
            ))),
        }
    }
}

/// A scalar sample type an [`Image`] can hold.
pub trait Sample: Copy + Default + PartialEq + Send + Sync + 'static {
    fn to_f64(self) -> f64;

    /// Convert back from the working precision. Integer samples saturate
    /// to their range and truncate toward zero.
    fn from_f64(v: f64) -> Self;
}

impl Sample for u8 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        // NaN maps to 0 through the saturating cast.
        v.clamp(0.0, 255.0) as u8
    }
}

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

/// Interleaved multi-channel image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    layout: PixelLayout,
    data: Vec<T>,
}

/// 8-bit image, the format images enter and leave the engine in.
pub type Image8 = Image<u8>;

/// Floating-point image, returned by background-aware deblurring.
pub type ImageF32 = Image<f32>;

impl<T: Sample> Image<T> {
    /// Create a zero-filled image.
    pub fn new(width: usize, height: usize, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![T::default(); width * height * layout.channels()],
        }
    }

    /// Create an image with every sample set to `value`.
    pub fn filled(width: usize, height: usize, layout: PixelLayout, value: T) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![value; width * height * layout.channels()],
        }
    }

    /// Wrap an existing interleaved buffer.
    pub fn from_vec(width: usize, height: usize, layout: PixelLayout, data: Vec<T>) -> Result<Self> {
        let expected = width * height * layout.channels();
        if data.len() != expected {
            return Err(ShutterError::DimensionMismatch {
                expected: format!("{expected} samples"),
                actual: format!("{} samples", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Assemble an image from one plane per channel.
    pub fn from_planes(planes: &[Plane]) -> Result<Self> {
        let layout = PixelLayout::from_channels(planes.len())?;
        let first = &planes[0];
        let (width, height) = (first.width, first.height);
        if let Some(odd) = planes
            .iter()
            .find(|p| p.width != width || p.height != height)
        {
            return Err(ShutterError::DimensionMismatch {
                expected: format!("{width}x{height}"),
                actual: format!("{}x{}", odd.width, odd.height),
            });
        }

        let channels = layout.channels();
        let mut image = Self::new(width, height, layout);
        for (c, plane) in planes.iter().enumerate() {
            for (i, v) in plane.data.iter().enumerate() {
                image.data[i * channels + c] = T::from_f64(*v);
            }
        }
        Ok(image)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// `(height, width, channels)`, the order image shapes are reported in.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels())
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Samples of row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let stride = self.width * self.channels();
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Mutable samples of row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let stride = self.width * self.channels();
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Samples of a single pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let c = self.channels();
        let start = (y * self.width + x) * c;
        &self.data[start..start + c]
    }

    /// Mutable samples of a single pixel.
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let c = self.channels();
        let start = (y * self.width + x) * c;
        &mut self.data[start..start + c]
    }

    /// Copy out the region `rect`, which must lie inside the image.
    pub fn crop(&self, rect: Rect) -> Result<Self> {
        if !rect.fits_within(self.width, self.height) {
            return Err(ShutterError::invalid(format!(
                "Crop {rect:?} exceeds image bounds {}x{}",
                self.width, self.height
            )));
        }
        let c = self.channels();
        let mut out = Self::new(rect.width, rect.height, self.layout);
        for y in 0..rect.height {
            let src = &self.row(rect.y + y)[rect.x * c..(rect.x + rect.width) * c];
            out.row_mut(y).copy_from_slice(src);
        }
        Ok(out)
    }

    /// Surround the image with `pad_x` columns and `pad_y` rows of zeros on
    /// every side. Alpha is zeroed too, so the border is fully transparent.
    pub fn zero_pad(&self, pad_x: usize, pad_y: usize) -> Self {
        let c = self.channels();
        let mut out = Self::new(self.width + 2 * pad_x, self.height + 2 * pad_y, self.layout);
        for y in 0..self.height {
            let dst = &mut out.row_mut(y + pad_y)[pad_x * c..(pad_x + self.width) * c];
            dst.copy_from_slice(self.row(y));
        }
        out
    }

    /// Extract channel `c` as a floating-point plane.
    pub fn channel_plane(&self, c: usize) -> Plane {
        let channels = self.channels();
        let data = self
            .data
            .iter()
            .skip(c)
            .step_by(channels)
            .map(|v| v.to_f64())
            .collect();
        Plane {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// All channels as planes, in channel order.
    pub fn planes(&self) -> Vec<Plane> {
        (0..self.channels()).map(|c| self.channel_plane(c)).collect()
    }

    /// Clip every sample to `[0, 255]` and truncate to 8 bits.
    pub fn quantize(&self) -> Image8 {
        Image {
            width: self.width,
            height: self.height,
            layout: self.layout,
            data: self.data.iter().map(|v| u8::from_f64(v.to_f64())).collect(),
        }
    }
}

/// Single-channel plane in working precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(ShutterError::DimensionMismatch {
                expected: format!("{} samples", width * height),
                actual: format!("{} samples", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f64] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, val: f64) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = val;
        }
    }

    /// Mirror-pad every row by `pad` samples on each side.
    ///
    /// The edge sample itself is not repeated: `[a b c d]` padded by 2
    /// becomes `[c b a b c d c b]`.
    pub fn reflect_pad_horizontal(&self, pad: usize) -> Plane {
        let padded_width = self.width + 2 * pad;
        let mut out = Plane::new(padded_width, self.height);
        for y in 0..self.height {
            let src = self.row(y);
            let dst = out.row_mut(y);
            for (i, v) in dst.iter_mut().enumerate() {
                *v = src[reflect_index(i as isize - pad as isize, self.width)];
            }
        }
        out
    }
}

/// Map a possibly out-of-range index onto `[0, len)` by mirror reflection
/// about the first and last samples.
pub fn reflect_index(i: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let r = i.rem_euclid(period);
    if r < len as isize {
        r as usize
    } else {
        (period - r) as usize
    }
}
