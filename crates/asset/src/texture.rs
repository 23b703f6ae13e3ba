//! Texture pixel data ready for GPU upload.
//! Every image the container yields is normalised to RGBA8.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgba};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap RGBA8 pixels. Returns `None` if the byte count does not match the
    /// dimensions or either dimension is zero.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let texture = Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        };
        texture.is_valid().then_some(texture)
    }

    /// Convert any decoded image into RGBA8.
    pub fn from_image(img: DynamicImage) -> Option<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Opaque 1x1 white texel; sampling it leaves lit colour unchanged.
    pub fn white() -> Self {
        Self {
            data: vec![255, 255, 255, 255],
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Bytes in one row of pixels.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected = self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected && self.width > 0 && self.height > 0
    }

    /// Number of levels in a full mip chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        u32::BITS - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Levels 1.. of the mip chain, each half the previous size (min 1).
    /// Level 0 is `self`.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let levels = self.mip_level_count() as usize;
        let mut out: Vec<TextureData> = Vec::with_capacity(levels.saturating_sub(1));
        let Some(mut prev) =
            ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.data.clone())
        else {
            return out;
        };
        for _ in 1..levels {
            let (w, h) = ((prev.width() / 2).max(1), (prev.height() / 2).max(1));
            let next = imageops::resize(&prev, w, h, FilterType::Triangle);
            out.push(TextureData {
                data: next.as_raw().clone(),
                width: w,
                height: h,
                format: TextureFormat::Rgba8,
            });
            prev = next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn rejects_mismatched_length() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(TextureData::from_rgba8(0, 0, Vec::new()).is_none());
        assert!(TextureData::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn mip_chain_halves_down_to_one_texel() {
        let tex = TextureData::from_rgba8(8, 2, vec![200; 8 * 2 * 4]).unwrap();
        assert_eq!(tex.mip_level_count(), 4);
        let dims: Vec<(u32, u32)> = tex.mip_chain().iter().map(|m| (m.width, m.height)).collect();
        assert_eq!(dims, vec![(4, 1), (2, 1), (1, 1)]);
        assert!(tex.mip_chain().iter().all(TextureData::is_valid));
        // Uniform input stays uniform.
        assert!(tex.mip_chain()[2].data.iter().all(|&b| b == 200));
    }

    #[test]
    fn single_texel_has_no_mips() {
        let tex = TextureData::white();
        assert_eq!(tex.mip_level_count(), 1);
        assert!(tex.mip_chain().is_empty());
        assert_eq!(TextureData::from_rgba8(5, 3, vec![0; 60]).unwrap().mip_level_count(), 3);
    }

    #[test]
    fn grayscale_expands_to_rgba() {
        let gray: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_raw(2, 1, vec![10, 200]).unwrap();
        let tex = TextureData::from_image(DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(tex.data, vec![10, 10, 10, 255, 200, 200, 200, 255]);
        assert_eq!(tex.bytes_per_row(), 8);
    }
}
