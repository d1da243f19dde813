//! Borrowed views over a single-channel (grayscale) pixel grid.
//!
//! The codec never owns pixels. Embedding borrows an [`ImageViewMut`],
//! extraction and search borrow an [`ImageView`]. Pixels are stored
//! row-major, one `u8` intensity per pixel.

use crate::error::{EmdError, Result};

fn check_shape(width: u32, height: u32, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EmdError::InvalidParameter(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(EmdError::InvalidParameter(format!(
            "pixel buffer holds {len} values, {width}x{height} grayscale needs {expected}"
        )));
    }
    Ok(())
}

/// Read-only grayscale view.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> ImageView<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self> {
        check_shape(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }
}

/// Mutable grayscale view used by `hide`.
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    width: u32,
    height: u32,
    pixels: &'a mut [u8],
}

impl<'a> ImageViewMut<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a mut [u8]) -> Result<Self> {
        check_shape(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[u8] {
        &*self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut *self.pixels
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            pixels: &*self.pixels,
        }
    }
}

#[cfg(feature = "image")]
mod image_impl {
    use ::image::GrayImage;

    use super::{ImageView, ImageViewMut};
    use crate::error::{EmdError, Result};

    impl<'a> TryFrom<&'a GrayImage> for ImageView<'a> {
        type Error = EmdError;

        fn try_from(img: &'a GrayImage) -> Result<Self> {
            let (width, height) = img.dimensions();
            ImageView::new(width, height, img.as_raw())
        }
    }

    impl<'a> TryFrom<&'a mut GrayImage> for ImageViewMut<'a> {
        type Error = EmdError;

        fn try_from(img: &'a mut GrayImage) -> Result<Self> {
            let (width, height) = img.dimensions();
            // GrayImage derefs to its row-major Luma<u8> sample buffer.
            ImageViewMut::new(width, height, &mut **img)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            ImageView::new(0, 4, &[]),
            Err(EmdError::InvalidParameter(_))
        ));
        let mut buf: Vec<u8> = vec![];
        assert!(ImageViewMut::new(4, 0, &mut buf).is_err());
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        let buf = vec![0u8; 15];
        assert!(ImageView::new(4, 4, &buf).is_err());
    }

    #[test]
    fn test_view_accessors() {
        let mut buf = vec![7u8; 12];
        let mut view = ImageViewMut::new(4, 3, &mut buf).unwrap();
        assert_eq!(view.pixel_count(), 12);
        view.pixels_mut()[0] = 9;
        let ro = view.as_view();
        assert_eq!(ro.width(), 4);
        assert_eq!(ro.height(), 3);
        assert_eq!(ro.pixels()[0], 9);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_from_gray_image() {
        let mut img =
            ::image::GrayImage::from_fn(5, 2, |x, y| ::image::Luma([(x + y * 5) as u8]));
        {
            let view = ImageView::try_from(&img).unwrap();
            assert_eq!(view.pixels()[7], 7);
        }
        let mut view = ImageViewMut::try_from(&mut img).unwrap();
        view.pixels_mut()[7] = 200;
        assert_eq!(img.get_pixel(2, 1).0[0], 200);
    }
}
