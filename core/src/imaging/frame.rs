use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};

use crate::{StageError, StageResult};

/// Owned 3-channel RGB pixel buffer flowing through the analysis stages.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> StageResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(StageError::InvalidInput(format!(
                "frame buffer holds {} bytes, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decodes an image file into a canonical RGB frame.
    ///
    /// Any decode or IO failure maps to [`StageError::ImageRead`], which
    /// aborts the analysis before detection or narrative generation run.
    pub fn open<P: AsRef<Path>>(path: P) -> StageResult<Self> {
        let path_ref = path.as_ref();
        let reader = ImageReader::open(path_ref)
            .map_err(|err| StageError::ImageRead(format!("{}: {}", path_ref.display(), err)))?;
        let decoded = reader
            .with_guessed_format()
            .map_err(|err| StageError::ImageRead(format!("{}: {}", path_ref.display(), err)))?
            .decode()
            .map_err(|err| StageError::ImageRead(format!("{}: {}", path_ref.display(), err)))?;
        Ok(Self::from_dynamic(decoded))
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            data: rgb.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn longer_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn channels(&self) -> u32 {
        3
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame invariant: buffer length matches dimensions")
    }

    /// Encodes the frame as JPEG bytes for the external vision API.
    pub fn to_jpeg(&self) -> StageResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.to_rgb_image()
            .write_to(&mut buffer, ImageFormat::Jpeg)
            .map_err(|err| StageError::Internal(format!("jpeg encode: {}", err)))?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
        assert!(Frame::new(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn open_missing_file_is_image_read_error() {
        let err = Frame::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, StageError::ImageRead(_)));
    }

    #[test]
    fn jpeg_encoding_round_trips_dimensions() {
        let frame = Frame::new(8, 4, vec![128; 8 * 4 * 3]).unwrap();
        let jpeg = frame.to_jpeg().unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 4);
    }
}
