use crate::error::{LocateError, LocateResult};
use image::{GrayImage, RgbImage};

/// A decoded camera frame and its grayscale derivative
#[derive(Debug, Clone)]
pub struct Frame {
    pub color: RgbImage,
    pub gray: GrayImage,
}

impl Frame {
    pub fn from_rgb(color: RgbImage) -> Self {
        let gray = image::imageops::grayscale(&color);
        Self { color, gray }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// Pixel data as delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    /// Encoded image file (PNG, JPEG, ...)
    Encoded(Vec<u8>),
    /// Packed 8-bit blue-green-red rows
    Bgr8 { width: u32, height: u32, data: Vec<u8> },
}

/// One frame delivery: where it came from plus its undecoded pixels
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMessage {
    pub source: String,
    pub payload: FramePayload,
}

impl FrameMessage {
    pub fn encoded(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { source: source.into(), payload: FramePayload::Encoded(bytes) }
    }

    pub fn bgr8(source: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { source: source.into(), payload: FramePayload::Bgr8 { width, height, data } }
    }

    pub fn decode(&self) -> LocateResult<Frame> {
        let color = match &self.payload {
            FramePayload::Encoded(bytes) => image::load_from_memory(bytes)?.to_rgb8(),
            FramePayload::Bgr8 { width, height, data } => {
                let expected_len = *width as usize * *height as usize * 3;
                let invalid = || LocateError::InvalidFrame {
                    width: *width,
                    height: *height,
                    expected_len,
                    actual_len: data.len(),
                };
                if data.len() != expected_len {
                    return Err(invalid());
                }
                let rgb: Vec<u8> = data.chunks_exact(3).flat_map(|px| [px[2], px[1], px[0]]).collect();
                RgbImage::from_raw(*width, *height, rgb).ok_or_else(invalid)?
            }
        };
        Ok(Frame::from_rgb(color))
    }
}
