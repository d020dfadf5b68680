//! Captured frames and the source/encoder collaborator seams.
//!
//! The publisher itself never touches a camera: a [`FrameSource`]
//! produces raw frames, a [`FrameEncoder`] turns them into payload
//! bytes. Both are traits so a rig can plug in a V4L2 capture, a JPEG
//! compressor, or a synthetic test pattern without the publish loop
//! changing.

use crate::VideoError;

/// Pixel layout of a captured frame's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Uncompressed pixels, layout agreed out of band.
    Raw,
    /// A complete JPEG image.
    Jpeg,
}

/// One captured frame, as handed from the source to the publisher.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub format: PixelFormat,
}

impl Frame {
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: PixelFormat::Raw,
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: PixelFormat::Jpeg,
        }
    }
}

/// Produces frames for the publisher, one at a time.
///
/// `next_frame` is expected to pace itself (camera frame rate, test
/// pattern interval); the capture loop calls it back-to-back.
pub trait FrameSource: Send + 'static {
    /// Captures the next frame.
    ///
    /// # Errors
    /// A [`VideoError::Source`] is logged and the capture loop retries
    /// after a short pause; it never stops the publisher.
    fn next_frame(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Frame, VideoError>> + Send;
}

/// Turns a captured frame into publish payload bytes.
pub trait FrameEncoder: Send + Sync + 'static {
    /// Encodes one frame.
    ///
    /// # Errors
    /// Returns [`VideoError::Encode`] if the frame can't be processed;
    /// the publisher drops that frame and moves on.
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, VideoError>;
}

/// A [`FrameEncoder`] that publishes frame bytes as-is.
///
/// The right choice when the source already emits JPEG, or when the
/// controller wants raw pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEncoder;

impl FrameEncoder for PassthroughEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, VideoError> {
        Ok(frame.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_preserves_bytes() {
        let frame = Frame::jpeg(vec![0xFF, 0xD8, 0xFF]);
        let encoded = PassthroughEncoder.encode(&frame).unwrap();
        assert_eq!(encoded, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_passthrough_ignores_format() {
        let raw = Frame::raw(vec![1, 2, 3]);
        let jpeg = Frame::jpeg(vec![1, 2, 3]);
        assert_eq!(
            PassthroughEncoder.encode(&raw).unwrap(),
            PassthroughEncoder.encode(&jpeg).unwrap()
        );
    }
}
