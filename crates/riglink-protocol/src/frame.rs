//! Wire format for published video frames.
//!
//! A frame travels as one binary message: a 2-byte big-endian tag
//! length, the UTF-8 tag, then the payload. The tag is
//! `<hostname>@<timestampMillis>`, which is all the controller needs
//! to attribute and order frames from multiple rigs. The payload is
//! opaque here — raw pixels or JPEG bytes, possibly encrypted.

use crate::types::now_millis;
use crate::ProtocolError;

/// One published video frame: attribution tag plus opaque payload.
///
/// Frames are never queued or retried — at most one is in flight per
/// publish attempt, and a failed attempt drops the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// `<hostname>@<timestampMillis>`.
    pub tag: String,
    /// Frame bytes (raw, JPEG, and/or encrypted — opaque here).
    pub payload: Vec<u8>,
}

impl VideoFrame {
    /// Builds a frame tagged with `hostname` and the current time.
    pub fn new(hostname: &str, payload: Vec<u8>) -> Self {
        Self {
            tag: format!("{hostname}@{}", now_millis()),
            payload,
        }
    }

    /// Serializes to the wire layout.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the tag exceeds
    /// the 2-byte length prefix (64 KiB — a hostname would have to be
    /// absurd to hit this).
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let tag = self.tag.as_bytes();
        let len = u16::try_from(tag.len()).map_err(|_| {
            ProtocolError::InvalidMessage("frame tag too long".into())
        })?;
        let mut out =
            Vec::with_capacity(2 + tag.len() + self.payload.len());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parses the wire layout back into a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] on truncated input or
    /// a non-UTF-8 tag.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < 2 {
            return Err(ProtocolError::InvalidMessage(
                "frame shorter than length prefix".into(),
            ));
        }
        let len = u16::from_be_bytes([data[0], data[1]]) as usize;
        if data.len() < 2 + len {
            return Err(ProtocolError::InvalidMessage(
                "frame truncated inside tag".into(),
            ));
        }
        let tag = std::str::from_utf8(&data[2..2 + len])
            .map_err(|_| {
                ProtocolError::InvalidMessage("frame tag not UTF-8".into())
            })?
            .to_string();
        Ok(Self {
            tag,
            payload: data[2 + len..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_hostname_at_millis() {
        let frame = VideoFrame::new("rig-01", vec![1, 2, 3]);
        let (host, millis) =
            frame.tag.split_once('@').expect("tag should contain @");
        assert_eq!(host, "rig-01");
        assert!(millis.parse::<u64>().is_ok());
    }

    #[test]
    fn test_wire_round_trip() {
        let frame = VideoFrame {
            tag: "rig-01@1680000000000".into(),
            payload: vec![0xFF, 0xD8, 0xFF, 0xE0],
        };
        let bytes = frame.to_bytes().unwrap();
        let decoded = VideoFrame::from_bytes(&bytes).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let frame = VideoFrame {
            tag: "h@1".into(),
            payload: vec![],
        };
        let bytes = frame.to_bytes().unwrap();
        let decoded = VideoFrame::from_bytes(&bytes).unwrap();
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_truncated_input_fails() {
        let frame = VideoFrame::new("rig-01", vec![1, 2, 3]);
        let bytes = frame.to_bytes().unwrap();
        // Cut inside the tag.
        let result = VideoFrame::from_bytes(&bytes[..3]);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_single_byte_input_fails() {
        assert!(VideoFrame::from_bytes(&[0x00]).is_err());
    }
}
