//! Podcast audio: decoding the synthesized payload and playing it back

use crate::{Result, TasteError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// Media type of synthesized podcast audio
pub const PODCAST_MEDIA_TYPE: &str = "audio/mpeg";

/// Decoded podcast audio, ready for the player
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodcastAudio {
    bytes: Arc<Vec<u8>>,
}

impl PodcastAudio {
    /// Decode a base64 payload from the audio endpoint
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        if bytes.is_empty() {
            return Err(TasteError::AudioError("audio payload is empty".to_string()));
        }
        debug!("[AUDIO] Decoded {} bytes of podcast audio", bytes.len());
        Ok(Self {
            bytes: Arc::new(bytes),
        })
    }

    pub fn media_type(&self) -> &'static str {
        PODCAST_MEDIA_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Audio player for podcast results
///
/// Owns the output stream, so it must stay on the thread that created it.
pub struct PodcastPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl PodcastPlayer {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| TasteError::AudioError(format!("No output device available: {}", e)))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Start playing from the beginning, replacing anything already loaded
    pub fn play(&mut self, audio: &PodcastAudio) -> Result<()> {
        self.stop();

        let source = Decoder::new(Cursor::new(audio.bytes().to_vec()))
            .map_err(|e| TasteError::AudioError(format!("Failed to decode audio: {}", e)))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| TasteError::AudioError(format!("Failed to open sink: {}", e)))?;
        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        info!("[AUDIO] Podcast playback started ({} bytes)", audio.len());
        Ok(())
    }

    /// Pause or resume the loaded audio
    pub fn toggle_pause(&mut self) {
        if let Some(sink) = &self.sink {
            if sink.is_paused() {
                sink.play();
            } else {
                sink.pause();
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Check if audio is loaded and not paused
    pub fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    /// Check if something is loaded (playing or paused)
    pub fn is_loaded(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        let audio = PodcastAudio::from_base64("SUQzBAA=").unwrap();
        assert_eq!(audio.bytes(), b"ID3\x04\x00");
        assert_eq!(audio.media_type(), "audio/mpeg");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = PodcastAudio::from_base64("not base64 at all!").unwrap_err();
        assert!(matches!(err, TasteError::DecodeError(_)));
    }

    #[test]
    fn test_decode_rejects_empty() {
        let err = PodcastAudio::from_base64("").unwrap_err();
        assert!(matches!(err, TasteError::AudioError(_)));
    }
}
