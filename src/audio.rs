//! Single-voice audio: one sample player, one music player.
//!
//! Starting a sample cuts off whatever sample was playing. Music loops until
//! stopped.

use crate::assets::{Sample, Track};
use std::io::Write;
use tracing::debug;

pub trait Audio {
    fn play_music(&mut self, track: &Track);
    fn stop_music(&mut self);
    fn is_music_playing(&self) -> bool;
    fn play_sample(&mut self, sample: &Sample);
}

/// Terminal backend: every sample rings the bell; music is tracked but silent.
#[derive(Debug, Default)]
pub struct TerminalAudio {
    music_playing: bool,
}

impl Audio for TerminalAudio {
    fn play_music(&mut self, track: &Track) {
        debug!(path = %track.path.display(), "music (silent backend)");
        self.music_playing = true;
    }

    fn stop_music(&mut self) {
        self.music_playing = false;
    }

    fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    fn play_sample(&mut self, _sample: &Sample) {
        let mut out = std::io::stdout();
        // A lost bell is not worth failing a frame over.
        let _ = out.write_all(b"\x07").and_then(|()| out.flush());
    }
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioAudio;

#[cfg(feature = "audio")]
mod rodio_backend {
    use super::{Audio, TerminalAudio};
    use crate::assets::{Sample, Track};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::io::Cursor;
    use tracing::warn;

    /// Real playback through the default output device.
    pub struct RodioAudio {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sample_sink: Option<Sink>,
        music_sink: Option<Sink>,
        bell: TerminalAudio,
    }

    impl RodioAudio {
        pub fn new() -> anyhow::Result<Self> {
            let (stream, handle) = OutputStream::try_default()?;
            Ok(Self {
                _stream: stream,
                handle,
                sample_sink: None,
                music_sink: None,
                bell: TerminalAudio::default(),
            })
        }
    }

    impl Audio for RodioAudio {
        fn play_music(&mut self, track: &Track) {
            self.stop_music();
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            match Decoder::new(Cursor::new(track.bytes.clone())) {
                Ok(source) => {
                    sink.append(source.repeat_infinite());
                    self.music_sink = Some(sink);
                }
                Err(err) => warn!(%err, path = %track.path.display(), "cannot decode music"),
            }
        }

        fn stop_music(&mut self) {
            if let Some(sink) = self.music_sink.take() {
                sink.stop();
            }
        }

        fn is_music_playing(&self) -> bool {
            self.music_sink
                .as_ref()
                .is_some_and(|sink| !sink.empty() && !sink.is_paused())
        }

        fn play_sample(&mut self, sample: &Sample) {
            let Sample::Clip { path, bytes } = sample else {
                self.bell.play_sample(sample);
                return;
            };
            if let Some(previous) = self.sample_sink.take() {
                previous.stop();
            }
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            match Decoder::new(Cursor::new(bytes.clone())) {
                Ok(source) => {
                    sink.append(source);
                    self.sample_sink = Some(sink);
                }
                Err(err) => warn!(%err, path = %path.display(), "cannot decode sample"),
            }
        }
    }
}

/// Records every request; used by scene tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub music_playing: bool,
    pub music_starts: usize,
    pub music_stops: usize,
    pub samples: Vec<Sample>,
}

#[cfg(test)]
impl Audio for RecordingAudio {
    fn play_music(&mut self, _track: &Track) {
        self.music_playing = true;
        self.music_starts += 1;
    }

    fn stop_music(&mut self) {
        self.music_playing = false;
        self.music_stops += 1;
    }

    fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    fn play_sample(&mut self, sample: &Sample) {
        self.samples.push(sample.clone());
    }
}
