// src/voice/mod.rs

//! Voice capture and speech playback state machines.
//!
//! Both are plain data, independent of any audio backend: the presentation
//! layer drives transitions from its recognition and playback events. An
//! invalid transition returns an error and leaves the state unchanged.

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Listening,
    Transcribing,
    Done(String),
    Error(String),
}

/// Speech-to-text capture lifecycle: `Idle → Listening → Transcribing →
/// Done | Error`, with `reset` returning to `Idle` from anywhere.
#[derive(Debug)]
pub struct VoiceCapture {
    state: CaptureState,
}

impl VoiceCapture {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Begins listening. Only valid from `Idle`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Idle => {
                self.state = CaptureState::Listening;
                Ok(())
            }
            ref other => Err(anyhow!("cannot start capture from {:?}", other)),
        }
    }

    /// Audio arrived and transcription began. Only valid while listening.
    pub fn audio_captured(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Listening => {
                self.state = CaptureState::Transcribing;
                Ok(())
            }
            ref other => Err(anyhow!("no audio expected in {:?}", other)),
        }
    }

    /// Transcription finished. Only valid while transcribing.
    pub fn transcribed(&mut self, transcript: impl Into<String>) -> Result<()> {
        match self.state {
            CaptureState::Transcribing => {
                self.state = CaptureState::Done(transcript.into());
                Ok(())
            }
            ref other => Err(anyhow!("no transcript expected in {:?}", other)),
        }
    }

    /// Recognition failed. Valid while listening or transcribing.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        match self.state {
            CaptureState::Listening | CaptureState::Transcribing => {
                self.state = CaptureState::Error(reason.into());
                Ok(())
            }
            ref other => Err(anyhow!("no capture in progress in {:?}", other)),
        }
    }

    /// Returns to `Idle` from any state, discarding a held transcript.
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
    }

    /// The finished transcript, when capture reached `Done`.
    pub fn transcript(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Done(transcript) => Some(transcript),
            _ => None,
        }
    }
}

impl Default for VoiceCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Which message's audio is playing, if any. Playing a second message
/// supersedes the first.
#[derive(Debug, Default)]
pub struct SpeechPlayback {
    current: Option<String>,
}

impl SpeechPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, message_id: impl Into<String>) {
        self.current = Some(message_id.into());
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_message_id(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
