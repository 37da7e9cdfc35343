use crate::error::{PetalVoiceError, Result};

/// Configuration descriptor for a PetalVoice world.
///
/// Read once by [`PetalVoiceWorld::initialize`](crate::PetalVoiceWorld::initialize). Changing
/// the pool size later requires a re-initialization, which discards and recreates every voice.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PetalVoiceWorldDesc {
    /// Number of voices spawned at initialization. Voices are recycled forever, never grown.
    pub max_voices: usize,
    /// Whether the host should keep the pooled voice objects out of sight (scene hierarchies,
    /// debug overlays). Forwarded untouched to the device factory.
    pub hide_voices: bool,
    /// Whether a request may interrupt a voice held at exactly the same priority.
    /// When false only strictly higher priorities preempt.
    pub equal_priority_preempts: bool,
    /// Seed for random-set picks. `None` draws from OS entropy.
    pub random_seed: Option<u64>,
}

impl Default for PetalVoiceWorldDesc {
    fn default() -> Self {
        Self {
            max_voices: 3,
            hide_voices: true,
            equal_priority_preempts: true,
            random_seed: None,
        }
    }
}

impl PetalVoiceWorldDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_voices(mut self, max: usize) -> Self {
        self.max_voices = max;
        self
    }

    pub fn hide_voices(mut self, hide: bool) -> Self {
        self.hide_voices = hide;
        self
    }

    pub fn equal_priority_preempts(mut self, enable: bool) -> Self {
        self.equal_priority_preempts = enable;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Checks the descriptor before a pool is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.max_voices == 0 {
            return Err(PetalVoiceError::Configuration(
                "max_voices must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
