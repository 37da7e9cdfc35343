use crate::device::AudioClip;
use crate::error::{PetalVoiceError, Result};
use rand::Rng;

/// Plays one fixed clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayClip {
    pub clip: AudioClip,
    #[cfg_attr(feature = "serde", serde(default))]
    pub looping: bool,
}

impl PlayClip {
    pub fn new(clip: AudioClip) -> Self {
        Self {
            clip,
            looping: false,
        }
    }

    pub fn looped(mut self) -> Self {
        self.looping = true;
        self
    }
}

/// Plays a clip picked uniformly from a set.
///
/// With `prevent_duplicate_picks` on and more than one clip available, a pick never repeats
/// the previous pick of this same action. The history is per action, so two events sharing a
/// clip set do not influence each other.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomSet {
    pub clips: Vec<AudioClip>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub looping: bool,
    pub prevent_duplicate_picks: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_pick: Option<usize>,
}

impl RandomSet {
    pub fn new(clips: impl IntoIterator<Item = AudioClip>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
            looping: false,
            prevent_duplicate_picks: true,
            last_pick: None,
        }
    }

    pub fn allow_duplicates(mut self) -> Self {
        self.prevent_duplicate_picks = false;
        self
    }

    pub fn looped(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Index of the previous pick, if any.
    pub fn last_pick(&self) -> Option<usize> {
        self.last_pick
    }

    /// Draws the next clip and remembers its index.
    pub fn pick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&AudioClip> {
        let count = self.clips.len();
        if count == 0 {
            return Err(PetalVoiceError::malformed(
                "PlayFromRandomSet",
                "clip set is empty",
            ));
        }

        let mut index = rng.random_range(0..count);
        if self.prevent_duplicate_picks && count > 1 {
            while Some(index) == self.last_pick {
                index = rng.random_range(0..count);
            }
        }
        self.last_pick = Some(index);
        Ok(&self.clips[index])
    }
}
