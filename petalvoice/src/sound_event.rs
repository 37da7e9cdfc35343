use crate::action::{Action, ActionContext, ActionSequence, SequenceReport};
use crate::config::AttenuationSettings;
use crate::device::PlaybackDevice;
use crate::math::Vec3;
use crate::pitch;
use crate::pool::VoicePool;
use crate::spatial::WeakAnchor;
use crate::voice::VoiceId;
use rand::RngCore;

/// Where the voices of an event are placed.
#[derive(Debug, Clone, Default)]
pub enum PlayMode {
    /// Flat playback that follows the listener.
    #[default]
    TwoD,
    AtPosition(Vec3),
    /// Follows an anchor until it is dropped.
    Attached(WeakAnchor),
}

impl PlayMode {
    pub fn is_two_d(&self) -> bool {
        matches!(self, Self::TwoD)
    }
}

/// Why a play request produced no sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotInitialized,
    EventNotFound,
    /// Not a single voice could be reserved.
    PoolExhausted,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "world not initialized"),
            Self::EventNotFound => write!(f, "event not found"),
            Self::PoolExhausted => write!(f, "no voice available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    Played {
        /// Voices left sounding once the sequence ran.
        voices: Vec<VoiceId>,
        report: SequenceReport,
    },
    Dropped(DropReason),
}

impl PlayOutcome {
    pub fn is_played(&self) -> bool {
        matches!(self, Self::Played { .. })
    }

    pub fn voices(&self) -> &[VoiceId] {
        match self {
            Self::Played { voices, .. } => voices,
            Self::Dropped(_) => &[],
        }
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Self::Dropped(reason) => Some(*reason),
            Self::Played { .. } => None,
        }
    }
}

/// A named, declarative sound: what to play, how loud, how it attenuates and at which priority
/// it competes for voices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoundEvent {
    pub name: String,
    /// Higher wins. A request may interrupt voices held at a lower (or, by default, equal)
    /// priority.
    pub priority: i32,
    pub volume: f32,
    /// Pitch offset in cents of a semitone.
    pub pitch_cents: f32,
    pub attenuation: AttenuationSettings,
    pub sequence: ActionSequence,
}

impl Default for SoundEvent {
    fn default() -> Self {
        Self {
            name: String::new(),
            priority: 1,
            volume: 1.0,
            pitch_cents: 0.0,
            attenuation: AttenuationSettings::default(),
            sequence: ActionSequence::default(),
        }
    }
}

impl SoundEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch_cents(mut self, cents: f32) -> Self {
        self.pitch_cents = cents;
        self
    }

    pub fn with_attenuation(mut self, attenuation: AttenuationSettings) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.sequence.push(action);
        self
    }

    pub fn with_sequence(mut self, sequence: ActionSequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn voice_count(&self) -> usize {
        self.sequence.voice_count()
    }

    /// Reserves voices, prepares them and runs the action sequence.
    ///
    /// `volume` scales the event's own volume. The play is dropped only when the event needs
    /// voices and gets none at all; otherwise it plays with whatever it got.
    pub(crate) fn play(
        &mut self,
        pool: &mut VoicePool,
        mode: &PlayMode,
        volume: f32,
        listener: Option<Vec3>,
        rng: &mut dyn RngCore,
    ) -> PlayOutcome {
        let count = self.sequence.voice_count();
        let slots = pool.request_voices(count, self.priority);
        if count > 0 && slots.iter().all(Option::is_none) {
            log::debug!(
                "{} dropped: no voice at priority {}",
                self.name,
                self.priority
            );
            return PlayOutcome::Dropped(DropReason::PoolExhausted);
        }

        let reserved: Vec<VoiceId> = slots.iter().flatten().copied().collect();
        for id in &reserved {
            let Some(voice) = pool.voice_mut(*id) else {
                continue;
            };
            voice.reset();
            match mode {
                PlayMode::TwoD => voice.attach_to_listener(listener),
                PlayMode::AtPosition(position) => voice.go_to_position(*position),
                PlayMode::Attached(anchor) => voice.attach_to(anchor.clone()),
            }
            voice.set_event_name(&self.name);
            voice.set_volume(self.volume * volume);
            voice.set_pitch(self.pitch_cents);
            voice.apply_attenuation(&self.attenuation, mode.is_two_d());
        }

        let mut ctx = ActionContext {
            pool: &mut *pool,
            rng,
            reserved: &reserved,
        };
        let report = self.sequence.apply(&slots, &mut ctx);
        pool.release_unactivated(&slots);

        let voices = reserved
            .into_iter()
            .filter(|id| pool.voice(*id).is_some_and(|voice| voice.is_active()))
            .collect();
        PlayOutcome::Played { voices, report }
    }

    /// Auditions the event on a single device, bypassing the pool.
    pub fn preview(
        &mut self,
        device: &mut dyn PlaybackDevice,
        volume: f32,
        rng: &mut dyn RngCore,
    ) -> SequenceReport {
        device.set_volume(self.volume * volume);
        device.set_pitch_multiplier(pitch::cents_to_rate(self.pitch_cents));
        device.set_spatialize(self.attenuation.is_spatial());
        device.set_spatial_blend(self.attenuation.amount);
        device.set_distance_range(
            self.attenuation.min_distance,
            self.attenuation.max_distance,
        );
        self.sequence.apply_to_device(device, rng)
    }
}
