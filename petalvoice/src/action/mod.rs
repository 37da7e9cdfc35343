//! Declarative event actions.
//!
//! An event is an ordered list of [`Action`]s. Actions that need a voice of their own consume
//! one slot of the voices reserved for the event, in sequence order; the others act on the
//! whole pool or on the voice of the most recent slot.

mod distance;
mod filter;
mod play;
mod sequence;
mod stop;

pub use distance::DistanceRange;
pub use filter::{CUTOFF_RANGE, FilterParams, RESONANCE_RANGE};
pub use play::{PlayClip, RandomSet};
pub use sequence::{ActionSequence, SequenceReport};
pub use stop::{GlobalStopAll, GlobalStopEvent};

use crate::device::{self, AudioClip, FilterKind, PlaybackDevice};
use crate::error::Result;
use crate::pool::VoicePool;
use crate::voice::VoiceId;
use rand::RngCore;

/// One step of an event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Play(PlayClip),
    PlayFromRandomSet(RandomSet),
    /// Stops the voice of its own slot.
    Stop,
    StopAllInEvent,
    GlobalStopEvent(GlobalStopEvent),
    GlobalStopAllEvents(GlobalStopAll),
    VolumeByDistance(DistanceRange),
    SpatialBlendByDistance(DistanceRange),
    HighPassFilter(FilterParams),
    LowPassFilter(FilterParams),
}

/// What an action may touch while an event plays.
pub struct ActionContext<'a> {
    pub(crate) pool: &'a mut VoicePool,
    pub(crate) rng: &'a mut dyn RngCore,
    /// Voices reserved by the running invocation. Global stops leave them alone.
    pub(crate) reserved: &'a [VoiceId],
}

impl Action {
    pub fn play(clip: AudioClip) -> Self {
        Self::Play(PlayClip::new(clip))
    }

    pub fn play_looped(clip: AudioClip) -> Self {
        Self::Play(PlayClip::new(clip).looped())
    }

    pub fn play_random(clips: impl IntoIterator<Item = AudioClip>) -> Self {
        Self::PlayFromRandomSet(RandomSet::new(clips))
    }

    pub fn global_stop<S: Into<String>>(events: impl IntoIterator<Item = S>) -> Self {
        Self::GlobalStopEvent(GlobalStopEvent::new(events))
    }

    pub fn global_stop_all() -> Self {
        Self::GlobalStopAllEvents(GlobalStopAll::default())
    }

    pub fn global_stop_all_except<S: Into<String>>(events: impl IntoIterator<Item = S>) -> Self {
        Self::GlobalStopAllEvents(GlobalStopAll::except(events))
    }

    pub fn volume_by_distance(min_distance: f32, max_distance: f32) -> Self {
        Self::VolumeByDistance(DistanceRange::new(min_distance, max_distance))
    }

    pub fn spatial_blend_by_distance(min_distance: f32, max_distance: f32) -> Self {
        Self::SpatialBlendByDistance(DistanceRange::new(min_distance, max_distance))
    }

    pub fn high_pass(cutoff_frequency: f32, resonance_q: f32) -> Self {
        Self::HighPassFilter(FilterParams::new(cutoff_frequency, resonance_q))
    }

    pub fn low_pass(cutoff_frequency: f32, resonance_q: f32) -> Self {
        Self::LowPassFilter(FilterParams::new(cutoff_frequency, resonance_q))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Play(_) => "Play",
            Self::PlayFromRandomSet(_) => "PlayFromRandomSet",
            Self::Stop => "Stop",
            Self::StopAllInEvent => "StopAllInEvent",
            Self::GlobalStopEvent(_) => "GlobalStopEvent",
            Self::GlobalStopAllEvents(_) => "GlobalStopAllEvents",
            Self::VolumeByDistance(_) => "VolumeByDistance",
            Self::SpatialBlendByDistance(_) => "SpatialBlendByDistance",
            Self::HighPassFilter(_) => "HighPassFilter",
            Self::LowPassFilter(_) => "LowPassFilter",
        }
    }

    /// Whether the action consumes a voice slot of its own.
    pub fn needs_voice(&self) -> bool {
        matches!(
            self,
            Self::Play(_)
                | Self::PlayFromRandomSet(_)
                | Self::Stop
                | Self::StopAllInEvent
                | Self::HighPassFilter(_)
                | Self::LowPassFilter(_)
        )
    }

    /// Whether the action does nothing without a target voice.
    pub fn targets_voice(&self) -> bool {
        self.needs_voice()
            || matches!(
                self,
                Self::VolumeByDistance(_) | Self::SpatialBlendByDistance(_)
            )
    }

    /// Runs the action against the pool. `target` is the voice of the current slot.
    pub(crate) fn apply(
        &mut self,
        ctx: &mut ActionContext<'_>,
        target: Option<VoiceId>,
    ) -> Result<()> {
        match self {
            Self::GlobalStopEvent(stop) => {
                for event in &stop.events {
                    ctx.pool.stop_event(event, ctx.reserved);
                }
                return Ok(());
            }
            Self::GlobalStopAllEvents(stop) => {
                ctx.pool.stop_all(stop.except.as_slice(), ctx.reserved);
                return Ok(());
            }
            _ => {}
        }

        let Some(id) = target else {
            return Ok(());
        };

        match self {
            Self::Play(play) => {
                ctx.pool.play_clip(id, &play.clip, play.looping);
            }
            Self::PlayFromRandomSet(set) => {
                let looping = set.looping;
                let clip = set.pick(&mut *ctx.rng)?.clone();
                ctx.pool.play_clip(id, &clip, looping);
            }
            Self::Stop | Self::StopAllInEvent => {
                ctx.pool.stop_voice(id);
            }
            Self::VolumeByDistance(range) => {
                range.validate("VolumeByDistance")?;
                if let Some(voice) = ctx.pool.voice_mut(id) {
                    voice.set_volume_by_distance(range.min_distance, range.max_distance);
                }
            }
            Self::SpatialBlendByDistance(range) => {
                range.validate("SpatialBlendByDistance")?;
                if let Some(voice) = ctx.pool.voice_mut(id) {
                    voice.set_spatial_blend_by_distance(range.min_distance, range.max_distance);
                }
            }
            Self::HighPassFilter(params) => {
                params.validate(FilterKind::HighPass)?;
                if let Some(voice) = ctx.pool.voice_mut(id) {
                    if !voice.set_high_pass(params.cutoff_frequency, params.resonance_q) {
                        log::debug!(
                            "{} has no {} filter",
                            voice.label(),
                            FilterKind::HighPass.label()
                        );
                    }
                }
            }
            Self::LowPassFilter(params) => {
                params.validate(FilterKind::LowPass)?;
                if let Some(voice) = ctx.pool.voice_mut(id) {
                    if !voice.set_low_pass(params.cutoff_frequency, params.resonance_q) {
                        log::debug!(
                            "{} has no {} filter",
                            voice.label(),
                            FilterKind::LowPass.label()
                        );
                    }
                }
            }
            Self::GlobalStopEvent(_) | Self::GlobalStopAllEvents(_) => {}
        }
        Ok(())
    }

    /// Runs the action against a single device outside the pool, for auditioning.
    ///
    /// Every slot maps to the same device. Global stops stop that device only; distance curves
    /// have no listener to work against and are skipped.
    pub(crate) fn apply_to_device(
        &mut self,
        device: &mut dyn PlaybackDevice,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        match self {
            Self::Play(play) => start_on_device(device, &play.clip, play.looping),
            Self::PlayFromRandomSet(set) => {
                let looping = set.looping;
                let clip = set.pick(rng)?;
                start_on_device(device, clip, looping);
            }
            Self::Stop
            | Self::StopAllInEvent
            | Self::GlobalStopEvent(_)
            | Self::GlobalStopAllEvents(_) => device.stop(),
            Self::VolumeByDistance(_) | Self::SpatialBlendByDistance(_) => {
                log::debug!("{} skipped while previewing", self.name());
            }
            Self::HighPassFilter(params) => {
                params.validate(FilterKind::HighPass)?;
                device::enable_filter(
                    device,
                    FilterKind::HighPass,
                    params.cutoff_frequency,
                    params.resonance_q,
                );
            }
            Self::LowPassFilter(params) => {
                params.validate(FilterKind::LowPass)?;
                device::enable_filter(
                    device,
                    FilterKind::LowPass,
                    params.cutoff_frequency,
                    params.resonance_q,
                );
            }
        }
        Ok(())
    }
}

fn start_on_device(device: &mut dyn PlaybackDevice, clip: &AudioClip, looping: bool) {
    device.set_clip(Some(clip.clone()));
    device.set_loop(looping);
    device.play();
}
