//! Playback device boundary.
//!
//! PetalVoice schedules voices but never touches samples. Every voice wraps one
//! [`PlaybackDevice`]: the host's channel that decodes, filters, pans and outputs a clip. Hosts
//! implement the trait over their own audio backend and hand a factory to
//! [`PetalVoiceWorld::initialize`](crate::PetalVoiceWorld::initialize).
//!
//! [`SimulatedDevice`] is a backend-free implementation that only tracks state. It drives the
//! demo and the unit tests.

mod clip;
mod simulated;

pub use clip::AudioClip;
pub use simulated::{SimulatedDevice, SimulatedDeviceHandle, SimulatedState};

use crate::error::Result;
use crate::math::Vec3;

/// The two filter slots every voice may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    HighPass,
    LowPass,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighPass => "high-pass",
            Self::LowPass => "low-pass",
        }
    }
}

/// Cutoff/resonance block of a device-side high- or low-pass filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub enabled: bool,
    pub cutoff_frequency: f32,
    pub resonance_q: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            cutoff_frequency: 5000.0,
            resonance_q: 1.0,
        }
    }
}

/// One output channel capable of playing a single clip at a time.
///
/// The spatial hooks have no-op defaults so that 2D-only backends can ignore them.
pub trait PlaybackDevice {
    fn set_clip(&mut self, clip: Option<AudioClip>);
    fn play(&mut self);
    fn stop(&mut self);
    fn pause(&mut self);
    fn unpause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn set_pitch_multiplier(&mut self, rate: f32);
    fn set_loop(&mut self, looping: bool);
    fn set_mute(&mut self, muted: bool);

    /// Whether the device is currently producing sound. A paused device reports false.
    fn is_playing(&self) -> bool;

    /// Current settings of a device-side filter, `None` if the device has no such filter.
    fn filter(&self, kind: FilterKind) -> Option<FilterSettings>;

    /// Replaces the settings of a device-side filter. Ignored if the device has no such filter.
    fn set_filter(&mut self, kind: FilterKind, settings: FilterSettings);

    fn set_position(&mut self, _position: Vec3) {}
    fn set_spatial_blend(&mut self, _blend: f32) {}
    fn set_spatialize(&mut self, _enabled: bool) {}
    fn set_distance_range(&mut self, _min: f32, _max: f32) {}
}

/// What the device factory is told about each voice it is asked to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSpawn {
    /// Position of the voice in the pool.
    pub index: usize,
    /// Display label, "Voice 1" onwards.
    pub label: String,
    /// Mirrors [`PetalVoiceWorldDesc::hide_voices`](crate::PetalVoiceWorldDesc::hide_voices).
    pub hidden: bool,
}

/// Builds the device behind one pooled voice. Called once per voice at (re-)initialization.
pub type DeviceFactory<'a> = dyn FnMut(&VoiceSpawn) -> Result<Box<dyn PlaybackDevice>> + 'a;

/// Disables both filters of a device, if present.
pub(crate) fn disable_filters(device: &mut dyn PlaybackDevice) {
    for kind in [FilterKind::HighPass, FilterKind::LowPass] {
        if let Some(mut settings) = device.filter(kind) {
            settings.enabled = false;
            device.set_filter(kind, settings);
        }
    }
}

/// Enables a device-side filter with the given cutoff and resonance.
/// Returns false if the device has no filter of that kind.
pub(crate) fn enable_filter(
    device: &mut dyn PlaybackDevice,
    kind: FilterKind,
    cutoff_frequency: f32,
    resonance_q: f32,
) -> bool {
    if device.filter(kind).is_none() {
        return false;
    }
    device.set_filter(
        kind,
        FilterSettings {
            enabled: true,
            cutoff_frequency,
            resonance_q,
        },
    );
    true
}
