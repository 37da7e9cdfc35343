use super::{AudioClip, FilterKind, FilterSettings, PlaybackDevice};
use crate::math::Vec3;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Everything a [`SimulatedDevice`] has been told, plus a playhead.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedState {
    pub clip: Option<AudioClip>,
    pub playing: bool,
    pub paused: bool,
    pub looping: bool,
    pub muted: bool,
    pub volume: f32,
    pub pitch: f32,
    pub position: Vec3,
    pub spatial_blend: f32,
    pub spatialize: bool,
    pub distance_range: (f32, f32),
    pub high_pass: FilterSettings,
    pub low_pass: FilterSettings,
    pub playhead: Duration,
    /// Number of `play()` calls that actually started a clip.
    pub starts: u32,
    /// Number of `stop()` calls received.
    pub stops: u32,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            clip: None,
            playing: false,
            paused: false,
            looping: false,
            muted: false,
            volume: 1.0,
            pitch: 1.0,
            position: Vec3::ZERO,
            spatial_blend: 0.0,
            spatialize: false,
            distance_range: (1.0, 500.0),
            high_pass: FilterSettings::default(),
            low_pass: FilterSettings::default(),
            playhead: Duration::ZERO,
            starts: 0,
            stops: 0,
        }
    }
}

impl SimulatedState {
    fn advance(&mut self, dt: Duration) {
        if !self.playing || self.paused {
            return;
        }
        let Some(length) = self.clip.as_ref().map(AudioClip::length) else {
            self.playing = false;
            return;
        };

        // An unrepresentable step runs the clip out.
        self.playhead = scaled_step(dt, self.pitch)
            .and_then(|step| self.playhead.checked_add(step))
            .unwrap_or(length);
        if self.playhead < length {
            return;
        }

        if self.looping && !length.is_zero() {
            let wrapped = self.playhead.as_nanos() % length.as_nanos();
            self.playhead = Duration::from_nanos(wrapped as u64);
        } else {
            self.playhead = length;
            self.playing = false;
            log::debug!(
                "Simulated device finished clip {:?}",
                self.clip.as_ref().map(AudioClip::name)
            );
        }
    }
}

fn scaled_step(dt: Duration, rate: f32) -> Option<Duration> {
    if !rate.is_finite() {
        return None;
    }
    Duration::try_from_secs_f32(dt.as_secs_f32() * rate.max(0.0)).ok()
}

/// Backend-free playback device. Plays nothing; it records what it is told and moves a
/// playhead forward when [`SimulatedDeviceHandle::advance`] is called.
pub struct SimulatedDevice {
    state: Rc<RefCell<SimulatedState>>,
}

/// Shared view of a [`SimulatedDevice`], kept by the host after the device is moved into a
/// voice.
#[derive(Clone)]
pub struct SimulatedDeviceHandle {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedDevice {
    /// Creates a device and the handle that observes it.
    pub fn new() -> (Self, SimulatedDeviceHandle) {
        let state = Rc::new(RefCell::new(SimulatedState::default()));
        (
            Self {
                state: state.clone(),
            },
            SimulatedDeviceHandle { state },
        )
    }
}

impl SimulatedDeviceHandle {
    /// Borrows the current state.
    pub fn state(&self) -> Ref<'_, SimulatedState> {
        self.state.borrow()
    }

    /// Moves the playhead forward by `dt` scaled by the pitch multiplier.
    pub fn advance(&self, dt: Duration) {
        self.state.borrow_mut().advance(dt);
    }

    /// Ends the current clip as if it had played to completion.
    pub fn finish(&self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.paused = false;
        if let Some(clip) = &state.clip {
            state.playhead = clip.length();
        }
    }

    pub fn is_playing(&self) -> bool {
        let state = self.state.borrow();
        state.playing && !state.paused
    }

    pub fn clip_name(&self) -> Option<String> {
        self.state
            .borrow()
            .clip
            .as_ref()
            .map(|clip| clip.name().to_string())
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn set_clip(&mut self, clip: Option<AudioClip>) {
        let mut state = self.state.borrow_mut();
        state.clip = clip;
        state.playhead = Duration::ZERO;
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.clip.is_none() {
            log::warn!("Simulated device asked to play without a clip");
            return;
        }
        state.playing = true;
        state.paused = false;
        state.playhead = Duration::ZERO;
        state.starts += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.paused = false;
        state.playhead = Duration::ZERO;
        state.stops += 1;
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.playing {
            state.paused = true;
        }
    }

    fn unpause(&mut self) {
        self.state.borrow_mut().paused = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_pitch_multiplier(&mut self, rate: f32) {
        self.state.borrow_mut().pitch = rate;
    }

    fn set_loop(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn set_mute(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn is_playing(&self) -> bool {
        let state = self.state.borrow();
        state.playing && !state.paused
    }

    fn filter(&self, kind: FilterKind) -> Option<FilterSettings> {
        let state = self.state.borrow();
        Some(match kind {
            FilterKind::HighPass => state.high_pass,
            FilterKind::LowPass => state.low_pass,
        })
    }

    fn set_filter(&mut self, kind: FilterKind, settings: FilterSettings) {
        let mut state = self.state.borrow_mut();
        match kind {
            FilterKind::HighPass => state.high_pass = settings,
            FilterKind::LowPass => state.low_pass = settings,
        }
    }

    fn set_position(&mut self, position: Vec3) {
        self.state.borrow_mut().position = position;
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.state.borrow_mut().spatial_blend = blend;
    }

    fn set_spatialize(&mut self, enabled: bool) {
        self.state.borrow_mut().spatialize = enabled;
    }

    fn set_distance_range(&mut self, min: f32, max: f32) {
        self.state.borrow_mut().distance_range = (min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(ms: u64) -> AudioClip {
        AudioClip::new("blip", Duration::from_millis(ms))
    }

    #[test]
    fn test_play_requires_clip() {
        let (mut device, handle) = SimulatedDevice::new();
        device.play();
        assert!(!handle.is_playing());

        device.set_clip(Some(clip(100)));
        device.play();
        assert!(handle.is_playing());
        assert_eq!(handle.state().starts, 1);
    }

    #[test]
    fn test_advance_finishes_one_shot() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.play();

        handle.advance(Duration::from_millis(60));
        assert!(device.is_playing());
        handle.advance(Duration::from_millis(60));
        assert!(!device.is_playing());
        assert_eq!(handle.state().playhead, Duration::from_millis(100));
    }

    #[test]
    fn test_advance_wraps_looping_clip() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.set_loop(true);
        device.play();

        handle.advance(Duration::from_millis(250));
        assert!(device.is_playing());
        assert_eq!(handle.state().playhead, Duration::from_millis(50));
    }

    #[test]
    fn test_pitch_scales_playhead() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.set_pitch_multiplier(2.0);
        device.play();

        handle.advance(Duration::from_millis(50));
        assert!(!device.is_playing());
    }

    #[test]
    fn test_unbounded_pitch_runs_clip_out() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.set_pitch_multiplier(f32::INFINITY);
        device.play();

        handle.advance(Duration::from_millis(16));
        assert!(!device.is_playing());
        assert_eq!(handle.state().playhead, Duration::from_millis(100));
    }

    #[test]
    fn test_huge_pitch_wraps_looping_clip() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.set_loop(true);
        device.set_pitch_multiplier(f32::MAX);
        device.play();

        handle.advance(Duration::from_millis(16));
        assert!(device.is_playing());
        assert_eq!(handle.state().playhead, Duration::ZERO);
    }

    #[test]
    fn test_finish_ends_clip() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.play();

        handle.finish();
        assert!(!device.is_playing());
        assert_eq!(handle.state().playhead, Duration::from_millis(100));
    }

    #[test]
    fn test_paused_device_is_not_playing() {
        let (mut device, handle) = SimulatedDevice::new();
        device.set_clip(Some(clip(100)));
        device.play();
        device.pause();
        assert!(!device.is_playing());

        handle.advance(Duration::from_millis(500));
        device.unpause();
        assert!(device.is_playing());
    }
}
