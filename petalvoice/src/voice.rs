use crate::config::AttenuationSettings;
use crate::device::{self, AudioClip, FilterKind, PlaybackDevice};
use crate::math::Vec3;
use crate::pitch;
use crate::spatial::{DistanceCurve, WeakAnchor};

/// Priority held by a voice that nobody owns.
pub const FREE_PRIORITY: i32 = -1;

/// Stable handle to one pooled voice. Valid until the world is re-initialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub(crate) usize);

impl VoiceId {
    /// Position of the voice in the pool.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}

#[derive(Debug, Clone, Default)]
enum Attachment {
    #[default]
    None,
    Listener,
    Target(WeakAnchor),
}

/// One poolable playback unit: a [`PlaybackDevice`] plus the bookkeeping the pool schedules
/// with.
///
/// A voice is either free, reserved (`is_requested`) by an event that is still running its
/// action sequence, or active. Activation happens through [`Voice::play_clip`]; a voice falls
/// back to free on the first fixed tick after its device stops playing, unless it is paused.
pub struct Voice {
    id: VoiceId,
    label: String,
    device: Box<dyn PlaybackDevice>,
    is_active: bool,
    is_requested: bool,
    is_paused: bool,
    active_priority: i32,
    event_name: Option<String>,
    position: Vec3,
    attachment: Attachment,
    volume: f32,
    spatial_blend: f32,
    volume_curve: Option<DistanceCurve>,
    spatial_curve: Option<DistanceCurve>,
}

impl Voice {
    pub(crate) fn new(id: VoiceId, label: String, device: Box<dyn PlaybackDevice>) -> Self {
        Self {
            id,
            label,
            device,
            is_active: false,
            is_requested: false,
            is_paused: false,
            active_priority: FREE_PRIORITY,
            event_name: None,
            position: Vec3::ZERO,
            attachment: Attachment::None,
            volume: 1.0,
            spatial_blend: 0.0,
            volume_curve: None,
            spatial_curve: None,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_requested(&self) -> bool {
        self.is_requested
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Neither active nor reserved.
    pub fn is_free(&self) -> bool {
        !self.is_active && !self.is_requested
    }

    /// Priority of the owning event, [`FREE_PRIORITY`] when free.
    pub fn active_priority(&self) -> i32 {
        self.active_priority
    }

    /// Name of the event this voice is playing. Reported only while the voice is active.
    pub fn current_event_name(&self) -> Option<&str> {
        if self.is_active {
            self.event_name.as_deref()
        } else {
            None
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Base volume, before any distance curve is applied.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn spatial_blend(&self) -> f32 {
        self.spatial_blend
    }

    pub fn volume_curve(&self) -> Option<DistanceCurve> {
        self.volume_curve
    }

    pub fn spatial_curve(&self) -> Option<DistanceCurve> {
        self.spatial_curve
    }

    /// Whether the voice follows the listener or an anchor.
    pub fn is_attached(&self) -> bool {
        !matches!(self.attachment, Attachment::None)
    }

    pub fn device(&self) -> &dyn PlaybackDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn PlaybackDevice {
        self.device.as_mut()
    }

    /// Reserves the voice for an event of the given priority.
    /// Fails if the voice is already reserved.
    pub(crate) fn request(&mut self, priority: i32) -> bool {
        if self.is_requested {
            return false;
        }
        self.is_requested = true;
        self.active_priority = priority;
        true
    }

    /// Clears per-play effect state: filters off, unmuted, pause flag cleared.
    pub(crate) fn reset(&mut self) {
        device::disable_filters(self.device.as_mut());
        self.device.set_mute(false);
        self.is_paused = false;
    }

    /// Starts a clip and promotes the voice to active.
    pub fn play_clip(&mut self, clip: &AudioClip, looping: bool) {
        self.reset();
        self.device.set_clip(Some(clip.clone()));
        self.device.set_loop(looping);
        self.device.play();
        self.is_requested = false;
        self.is_active = true;
        log::debug!(
            "{} playing clip {} (event {:?}, priority {})",
            self.label,
            clip.name(),
            self.event_name,
            self.active_priority
        );
    }

    /// Stops playback immediately and returns the voice to the pool.
    pub fn stop(&mut self) {
        self.device.stop();
        self.release();
    }

    pub fn pause(&mut self) {
        if !self.is_active {
            return;
        }
        self.device.pause();
        self.is_paused = true;
    }

    pub fn unpause(&mut self) {
        if !self.is_paused {
            return;
        }
        self.device.unpause();
        self.is_paused = false;
    }

    pub fn mute(&mut self) {
        self.device.set_mute(true);
    }

    pub fn unmute(&mut self) {
        self.device.set_mute(false);
    }

    /// Sets the base volume. An enabled volume curve keeps scaling from the new value.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(curve) = self.volume_curve.as_mut() {
            curve.ceiling = volume;
        }
        self.device.set_volume(volume);
    }

    /// Sets the pitch offset in cents of a semitone.
    pub fn set_pitch(&mut self, cents: f32) {
        self.device.set_pitch_multiplier(pitch::cents_to_rate(cents));
    }

    /// Ignores rates that are negative or not finite.
    pub fn set_pitch_multiplier(&mut self, rate: f32) {
        if !rate.is_finite() || rate < 0.0 {
            log::warn!("{} ignored pitch multiplier {}", self.label, rate);
            return;
        }
        self.device.set_pitch_multiplier(rate);
    }

    pub fn set_spatial_blend(&mut self, blend: f32) {
        self.spatial_blend = blend.clamp(0.0, 1.0);
        if let Some(curve) = self.spatial_curve.as_mut() {
            curve.ceiling = self.spatial_blend;
        }
        self.device.set_spatial_blend(self.spatial_blend);
    }

    /// Configures 3D rendering for the voice. 2D playback forces a flat, non-spatialized voice.
    pub(crate) fn apply_attenuation(&mut self, settings: &AttenuationSettings, two_d: bool) {
        if two_d {
            self.device.set_spatialize(false);
            self.set_spatial_blend(0.0);
            return;
        }
        self.device.set_spatialize(settings.is_spatial());
        self.set_spatial_blend(settings.amount);
        self.device
            .set_distance_range(settings.min_distance, settings.max_distance);
    }

    /// Enables a volume curve scaled from the current base volume.
    pub fn set_volume_by_distance(&mut self, min_distance: f32, max_distance: f32) {
        self.volume_curve = Some(DistanceCurve::new(min_distance, max_distance, self.volume));
    }

    /// Enables a spatial blend curve scaled from the current blend.
    pub fn set_spatial_blend_by_distance(&mut self, min_distance: f32, max_distance: f32) {
        self.spatial_curve = Some(DistanceCurve::new(
            min_distance,
            max_distance,
            self.spatial_blend,
        ));
    }

    /// Returns false if the device has no high-pass filter.
    pub fn set_high_pass(&mut self, cutoff_frequency: f32, resonance_q: f32) -> bool {
        device::enable_filter(
            self.device.as_mut(),
            FilterKind::HighPass,
            cutoff_frequency,
            resonance_q,
        )
    }

    /// Returns false if the device has no low-pass filter.
    pub fn set_low_pass(&mut self, cutoff_frequency: f32, resonance_q: f32) -> bool {
        device::enable_filter(
            self.device.as_mut(),
            FilterKind::LowPass,
            cutoff_frequency,
            resonance_q,
        )
    }

    /// Places the voice at a fixed point, dropping any attachment.
    pub fn go_to_position(&mut self, position: Vec3) {
        self.attachment = Attachment::None;
        self.move_to(position);
    }

    /// Makes the voice follow an anchor from the next late tick on.
    pub fn attach_to(&mut self, anchor: WeakAnchor) {
        if let Some(pose) = anchor.pose() {
            self.move_to(pose.position);
        }
        self.attachment = Attachment::Target(anchor);
    }

    /// Makes the voice follow the listener. Used for 2D playback.
    pub fn attach_to_listener(&mut self, listener: Option<Vec3>) {
        if let Some(position) = listener {
            self.move_to(position);
        }
        self.attachment = Attachment::Listener;
    }

    pub(crate) fn set_event_name(&mut self, name: &str) {
        self.event_name = Some(name.to_string());
    }

    /// Returns the voice to the free state.
    pub(crate) fn release(&mut self) {
        self.is_active = false;
        self.is_requested = false;
        self.is_paused = false;
        self.active_priority = FREE_PRIORITY;
        self.event_name = None;
        self.attachment = Attachment::None;
        self.volume_curve = None;
        self.spatial_curve = None;
    }

    /// Frees the voice if its device has stopped on its own. Returns true if it expired.
    pub(crate) fn update_expiry(&mut self) -> bool {
        if self.is_active && !self.is_paused && !self.device.is_playing() {
            self.release();
            return true;
        }
        false
    }

    /// Follows the attachment and re-evaluates distance curves against the listener.
    pub(crate) fn follow_and_attenuate(&mut self, listener: Option<Vec3>) {
        let follow = match &self.attachment {
            Attachment::None => None,
            Attachment::Listener => listener,
            Attachment::Target(anchor) => anchor.pose().map(|pose| pose.position),
        };
        match follow {
            Some(position) => self.move_to(position),
            None if matches!(self.attachment, Attachment::Target(_)) => {
                log::debug!("{} lost its anchor, staying at {}", self.label, self.position);
                self.attachment = Attachment::None;
            }
            None => {}
        }

        let Some(listener) = listener else {
            return;
        };
        let distance = self.position.distance(listener);
        if let Some(curve) = self.volume_curve {
            self.device.set_volume(curve.falloff(distance));
        }
        if let Some(curve) = self.spatial_curve {
            self.device.set_spatial_blend(curve.rise(distance));
        }
    }

    fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.device.set_position(position);
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("is_active", &self.is_active)
            .field("is_requested", &self.is_requested)
            .field("is_paused", &self.is_paused)
            .field("active_priority", &self.active_priority)
            .field("event_name", &self.event_name)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
