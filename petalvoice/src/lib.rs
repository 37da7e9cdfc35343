//! # PetalVoice
//!
//! Event-driven voice management for game audio.
//!
//! Games trigger sounds far more often than there are output channels to play them on.
//! PetalVoice sits between the game and its playback backend: named events describe what to do
//! as an ordered list of actions, and a fixed pool of voices decides who gets to sound, by
//! priority, when every voice is busy.
//!
//! ## Quick Start
//!
//! ```
//! use petalvoice::*;
//! use std::time::Duration;
//!
//! let mut world = PetalVoiceWorld::new();
//!
//! // One playback device per voice; hosts plug their own backend in here.
//! world.initialize(PetalVoiceWorldDesc::default().max_voices(4), |_spawn| {
//!     let (device, _handle) = SimulatedDevice::new();
//!     Ok(Box::new(device) as Box<dyn PlaybackDevice>)
//! })?;
//!
//! let clip = |name: &str| AudioClip::new(name, Duration::from_millis(300));
//! world.load_events(vec![
//!     SoundEvent::new("Footstep")
//!         .with_attenuation(AttenuationSettings::spatial(1.0, 30.0))
//!         .with_action(Action::play_random([clip("step-1"), clip("step-2"), clip("step-3")]))
//!         .with_action(Action::volume_by_distance(1.0, 30.0)),
//!     SoundEvent::new("Alarm")
//!         .with_priority(10)
//!         .with_action(Action::global_stop_all_except(["Music"]))
//!         .with_action(Action::play(clip("alarm"))),
//! ])?;
//!
//! world.set_listener_pose(Pose::from_position(Vec3::ZERO));
//! world.play_event_at_position("Footstep", Vec3::new(2.0, 0.0, 0.0));
//! world.play_event_2d("Alarm");
//!
//! // Once per frame
//! world.fixed_tick();
//! world.late_tick();
//!
//! for event in world.poll_events() {
//!     if let PetalVoiceEvent::VoiceStarted { voice, clip, .. } = event {
//!         println!("{voice} started {clip}");
//!     }
//! }
//! # Ok::<(), PetalVoiceError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`PetalVoiceWorld`]**: Owns the pool, the event bank and the listener; the public API
//! - **[`VoicePool`]**: Fixed set of voices with first-free, then lowest-priority allocation
//! - **[`SoundEvent`]**: Named event with priority, volume, pitch, attenuation and actions
//! - **[`Action`]**: One declarative step (play, random set, filters, stops, distance curves)
//! - **[`PlaybackDevice`]**: Trait the host implements over its audio backend
//! - **[`PetalVoiceEvent`]**: Notifications (voice started, preempted, finished, ...)
//!
//! ## Threading
//!
//! A world lives on one thread and is driven by the host's frame loop. Nothing in it blocks
//! or locks; it is intentionally `!Send`.

pub mod action;
pub mod bank;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod math;
pub mod pitch;
pub mod pool;
pub mod sound_event;
pub mod spatial;
pub mod voice;
pub mod world;

pub use action::{Action, ActionSequence, SequenceReport};
pub use bank::{EventBank, EventId, EventKey, EventSource};
pub use config::{AttenuationSettings, PetalVoiceWorldDesc};
pub use device::{
    AudioClip, FilterKind, FilterSettings, PlaybackDevice, SimulatedDevice,
    SimulatedDeviceHandle, VoiceSpawn,
};
pub use error::PetalVoiceError;
pub use events::PetalVoiceEvent;
pub use math::{Pose, Quat, Vec3};
pub use pool::VoicePool;
pub use sound_event::{DropReason, PlayMode, PlayOutcome, SoundEvent};
pub use spatial::{Anchor, ListenerProvider, WeakAnchor};
pub use voice::{Voice, VoiceId};
pub use world::{MAX_PENDING_EVENTS, PetalVoiceAudioListener, PetalVoiceWorld};
