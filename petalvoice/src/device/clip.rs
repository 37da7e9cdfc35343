use std::sync::Arc;
use std::time::Duration;

/// Opaque handle to a playable clip.
///
/// The core never decodes audio; a clip is whatever the host's playback device knows how to
/// play, identified by name. Cloning is cheap (reference counted), so action definitions can
/// hold clips by value.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    inner: Arc<ClipInner>,
}

#[derive(Debug, PartialEq)]
struct ClipInner {
    name: String,
    length: Duration,
}

impl AudioClip {
    /// Creates a clip handle with a nominal playback length.
    pub fn new(name: impl Into<String>, length: Duration) -> Self {
        Self {
            inner: Arc::new(ClipInner {
                name: name.into(),
                length,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Nominal length at a rate of 1.0.
    pub fn length(&self) -> Duration {
        self.inner.length
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::AudioClip;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct ClipRepr {
        name: String,
        length_secs: f64,
    }

    impl Serialize for AudioClip {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            ClipRepr {
                name: self.name().to_string(),
                length_secs: self.length().as_secs_f64(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for AudioClip {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = ClipRepr::deserialize(deserializer)?;
            let length = Duration::try_from_secs_f64(repr.length_secs)
                .map_err(serde::de::Error::custom)?;
            Ok(AudioClip::new(repr.name, length))
        }
    }
}
