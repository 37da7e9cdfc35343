/// Stops every active voice tagged with one of the named events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalStopEvent {
    pub events: Vec<String>,
}

impl GlobalStopEvent {
    pub fn new<S: Into<String>>(events: impl IntoIterator<Item = S>) -> Self {
        Self {
            events: events.into_iter().map(Into::into).collect(),
        }
    }
}

/// Stops every active voice, except those playing one of the listed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalStopAll {
    #[cfg_attr(feature = "serde", serde(default))]
    pub except: Vec<String>,
}

impl GlobalStopAll {
    pub fn except<S: Into<String>>(events: impl IntoIterator<Item = S>) -> Self {
        Self {
            except: events.into_iter().map(Into::into).collect(),
        }
    }
}
