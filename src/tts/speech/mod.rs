use std::borrow::{Borrow, Cow};

mod builder;
mod types;

pub use builder::SpeechBuilder;
pub use types::{Pitch, Rate, SayAs, Volume};

/// A speech to be rendered by a synthesizer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Speech<'s> {
    /// Plain text
    Text(Cow<'s, str>),
    /// SSML markup
    Ssml(Cow<'s, str>),
}

impl<'s> Speech<'s> {
    pub(crate) fn contents(&self) -> &str {
        match self {
            Self::Text(cow) => cow.borrow(),
            Self::Ssml(cow) => cow.borrow(),
        }
    }

    /// Detaches the speech from any borrowed text.
    pub fn into_owned(self) -> Speech<'static> {
        match self {
            Self::Text(cow) => Speech::Text(Cow::Owned(cow.into_owned())),
            Self::Ssml(cow) => Speech::Ssml(Cow::Owned(cow.into_owned())),
        }
    }
}

impl<'s> From<&'s str> for Speech<'s> {
    fn from(s: &'s str) -> Self {
        Self::Text(s.into())
    }
}

impl<'s> From<String> for Speech<'s> {
    fn from(s: String) -> Self {
        Self::Text(s.into())
    }
}

impl<'s> From<&'s Speech<'s>> for Speech<'s> {
    fn from(s: &'s Speech<'s>) -> Self {
        match s {
            Speech::Text(s) => Self::Text(Cow::Borrowed(s.borrow())),
            Speech::Ssml(s) => Self::Ssml(Cow::Borrowed(s.borrow())),
        }
    }
}
