use std::fmt::Display;
use std::hash::Hash;

/// Provides a hint about how to pronounce the associated content.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SayAs<'s> {
    /// Pronounce a sequence of numbers as a date, e.g. "03/08/2000" as "march eighth two thousand".
    DateMDY,
    /// Pronounce a sequence of numbers as a date, e.g. "03/08/2000" as "august third two thousand".
    DateDMY,
    /// Pronounce a sequence of numbers as a date, e.g. "2000/03/08" as "march eighth two thousand".
    DateYMD,
    /// Pronounce a sequence of numbers as a year and month, e.g. "2000/03" as "march two thousand".
    DateYM,
    /// Pronounce a sequence of numbers as a month and year, e.g. "03/2000" as "march two thousand".
    DateMY,
    /// Pronounce a sequence of numbers as a day and month, e.g. "08/03" as "march eighth".
    DateDM,
    /// Pronounce a sequence of numbers as a month and day, e.g. "03/08" as "march eighth".
    DateMD,
    /// Pronounce a number as a year, e.g. "1979" as "nineteen seventy-nine".
    DateYear,
    /// Pronounce a sequence of numbers as a time, e.g. "10:24" as "ten twenty-four".
    Time,
    /// Pronounce a number as a cardinal number, e.g. "1024" as "one thousand twenty-four".
    Cardinal,
    /// Pronounce a number as an ordinal number, e.g. "2" as "second".
    Ordinal,
    /// Pronounce a number as a sequence of digits, e.g. "1024" as "one zero two four".
    Digits,
    /// Pronounce a number as a fraction, e.g. "3/8" as "three eighths".
    Fraction,
    /// Pronounce a sequence of numbers as a telephone number, e.g. "(206) 555-1234" as "two zero
    /// six five five five one two three four".
    Telephone,
    /// Spell the content out character by character.
    Characters,
    /// A custom interpretation supported by the service.
    Custom(&'s str),
}

impl<'s> SayAs<'s> {
    pub(super) fn ssml_id(&self) -> (&str, Option<&str>) {
        match self {
            Self::DateMDY => ("date", Some("mdy")),
            Self::DateDMY => ("date", Some("dmy")),
            Self::DateYMD => ("date", Some("ymd")),
            Self::DateYM => ("date", Some("ym")),
            Self::DateMY => ("date", Some("my")),
            Self::DateDM => ("date", Some("dm")),
            Self::DateMD => ("date", Some("md")),
            Self::DateYear => ("date", Some("y")),
            Self::Time => ("time", Some("hms24")),
            Self::Cardinal => ("cardinal", None),
            Self::Ordinal => ("ordinal", None),
            Self::Digits => ("digits", None),
            Self::Fraction => ("fraction", None),
            Self::Telephone => ("telephone", None),
            Self::Characters => ("characters", None),
            Self::Custom(s) => (s, None),
        }
    }
}

macro_rules! decl_clamped_int {
    {$(#[$meta:meta])* $name:ident($base:ty) in $min:literal..$max:literal} => {
        $(#[$meta])*
        #[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
        pub struct $name($base);

        impl $name {
            /// Clamps the given value to the interval
            #[doc = concat!("[", stringify!($min), ", ", stringify!($max), "]")]
            /// and constructs a new instance from it.
            pub fn new(value: $base) -> Self {
                Self(value.clamp($min, $max))
            }

            /// Returns the value encapsulated by this instance.
            pub fn value(&self) -> $base {
                self.0
            }
        }

        impl From<$base> for $name {
            fn from(source: $base) -> Self {
                Self::new(source)
            }
        }

        impl From<$name> for $base {
            fn from(source: $name) -> Self {
                source.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

decl_clamped_int! {
    /// Voice pitch, represented as a value in the interval [-10, 10], with 0 being normal pitch.
    Pitch(i32) in -10..10
}

decl_clamped_int! {
    /// Speech rate, represented as a value in the interval [-10, 10], with 0 being normal speed.
    Rate(i32) in -10..10
}

decl_clamped_int! {
    /// Voice volume, represented as a value in the interval [0, 100], with 100 being full volume.
    Volume(u32) in 0..100
}

impl Pitch {
    // Rendered as a relative change in prosody markup.
    pub(super) fn ssml_value(&self) -> String {
        format!("{:+}%", self.0 * 10)
    }
}

impl Rate {
    pub(super) fn ssml_value(&self) -> String {
        format!("{:+}%", self.0 * 10)
    }
}
