/// Sample rate, in samples per second, at which to record.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[allow(missing_docs)]
pub enum SampleRate {
    Hz8000 = 8000,
    Hz11025 = 11025,
    Hz12000 = 12000,
    Hz16000 = 16000,
    Hz22050 = 22050,
    Hz24000 = 24000,
    Hz32000 = 32000,
    Hz44100 = 44100,
    Hz48000 = 48000,
}

/// How many bits each sample has.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[allow(missing_docs)]
pub enum BitRate {
    Bits8 = 8,
    Bits16 = 16,
}

/// Number of audio channels.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[allow(missing_docs)]
pub enum Channels {
    Mono = 1,
    Stereo = 2,
}

/// Specifies the format of the PCM audio data in a stream.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct AudioFormat {
    /// Sample rate at which the audio was recorded.
    pub sample_rate: SampleRate,
    /// How many bits each sample has.
    pub bit_rate: BitRate,
    /// Number of channels.
    pub channels: Channels,
}

impl AudioFormat {
    /// Recognition's preferred input format: 16 kHz, 16-bit, mono.
    pub fn recognition_default() -> Self {
        Self {
            sample_rate: SampleRate::Hz16000,
            bit_rate: BitRate::Bits16,
            channels: Channels::Mono,
        }
    }

    pub(crate) fn to_native(&self) -> (u32, u8, u8) {
        (
            self.sample_rate as u32,
            self.bit_rate as u8,
            self.channels as u8,
        )
    }
}
