use std::fmt;
use std::time::Duration;

use xml::writer::XmlEvent;
use xml::{EmitterConfig, EventWriter};

use super::{Pitch, Rate, SayAs, Speech, Volume};

const SSML_NAMESPACE: &str = "http://www.w3.org/2001/10/synthesis";

/// Helper type that can construct a [`Speech`] from a sequence of rendering instructions.
///
/// Plain calls to [`say`](SpeechBuilder::say) accumulate unadorned text;
/// the first markup instruction upgrades the whole speech to SSML, wrapped
/// in a `speak` document element. The builder performs no validation
/// beyond well-formed nesting of what it wrote itself. For example, it
/// will happily emit overlapping `prosody` and `emphasis` ranges if the
/// `start_*`/`end_*` calls are interleaved that way.
pub struct SpeechBuilder {
    state: SpeechBuilderState,
    language: String,
}

enum SpeechBuilderState {
    Text(String),
    Ssml(EventWriter<Vec<u8>>),
}

impl SpeechBuilder {
    /// Constructs a new, empty instance. Markup is tagged as US English;
    /// use [`with_language`](SpeechBuilder::with_language) for anything
    /// else.
    pub fn new() -> Self {
        Self::with_language("en-US")
    }

    /// Constructs a new, empty instance whose markup is tagged with the
    /// given BCP-47 language.
    pub fn with_language<L: Into<String>>(language: L) -> Self {
        Self {
            state: SpeechBuilderState::Text(String::new()),
            language: language.into(),
        }
    }

    /// Emphasizes all subsequent speech until the corresponding
    /// [`end_emphasis`](SpeechBuilder::end_emphasis) call.
    pub fn start_emphasis(&mut self) -> &mut Self {
        self.append_xml(XmlEvent::start_element("emphasis").into())
    }

    /// Changes the pitch of all subsequent speech until the corresponding
    /// [`end_pitch`](SpeechBuilder::end_pitch) call.
    pub fn start_pitch<P: Into<Pitch>>(&mut self, pitch: P) -> &mut Self {
        self.append_xml(
            XmlEvent::start_element("prosody").attr("pitch", &pitch.into().ssml_value()).into(),
        )
    }

    /// Changes the rate of all subsequent speech until the corresponding
    /// [`end_rate`](SpeechBuilder::end_rate) call.
    pub fn start_rate<R: Into<Rate>>(&mut self, rate: R) -> &mut Self {
        self.append_xml(
            XmlEvent::start_element("prosody").attr("rate", &rate.into().ssml_value()).into(),
        )
    }

    /// Switches to the named voice until the corresponding
    /// [`end_voice`](SpeechBuilder::end_voice) call.
    pub fn start_voice<V: AsRef<str>>(&mut self, voice: V) -> &mut Self {
        self.append_xml(XmlEvent::start_element("voice").attr("name", voice.as_ref()).into())
    }

    /// Changes the volume of all subsequent speech until the corresponding
    /// [`end_volume`](SpeechBuilder::end_volume) call.
    pub fn start_volume<V: Into<Volume>>(&mut self, volume: V) -> &mut Self {
        self.append_xml(
            XmlEvent::start_element("prosody").attr("volume", &volume.into().to_string()).into(),
        )
    }

    /// Appends text to pronounce.
    pub fn say<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        // TODO: What about punctuation, whitespace, etc?
        match &mut self.state {
            SpeechBuilderState::Text(contents) => {
                contents.push_str(text.as_ref());
            }
            SpeechBuilderState::Ssml(writer) => {
                writer.write(text.as_ref()).unwrap();
            }
        };
        self
    }

    /// Appends text to pronounce, along with a hint on how to pronounce it.
    pub fn say_as<S: AsRef<str>>(&mut self, text: S, ctx: SayAs) -> &mut Self {
        let (interpret_as, format) = ctx.ssml_id();
        let mut event = XmlEvent::start_element("say-as").attr("interpret-as", interpret_as);
        if let Some(format) = format {
            event = event.attr("format", format);
        }
        self.append_xml(event.into()).say(text).end_element("say-as")
    }

    /// Appends text to render with a specific phonetic pronunciation, given
    /// in the International Phonetic Alphabet. For example, the text
    /// "tomato" with the pronunciation "təˈmɑːtoʊ" renders the British way.
    pub fn pronounce<S: AsRef<str>, P: AsRef<str>>(&mut self, text: S, pronunciation: P) -> &mut Self {
        self.append_xml(
            XmlEvent::start_element("phoneme")
                .attr("alphabet", "ipa")
                .attr("ph", pronunciation.as_ref())
                .into(),
        )
        .say(text)
        .end_element("phoneme")
    }

    /// Appends a silence with a specified duration. Does not support sub-millisecond precision.
    pub fn silence(&mut self, duration: Duration) -> &mut Self {
        let millis = duration.as_millis();
        if millis == 0 {
            return self;
        }

        self.append_xml(
            XmlEvent::start_element("break").attr("time", &format!("{}ms", millis)).into(),
        )
        .end_element("break")
    }

    /// Ends the effect of the corresponding [`start_emphasis`](SpeechBuilder::start_emphasis) call.
    pub fn end_emphasis(&mut self) -> &mut Self {
        self.end_element("emphasis")
    }

    /// Ends the effect of the corresponding [`start_pitch`](SpeechBuilder::start_pitch) call.
    pub fn end_pitch(&mut self) -> &mut Self {
        self.end_element("prosody")
    }

    /// Ends the effect of the corresponding [`start_rate`](SpeechBuilder::start_rate) call.
    pub fn end_rate(&mut self) -> &mut Self {
        self.end_element("prosody")
    }

    /// Ends the effect of the corresponding [`start_voice`](SpeechBuilder::start_voice) call.
    pub fn end_voice(&mut self) -> &mut Self {
        self.end_element("voice")
    }

    /// Ends the effect of the corresponding [`start_volume`](SpeechBuilder::start_volume) call.
    pub fn end_volume(&mut self) -> &mut Self {
        self.end_element("prosody")
    }

    /// Builds the [`Speech`] from instructions received so far. Clears the contents of the builder.
    pub fn build<'s>(&mut self) -> Speech<'s> {
        let state =
            std::mem::replace(&mut self.state, SpeechBuilderState::Text(String::new()));
        match state {
            SpeechBuilderState::Text(contents) => Speech::Text(contents.into()),
            SpeechBuilderState::Ssml(mut writer) => {
                writer.write(XmlEvent::end_element().name("speak")).unwrap();
                Speech::Ssml(String::from_utf8(writer.into_inner()).unwrap().into())
            }
        }
    }

    fn end_element(&mut self, name: &str) -> &mut Self {
        self.append_xml(XmlEvent::end_element().name(name).into())
    }

    fn append_xml(&mut self, event: XmlEvent) -> &mut Self {
        match &mut self.state {
            SpeechBuilderState::Text(contents) => {
                let mut writer = EventWriter::new_with_config(
                    Vec::new(),
                    EmitterConfig::new()
                        .keep_element_names_stack(false)
                        .write_document_declaration(false),
                );
                writer
                    .write(
                        XmlEvent::start_element("speak")
                            .attr("version", "1.0")
                            .attr("xmlns", SSML_NAMESPACE)
                            .attr("xml:lang", &self.language),
                    )
                    .unwrap();
                writer.write(contents.as_ref()).unwrap();
                writer.write(event).unwrap();
                self.state = SpeechBuilderState::Ssml(writer);
            }
            SpeechBuilderState::Ssml(writer) => {
                writer.write(event).unwrap();
            }
        }
        self
    }
}

impl Default for SpeechBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for SpeechBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.say(s);
        Ok(())
    }
}

impl<'s> From<SpeechBuilder> for Speech<'s> {
    fn from(mut builder: SpeechBuilder) -> Self {
        builder.build()
    }
}

impl<'s> From<&mut SpeechBuilder> for Speech<'s> {
    fn from(builder: &mut SpeechBuilder) -> Self {
        builder.build()
    }
}
