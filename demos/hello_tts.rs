//! A bare-bones TTS example.

use spx_lite::tts::{SpeechOutput, Synthesizer};
use spx_lite::SpeechConfig;

fn main() {
    // Load the native core and hand its entry points to the crate.
    spx_lite::initialize_from_library(library_path()).unwrap();

    // Service credentials come from the environment.
    let config = SpeechConfig::from_subscription(
        &std::env::var("SPX_KEY").expect("set SPX_KEY to your subscription key"),
        &std::env::var("SPX_REGION").expect("set SPX_REGION to your service region"),
    )
    .unwrap();

    // Create a synthesizer playing through the default speaker.
    let synth = Synthesizer::new(&config, SpeechOutput::Default).unwrap();

    // Speak the phrase and wait until the speech is finished.
    synth.speak("Hello, world!").unwrap();

    // Release the native resources deterministically.
    synth.close().unwrap();
}

fn library_path() -> String {
    std::env::var("SPX_LIBRARY").unwrap_or_else(|_| "libspx.so".to_string())
}
