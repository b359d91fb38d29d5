//! An example that shows how to use `SpeechBuilder` to create a speech that
//! can be rendered multiple times. It also showcases some of the markup
//! commands that control the rendering.

use std::time::Duration;

use spx_lite::tts::{SayAs, SpeechBuilder, SpeechOutput, Synthesizer};
use spx_lite::SpeechConfig;

fn main() {
    // Load the native core and hand its entry points to the crate.
    spx_lite::initialize_from_library(library_path()).unwrap();

    let config = SpeechConfig::from_subscription(
        &std::env::var("SPX_KEY").expect("set SPX_KEY to your subscription key"),
        &std::env::var("SPX_REGION").expect("set SPX_REGION to your service region"),
    )
    .unwrap();

    // Build a speech with a variety of commands.
    let mut builder = SpeechBuilder::new();
    builder
        .start_rate(4)
        .say("The pellet with the poison's in the vessel with the pestle.")
        .end_rate()
        .silence(Duration::from_millis(500))
        .start_volume(50)
        .say("And the chalice from the palace has the brew that is true.")
        .end_volume()
        .silence(Duration::from_millis(500))
        .say("Call ")
        .say_as("5551234", SayAs::Telephone)
        .say(" if you mix them up. Just remember that!");
    let speech = builder.build();

    // Create a speech synthesizer.
    let synth = Synthesizer::new(&config, SpeechOutput::Default).unwrap();

    // Render the speech. The markup commands adjust the voice's configured
    // rate and volume rather than overriding them.
    synth.speak(&speech).unwrap();

    // A speech can be rendered as often as needed.
    synth.speak(&speech).unwrap();

    // Release the native resources deterministically.
    synth.close().unwrap();
}

fn library_path() -> String {
    std::env::var("SPX_LIBRARY").unwrap_or_else(|_| "libspx.so".to_string())
}
