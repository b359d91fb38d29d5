//! A bare-bones speech recognition example.

use spx_lite::stt::{RecognitionInput, Recognizer};
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

    println!("The Doors of Durin, Lord of Moria. Speak, friend, and enter.");

    // Create a recognizer that listens to the default microphone.
    let recognizer = Recognizer::new(&config, RecognitionInput::Default).unwrap();

    // Transcribe a single utterance and wait for it.
    let result = recognizer.recognize_once().unwrap();
    if result.text().to_lowercase().contains("friend") {
        println!("The gate swings open. Welcome to Moria.");
    } else {
        println!("The gate to Moria remains shut. You said: {:?}", result.text());
    }

    // Release the native resources deterministically.
    recognizer.close().unwrap();
}

fn library_path() -> String {
    std::env::var("SPX_LIBRARY").unwrap_or_else(|_| "libspx.so".to_string())
}
