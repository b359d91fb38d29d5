//! This example showcases event-based continuous recognition. The recognizer
//! transcribes everything said into the default microphone, and every final
//! recognition containing the word "half" increments a counter. When the user
//! signals they are finished reading, the program prints out the value of the
//! counter.

use std::io::{stdin, BufRead};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spx_lite::stt::{RecognitionEvent, RecognitionInput, Recognizer};
use spx_lite::SpeechConfig;

const INSTRUCTIONS: &str = r#"
Choose a text and read it out loud. For example:

"I don't know half of you half as well as I should like;
and I like less than half of you half as well as you deserve."

When you're done, press ENTER to see how many utterances mentioned "half".
"#;

fn main() {
    // Load the native core and hand its entry points to the crate.
    spx_lite::initialize_from_library(library_path()).unwrap();

    let config = SpeechConfig::from_subscription(
        &std::env::var("SPX_KEY").expect("set SPX_KEY to your subscription key"),
        &std::env::var("SPX_REGION").expect("set SPX_REGION to your service region"),
    )
    .unwrap();

    // Print out the instructions for the user.
    println!("{}", INSTRUCTIONS);

    let recognizer = Recognizer::new(&config, RecognitionInput::Default).unwrap();

    // Create the counter to use in our event handler. Note that the handler
    // needs to have a static lifetime, so it gets its own reference.
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let counter = counter.clone();
        recognizer
            .recognized()
            .subscribe(move |event: RecognitionEvent| {
                if event.result().text().to_lowercase().contains("half") {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
            .unwrap();
    }

    // Transcribe continuously until the user presses ENTER.
    recognizer.start_continuous().unwrap();
    stdin().lock().lines().next();
    recognizer.stop_continuous().unwrap();

    // Display the value of the counter.
    let count = counter.load(Ordering::Relaxed);
    println!(
        "You mentioned \"half\" in exactly {} {}.",
        count,
        if count == 1 { "utterance" } else { "utterances" }
    );

    // Release the native resources deterministically.
    recognizer.close().unwrap();
}

fn library_path() -> String {
    std::env::var("SPX_LIBRARY").unwrap_or_else(|_| "libspx.so".to_string())
}
