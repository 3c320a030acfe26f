//! Prompt texts sent to the generative service.

use crate::types::FragmentMode;

pub const GENERAL_FRAGMENT_PROMPT: &str = "Provide a single, visually evocative verse from the King James Bible. Ensure the verse is suitable for artistic interpretation.";

pub const REVELATION_FRAGMENT_PROMPT: &str = "Provide a single, random, visually evocative verse from the book of Revelation in the King James Bible. Ensure the verse is suitable for artistic interpretation.";

pub fn fragment_prompt(mode: FragmentMode) -> &'static str {
    match mode {
        FragmentMode::General => GENERAL_FRAGMENT_PROMPT,
        FragmentMode::Revelation => REVELATION_FRAGMENT_PROMPT,
    }
}

/// Example reference shown to the model in the response schema.
pub fn reference_example(mode: FragmentMode) -> &'static str {
    match mode {
        FragmentMode::General => "Genesis 1:1",
        FragmentMode::Revelation => "Revelation 1:8",
    }
}

/// Wrap fragment text in the fixed visual style used for every reward image.
pub fn image_prompt(fragment_text: &str) -> String {
    format!(
        "A photo-realistic, hyper-realistic square image as if filmed by an 8mm camera, \
         interpreting the Bible verse: \"{fragment_text}\". The aesthetic is heavily inspired \
         by 1970s Turkish Giallo thrillers and the directorial style of Dario Argento and Mario \
         Bava. The scene should feature bold, saturated colors (especially reds, blues, and \
         yellows), dramatic lighting with high contrast and deep shadows, and a surreal, \
         dreamlike quality. If a person is present, they should be a beautiful, stylized woman \
         with a sense of mystery or fear. The overall mood is striking, beautiful, and slightly \
         unsettling. Cinematic, 35mm film grain. The final image must contain NO text, letters, \
         writing, or watermarks whatsoever."
    )
}
