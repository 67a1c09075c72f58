//! espeak-ng backend.

use super::{capture, Invocation, SpeechBackend};
use crate::error::SpeakerError;

const DEFAULT_PROGRAM: &str = "espeak-ng";

pub struct Espeak {
    program: String,
}

impl Espeak {
    pub fn new(program: Option<&str>) -> Self {
        Self {
            program: program.unwrap_or(DEFAULT_PROGRAM).to_string(),
        }
    }
}

impl SpeechBackend for Espeak {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn list_voices(&self) -> Result<Vec<String>, SpeakerError> {
        let listing = capture(&self.program, &["--voices"])?;
        Ok(parse_voice_listing(&listing))
    }

    fn utterance(&self, voice: Option<&str>, text: &str) -> Invocation {
        let mut args = Vec::new();
        if let Some(voice) = voice {
            args.push("-v".to_string());
            args.push(voice.to_string());
        }
        args.push("--stdin".to_string());

        Invocation {
            program: self.program.clone(),
            args,
            input: text.to_string(),
        }
    }
}

/// Pull the language column out of `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
fn parse_voice_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_listing_uses_language_column() {
        let listing = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  fr-fr           --/M      French_(France)    roa/fr
";
        assert_eq!(parse_voice_listing(listing), vec!["af", "en-us", "fr-fr"]);
    }

    #[test]
    fn utterance_selects_voice_and_reads_stdin() {
        let espeak = Espeak::new(None);

        let plain = espeak.utterance(None, "hi");
        assert_eq!(plain.program, "espeak-ng");
        assert_eq!(plain.args, vec!["--stdin"]);
        assert_eq!(plain.input, "hi");

        let voiced = espeak.utterance(Some("en-us"), "-dash first");
        assert_eq!(voiced.args, vec!["-v", "en-us", "--stdin"]);
        assert_eq!(voiced.input, "-dash first");
    }
}
