//! Windows System.Speech backend, driven through PowerShell.
//!
//! The text is read from stdin inside the script so it never has to be
//! escaped into the command line; only the voice name is quoted.

use super::{capture, Invocation, SpeechBackend};
use crate::error::SpeakerError;

const DEFAULT_PROGRAM: &str = "powershell";

const PRELUDE: &str = "Add-Type -AssemblyName System.Speech; \
     $synth = New-Object System.Speech.Synthesis.SpeechSynthesizer;";

pub struct SystemSpeech {
    program: String,
}

impl SystemSpeech {
    pub fn new(program: Option<&str>) -> Self {
        Self {
            program: program.unwrap_or(DEFAULT_PROGRAM).to_string(),
        }
    }

    fn script_args(script: String) -> Vec<String> {
        vec![
            "-NoProfile".into(),
            "-NonInteractive".into(),
            "-Command".into(),
            script,
        ]
    }
}

/// Single-quoted PowerShell string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl SpeechBackend for SystemSpeech {
    fn name(&self) -> &'static str {
        "system"
    }

    fn list_voices(&self) -> Result<Vec<String>, SpeakerError> {
        let script = format!(
            "{PRELUDE} $synth.GetInstalledVoices() | ForEach-Object {{ $_.VoiceInfo.Name }}"
        );
        let args = Self::script_args(script);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let listing = capture(&self.program, &args)?;

        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn utterance(&self, voice: Option<&str>, text: &str) -> Invocation {
        let select = voice
            .map(|v| format!(" $synth.SelectVoice({});", quote(v)))
            .unwrap_or_default();
        let script = format!("{PRELUDE}{select} $synth.Speak([Console]::In.ReadToEnd());");

        Invocation {
            program: self.program.clone(),
            args: Self::script_args(script),
            input: text.to_string(),
        }
    }
}
