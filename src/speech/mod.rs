//! Speech output.
//!
//! `SpeechEngine` is the seam the dispatcher talks to. The shipped engine
//! drives an external synthesizer command per utterance:
//! - `system`: Windows System.Speech through PowerShell
//! - `espeak`: espeak-ng
//!
//! Blocking speech runs the command in place; queued speech is handed to a
//! worker thread that plays utterances one at a time in submission order.

pub mod espeak;
pub mod system;

use std::cell::OnceCell;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info, warn};

use crate::config::{SpeechBackendKind, SpeechConfig};
use crate::error::SpeakerError;

pub trait SpeechEngine {
    /// Names accepted by `select_voice`, as the synthesizer reports them.
    fn installed_voices(&self) -> Result<Vec<String>, SpeakerError>;

    /// Selected voice, `None` for the synthesizer default.
    fn current_voice(&self) -> Option<String>;

    /// Select a voice by exact name, or go back to the default with `None`.
    fn select_voice(&mut self, voice: Option<&str>) -> Result<(), SpeakerError>;

    /// Speak and wait until playback has finished.
    fn speak(&mut self, text: &str) -> Result<(), SpeakerError>;

    /// Queue text behind anything already queued and return immediately.
    fn speak_async(&mut self, text: &str) -> Result<(), SpeakerError>;
}

/// One synthesizer run: the command line plus the text fed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub input: String,
}

impl Invocation {
    /// Run to completion, failing on spawn errors or a non-zero exit.
    pub fn run(&self) -> Result<(), SpeakerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpeakerError::Speech(format!("Failed to spawn {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.input.as_bytes())
                .map_err(|e| SpeakerError::Speech(format!("Failed to write to {}: {e}", self.program)))?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeakerError::Speech(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Run a command and return its stdout, for voice enumeration.
fn capture(program: &str, args: &[&str]) -> Result<String, SpeakerError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| SpeakerError::Speech(format!("Failed to run {program}: {e}")))?;

    if !output.status.success() {
        return Err(SpeakerError::Speech(format!(
            "{program} exited with {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A synthesizer reachable through a command line.
pub trait SpeechBackend {
    fn name(&self) -> &'static str;
    fn list_voices(&self) -> Result<Vec<String>, SpeakerError>;
    fn utterance(&self, voice: Option<&str>, text: &str) -> Invocation;
}

/// `SpeechEngine` over a command-line backend.
pub struct CommandEngine<B: SpeechBackend> {
    backend: B,
    voice: Option<String>,
    installed: OnceCell<Vec<String>>,
    queue: mpsc::Sender<Invocation>,
}

impl<B: SpeechBackend> CommandEngine<B> {
    pub fn new(backend: B) -> Self {
        let (queue, rx) = mpsc::channel::<Invocation>();
        let name = backend.name();

        // Detached: the worker exits once the engine (and its sender) is dropped.
        thread::spawn(move || {
            for invocation in rx {
                if let Err(e) = invocation.run() {
                    warn!("Queued speech failed ({name}): {e}");
                }
            }
            debug!("Speech queue closed ({name})");
        });

        info!("Speech engine initialized (backend: {name})");

        Self {
            backend,
            voice: None,
            installed: OnceCell::new(),
            queue,
        }
    }

    fn cached_voices(&self) -> Result<&[String], SpeakerError> {
        if let Some(voices) = self.installed.get() {
            return Ok(voices.as_slice());
        }
        let voices = self.backend.list_voices()?;
        Ok(self.installed.get_or_init(|| voices).as_slice())
    }
}

impl<B: SpeechBackend> SpeechEngine for CommandEngine<B> {
    fn installed_voices(&self) -> Result<Vec<String>, SpeakerError> {
        self.cached_voices().map(<[String]>::to_vec)
    }

    fn current_voice(&self) -> Option<String> {
        self.voice.clone()
    }

    fn select_voice(&mut self, voice: Option<&str>) -> Result<(), SpeakerError> {
        if let Some(name) = voice {
            let installed = self.cached_voices()?;
            if !installed.iter().any(|v| v == name) {
                return Err(SpeakerError::into_voice_not_found(name, installed));
            }
        }
        self.voice = voice.map(str::to_string);
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeakerError> {
        debug!("Speaking {} characters", text.len());
        self.backend.utterance(self.voice.as_deref(), text).run()
    }

    fn speak_async(&mut self, text: &str) -> Result<(), SpeakerError> {
        let invocation = self.backend.utterance(self.voice.as_deref(), text);
        self.queue
            .send(invocation)
            .map_err(|_| SpeakerError::Speech("speech queue worker has stopped".into()))
    }
}

/// Build the engine named in the config.
pub fn from_config(config: &SpeechConfig) -> Box<dyn SpeechEngine> {
    let program = config.program_override();
    match config.resolved_backend() {
        SpeechBackendKind::System => Box::new(CommandEngine::new(system::SystemSpeech::new(program))),
        _ => Box::new(CommandEngine::new(espeak::Espeak::new(program))),
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording engine for dispatcher and session tests.

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Select(Option<String>),
        Speak { voice: Option<String>, text: String },
        SpeakAsync { voice: Option<String>, text: String },
    }

    #[derive(Default)]
    pub struct RecordingEngine {
        pub voices: Vec<String>,
        pub voice: Option<String>,
        pub calls: Vec<Call>,
        pub fail_speech: bool,
    }

    impl RecordingEngine {
        pub fn with_voices(voices: &[&str]) -> Self {
            Self {
                voices: voices.iter().map(|v| v.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn spoken(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| !matches!(c, Call::Select(_)))
                .collect()
        }
    }

    impl SpeechEngine for RecordingEngine {
        fn installed_voices(&self) -> Result<Vec<String>, SpeakerError> {
            Ok(self.voices.clone())
        }

        fn current_voice(&self) -> Option<String> {
            self.voice.clone()
        }

        fn select_voice(&mut self, voice: Option<&str>) -> Result<(), SpeakerError> {
            if let Some(name) = voice {
                if !self.voices.iter().any(|v| v == name) {
                    return Err(SpeakerError::into_voice_not_found(name, &self.voices));
                }
            }
            self.voice = voice.map(str::to_string);
            self.calls.push(Call::Select(self.voice.clone()));
            Ok(())
        }

        fn speak(&mut self, text: &str) -> Result<(), SpeakerError> {
            self.calls.push(Call::Speak {
                voice: self.voice.clone(),
                text: text.to_string(),
            });
            if self.fail_speech {
                return Err(SpeakerError::Speech("device unplugged".into()));
            }
            Ok(())
        }

        fn speak_async(&mut self, text: &str) -> Result<(), SpeakerError> {
            self.calls.push(Call::SpeakAsync {
                voice: self.voice.clone(),
                text: text.to_string(),
            });
            if self.fail_speech {
                return Err(SpeakerError::Speech("device unplugged".into()));
            }
            Ok(())
        }
    }

    /// Lets a test inspect the recording engine after it is boxed.
    #[derive(Clone, Default)]
    pub struct SharedEngine(pub Rc<RefCell<RecordingEngine>>);

    impl SharedEngine {
        pub fn new(engine: RecordingEngine) -> Self {
            Self(Rc::new(RefCell::new(engine)))
        }

        /// Texts handed to `speak_async`, in submission order.
        pub fn queued(&self) -> Vec<String> {
            self.0
                .borrow()
                .calls
                .iter()
                .filter_map(|c| match c {
                    Call::SpeakAsync { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl SpeechEngine for SharedEngine {
        fn installed_voices(&self) -> Result<Vec<String>, SpeakerError> {
            self.0.borrow().installed_voices()
        }
        fn current_voice(&self) -> Option<String> {
            self.0.borrow().current_voice()
        }
        fn select_voice(&mut self, voice: Option<&str>) -> Result<(), SpeakerError> {
            self.0.borrow_mut().select_voice(voice)
        }
        fn speak(&mut self, text: &str) -> Result<(), SpeakerError> {
            self.0.borrow_mut().speak(text)
        }
        fn speak_async(&mut self, text: &str) -> Result<(), SpeakerError> {
            self.0.borrow_mut().speak_async(text)
        }
    }
}
