//! Daemon - the Nova service
//!
//! Wires configuration into the HTTP server (`serve`) and into the voice
//! loop (`listen`): session → dispatcher → rendered and spoken reply.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::api::ApiServerBuilder;
use crate::assistant::{
    Assistant, Classifier, CommandResponse, Directive, KnowledgeBase, LocalAssistant, Payload,
    RemoteAssistant,
};
use crate::db::{self, CommandLog, CommandLogRepo, DbPool, NullCommandLog, record_command};
use crate::voice::{
    CaptureBackend, CaptureSettings, CloudSynthesizer, ConsoleCapture, ConsoleSynthesizer,
    MicrophoneCapture, SessionOptions, Speaker, SpeechToText, SynthesisBackend, TextToSpeech,
    VoiceSession, WakeWord,
};
use crate::{Config, Error, Result};

/// Options for the voice loop
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenOptions {
    /// Read typed utterances from stdin instead of the microphone
    pub console: bool,
    /// Print replies instead of speaking them
    pub mute: bool,
}

/// Forwards commands to an assistant and logs the exchange
pub struct Dispatcher {
    assistant: Arc<dyn Assistant>,
    log: Arc<dyn CommandLog>,
    user_id: Option<String>,
}

impl Dispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(assistant: Arc<dyn Assistant>, log: Arc<dyn CommandLog>) -> Self {
        Self {
            assistant,
            log,
            user_id: None,
        }
    }

    /// Tag logged commands with a user ID
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Answer a command; never fails
    pub async fn dispatch(&self, command: &str) -> CommandResponse {
        let response = self.assistant.respond(command).await;
        tracing::info!(
            assistant = self.assistant.name(),
            command,
            action = response.action.as_str(),
            "command answered"
        );
        record_command(self.log.as_ref(), command, &response, self.user_id.as_deref());
        response
    }
}

/// Render a response for a terminal
///
/// The reply text is included only when `with_text` is set; the link or
/// requested fields are always shown.
#[must_use]
pub fn render(response: &CommandResponse, with_text: bool) -> String {
    let mut out = String::new();
    if with_text {
        out.push_str(&response.response);
    }

    match (&response.action, &response.data) {
        (Directive::SuggestLink, Some(Payload::Url(url))) => {
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = write!(out, "  -> {url}");
        }
        (Directive::CollectDetails, Some(Payload::FollowUp(follow_up))) => {
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = write!(out, "  Please provide: {}", follow_up.fields.join(", "));
        }
        _ => {}
    }

    out
}

/// The Nova daemon
pub struct Daemon {
    config: Config,
    db: DbPool,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the command log database cannot be opened
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.database_path();
        let db = db::init(&db_path)?;

        tracing::info!(path = %db_path.display(), "command log opened");

        Ok(Self { config, db })
    }

    /// Classifier built from configuration
    #[must_use]
    pub fn classifier(&self) -> Classifier {
        Classifier::new(KnowledgeBase::default().with_default_city(&self.config.assistant.default_city))
    }

    /// Command log repository
    #[must_use]
    pub fn command_log(&self) -> CommandLogRepo {
        CommandLogRepo::new(self.db.clone())
    }

    /// Dispatcher for the configured classifier
    ///
    /// A remote classifier logs on the server side, so local logging is
    /// only done for in-process classification.
    ///
    /// # Errors
    ///
    /// Returns error if the remote client cannot be built
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        match &self.config.assistant.backend_url {
            Some(url) => {
                tracing::info!(url = %url, "using remote classifier");
                Ok(Dispatcher::new(
                    Arc::new(RemoteAssistant::new(url)?),
                    Arc::new(NullCommandLog),
                ))
            }
            None => Ok(Dispatcher::new(
                Arc::new(LocalAssistant::new(self.classifier())),
                Arc::new(self.command_log()),
            )),
        }
    }

    /// Serve the HTTP API until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn serve(self) -> Result<()> {
        let server = ApiServerBuilder::new(self.config.api_server.port)
            .classifier(self.classifier())
            .command_log(self.command_log())
            .voice_config(&self.config.voice, self.config.api_keys.openai.is_some())
            .static_dir(self.config.api_server.static_dir.clone())
            .build();

        tokio::select! {
            result = server.run() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                Ok(())
            }
        }
    }

    /// Run the voice loop until interrupted or input ends
    ///
    /// # Errors
    ///
    /// Returns error if the voice resources cannot be set up
    pub async fn listen(self, options: ListenOptions) -> Result<()> {
        let dispatcher = self.dispatcher()?;
        let capture = self.capture_backend(options)?;
        let (synthesis, cloud_speech) = self.synthesis_backend(options);

        let speaker = Speaker::new(synthesis, self.config.voice.preferred_voices.clone());
        let session = VoiceSession::new(
            Arc::clone(&capture),
            speaker,
            WakeWord::new(&self.config.voice.wake_word)?,
            SessionOptions {
                capture: CaptureSettings::single_shot(self.config.voice.locale.clone()),
                settle_delay: self.config.voice.settle_delay,
            },
        );

        tracing::info!("nova ready - say \"{}\"", session.wake_word());

        loop {
            let outcome = tokio::select! {
                outcome = session.listen() => outcome,
                _ = tokio::signal::ctrl_c() => {
                    session.stop();
                    tracing::info!("shutdown requested");
                    break;
                }
            };

            match outcome {
                Ok(command) => {
                    let response = dispatcher.dispatch(&command).await;
                    let rendered = render(&response, cloud_speech);
                    if !rendered.is_empty() {
                        println!("{rendered}");
                    }
                    session.speak(&response.response).await;
                }
                Err(e @ Error::UnsupportedCapability(_)) => return Err(e),
                Err(e) => {
                    if !capture.is_available() {
                        tracing::info!("input closed");
                        break;
                    }
                    tracing::debug!(error = %e, "no command captured");
                }
            }
        }

        Ok(())
    }

    fn capture_backend(&self, options: ListenOptions) -> Result<Arc<dyn CaptureBackend>> {
        if options.console {
            return Ok(Arc::new(ConsoleCapture::stdin()));
        }

        let api_key = self.config.api_keys.openai.clone().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY required for microphone capture (or use --console)".to_string())
        })?;
        let stt = SpeechToText::new_whisper(
            api_key,
            self.config.voice.stt_model.clone(),
            &self.config.voice.locale,
        )?;
        Ok(Arc::new(MicrophoneCapture::new(stt)?))
    }

    /// Synthesis backend and whether it produces audio
    fn synthesis_backend(&self, options: ListenOptions) -> (Arc<dyn SynthesisBackend>, bool) {
        if options.mute {
            return (Arc::new(ConsoleSynthesizer), false);
        }

        let Some(api_key) = self.config.api_keys.openai.clone() else {
            tracing::info!("no OPENAI_API_KEY, replies will be printed");
            return (Arc::new(ConsoleSynthesizer), false);
        };

        let cloud = TextToSpeech::new_openai(
            api_key,
            self.config.voice.tts_voice.clone(),
            self.config.voice.tts_model.clone(),
        )
        .and_then(CloudSynthesizer::new);

        match cloud {
            Ok(synth) => (Arc::new(synth), true),
            Err(e) => {
                tracing::warn!(error = %e, "speech output unavailable, replies will be printed");
                (Arc::new(ConsoleSynthesizer), false)
            }
        }
    }
}
