use {
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{ChatId, MessageId},
    },
    tgrelay_relay::{ConnectionErrorKind, RelayOutcome, StatusSink, transport::TIMEOUT_HINT},
};

pub const PROCESSING: &str = "Processing your file…";

/// The status message of one relay, edited in place.
#[derive(Clone)]
pub struct TelegramStatus {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
}

impl TelegramStatus {
    pub fn new(bot: Bot, chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
        }
    }
}

#[async_trait]
impl StatusSink for TelegramStatus {
    async fn set_status(&self, text: &str) -> anyhow::Result<()> {
        match self
            .bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Final text for the status message.
#[must_use]
pub fn render_outcome(outcome: &RelayOutcome) -> String {
    match outcome {
        RelayOutcome::Success { public_url } => {
            format!("✅ Here is your direct download link:\n\n{public_url}")
        },
        RelayOutcome::ConfigurationError { missing_fields } => format!(
            "⚠️ The upload destination is not configured. Missing settings: {}",
            missing_fields.join(", ")
        ),
        RelayOutcome::ConnectionError { kind, detail } => match kind {
            ConnectionErrorKind::Auth => {
                "❌ The file host rejected the login. Check the SFTP username and password."
                    .to_string()
            },
            ConnectionErrorKind::Timeout => format!("❌ Upload timed out: {TIMEOUT_HINT}."),
            ConnectionErrorKind::Other => format!("❌ Upload failed: {detail}"),
        },
        RelayOutcome::UnexpectedError { .. } => {
            "Sorry, an error occurred while processing your file.".to_string()
        },
    }
}
