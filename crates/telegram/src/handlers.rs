use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{CallbackQuery, Chat, MediaKind, MessageKind, MessageOrigin, User},
    },
    tgrelay_channels::{MemberStatus, RequiredChannel},
    tgrelay_common::UserId as RelayUserId,
    tgrelay_config::{Severity, validate},
    tgrelay_relay::{
        RelayOutcome, RelayRequest, SourceHandle, StatusSink,
        naming::{MediaCategory, remote_file_name},
    },
    tokio::task::JoinHandle,
    tracing::{debug, error, info, warn},
};

use crate::{
    access::{NOT_AUTHORIZED, is_owner},
    error::Result,
    keyboard::{CHECK_SUBSCRIPTION, join_prompt, resolve_join_links},
    membership::member_status,
    source::MAX_DOWNLOAD_BYTES,
    state::BotState,
    status::{PROCESSING, TelegramStatus, render_outcome},
};

const THANKS_FOR_JOINING: &str = "🎉 Thanks for joining! Please send your file again.";
const STILL_NOT_JOINED: &str = "You still haven't joined all the required channels.";
const GENERIC_FAILURE: &str = "Sorry, an error occurred while processing your file.";

/// A downloadable attachment found on an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: u64,
    pub category: MediaCategory,
}

/// Handle a single inbound Telegram message (called from the polling loop).
pub async fn handle_message(msg: Message, state: &Arc<BotState>) -> anyhow::Result<()> {
    if let Some(MessageOrigin::Channel { chat, .. }) = msg.forward_origin()
        && msg.chat.is_private()
        && is_owner(state.owner_id, msg.from.as_ref())
    {
        let reply = register_forwarded_channel(state, chat).await?;
        state.bot.send_message(msg.chat.id, reply).await?;
        return Ok(());
    }

    if let Some(text) = extract_text(&msg)
        && text.starts_with('/')
    {
        if let Some(reply) = command_reply(&text, msg.from.as_ref(), state).await {
            state.bot.send_message(msg.chat.id, reply).await?;
        }
        return Ok(());
    }

    match extract_media(&msg) {
        Some(media) => {
            handle_media(&msg, media, state).await?;
        },
        None => {
            debug!(account_id = state.account_id, chat_id = msg.chat.id.0, "ignoring message without media");
        },
    }
    Ok(())
}

/// Gate the sender, then spawn the relay for `media`.
///
/// Returns the relay task when one was started so callers can await it.
pub async fn handle_media(
    msg: &Message,
    media: MediaFile,
    state: &Arc<BotState>,
) -> anyhow::Result<Option<JoinHandle<()>>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };
    let user_id = RelayUserId(user.id.0);
    let chat_id = msg.chat.id;
    let bot = &state.bot;

    let channels = match state.store.list(&state.account_id).await {
        Ok(channels) => channels,
        Err(e) => {
            error!(account_id = state.account_id, error = %e, "cannot read channel list");
            bot.send_message(chat_id, GENERIC_FAILURE).await?;
            return Ok(None);
        },
    };

    let membership = state.gate.check(user_id, &channels).await;
    if !membership.subscribed {
        info!(
            account_id = state.account_id,
            %user_id,
            blocking = membership.blocking_channels.len(),
            "user not subscribed, sending join prompt"
        );
        let links = resolve_join_links(bot, &membership.blocking_channels).await;
        let (text, markup) = join_prompt(&links);
        bot.send_message(chat_id, text).reply_markup(markup).await?;
        return Ok(None);
    }

    if let Err(missing) = state.pipeline.validate() {
        warn!(account_id = state.account_id, error = %missing, "upload destination incomplete");
        let outcome = RelayOutcome::ConfigurationError {
            missing_fields: missing.0.into_iter().map(String::from).collect(),
        };
        bot.send_message(chat_id, render_outcome(&outcome)).await?;
        return Ok(None);
    }

    if media.size > MAX_DOWNLOAD_BYTES {
        bot.send_message(
            chat_id,
            "This file is larger than the 20 MB that Telegram lets bots download.",
        )
        .await?;
        return Ok(None);
    }

    let placeholder = bot.send_message(chat_id, PROCESSING).await?;
    let status = Arc::new(TelegramStatus::new(bot.clone(), chat_id, placeholder.id));
    let request = RelayRequest {
        suggested_name: remote_file_name(
            media.file_name.as_deref(),
            media.category,
            media.mime_type.as_deref(),
        ),
        source: SourceHandle(media.file_id),
        size_hint: Some(media.size),
    };
    info!(
        account_id = state.account_id,
        %user_id,
        file_name = request.suggested_name,
        category = %media.category,
        "relaying file"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let account_id = state.account_id.clone();
    Ok(Some(tokio::spawn(async move {
        let outcome = pipeline
            .relay(request, Arc::clone(&status) as Arc<dyn StatusSink>)
            .await;
        if let Err(e) = status.set_status(&render_outcome(&outcome)).await {
            warn!(account_id, error = %e, "failed to show relay outcome");
        }
    })))
}

/// Handle the "I have joined" button.
pub async fn handle_callback_query(query: CallbackQuery, state: &Arc<BotState>) -> anyhow::Result<()> {
    let bot = &state.bot;
    if query.data.as_deref() != Some(CHECK_SUBSCRIPTION) {
        let _ = bot.answer_callback_query(&query.id).await;
        return Ok(());
    }

    let channels = match state.store.list(&state.account_id).await {
        Ok(channels) => channels,
        Err(e) => {
            error!(account_id = state.account_id, error = %e, "cannot read channel list");
            bot.answer_callback_query(&query.id)
                .text(GENERIC_FAILURE)
                .show_alert(true)
                .await?;
            return Ok(());
        },
    };

    let membership = state
        .gate
        .check(RelayUserId(query.from.id.0), &channels)
        .await;
    if !membership.subscribed {
        bot.answer_callback_query(&query.id)
            .text(STILL_NOT_JOINED)
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(&query.id).await?;
    if let Some(message) = query.message.as_ref() {
        match bot
            .edit_message_text(message.chat().id, message.id(), THANKS_FOR_JOINING)
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => {},
            Err(e) => warn!(account_id = state.account_id, error = %e, "failed to edit join prompt"),
        }
    }
    Ok(())
}

/// Reply to a slash command. `None` for commands this bot does not know.
pub async fn command_reply(text: &str, from: Option<&User>, state: &BotState) -> Option<String> {
    let mut parts = text.split_whitespace();
    let head = parts.next().unwrap_or_default().trim_start_matches('/');
    // "/cmd@BotName" in groups.
    let command = head.split('@').next().unwrap_or_default();
    let arg = parts.next();

    let reply = match command {
        "start" | "help" => start_text(from),
        "addchannel" | "delchannel" | "listchannels" | "env"
            if !is_owner(state.owner_id, from) =>
        {
            NOT_AUTHORIZED.to_string()
        },
        "addchannel" => add_channel(state, arg).await,
        "delchannel" => del_channel(state, arg).await,
        "listchannels" => list_channels(state).await,
        "env" => env_report(state),
        _ => return None,
    };
    Some(reply)
}

fn start_text(from: Option<&User>) -> String {
    let name = from.map_or_else(|| "there".to_string(), |u| u.first_name.clone());
    format!("Hi {name}! Send me any video or file, and I'll give you a direct download link.")
}

async fn add_channel(state: &BotState, arg: Option<&str>) -> String {
    let Some(raw) = arg else {
        return "Usage: /addchannel @channel_username".to_string();
    };
    let channel = match RequiredChannel::parse(raw) {
        Ok(channel) => channel,
        Err(e) => return format!("⚠️ {e}"),
    };
    match state.store.add(&state.account_id, channel.clone()).await {
        Ok(true) => {
            info!(account_id = state.account_id, %channel, "required channel added");
            format!("Channel {channel} added successfully.")
        },
        Ok(false) => format!("Channel {channel} is already in the list."),
        Err(e) => {
            error!(account_id = state.account_id, error = %e, "failed to save channel list");
            "Could not save the channel list.".to_string()
        },
    }
}

async fn del_channel(state: &BotState, arg: Option<&str>) -> String {
    let Some(raw) = arg else {
        return "Usage: /delchannel @channel_username".to_string();
    };
    let channel = match RequiredChannel::parse(raw) {
        Ok(channel) => channel,
        Err(e) => return format!("⚠️ {e}"),
    };
    match state.store.remove(&state.account_id, &channel).await {
        Ok(true) => {
            info!(account_id = state.account_id, %channel, "required channel removed");
            format!("Channel {channel} removed successfully.")
        },
        Ok(false) => format!("Channel {channel} not found in the list."),
        Err(e) => {
            error!(account_id = state.account_id, error = %e, "failed to save channel list");
            "Could not save the channel list.".to_string()
        },
    }
}

async fn list_channels(state: &BotState) -> String {
    match state.store.list(&state.account_id).await {
        Ok(channels) if channels.is_empty() => "No channels are currently required.".to_string(),
        Ok(channels) => {
            let lines: Vec<&str> = channels.iter().map(RequiredChannel::as_str).collect();
            format!("Required Channels:\n{}", lines.join("\n"))
        },
        Err(e) => {
            error!(account_id = state.account_id, error = %e, "cannot read channel list");
            "Could not read the channel list.".to_string()
        },
    }
}

/// Configuration summary for the owner. Never includes secrets.
fn env_report(state: &BotState) -> String {
    let config = &state.config;
    let dest = &config.destination;
    let show = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("(missing)")
            .to_string()
    };
    let password = match &dest.password {
        Some(p) if !p.expose_secret().trim().is_empty() => "set",
        _ => "(missing)",
    };

    let mut out = format!(
        "Bot instance: {}\nSFTP host: {}:{}\nSFTP user: {}\nSFTP password: {password}\nRemote path: {}\nPublic URL base: {}\nUpload timeout: {}s",
        config.telegram.account_id,
        show(&dest.host),
        dest.port,
        show(&dest.username),
        show(&dest.remote_base_path),
        show(&dest.public_url_base),
        dest.timeout_secs,
    );

    let result = validate(config, None);
    if result.diagnostics.is_empty() {
        out.push_str("\n\nNo problems found.");
    } else {
        out.push_str(&format!(
            "\n\n{} error(s), {} warning(s):",
            result.count(Severity::Error),
            result.count(Severity::Warning)
        ));
        for d in &result.diagnostics {
            out.push_str(&format!("\n• [{}] {}: {}", d.severity, d.path, d.message));
        }
    }
    out
}

/// Owner forwarded a post from a channel: require that channel, provided the
/// bot administers it (otherwise membership lookups there would fail).
async fn register_forwarded_channel(state: &BotState, chat: &Chat) -> Result<String> {
    let title = chat.title().unwrap_or("the channel");
    let Some(bot_id) = state.bot_user_id else {
        return Ok("I could not verify my own account yet. Please try again shortly.".into());
    };

    let is_admin = match state.bot.get_chat_member(chat.id, bot_id).await {
        Ok(member) => matches!(
            member_status(member.kind.status()),
            MemberStatus::Owner | MemberStatus::Administrator
        ),
        Err(e) => {
            warn!(account_id = state.account_id, chat_id = chat.id.0, error = %e, "cannot check bot rights in forwarded channel");
            false
        },
    };
    if !is_admin {
        return Ok(format!(
            "Make me an administrator of {title} first, then forward the post again."
        ));
    }

    let channel = RequiredChannel::from_chat_id(chat.id.0);
    let added = state.store.add(&state.account_id, channel.clone()).await?;
    Ok(if added {
        info!(account_id = state.account_id, %channel, "required channel added from forward");
        format!("Channel {title} ({channel}) added successfully.")
    } else {
        format!("Channel {title} ({channel}) is already in the list.")
    })
}

/// Extract text content from a message.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn mime_text(mime: Option<&impl std::fmt::Display>) -> Option<String> {
    mime.map(ToString::to_string)
}

/// Find a relayable attachment. Photos use the largest size.
pub fn extract_media(msg: &Message) -> Option<MediaFile> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    let media = match &common.media_kind {
        MediaKind::Video(v) => MediaFile {
            file_id: v.video.file.id.clone(),
            file_name: v.video.file_name.clone(),
            mime_type: mime_text(v.video.mime_type.as_ref()),
            size: u64::from(v.video.file.size),
            category: MediaCategory::Video,
        },
        MediaKind::Document(d) => MediaFile {
            file_id: d.document.file.id.clone(),
            file_name: d.document.file_name.clone(),
            mime_type: mime_text(d.document.mime_type.as_ref()),
            size: u64::from(d.document.file.size),
            category: MediaCategory::Document,
        },
        MediaKind::Audio(a) => MediaFile {
            file_id: a.audio.file.id.clone(),
            file_name: a.audio.file_name.clone(),
            mime_type: mime_text(a.audio.mime_type.as_ref()),
            size: u64::from(a.audio.file.size),
            category: MediaCategory::Audio,
        },
        MediaKind::Animation(a) => MediaFile {
            file_id: a.animation.file.id.clone(),
            file_name: a.animation.file_name.clone(),
            mime_type: mime_text(a.animation.mime_type.as_ref()),
            size: u64::from(a.animation.file.size),
            category: MediaCategory::Animation,
        },
        MediaKind::Voice(v) => MediaFile {
            file_id: v.voice.file.id.clone(),
            file_name: None,
            mime_type: mime_text(v.voice.mime_type.as_ref()),
            size: u64::from(v.voice.file.size),
            category: MediaCategory::Voice,
        },
        MediaKind::Photo(p) => {
            let largest = p.photo.last()?;
            MediaFile {
                file_id: largest.file.id.clone(),
                file_name: None,
                mime_type: Some("image/jpeg".into()),
                size: u64::from(largest.file.size),
                category: MediaCategory::Photo,
            }
        },
        _ => return None,
    };
    Some(media)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock_api::{MockBehavior, MockTelegramApi},
        secrecy::Secret,
        serde_json::{Value, json},
        std::path::Path,
        tgrelay_channels::{ChannelStore, FileChannelStore},
        tgrelay_config::{DestinationConfig, RelayConfig},
        tgrelay_relay::{
            Destination, FileRelayPipeline, ProgressReporter, Transport, TransportError,
        },
    };

    const OWNER: u64 = 1001;
    const STRANGER: u64 = 2002;

    /// Records uploads instead of talking SFTP.
    struct RecordingTransport {
        uploads: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Transport for RecordingTransport {
        fn upload(
            &self,
            _destination: &Destination,
            local: &Path,
            remote_path: &str,
            progress: &ProgressReporter,
        ) -> std::result::Result<u64, TransportError> {
            let data = std::fs::read(local).unwrap();
            let total = data.len() as u64;
            progress.report(total, total);
            self.uploads
                .lock()
                .unwrap()
                .push((remote_path.to_string(), data));
            Ok(total)
        }
    }

    fn destination() -> DestinationConfig {
        DestinationConfig {
            host: Some("files.example.com".into()),
            username: Some("uploader".into()),
            password: Some(Secret::new("hunter2".into())),
            remote_base_path: Some("/srv/drop".into()),
            public_url_base: Some("https://dl.example.com".into()),
            ..Default::default()
        }
    }

    struct Fixture {
        api: MockTelegramApi,
        state: Arc<BotState>,
        transport: Arc<RecordingTransport>,
        _data: tempfile::TempDir,
        _scratch: tempfile::TempDir,
    }

    async fn fixture(behavior: MockBehavior, channels: &[&str], dest: DestinationConfig) -> Fixture {
        let api = MockTelegramApi::start(behavior).await;
        let data = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(FileChannelStore::new(data.path()));
        for c in channels {
            store
                .add("default", RequiredChannel::parse(c).unwrap())
                .await
                .unwrap();
        }

        let mut config = RelayConfig::default();
        config.telegram.owner_id = Some(OWNER);
        config.destination = dest.clone();
        let transport = Arc::new(RecordingTransport {
            uploads: std::sync::Mutex::new(Vec::new()),
        });
        let pipeline = FileRelayPipeline::new(
            dest,
            Arc::new(crate::source::TelegramFileSource::new(api.bot())),
            Arc::clone(&transport) as Arc<dyn Transport>,
        )
        .with_scratch_dir(scratch.path());
        let state = BotState::new(api.bot(), Arc::new(config), store)
            .with_pipeline(pipeline)
            .with_bot_user_id(UserId(999));

        Fixture {
            api,
            state: Arc::new(state),
            transport,
            _data: data,
            _scratch: scratch,
        }
    }

    fn message(from: u64, extra: Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": from, "is_bot": false, "first_name": "Alice" },
        });
        value
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(value).expect("deserialize message")
    }

    fn document(from: u64, name: &str) -> Message {
        message(
            from,
            json!({
                "document": {
                    "file_id": "doc-1",
                    "file_unique_id": "doc-unique-1",
                    "file_name": name,
                    "mime_type": "video/mp4",
                    "file_size": 10
                }
            }),
        )
    }

    fn command(from: u64, text: &str) -> Message {
        message(from, json!({ "text": text }))
    }

    fn sent_texts(api: &MockTelegramApi) -> Vec<String> {
        api.calls("SendMessage")
            .iter()
            .map(|b| b["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn extracts_document_metadata() {
        let media = extract_media(&document(OWNER, "clip.mp4")).unwrap();
        assert_eq!(media, MediaFile {
            file_id: "doc-1".into(),
            file_name: Some("clip.mp4".into()),
            mime_type: Some("video/mp4".into()),
            size: 10,
            category: MediaCategory::Document,
        });
        assert!(extract_media(&command(OWNER, "hello")).is_none());
    }

    #[test]
    fn photos_use_largest_size() {
        let msg = message(
            OWNER,
            json!({
                "photo": [
                    { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1 },
                    { "file_id": "large", "file_unique_id": "l", "width": 800, "height": 800, "file_size": 9 }
                ]
            }),
        );
        let media = extract_media(&msg).unwrap();
        assert_eq!(media.file_id, "large");
        assert_eq!(media.category, MediaCategory::Photo);
        assert_eq!(media.file_name, None);
    }

    #[tokio::test]
    async fn empty_channel_list_relays_to_public_url() {
        let f = fixture(MockBehavior::default().file(b"0123456789"), &[], destination()).await;

        let msg = document(STRANGER, "clip.mp4");
        let media = extract_media(&msg).unwrap();
        let task = handle_media(&msg, media, &f.state).await.unwrap().unwrap();
        task.await.unwrap();

        assert_eq!(sent_texts(&f.api), vec![PROCESSING.to_string()]);
        let edits = f.api.calls("EditMessageText");
        let last = edits.last().unwrap()["text"].as_str().unwrap().to_string();
        assert!(last.ends_with("https://dl.example.com/clip.mp4"), "{last}");
        assert_eq!(f.transport.uploads.lock().unwrap().clone(), vec![(
            "/srv/drop/clip.mp4".to_string(),
            b"0123456789".to_vec()
        )]);
        assert!(f.api.calls("GetChatMember").is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn non_member_gets_join_prompt_and_no_relay() {
        let f = fixture(
            MockBehavior::default().member("@xchan", "left"),
            &["@xchan"],
            destination(),
        )
        .await;

        handle_message(document(STRANGER, "clip.mp4"), &f.state)
            .await
            .unwrap();

        let sent = f.api.calls("SendMessage");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["text"], crate::keyboard::JOIN_PROMPT);
        let keyboard = &sent[0]["reply_markup"]["inline_keyboard"];
        assert_eq!(keyboard[0][0]["url"], "https://t.me/xchan");
        assert_eq!(keyboard[1][0]["callback_data"], CHECK_SUBSCRIPTION);
        assert!(f.api.calls("GetFile").is_empty());
        assert!(f.transport.uploads.lock().unwrap().is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_channel_blocks() {
        let f = fixture(MockBehavior::default(), &["@gone_chan"], destination()).await;

        handle_message(document(STRANGER, "clip.mp4"), &f.state)
            .await
            .unwrap();

        assert_eq!(sent_texts(&f.api), vec![crate::keyboard::JOIN_PROMPT.to_string()]);
        assert!(f.transport.uploads.lock().unwrap().is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn incomplete_destination_is_reported_without_download() {
        let mut dest = destination();
        dest.remote_base_path = None;
        let f = fixture(MockBehavior::default().file(b"0123456789"), &[], dest).await;

        handle_message(document(STRANGER, "clip.mp4"), &f.state)
            .await
            .unwrap();

        let texts = sent_texts(&f.api);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].ends_with("Missing settings: remoteBasePath"));
        assert!(f.api.calls("GetFile").is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn oversized_files_are_refused() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;
        let msg = message(
            STRANGER,
            json!({
                "document": {
                    "file_id": "doc-big",
                    "file_unique_id": "doc-big-u",
                    "file_name": "movie.mkv",
                    "file_size": 50 * 1024 * 1024
                }
            }),
        );

        handle_message(msg, &f.state).await.unwrap();

        assert!(sent_texts(&f.api)[0].contains("20 MB"));
        assert!(f.api.calls("GetFile").is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn admin_commands_manage_channel_list() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        for text in [
            "/addchannel @relay_news",
            "/addchannel https://t.me/relay_news",
            "/listchannels",
            "/delchannel @relay_news",
            "/delchannel @relay_news",
            "/listchannels",
            "/addchannel",
            "/addchannel not-a-channel",
        ] {
            handle_message(command(OWNER, text), &f.state).await.unwrap();
        }

        let texts = sent_texts(&f.api);
        assert_eq!(texts[0], "Channel @relay_news added successfully.");
        assert_eq!(texts[1], "Channel @relay_news is already in the list.");
        assert_eq!(texts[2], "Required Channels:\n@relay_news");
        assert_eq!(texts[3], "Channel @relay_news removed successfully.");
        assert_eq!(texts[4], "Channel @relay_news not found in the list.");
        assert_eq!(texts[5], "No channels are currently required.");
        assert_eq!(texts[6], "Usage: /addchannel @channel_username");
        assert!(texts[7].starts_with("⚠️ invalid channel"));
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn admin_commands_require_owner() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        handle_message(command(STRANGER, "/addchannel @relay_news"), &f.state)
            .await
            .unwrap();
        handle_message(command(STRANGER, "/env"), &f.state)
            .await
            .unwrap();

        assert_eq!(sent_texts(&f.api), vec![
            NOT_AUTHORIZED.to_string(),
            NOT_AUTHORIZED.to_string()
        ]);
        assert!(f.state.store.list("default").await.unwrap().is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn env_report_hides_password() {
        let mut dest = destination();
        dest.public_url_base = None;
        let f = fixture(MockBehavior::default(), &[], dest).await;

        handle_message(command(OWNER, "/env@relay_bot"), &f.state)
            .await
            .unwrap();

        let report = sent_texts(&f.api).remove(0);
        assert!(report.contains("SFTP password: set"));
        assert!(report.contains("Public URL base: (missing)"));
        assert!(report.contains("destination.public_url_base"));
        assert!(!report.contains("hunter2"));
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn start_greets_anyone_and_unknown_commands_are_ignored() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        handle_message(command(STRANGER, "/start"), &f.state)
            .await
            .unwrap();
        handle_message(command(STRANGER, "/bogus"), &f.state)
            .await
            .unwrap();

        let texts = sent_texts(&f.api);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Hi Alice!"));
        f.api.shutdown().await;
    }

    fn recheck_query(from: u64) -> CallbackQuery {
        serde_json::from_value(json!({
            "id": "cb-1",
            "from": { "id": from, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "ci-1",
            "data": CHECK_SUBSCRIPTION,
            "message": {
                "message_id": 5,
                "date": 1,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "text": crate::keyboard::JOIN_PROMPT
            }
        }))
        .expect("deserialize callback query")
    }

    #[tokio::test]
    async fn recheck_alerts_while_still_blocked() {
        let f = fixture(
            MockBehavior::default().member("@xchan", "left"),
            &["@xchan"],
            destination(),
        )
        .await;

        handle_callback_query(recheck_query(STRANGER), &f.state)
            .await
            .unwrap();

        let answers = f.api.calls("AnswerCallbackQuery");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["text"], STILL_NOT_JOINED);
        assert_eq!(answers[0]["show_alert"], true);
        assert!(f.api.calls("EditMessageText").is_empty());
        assert_eq!(f.api.calls("GetChatMember").len(), 1);
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn recheck_thanks_once_admitted() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        handle_callback_query(recheck_query(STRANGER), &f.state)
            .await
            .unwrap();

        let edits = f.api.calls("EditMessageText");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0]["text"], THANKS_FOR_JOINING);
        assert_eq!(edits[0]["message_id"], 5);
        f.api.shutdown().await;
    }

    fn forwarded_post(from: u64) -> Message {
        let channel = json!({ "id": -100777, "type": "channel", "title": "Relay News" });
        message(
            from,
            json!({
                "text": "channel post",
                "forward_origin": {
                    "type": "channel",
                    "chat": channel,
                    "message_id": 3,
                    "date": 1
                },
                "forward_from_chat": channel,
                "forward_from_message_id": 3,
                "forward_date": 1
            }),
        )
    }

    #[tokio::test]
    async fn forwarded_post_needs_bot_admin_rights() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        handle_message(forwarded_post(OWNER), &f.state)
            .await
            .unwrap();

        assert!(sent_texts(&f.api)[0].starts_with("Make me an administrator of Relay News"));
        assert!(f.state.store.list("default").await.unwrap().is_empty());
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn forwarded_post_registers_channel_when_bot_is_admin() {
        let f = fixture(
            MockBehavior::default().member("-100777", "administrator"),
            &[],
            destination(),
        )
        .await;

        handle_message(forwarded_post(OWNER), &f.state)
            .await
            .unwrap();
        handle_message(forwarded_post(OWNER), &f.state)
            .await
            .unwrap();

        let lookups = f.api.calls("GetChatMember");
        assert_eq!(lookups[0]["chat_id"], -100777);
        assert_eq!(lookups[0]["user_id"], 999);
        assert_eq!(f.state.store.list("default").await.unwrap(), vec![
            RequiredChannel::from_chat_id(-100777)
        ]);
        let texts = sent_texts(&f.api);
        assert_eq!(texts[0], "Channel Relay News (-100777) added successfully.");
        assert_eq!(texts[1], "Channel Relay News (-100777) is already in the list.");
        f.api.shutdown().await;
    }

    #[tokio::test]
    async fn forwarded_post_from_stranger_is_not_registration() {
        let f = fixture(MockBehavior::default(), &[], destination()).await;

        handle_message(forwarded_post(STRANGER), &f.state)
            .await
            .unwrap();

        assert!(f.api.calls("GetChatMember").is_empty());
        assert!(sent_texts(&f.api).is_empty());
        f.api.shutdown().await;
    }
}
