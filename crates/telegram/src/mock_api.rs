//! In-process stand-in for the Telegram Bot API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{Method, StatusCode, Uri},
        response::{IntoResponse, Response},
    },
    serde_json::{Value, json},
    teloxide::Bot,
    tokio::sync::oneshot,
};

const NOT_MODIFIED: &str = "Bad Request: message is not modified: specified new message content and reply markup are exactly the same as a current content and reply markup of the message";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub body: Value,
}

/// Canned answers. Chats without a membership entry answer "chat not found".
#[derive(Clone, Default)]
pub struct MockBehavior {
    members: HashMap<String, String>,
    invite_links: HashMap<String, String>,
    file_bytes: Vec<u8>,
    edits_not_modified: bool,
}

impl MockBehavior {
    /// `chat` is the `chat_id` as sent: `@handle` or the numeric id.
    pub fn member(mut self, chat: &str, status: &str) -> Self {
        self.members.insert(chat.to_string(), status.to_string());
        self
    }

    /// Primary invite link reported by `getChat` for `chat`.
    pub fn invite_link(mut self, chat: &str, link: &str) -> Self {
        self.invite_links.insert(chat.to_string(), link.to_string());
        self
    }

    pub fn file(mut self, bytes: &[u8]) -> Self {
        self.file_bytes = bytes.to_vec();
        self
    }

    pub fn edits_not_modified(mut self) -> Self {
        self.edits_not_modified = true;
        self
    }
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    behavior: Arc<MockBehavior>,
}

pub struct MockTelegramApi {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    bot: Bot,
    shutdown: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

impl MockTelegramApi {
    pub async fn start(behavior: MockBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(handle).with_state(MockState {
            requests: Arc::clone(&requests),
            behavior: Arc::new(behavior),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = Bot::new("test-token").set_api_url(api_url);
        Self {
            requests,
            bot,
            shutdown,
            server,
        }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of every call to `method` (PascalCase, e.g. `SendMessage`).
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.body)
            .collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        self.server.await.expect("server join");
    }
}

fn chat_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ok(result: Value) -> Response {
    Json(json!({ "ok": true, "result": result })).into_response()
}

fn api_error(description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "ok": false, "error_code": 400, "description": description })),
    )
        .into_response()
}

fn message(body: &Value) -> Value {
    let chat_id = body["chat_id"].as_i64().unwrap_or(42);
    json!({
        "message_id": body["message_id"].as_i64().unwrap_or(7),
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
        "text": body["text"].as_str().unwrap_or("ok"),
    })
}

/// `ChatMember` JSON carrying every field the richer statuses require.
fn chat_member(status: &str, user_id: &Value) -> Value {
    let mut member = json!({
        "status": status,
        "user": { "id": user_id, "is_bot": false, "first_name": "Alice" },
        "is_anonymous": false,
        "until_date": 0,
        "is_member": true,
    });
    for permission in [
        "can_be_edited",
        "can_manage_chat",
        "can_change_info",
        "can_post_messages",
        "can_edit_messages",
        "can_delete_messages",
        "can_manage_video_chats",
        "can_invite_users",
        "can_restrict_members",
        "can_pin_messages",
        "can_promote_members",
        "can_manage_topics",
        "can_post_stories",
        "can_edit_stories",
        "can_delete_stories",
        "can_send_messages",
        "can_send_audios",
        "can_send_documents",
        "can_send_photos",
        "can_send_videos",
        "can_send_video_notes",
        "can_send_voice_notes",
        "can_send_polls",
        "can_send_other_messages",
        "can_add_web_page_previews",
    ] {
        member[permission] = json!(false);
    }
    member
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> Response {
    // File downloads: GET /file/bot<token>/<file_path>
    if method == Method::GET {
        return state.behavior.file_bytes.clone().into_response();
    }

    let api_method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(CapturedRequest {
        method: api_method.clone(),
        body: body.clone(),
    });

    match api_method.as_str() {
        "SendMessage" => ok(message(&body)),
        "EditMessageText" if state.behavior.edits_not_modified => api_error(NOT_MODIFIED),
        "EditMessageText" => ok(message(&body)),
        "GetChatMember" => {
            let chat = chat_key(&body["chat_id"]);
            match state.behavior.members.get(&chat) {
                Some(status) => ok(chat_member(status, &body["user_id"])),
                None => api_error("Bad Request: chat not found"),
            }
        },
        "GetChat" => {
            let mut chat = json!({
                "id": body["chat_id"],
                "type": "channel",
                "title": "Private channel",
            });
            if let Some(link) = state.behavior.invite_links.get(&chat_key(&body["chat_id"])) {
                chat["invite_link"] = json!(link);
            }
            ok(chat)
        },
        "GetFile" => ok(json!({
            "file_id": body["file_id"],
            "file_unique_id": "unique-1",
            "file_size": state.behavior.file_bytes.len(),
            "file_path": "documents/file_1.bin",
        })),
        "ExportChatInviteLink" => ok(json!("https://t.me/+invite")),
        _ => ok(json!(true)),
    }
}
