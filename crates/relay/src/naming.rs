//! Remote file naming.

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Video,
    Document,
    Audio,
    Animation,
    Photo,
    Voice,
}

impl MediaCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Animation => "animation",
            Self::Photo => "photo",
            Self::Voice => "voice",
        }
    }

    fn default_extension(self) -> Option<&'static str> {
        match self {
            Self::Video | Self::Animation => Some("mp4"),
            Self::Photo => Some("jpg"),
            Self::Voice => Some("ogg"),
            Self::Audio => Some("mp3"),
            Self::Document => None,
        }
    }
}

impl std::fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a MIME type to a file extension. Unknown types yield `None`.
#[must_use]
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.split(';').next().unwrap_or_default().trim();
    let ext = match mime.to_ascii_lowercase().as_str() {
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "video/webm" => "webm",
        "video/x-msvideo" => "avi",
        "audio/mpeg" => "mp3",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/wav" | "audio/x-wav" => "wav",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/x-7z-compressed" => "7z",
        "application/x-rar-compressed" | "application/vnd.rar" => "rar",
        "application/json" => "json",
        "text/plain" => "txt",
        _ => return None,
    };
    Some(ext)
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Directory parts are dropped, control and reserved characters become `_`.
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Some(truncate_to_bytes(cleaned, MAX_NAME_BYTES))
}

/// Byte budget for a sanitized name. Scratch files add a 33-byte prefix and
/// most filesystems cap a component at 255 bytes.
pub const MAX_NAME_BYTES: usize = 200;

/// Cut `name` to at most `budget` bytes on a char boundary, keeping a short
/// extension intact.
fn truncate_to_bytes(name: &str, budget: usize) -> String {
    if name.len() <= budget {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 16 => name.split_at(dot),
        _ => (name, ""),
    };
    let mut cut = budget.saturating_sub(ext.len()).min(stem.len());
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{ext}", &stem[..cut])
}

/// Generate `<category>_<uuid>.<ext>` for media that carries no name.
#[must_use]
pub fn synthesize_name(category: MediaCategory, mime: Option<&str>) -> String {
    let ext = mime
        .and_then(extension_for_mime)
        .or_else(|| category.default_extension())
        .unwrap_or("bin");
    format!("{category}_{}.{ext}", uuid::Uuid::new_v4().simple())
}

/// Name the uploaded file: the sanitized client name when there is one,
/// otherwise a synthesized unique name.
#[must_use]
pub fn remote_file_name(
    suggested: Option<&str>,
    category: MediaCategory,
    mime: Option<&str>,
) -> String {
    suggested
        .and_then(sanitize_file_name)
        .unwrap_or_else(|| synthesize_name(category, mime))
}
