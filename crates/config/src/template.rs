//! Default configuration template with all options documented.
//!
//! Written by `tgrelay init`. Every option is listed with its default so
//! operators can see what is tunable without reading the source.

/// Generate the default config template for a bot instance.
pub fn default_config_template(account_id: &str) -> String {
    format!(
        r##"# tgrelay configuration
# =====================
# Environment variable substitution is supported: ${{ENV_VAR}} or ${{ENV_VAR:-default}}
# Environment variables TELEGRAM_BOT_TOKEN, OWNER_ID, SFTP_HOST, SFTP_PORT,
# SFTP_USER, SFTP_PASSWORD, SFTP_REMOTE_PATH and PUBLIC_URL_BASE override
# the values below.

# ══════════════════════════════════════════════════════════════════════════════
# TELEGRAM
# ══════════════════════════════════════════════════════════════════════════════

[telegram]
token = "${{TELEGRAM_BOT_TOKEN}}"   # Bot token from @BotFather
account_id = "{account_id}"              # Keys the persisted channel list
# owner_id = 123456789            # Telegram user id allowed to run admin commands
poll_timeout_secs = 30            # getUpdates long-polling timeout
register_commands = true          # Publish the slash-command menu on startup

# ══════════════════════════════════════════════════════════════════════════════
# DESTINATION (SFTP)
# ══════════════════════════════════════════════════════════════════════════════
# All of host, username, password, remote_base_path and public_url_base are
# required. Uploads are refused until every one of them is set.

[destination]
# host = "files.example.com"
port = 22
# username = "uploader"
# password = "${{SFTP_PASSWORD}}"
# remote_base_path = "/var/www/html/files"
# public_url_base = "https://files.example.com/files"
timeout_secs = 30                 # Connect / handshake / socket I/O bound

# ══════════════════════════════════════════════════════════════════════════════
# RELAY
# ══════════════════════════════════════════════════════════════════════════════

[relay]
progress_interval_ms = 1500       # Minimum gap between progress edits
# scratch_dir = "/tmp"            # Where downloads wait for upload

# ══════════════════════════════════════════════════════════════════════════════
# STORAGE
# ══════════════════════════════════════════════════════════════════════════════

[storage]
# data_dir = "/var/lib/tgrelay"   # Holds channels/<account_id>.json
"##
    )
}
