use chrono::Duration;
use clap::Parser;

/// Process-wide configuration, resolved once at startup from the
/// environment (or CLI flags, which `clap`'s `env` feature lets override
/// each other). Fatal to be missing `session_secret`; everything else has
/// a spec-mandated default.
#[derive(Parser, Debug, Clone)]
#[command(name = "lunasentri-server", about = "LunaSentri control plane")]
pub struct Config {
    /// HMAC key for session tokens. Startup fails if absent.
    #[arg(long, env = "SESSION_SECRET")]
    pub session_secret: String,

    /// Session lifetime in minutes.
    #[arg(long, env = "ACCESS_TOKEN_TTL_MINUTES", default_value_t = 15)]
    pub access_ttl_minutes: i64,

    /// Password-reset token lifetime in minutes.
    #[arg(long, env = "RESET_TOKEN_TTL_MINUTES", default_value_t = 60)]
    pub reset_ttl_minutes: i64,

    /// CORS and WebSocket origin check.
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,

    /// Whether the session cookie carries the `Secure` attribute.
    #[arg(long, env = "SECURE_COOKIES", default_value_t = true)]
    pub secure_cookies: bool,

    /// Store connection string: local file path, `:memory:`, or a
    /// `libsql://`/`https://` remote URL.
    #[arg(long, env = "DATABASE_URL", default_value = "lunasentri.db")]
    pub database_url: String,

    /// Auth token for a remote libSQL store, if `database_url` is remote.
    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    pub database_auth_token: Option<String>,

    /// Email for an admin account created/updated at startup.
    #[arg(long, env = "ADMIN_BOOTSTRAP_EMAIL")]
    pub admin_bootstrap_email: Option<String>,

    /// Password paired with `admin_bootstrap_email`.
    #[arg(long, env = "ADMIN_BOOTSTRAP_PASSWORD")]
    pub admin_bootstrap_password: Option<String>,

    /// Telegram bot token. Presence alone enables the chat delivery channel.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Whether `/metrics` and `/ws` without a `machine_id` serve host-local
    /// metrics for the process running the server.
    #[arg(long, env = "LOCAL_HOST_METRICS", default_value_t = false)]
    pub local_host_metrics: bool,

    /// TCP port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Exposes `reset_token` in the forgot-password response body. Must
    /// stay false in any real deployment.
    #[arg(long, env = "DEV_EXPOSE_RESET_TOKEN", default_value_t = false)]
    pub dev_expose_reset_token: bool,
}

impl Config {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::minutes(self.reset_ttl_minutes)
    }
}
