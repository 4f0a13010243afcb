// # SMTP Notifier
//
// This crate provides a Notifier implementation delivering one plain-text
// mail per change over an implicit-TLS SMTP session.
//
// ## Session Scope
//
// The transport is built without connection pooling, so every notify()
// call opens its own session: connect, authenticate, send one message,
// close — on all exit paths. Nothing stays open between cycles.
//
// The notifier is single-shot and stateless: no retries (the engine
// re-detects an unreported change on the next cycle), no queueing, no
// store access.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use wanwatch_core::error::{Error, NotifyError};
use wanwatch_core::traits::{NotificationRequest, Notifier};

/// Default SMTPS submission port
const DEFAULT_SMTP_PORT: u16 = 465;

/// Connection settings for the mail server
#[derive(Clone)]
pub struct SmtpConfig {
    /// Mail server hostname
    pub host: String,
    /// Mail server port (implicit TLS)
    pub port: u16,
    /// Login username
    pub username: String,
    /// Login password
    pub password: String,
    /// Sender address
    pub from: String,
}

impl SmtpConfig {
    /// Create a configuration with the default SMTPS port
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            username: username.into(),
            password: password.into(),
            from: from.into(),
        }
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// The password never appears in Debug output
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("from", &self.from)
            .finish()
    }
}

/// Notifier delivering change mails over implicit-TLS SMTP
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("host", &self.host)
            .field("from", &self.from)
            .finish()
    }
}

impl SmtpNotifier {
    /// Create a new notifier
    ///
    /// Fails only on invalid configuration (unparseable sender address or
    /// server name); delivery failures are reported per call.
    pub fn new(config: SmtpConfig) -> Result<Self, Error> {
        let from: Mailbox = config.from.parse().map_err(|e| {
            Error::config(format!("Invalid sender address '{}': {}", config.from, e))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| Error::config(format!("Invalid mail server '{}': {}", config.host, e)))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self {
            transport,
            from,
            host: config.host,
        })
    }
}

fn render_subject(request: &NotificationRequest) -> String {
    format!("New address detected on {}", request.interface)
}

fn render_body(request: &NotificationRequest) -> String {
    let mut body = format!(
        "Interface {} reports a new set of addresses:\n\n",
        request.interface
    );
    for addr in request.addresses.iter() {
        body.push_str(addr);
        body.push('\n');
    }
    body.push_str(&format!(
        "\nDetected at {}\n",
        request.detected_at.to_rfc3339()
    ));
    body
}

/// Map a lettre failure onto the notifier error taxonomy.
/// SMTP carries no structured auth-failure signal, so rejected
/// credentials are recognized by their reply code.
fn classify(error: &lettre::transport::smtp::Error) -> NotifyError {
    let text = error.to_string();

    if error.is_timeout() || error.is_tls() {
        return NotifyError::Transport(text);
    }

    if error.is_permanent()
        && (text.contains("535") || text.to_lowercase().contains("authentication"))
    {
        return NotifyError::Auth(text);
    }

    if error.is_response() || error.is_permanent() || error.is_transient() || error.is_client() {
        return NotifyError::Protocol(text);
    }

    // Everything left is connect/io trouble
    NotifyError::Transport(text)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let to: Mailbox = request.recipient.parse().map_err(|e| {
            NotifyError::Protocol(format!("Invalid recipient '{}': {}", request.recipient, e))
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(render_subject(request))
            .body(render_body(request))
            .map_err(|e| NotifyError::Protocol(format!("Failed to build message: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!(
                    "Notification mail for {} delivered to {}",
                    request.interface,
                    request.recipient
                );
                Ok(())
            }
            Err(e) => Err(classify(&e)),
        }
    }

    fn notifier_name(&self) -> &'static str {
        "smtp"
    }
}
