use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("invalid deployment environment '{given}'. Configured environments: '{}'", .known.join("', '"))]
    InvalidEnvironment { given: String, known: Vec<String> },

    #[error("cannot read changelog for commit range '{range}': {detail}")]
    Changelog { range: String, detail: String },

    #[error("cannot locate {0}: run herald from the root of your project")]
    ConfigNotFound(String),

    #[error("configuration key '{0}' is not set")]
    MissingConfig(String),

    #[error("unsupported {kind} '{name}'")]
    UnsupportedSystem { kind: &'static str, name: String },

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("the field '{0}' does not exist in this Jira installation")]
    UnknownJiraField(String),

    #[error("cannot call the Jira API: captcha challenge pending, log in via the browser first")]
    CaptchaRequired,

    #[error("ticket system error: {0}")]
    TicketSystem(String),

    #[error("chat transport error: {0}")]
    ChatTransport(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// The user declined a confirmation prompt. A deliberate early stop,
    /// not an error; the CLI exits non-zero without a diagnostic.
    #[error("aborted")]
    Aborted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl HeraldError {
    pub fn is_user_abort(&self) -> bool {
        matches!(self, HeraldError::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, HeraldError>;
