use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const USER_CONFIG_FILE: &str = ".notify.conf";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/notify.conf";
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Resolved bot token and chat id. Empty fields mean "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bot_token.is_empty() {
            missing.push("bot token");
        }
        if self.chat_id.is_empty() {
            missing.push("chat ID");
        }
        missing
    }

    pub fn ensure_complete(&self) -> Result<(), ConfigError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials { missing })
        }
    }

    /// Applies every non-empty field of `incoming`, leaving the rest untouched.
    #[must_use]
    pub fn merge(mut self, incoming: &PartialCredentials) -> Self {
        if let Some(token) = incoming.bot_token.as_deref().filter(|t| !t.is_empty()) {
            self.bot_token = token.to_string();
        }
        if let Some(chat_id) = incoming.chat_id.as_deref().filter(|c| !c.is_empty()) {
            self.chat_id = chat_id.to_string();
        }
        self
    }
}

/// What a single configuration source contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl PartialCredentials {
    fn fields(&self) -> Vec<&'static str> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        let mut fields = Vec::new();
        if present(&self.bot_token) {
            fields.push("bot_token");
        }
        if present(&self.chat_id) {
            fields.push("chat_id");
        }
        fields
    }
}

/// On-disk layout: a `[telegram]` table; anything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    telegram: TelegramSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(from = "RawTelegramSection")]
struct TelegramSection {
    bot_token: Option<String>,
    chat_id: Option<String>,
}

/// Intermediate type for deserialization (chat ids may be written as integers).
#[derive(Deserialize)]
struct RawTelegramSection {
    #[serde(default)]
    bot_token: Option<String>,
    #[serde(default)]
    chat_id: Option<ChatIdValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChatIdValue {
    Text(String),
    Number(i64),
}

impl From<RawTelegramSection> for TelegramSection {
    fn from(raw: RawTelegramSection) -> Self {
        Self {
            bot_token: raw.bot_token,
            chat_id: raw.chat_id.map(|id| match id {
                ChatIdValue::Text(s) => s,
                ChatIdValue::Number(n) => n.to_string(),
            }),
        }
    }
}

impl From<ConfigFile> for PartialCredentials {
    fn from(file: ConfigFile) -> Self {
        Self {
            bot_token: file.telegram.bot_token,
            chat_id: file.telegram.chat_id,
        }
    }
}

/// Reads one config file. `Ok(None)` means the file does not exist.
pub fn load_file(path: &Path) -> Result<Option<PartialCredentials>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(file.into()))
}

/// Locations of the two config files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// `None` when the home directory cannot be determined.
    pub user: Option<PathBuf>,
    pub system: PathBuf,
}

impl ConfigPaths {
    pub fn default_locations() -> Self {
        Self {
            user: dirs::home_dir().map(|home| home.join(USER_CONFIG_FILE)),
            system: PathBuf::from(SYSTEM_CONFIG_PATH),
        }
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::default_locations()
    }
}

/// Something that happened during resolution, for `--verbose` output.
#[derive(Debug)]
pub enum Diagnostic {
    HomeUnavailable,
    Loaded {
        path: PathBuf,
        fields: Vec<&'static str>,
    },
    Skipped(ConfigError),
    NotNeeded {
        path: PathBuf,
    },
    EnvOverride {
        var: &'static str,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HomeUnavailable => {
                write!(f, "Cannot determine home directory, skipping user config")
            }
            Self::Loaded { path, fields } if fields.is_empty() => write!(
                f,
                "Loaded configuration from {} (no credentials set)",
                path.display()
            ),
            Self::Loaded { path, fields } => write!(
                f,
                "Loaded configuration from {} ({})",
                path.display(),
                fields.join(", ")
            ),
            Self::Skipped(err) => write!(f, "Could not load config: {err}"),
            Self::NotNeeded { path } => write!(
                f,
                "Credentials already resolved, not reading {}",
                path.display()
            ),
            Self::EnvOverride { var } => write!(f, "Using {var} from environment variable"),
        }
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub credentials: Credentials,
    pub diagnostics: Vec<Diagnostic>,
}

/// Ordered configuration sources; later ones win per field.
#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    UserFile(Option<&'a Path>),
    SystemFile(&'a Path),
    BotTokenEnv,
    ChatIdEnv,
}

impl Source<'_> {
    fn read<F>(self, env: &F, diagnostics: &mut Vec<Diagnostic>) -> Option<PartialCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Source::UserFile(None) => {
                diagnostics.push(Diagnostic::HomeUnavailable);
                None
            }
            Source::UserFile(Some(path)) | Source::SystemFile(path) => match load_file(path) {
                Ok(Some(partial)) => {
                    diagnostics.push(Diagnostic::Loaded {
                        path: path.to_path_buf(),
                        fields: partial.fields(),
                    });
                    Some(partial)
                }
                Ok(None) => None,
                Err(e) => {
                    diagnostics.push(Diagnostic::Skipped(e));
                    None
                }
            },
            Source::BotTokenEnv => {
                let value = env_value(env, BOT_TOKEN_ENV, diagnostics)?;
                Some(PartialCredentials {
                    bot_token: Some(value),
                    chat_id: None,
                })
            }
            Source::ChatIdEnv => {
                let value = env_value(env, CHAT_ID_ENV, diagnostics)?;
                Some(PartialCredentials {
                    bot_token: None,
                    chat_id: Some(value),
                })
            }
        }
    }
}

fn env_value<F>(env: &F, var: &'static str, diagnostics: &mut Vec<Diagnostic>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = env(var).filter(|v| !v.is_empty())?;
    diagnostics.push(Diagnostic::EnvOverride { var });
    Some(value)
}

/// Resolves credentials from the files in `paths` and the process environment.
pub fn resolve(paths: &ConfigPaths) -> Resolution {
    resolve_with(paths, |name| std::env::var(name).ok())
}

/// Like [`resolve`], reading environment variables through `env`.
pub fn resolve_with<F>(paths: &ConfigPaths, env: F) -> Resolution
where
    F: Fn(&str) -> Option<String>,
{
    let sources = [
        Source::UserFile(paths.user.as_deref()),
        Source::SystemFile(&paths.system),
        Source::BotTokenEnv,
        Source::ChatIdEnv,
    ];

    let mut diagnostics = Vec::new();
    let credentials = sources
        .into_iter()
        .fold(Credentials::default(), |acc, source| {
            if let Source::SystemFile(path) = source
                && acc.is_complete()
            {
                diagnostics.push(Diagnostic::NotNeeded {
                    path: path.to_path_buf(),
                });
                return acc;
            }
            match source.read(&env, &mut diagnostics) {
                Some(partial) => acc.merge(&partial),
                None => acc,
            }
        });

    Resolution {
        credentials,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn partial(token: Option<&str>, chat: Option<&str>) -> PartialCredentials {
        PartialCredentials {
            bot_token: token.map(String::from),
            chat_id: chat.map(String::from),
        }
    }

    #[test]
    fn merge_overrides_per_field() {
        let base = Credentials {
            bot_token: "file-token".to_string(),
            chat_id: "file-chat".to_string(),
        };
        let merged = base.merge(&partial(None, Some("env-chat")));
        assert_eq!(merged.bot_token, "file-token");
        assert_eq!(merged.chat_id, "env-chat");
    }

    #[test]
    fn merge_ignores_empty_values() {
        let base = Credentials {
            bot_token: "tok".to_string(),
            chat_id: "42".to_string(),
        };
        let merged = base.clone().merge(&partial(Some(""), Some("")));
        assert_eq!(merged, base);
    }

    #[test]
    fn missing_fields_lists_empty_ones() {
        let creds = Credentials::default();
        assert_eq!(creds.missing_fields(), vec!["bot token", "chat ID"]);
        assert!(!creds.is_complete());

        let creds = Credentials {
            bot_token: "tok".to_string(),
            chat_id: String::new(),
        };
        let err = creds.ensure_complete().unwrap_err();
        assert!(err.to_string().contains("Missing Telegram chat ID"));
    }

    #[test]
    fn load_valid_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            "notify.conf",
            r#"
            [telegram]
            bot_token = "123:ABC"
            chat_id = "-100200300"
            "#,
        );
        let loaded = load_file(&path).unwrap().unwrap();
        assert_eq!(loaded, partial(Some("123:ABC"), Some("-100200300")));
    }

    #[test]
    fn integer_chat_id_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            "notify.conf",
            "[telegram]\nchat_id = -1001234567890\n",
        );
        let loaded = load_file(&path).unwrap().unwrap();
        assert_eq!(loaded.chat_id.as_deref(), Some("-1001234567890"));
        assert!(loaded.bot_token.is_none());
    }

    #[test]
    fn unknown_keys_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            "notify.conf",
            r#"
            title = "mine"

            [telegram]
            bot_token = "tok"
            parse_mode = "HTML"

            [slack]
            webhook = "https://example.com"
            "#,
        );
        let loaded = load_file(&path).unwrap().unwrap();
        assert_eq!(loaded, partial(Some("tok"), None));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_file(&tmp.path().join("absent.conf")).unwrap().is_none());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), "notify.conf", "[telegram\nbot_token = ");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("notify.conf"));
    }

    #[test]
    fn wrong_value_type_rejects_whole_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            "notify.conf",
            "[telegram]\nbot_token = \"tok\"\nchat_id = 1.5\n",
        );
        assert!(matches!(
            load_file(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn directory_in_place_of_file_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn nothing_configured_resolves_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(tmp.path().join("user.conf")),
            system: tmp.path().join("system.conf"),
        };
        let resolution = resolve_with(&paths, no_env);
        assert_eq!(resolution.credentials, Credentials::default());
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn files_contribute_different_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(write_config(
                tmp.path(),
                "user.conf",
                "[telegram]\nchat_id = \"user-chat\"\n",
            )),
            system: write_config(
                tmp.path(),
                "system.conf",
                "[telegram]\nbot_token = \"sys-token\"\n",
            ),
        };
        let creds = resolve_with(&paths, no_env).credentials;
        assert_eq!(creds.bot_token, "sys-token");
        assert_eq!(creds.chat_id, "user-chat");
    }

    #[test]
    fn empty_user_token_does_not_hide_system_token() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(write_config(
                tmp.path(),
                "user.conf",
                "[telegram]\nbot_token = \"\"\nchat_id = \"user-chat\"\n",
            )),
            system: write_config(
                tmp.path(),
                "system.conf",
                "[telegram]\nbot_token = \"sys-token\"\n",
            ),
        };
        let creds = resolve_with(&paths, no_env).credentials;
        assert_eq!(creds.bot_token, "sys-token");
        assert_eq!(creds.chat_id, "user-chat");
    }

    #[test]
    fn system_file_not_read_when_user_file_complete() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(write_config(
                tmp.path(),
                "user.conf",
                "[telegram]\nbot_token = \"user-token\"\nchat_id = \"user-chat\"\n",
            )),
            system: write_config(tmp.path(), "system.conf", "not = [valid"),
        };
        let resolution = resolve_with(&paths, no_env);
        assert_eq!(resolution.credentials.bot_token, "user-token");
        assert!(
            resolution
                .diagnostics
                .iter()
                .all(|d| !matches!(d, Diagnostic::Skipped(_)))
        );
        assert!(
            resolution
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::NotNeeded { .. }))
        );
    }

    #[test]
    fn env_overrides_only_its_own_field() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: None,
            system: write_config(
                tmp.path(),
                "system.conf",
                "[telegram]\nbot_token = \"sys-token\"\nchat_id = \"sys-chat\"\n",
            ),
        };
        let env = HashMap::from([(CHAT_ID_ENV, "env-chat".to_string())]);
        let resolution = resolve_with(&paths, |name| env.get(name).cloned());
        assert_eq!(resolution.credentials.bot_token, "sys-token");
        assert_eq!(resolution.credentials.chat_id, "env-chat");
        assert!(matches!(
            resolution.diagnostics[0],
            Diagnostic::HomeUnavailable
        ));
    }

    #[test]
    fn empty_env_token_does_not_override() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(write_config(
                tmp.path(),
                "user.conf",
                "[telegram]\nbot_token = \"file-token\"\nchat_id = \"1\"\n",
            )),
            system: tmp.path().join("system.conf"),
        };
        let env = HashMap::from([(BOT_TOKEN_ENV, String::new())]);
        let resolution = resolve_with(&paths, |name| env.get(name).cloned());
        assert_eq!(resolution.credentials.bot_token, "file-token");
        assert!(
            resolution
                .diagnostics
                .iter()
                .all(|d| !matches!(d, Diagnostic::EnvOverride { .. }))
        );
    }

    #[test]
    fn malformed_user_file_is_skipped_and_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths {
            user: Some(write_config(tmp.path(), "user.conf", "bot_token = = 1")),
            system: write_config(
                tmp.path(),
                "system.conf",
                "[telegram]\nbot_token = \"sys-token\"\nchat_id = \"sys-chat\"\n",
            ),
        };
        let resolution = resolve_with(&paths, no_env);
        assert_eq!(resolution.credentials.bot_token, "sys-token");
        let rendered: Vec<String> = resolution
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(rendered[0].starts_with("Could not load config: Failed to parse config"));
        assert!(rendered[1].contains("(bot_token, chat_id)"));
    }

    #[test]
    fn default_locations_use_expected_names() {
        let paths = ConfigPaths::default_locations();
        assert_eq!(paths.system, PathBuf::from("/etc/notify.conf"));
        if let Some(user) = paths.user {
            assert!(user.ends_with(".notify.conf"));
        }
    }
}
