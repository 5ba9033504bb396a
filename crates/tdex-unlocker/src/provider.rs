//! Password and TLS certificate providers.

use crate::config::ProviderKind;
use crate::error::UnlockerError;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Environment variable holding the password file path.
pub const PASSWORD_PATH_ENV: &str = "TDEX_UNLOCKER_PASSWORD_PATH";

/// Environment variable holding the optional TLS certificate path.
pub const TLS_CERT_PATH_ENV: &str = "TDEX_UNLOCKER_TLS_CERT_PATH";

/// Wallet password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Source of the daemon's secrets.
pub trait PasswordProvider: Send + Sync {
    /// Wallet password.
    fn password(&self) -> Result<Password, UnlockerError>;

    /// PEM encoded TLS certificate of the daemon; empty when the daemon
    /// serves plaintext.
    fn tls_certificate(&self) -> Result<Vec<u8>, UnlockerError>;
}

/// Build the provider selected on the command line.
pub fn new_provider(kind: ProviderKind) -> Result<Box<dyn PasswordProvider>, UnlockerError> {
    match kind {
        ProviderKind::File => Ok(Box::new(FileProvider::from_env()?)),
    }
}

/// Reads the password, and optionally the TLS certificate, from files.
#[derive(Debug, Clone)]
pub struct FileProvider {
    password_path: PathBuf,
    tls_cert_path: Option<PathBuf>,
}

impl FileProvider {
    /// Provider for the given files. Both must exist.
    pub fn new(
        password_path: impl AsRef<str>,
        tls_cert_path: Option<&str>,
    ) -> Result<Self, UnlockerError> {
        let password_path = clean_and_expand_path(password_path.as_ref());
        if password_path.as_os_str().is_empty() || !password_path.exists() {
            return Err(UnlockerError::Provider(format!(
                "password file {} not found",
                password_path.display()
            )));
        }

        let tls_cert_path = match tls_cert_path.filter(|p| !p.is_empty()) {
            Some(raw) => {
                let path = clean_and_expand_path(raw);
                if !path.exists() {
                    return Err(UnlockerError::Provider(format!(
                        "TLS certificate {} not found",
                        path.display()
                    )));
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            password_path,
            tls_cert_path,
        })
    }

    /// Provider configured from `TDEX_UNLOCKER_PASSWORD_PATH` and
    /// `TDEX_UNLOCKER_TLS_CERT_PATH`.
    pub fn from_env() -> Result<Self, UnlockerError> {
        let password_path = env::var(PASSWORD_PATH_ENV).map_err(|_| {
            UnlockerError::Provider(format!("{} must be set", PASSWORD_PATH_ENV))
        })?;
        let tls_cert_path = env::var(TLS_CERT_PATH_ENV).ok();
        Self::new(password_path, tls_cert_path.as_deref())
    }

    fn read(path: &Path) -> Result<Vec<u8>, UnlockerError> {
        fs::read(path).map_err(|source| UnlockerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PasswordProvider for FileProvider {
    fn password(&self) -> Result<Password, UnlockerError> {
        let raw = Self::read(&self.password_path)?;
        let text = String::from_utf8(raw)
            .map_err(|_| UnlockerError::Provider("password file is not valid UTF-8".to_string()))?;
        let secret = text.trim_end_matches(['\r', '\n']);
        if secret.is_empty() {
            return Err(UnlockerError::Provider("password file is empty".to_string()));
        }
        Ok(Password::new(secret))
    }

    fn tls_certificate(&self) -> Result<Vec<u8>, UnlockerError> {
        match &self.tls_cert_path {
            Some(path) => Self::read(path),
            None => Ok(Vec::new()),
        }
    }
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references, then normalize
/// the path lexically.
pub fn clean_and_expand_path(path: &str) -> PathBuf {
    if path.is_empty() {
        return PathBuf::new();
    }

    let mut expanded = path.to_string();
    if let Some(rest) = expanded.strip_prefix('~') {
        let home = dirs::home_dir()
            .map(|h| h.to_string_lossy().into_owned())
            .or_else(|| env::var("HOME").ok())
            .unwrap_or_default();
        expanded = format!("{}{}", home, rest);
    }

    clean(Path::new(&expand_env(&expanded)))
}

fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|c| *c != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            name
        };
        if name.is_empty() {
            out.push('$');
        } else {
            out.push_str(&env::var(&name).unwrap_or_default());
        }
    }
    out
}

fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
