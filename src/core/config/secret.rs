use std::io::Write;
use std::{fs, path::Path, path::PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;
use super::types::ConfigError;

const SECRET_BYTES: usize = 64;

pub(super) fn resolve_session_secret(strict: bool) -> Result<String, ConfigError> {
    if let Some(value) = env_optional("JWT_SECRET") {
        return Ok(value);
    }

    if strict {
        return Err(ConfigError::MissingSecret("JWT_SECRET"));
    }

    let path = env_optional("SCHEDULER_SECRET_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".session_secret"));

    Ok(load_or_create(&path))
}

fn load_or_create(path: &Path) -> String {
    if let Some(existing) = read_secret(path) {
        return existing;
    }

    let fresh = generate_secret();

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(error = %err, path = %parent.display(), "Failed to create secret directory");
        }
    }

    match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;

                if let Err(err) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
                    tracing::warn!(error = %err, path = %path.display(), "Failed to restrict secret file");
                }
            }

            if let Err(err) = file.write_all(fresh.as_bytes()) {
                tracing::warn!(error = %err, path = %path.display(), "Failed to persist session secret");
            }
            fresh
        }
        // Another process won the race; use its key.
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            read_secret(path).unwrap_or(fresh)
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Session secret is not persisted");
            fresh
        }
    }
}

fn read_secret(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_differ() {
        let first = generate_secret();
        let second = generate_secret();
        assert_ne!(first, second);
        assert!(first.len() >= SECRET_BYTES);
    }

    #[test]
    fn load_or_create_reuses_persisted_key() {
        let dir = std::env::temp_dir().join(format!("scheduler-secret-{}", uuid::Uuid::new_v4()));
        let path = dir.join("secret");

        let created = load_or_create(&path);
        let reloaded = load_or_create(&path);
        assert_eq!(created, reloaded);

        let _ = fs::remove_dir_all(dir);
    }
}
