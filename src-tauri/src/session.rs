//! Browser session key storage using the system keyring.
//!
//! The usage endpoints authenticate with the `sessionKey` cookie of a signed-in
//! browser session. The key is stored in the OS's native secret storage:
//! - Linux: Secret Service (GNOME Keyring/KDE Wallet)
//! - macOS: Keychain
//! - Windows: Credential Manager
//!
//! `USAGE_SESSION_KEY` in the environment (or `.env`) takes precedence.
//!
//! Never log the key value.

use keyring::Entry;

const SERVICE_NAME: &str = "usage-tray";
const SESSION_KEY_NAME: &str = "session-key";
pub const SESSION_KEY_ENV: &str = "USAGE_SESSION_KEY";

/// Session key from the environment, else the keyring.
/// Returns None if not configured or on error (errors are logged).
pub fn get_session_key() -> Option<String> {
    if let Some(key) = session_key_from_env() {
        return Some(key);
    }

    let entry = match Entry::new(SERVICE_NAME, SESSION_KEY_NAME) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("Session: failed to create keyring entry: {}", e);
            return None;
        }
    };

    match entry.get_password() {
        Ok(key) => normalize_session_key(&key),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("Session: failed to retrieve key: {}", e);
            None
        }
    }
}

fn session_key_from_env() -> Option<String> {
    std::env::var(SESSION_KEY_ENV)
        .ok()
        .and_then(|k| normalize_session_key(&k))
}

/// Accept either the bare cookie value or a pasted `sessionKey=...` pair.
pub fn normalize_session_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let value = trimmed
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("sessionKey="))
        .unwrap_or(trimmed)
        .trim();

    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c.is_control()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Store the session key in the system keyring.
/// Pass None to delete the key.
pub fn set_session_key(key: Option<&str>) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, SESSION_KEY_NAME)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;

    match key.and_then(normalize_session_key) {
        Some(k) => {
            entry
                .set_password(&k)
                .map_err(|e| format!("Failed to store session key: {}", e))?;
            log::info!("Session: stored new session key");
        }
        None => match entry.delete_credential() {
            Ok(()) => log::info!("Session: deleted session key"),
            Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(format!("Failed to delete session key: {}", e)),
        },
    }

    Ok(())
}

/// Read the clipboard and store it as the session key.
pub fn import_session_key_from_clipboard() -> Result<(), String> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| format!("Clipboard unavailable: {}", e))?;
    let text = clipboard
        .get_text()
        .map_err(|e| format!("Clipboard has no text: {}", e))?;

    let key = normalize_session_key(&text)
        .ok_or_else(|| "Clipboard does not contain a session key".to_string())?;
    set_session_key(Some(&key))
}

/// Masked key for display and logs (e.g., "sk-ant...1234")
pub fn mask_session_key(key: &str) -> String {
    if key.len() <= 12 {
        "*".repeat(key.len())
    } else {
        match (key.get(..6), key.get(key.len() - 4..)) {
            (Some(head), Some(tail)) => format!("{}...{}", head, tail),
            _ => "*".repeat(key.chars().count()),
        }
    }
}
