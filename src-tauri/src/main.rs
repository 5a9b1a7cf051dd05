// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    // Load .env file if present (e.g. USAGE_SESSION_KEY during development)
    // Silently ignore if not found - production uses the keyring
    let _ = dotenvy::dotenv();

    app_lib::run();
}
