//! Actions behind the leaf menu options
//!
//! Each action takes the session, does its own prompting and status output,
//! and returns `Ok(())` or a descriptive error. Errors are reported by the
//! screen that invoked the action; flag mode turns them into exit code 1.

pub mod comfyui;
pub mod file_transfer;
pub mod pod_info;
pub mod ssh;
pub mod tailscale;

use secrecy::{ExposeSecret, SecretString};

/// Show only the ends of a secret
pub fn mask_secret(secret: &SecretString) -> String {
    let exposed = secret.expose_secret();
    let chars: Vec<char> = exposed.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 4), tail)
    }
}
