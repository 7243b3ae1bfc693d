//! Secret backends for reading the Adjust user token.
//!
//! Used by `Config::from_env` when `ADJUST_USER_TOKEN` is not set. Each
//! backend shells out to its vendor CLI and returns `None` when it is not
//! configured or the lookup fails.

use std::process::{Command, Stdio};

/// Run a CLI and return its trimmed stdout; stderr is discarded so secrets
/// tooling noise never reaches our output.
fn run_cmd(args: &[&str], env_extra: &[(&str, &str)]) -> Option<String> {
    let (bin, rest) = args.split_first()?;
    let mut cmd = Command::new(bin);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    for (k, v) in env_extra {
        cmd.env(k, v);
    }
    let out = cmd.output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 1Password CLI (`op read`).
///
/// - `ADJUST_OP_ENTRY_PATH`: `op://Vault/Item`, or `ADJUST_OP_VAULT` + `ADJUST_OP_ITEM`
/// - `ADJUST_OP_FIELD`: field holding the token (default `USER_TOKEN`)
pub fn one_password() -> Option<String> {
    let field = env_nonempty("ADJUST_OP_FIELD").unwrap_or_else(|| "USER_TOKEN".to_string());
    let uri = match env_nonempty("ADJUST_OP_ENTRY_PATH") {
        Some(path) => format!("{}/{}", path.trim_end_matches('/'), field),
        None => {
            let vault = env_nonempty("ADJUST_OP_VAULT")?;
            let item = env_nonempty("ADJUST_OP_ITEM")?;
            format!("op://{}/{}/{}", vault, item, field)
        }
    };
    run_cmd(&["op", "read", &uri], &[])
}

/// Bitwarden CLI (`bw get password`).
///
/// - `ADJUST_BW_ITEM_ID`: login item UUID
/// - `ADJUST_BW_SESSION`: optional session key, passed on as `BW_SESSION`
pub fn bitwarden() -> Option<String> {
    let id = env_nonempty("ADJUST_BW_ITEM_ID")?;
    match env_nonempty("ADJUST_BW_SESSION") {
        Some(session) => run_cmd(
            &["bw", "get", "password", &id],
            &[("BW_SESSION", session.as_str())],
        ),
        None => run_cmd(&["bw", "get", "password", &id], &[]),
    }
}
