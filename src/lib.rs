//! infra-guard: a tool-call hook that keeps infrastructure commands in human hands.
//!
//! The guard inspects shell commands proposed by an agent and blocks a small
//! denylist of operations with hard-to-reverse, real-world effects: SSH to
//! remote hosts, Ansible, mutating Terraform verbs, and remote file transfer.
//! Every other command is allowed. Matching is a heuristic over the raw
//! command text; it does not parse shell syntax and is not a security boundary.
//!
//! # Architecture
//!
//! - **[`eval`]** — The [`Guard`](eval::Guard): an ordered rule list where the first match blocks.
//! - **[`hook`]** — Event contract: tool-name dispatch table, JSON input and output shapes.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — Decision logging to `~/.local/share/infra-guard/decisions.log`.
//! - **[`error`]** — Errors raised while loading config or talking to the host.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error type shared by config, rule compilation and hook I/O.
pub mod error;
/// Rule compilation and the ordered first-match guard.
pub mod eval;
/// Host event contract and tool-name dispatch.
pub mod hook;
/// File-based decision logging.
pub mod logging;

use std::sync::LazyLock;

use eval::{Decision, Guard};

static DEFAULT_GUARD: LazyLock<Guard> = LazyLock::new(|| {
    Guard::from_config(&config::Config::default_config())
        .expect("embedded default rules must compile")
});

/// Evaluate a command string against the default rule set.
///
/// This is the main entry point for tests and simple usage.
/// For user config or a custom rule set, build a [`Guard`] directly.
pub fn evaluate(command: &str) -> Decision {
    DEFAULT_GUARD.evaluate(command)
}
