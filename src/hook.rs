//! Host-facing event contract: tool-call JSON in, block decision JSON out.
//!
//! Events are routed through a [`Dispatcher`] keyed by tool name. Tools
//! without a registered handler are ignored, which the host reads as allow.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::{Decision, Guard};

/// A tool-call event as delivered by the host.
#[derive(Debug, Deserialize, Default)]
pub struct HookInput {
    #[serde(default, alias = "toolName")]
    pub tool_name: Option<String>,
    #[serde(default, alias = "input")]
    pub tool_input: Option<ToolInput>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToolInput {
    #[serde(default)]
    pub command: Option<String>,
}

impl HookInput {
    /// The proposed command, empty when absent.
    pub fn command(&self) -> &str {
        self.tool_input
            .as_ref()
            .and_then(|t| t.command.as_deref())
            .unwrap_or("")
    }
}

/// Shape of the JSON written back to the host on block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `{"block": true, "reason": "..."}`
    #[default]
    Block,
    /// Claude Code PreToolUse `hookSpecificOutput` with a deny decision.
    ClaudeCode,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "block" => Ok(OutputFormat::Block),
            "claude-code" => Ok(OutputFormat::ClaudeCode),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Decides on one tool invocation.
pub trait ToolHandler: Send + Sync {
    fn handle(&self, input: &HookInput) -> Decision;
}

impl ToolHandler for Guard {
    fn handle(&self, input: &HookInput) -> Decision {
        self.evaluate(input.command())
    }
}

/// Blocks every command while the configured rules fail to compile.
struct ConfigErrorHandler {
    reason: String,
}

/// Rule name reported when the guard is failing closed.
pub const CONFIG_ERROR_RULE: &str = "config-error";

impl ToolHandler for ConfigErrorHandler {
    fn handle(&self, _input: &HookInput) -> Decision {
        Decision::Block {
            rule: CONFIG_ERROR_RULE.to_string(),
            reason: self.reason.clone(),
        }
    }
}

/// Dispatch table from tool name to handler.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dispatcher that routes every guarded tool to one shared guard.
    pub fn from_config(config: &Config) -> Result<Self> {
        let guard: Arc<dyn ToolHandler> = Arc::new(Guard::from_config(config)?);
        let mut dispatcher = Self::new();
        for name in &config.settings.guarded_tools {
            dispatcher.register(name, Arc::clone(&guard));
        }
        Ok(dispatcher)
    }

    /// Build a dispatcher from config, denying every guarded tool when the
    /// rule set cannot be compiled.
    pub fn from_config_or_deny(config: &Config) -> Self {
        match Self::from_config(config) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                log::error!("{e}");
                eprintln!("infra-guard: {e}");
                Self::deny_all(config, &e)
            }
        }
    }

    /// Route every guarded tool to a handler that blocks with `error` as the reason.
    pub fn deny_all(config: &Config, error: &Error) -> Self {
        let handler: Arc<dyn ToolHandler> = Arc::new(ConfigErrorHandler {
            reason: format!("infra-guard configuration error: {error}"),
        });
        let mut dispatcher = Self::new();
        for name in &config.settings.guarded_tools {
            dispatcher.register(name, Arc::clone(&handler));
        }
        dispatcher
    }

    pub fn register(&mut self, tool_name: &str, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(tool_name.to_string(), handler);
    }

    pub fn is_registered(&self, tool_name: &str) -> bool {
        self.handlers.contains_key(tool_name)
    }

    /// Route an event. `None` means the tool is not guarded and was ignored.
    pub fn dispatch(&self, input: &HookInput) -> Option<Decision> {
        let name = input.tool_name.as_deref()?;
        let handler = self.handlers.get(name)?;
        Some(handler.handle(input))
    }
}

/// Render a decision for the host. Allowed commands produce no output.
pub fn render(decision: &Decision, format: OutputFormat) -> Option<serde_json::Value> {
    let reason = decision.reason()?;
    let value = match format {
        OutputFormat::Block => serde_json::json!({
            "block": true,
            "reason": reason,
        }),
        OutputFormat::ClaudeCode => serde_json::json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "deny",
                "permissionDecisionReason": reason,
            }
        }),
    };
    Some(value)
}

/// Handle one hook invocation: read an event, decide, write the response.
///
/// Returns the decision, or `None` when the event's tool is not guarded.
pub fn run<R: Read, W: Write>(
    dispatcher: &Dispatcher,
    mut input: R,
    mut output: W,
    format: OutputFormat,
) -> Result<Option<Decision>> {
    let mut raw = String::new();
    input.read_to_string(&mut raw)?;
    let event: HookInput = serde_json::from_str(&raw)?;

    let Some(decision) = dispatcher.dispatch(&event) else {
        log::debug!(
            "ignored tool: {}",
            event.tool_name.as_deref().unwrap_or("<none>")
        );
        return Ok(None);
    };

    crate::logging::log_decision(event.command(), &decision);

    if let Some(value) = render(&decision, format) {
        writeln!(output, "{}", serde_json::to_string(&value)?)?;
    }
    Ok(Some(decision))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::from_config(&Config::default_config()).unwrap()
    }

    fn run_str(json: &str, format: OutputFormat) -> (Option<Decision>, String) {
        let mut out = Vec::new();
        let decision = run(&dispatcher(), json.as_bytes(), &mut out, format).unwrap();
        (decision, String::from_utf8(out).unwrap())
    }

    #[test]
    fn blocks_ssh_with_block_format() {
        let (decision, out) = run_str(
            r#"{"tool_name":"bash","tool_input":{"command":"ssh root@10.0.0.5"}}"#,
            OutputFormat::Block,
        );
        assert_eq!(decision.unwrap().rule(), Some("ssh"));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["block"], true);
        assert_eq!(
            value["reason"],
            "SSH to remote servers is forbidden; the user must execute infrastructure commands themselves."
        );
    }

    #[test]
    fn blocks_with_claude_code_format() {
        let (_, out) = run_str(
            r#"{"tool_name":"Bash","tool_input":{"command":"terraform apply"}}"#,
            OutputFormat::ClaudeCode,
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let hso = &value["hookSpecificOutput"];
        assert_eq!(hso["hookEventName"], "PreToolUse");
        assert_eq!(hso["permissionDecision"], "deny");
        assert!(
            hso["permissionDecisionReason"]
                .as_str()
                .unwrap()
                .starts_with("Terraform")
        );
    }

    #[test]
    fn camel_case_event_fields() {
        let (decision, _) = run_str(
            r#"{"toolName":"bash","input":{"command":"ansible all -m ping"}}"#,
            OutputFormat::Block,
        );
        assert_eq!(decision.unwrap().rule(), Some("ansible"));
    }

    #[test]
    fn allow_writes_nothing() {
        let (decision, out) = run_str(
            r#"{"tool_name":"bash","tool_input":{"command":"ls -la"}}"#,
            OutputFormat::Block,
        );
        assert_eq!(decision, Some(Decision::Allow));
        assert!(out.is_empty());
    }

    #[test]
    fn other_tools_are_ignored() {
        let (decision, out) = run_str(
            r#"{"tool_name":"Read","tool_input":{"command":"ssh root@host"}}"#,
            OutputFormat::Block,
        );
        assert_eq!(decision, None);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_tool_name_is_ignored() {
        let (decision, _) = run_str(r#"{"tool_input":{"command":"ssh root@host"}}"#, OutputFormat::Block);
        assert_eq!(decision, None);
    }

    #[test]
    fn missing_command_is_allowed() {
        let (decision, out) = run_str(r#"{"tool_name":"bash","tool_input":{}}"#, OutputFormat::Block);
        assert_eq!(decision, Some(Decision::Allow));
        assert!(out.is_empty());

        let (decision, _) = run_str(r#"{"tool_name":"bash"}"#, OutputFormat::Block);
        assert_eq!(decision, Some(Decision::Allow));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut out = Vec::new();
        let err = run(&dispatcher(), "not json".as_bytes(), &mut out, OutputFormat::Block)
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn custom_handler_registration() {
        struct AlwaysBlock;
        impl ToolHandler for AlwaysBlock {
            fn handle(&self, _input: &HookInput) -> Decision {
                Decision::Block {
                    rule: "write".into(),
                    reason: "read-only session".into(),
                }
            }
        }

        let mut dispatcher = dispatcher();
        dispatcher.register("Write", Arc::new(AlwaysBlock));
        assert!(dispatcher.is_registered("Write"));
        assert!(dispatcher.is_registered("bash"));

        let event: HookInput = serde_json::from_str(r#"{"tool_name":"Write"}"#).unwrap();
        assert_eq!(dispatcher.dispatch(&event).unwrap().rule(), Some("write"));
    }

    fn broken_config() -> Config {
        let mut config = Config::default_config();
        config
            .apply_overlay_str(
                r#"
            [[rules]]
            name = "typo"
            patterns = ['(unclosed']
            reason = "never"
        "#,
            )
            .unwrap();
        config
    }

    #[test]
    fn invalid_rule_denies_guarded_tools() {
        let dispatcher = Dispatcher::from_config_or_deny(&broken_config());
        let mut out = Vec::new();
        let decision = run(
            &dispatcher,
            r#"{"tool_name":"Bash","tool_input":{"command":"ls -la"}}"#.as_bytes(),
            &mut out,
            OutputFormat::ClaudeCode,
        )
        .unwrap()
        .unwrap();

        assert_eq!(decision.rule(), Some(CONFIG_ERROR_RULE));
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let hso = &value["hookSpecificOutput"];
        assert_eq!(hso["permissionDecision"], "deny");
        let reason = hso["permissionDecisionReason"].as_str().unwrap();
        assert!(reason.contains("typo"), "reason: {reason}");
        assert!(reason.contains("(unclosed"), "reason: {reason}");
    }

    #[test]
    fn invalid_rule_still_ignores_other_tools() {
        let dispatcher = Dispatcher::from_config_or_deny(&broken_config());
        let event: HookInput = serde_json::from_str(r#"{"tool_name":"Read"}"#).unwrap();
        assert_eq!(dispatcher.dispatch(&event), None);
    }

    #[test]
    fn valid_config_is_not_denied() {
        let dispatcher = Dispatcher::from_config_or_deny(&Config::default_config());
        let event: HookInput =
            serde_json::from_str(r#"{"tool_name":"bash","tool_input":{"command":"ls"}}"#)
                .unwrap();
        assert_eq!(dispatcher.dispatch(&event), Some(Decision::Allow));
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("block".parse::<OutputFormat>().unwrap(), OutputFormat::Block);
        assert_eq!(
            "claude-code".parse::<OutputFormat>().unwrap(),
            OutputFormat::ClaudeCode
        );
        assert!(matches!(
            "json".parse::<OutputFormat>(),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn render_allow_is_none() {
        assert!(render(&Decision::Allow, OutputFormat::Block).is_none());
        assert!(render(&Decision::Allow, OutputFormat::ClaudeCode).is_none());
    }
}
