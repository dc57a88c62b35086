//! infra-guard: tool-call hook binary.
//!
//! Reads one tool-call event as JSON from stdin. For guarded shell tools the
//! proposed command is checked against the rule set; a blocked command
//! produces one JSON object on stdout, an allowed one produces nothing.

use std::path::PathBuf;
use std::process::ExitCode;

use infra_guard::config::Config;
use infra_guard::eval::{Decision, Guard};
use infra_guard::hook::{self, CONFIG_ERROR_RULE, Dispatcher, OutputFormat};
use infra_guard::logging;

const USAGE: &str = "\
usage: infra-guard [--config <path>] [--format <block|claude-code>]
       infra-guard --check <command>
       infra-guard --dump-config";

/// Exit code for `--check` when the command is blocked.
const EXIT_BLOCKED: u8 = 2;

#[derive(Debug, Default, PartialEq)]
struct Options {
    config: Option<PathBuf>,
    format: Option<OutputFormat>,
    check: Option<String>,
    dump_config: bool,
    help: bool,
}

impl Options {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut opts = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or("--config requires a path")?;
                    opts.config = Some(PathBuf::from(shellexpand::tilde(&path).into_owned()));
                }
                "--format" => {
                    let name = args.next().ok_or("--format requires a value")?;
                    opts.format = Some(name.parse().map_err(|e| format!("{e}"))?);
                }
                "--check" => {
                    opts.check = Some(args.next().ok_or("--check requires a command")?);
                }
                "--dump-config" => opts.dump_config = true,
                "-h" | "--help" => opts.help = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(opts)
    }
}

fn main() -> ExitCode {
    let opts = match Options::parse(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("infra-guard: {e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    if opts.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = Config::load(opts.config.as_deref());

    if opts.dump_config {
        return match config.to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("infra-guard: {e}");
                ExitCode::FAILURE
            }
        };
    }

    logging::init(&config);

    if let Some(command) = opts.check {
        return check(&config, &command);
    }

    // A broken rule set fails closed: guarded tools are denied, not waved through.
    let dispatcher = Dispatcher::from_config_or_deny(&config);

    let format = opts.format.unwrap_or(config.settings.output_format);
    match hook::run(
        &dispatcher,
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        format,
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("infra-guard: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Evaluate one command from the command line and print the verdict.
fn check(config: &Config, command: &str) -> ExitCode {
    let decision = match Guard::from_config(config) {
        Ok(guard) => guard.evaluate(command),
        Err(e) => {
            eprintln!("infra-guard: {e}");
            Decision::Block {
                rule: CONFIG_ERROR_RULE.to_string(),
                reason: format!("infra-guard configuration error: {e}"),
            }
        }
    };
    logging::log_decision(command, &decision);
    match decision {
        Decision::Allow => {
            println!("{}", decision.label());
            ExitCode::SUCCESS
        }
        Decision::Block { ref rule, ref reason } => {
            println!("{}\t{rule}\t{reason}", decision.label());
            ExitCode::from(EXIT_BLOCKED)
        }
    }
}
