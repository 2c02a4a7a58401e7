//! Human and JSON rendering for taskdesk CLI commands.
//!
//! Every command builds one [`HumanOutput`] and hands its JSON payload to
//! [`emit_success`]; with `--json` both collapse into a single envelope.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskdesk.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text rendering of a command result: a header, aligned `key  value`
/// pairs, free-form lines, then warnings and suggested commands.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(flatten)]
    body: B,
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    next_steps: &'a [String],
}

fn is_empty(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct SuccessBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    message: &'a str,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn print_envelope<B: Serialize>(
    command: &str,
    status: &'static str,
    body: B,
    warnings: &[String],
    next_steps: &[String],
) -> Result<()> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status,
        body,
        warnings,
        next_steps,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        return print_envelope(command, "success", SuccessBody { data }, warnings, next_steps);
    }

    if options.quiet {
        return Ok(());
    }
    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report a failed command: an error envelope on stdout with `--json`,
/// otherwise `error:` and an optional `hint:` on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        let message = err.to_string();
        let body = ErrorBody {
            error: ErrorPayload {
                message: &message,
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
        };
        return print_envelope(command, "error", body, &[], &next_steps);
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    let width = output
        .summary
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    for (key, value) in &output.summary {
        if value.is_empty() {
            lines.push(format!("  {key}"));
        } else {
            let pad = width - key.chars().count();
            lines.push(format!("  {key}{}  {value}", " ".repeat(pad)));
        }
    }

    if !output.details.is_empty() {
        lines.push(String::new());
        lines.extend(output.details.iter().map(|line| format!("  {line}")));
    }
    if !output.warnings.is_empty() || !output.next_steps.is_empty() {
        lines.push(String::new());
    }
    lines.extend(output.warnings.iter().map(|line| format!("warning: {line}")));
    lines.extend(output.next_steps.iter().map(|line| format!("next: {line}")));

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// Global flags that consume the following argument.
const VALUE_FLAGS: [&str; 3] = ["--root", "--actor", "--events"];

/// Command groups whose second word names the command.
const NESTED: [&str; 4] = ["task", "profile", "actor", "avatar"];

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut skip_value = false;
    let words: Vec<String> = args
        .into_iter()
        .filter(|arg| {
            if std::mem::take(&mut skip_value) {
                return false;
            }
            if arg.starts_with('-') {
                skip_value = VALUE_FLAGS.contains(&arg.as_str());
                return false;
            }
            true
        })
        .take(2)
        .collect();

    match words.as_slice() {
        [] => "taskdesk".to_string(),
        [group, sub] if NESTED.contains(&group.as_str()) => format!("{group} {sub}"),
        [command, ..] => command.clone(),
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "policy_blocked",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let steps: &[&str] = match err {
        Error::UnknownActor(_) => &["taskdesk profile list", "taskdesk actor set <profile-id>"],
        Error::ProfileNotFound(_) => &["taskdesk profile list"],
        Error::TaskNotFound(_) | Error::ChecklistItemNotFound(_) => &["taskdesk task list"],
        Error::Forbidden { .. } => &["taskdesk profile whoami"],
        Error::InvalidConfig(_) => &["fix .taskdesk.toml then retry"],
        Error::LockFailed(_) => &["retry once the other taskdesk command finishes"],
        _ => &[],
    };
    steps.iter().map(|step| step.to_string()).collect()
}
