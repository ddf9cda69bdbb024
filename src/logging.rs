//! Workflow-command logging.
//!
//! Events go through `tracing` and are rendered the way the Actions runner
//! expects them on stdout: errors and warnings become annotations, debug
//! events become `::debug::` lines and info is printed as-is.

use anyhow::{Context, Result};
use std::{fmt, io::Write};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::{Context as LayerContext, Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_ENV: &str = "VHS_ACTION_LOG";
const DEFAULT_DIRECTIVES: &str = "vhs_action=debug,warn";

pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    tracing_subscriber::registry()
        .with(filter)
        .with(WorkflowCommandLayer::new(std::io::stdout))
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

/// Reports a run-terminating failure. Written straight to stdout so neither
/// the log filter nor a missing subscriber can hide it. The caller is
/// responsible for the exit code.
pub fn set_failed(err: &anyhow::Error) {
    println!("{}", failure_line(err));
}

fn failure_line(err: &anyhow::Error) -> String {
    format_command("error", &[], &format!("{err:#}"))
}

/// Runs `f` inside a collapsible log group.
pub fn group<T>(title: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    issue("group", &[], title);
    let result = f();
    issue("endgroup", &[], "");
    result
}

pub fn issue(command: &str, properties: &[(&str, &str)], message: &str) {
    println!("{}", format_command(command, properties, message));
}

pub fn format_command(command: &str, properties: &[(&str, &str)], message: &str) -> String {
    let mut line = format!("::{command}");
    let props: Vec<String> = properties
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={}", escape_property(value)))
        .collect();
    if !props.is_empty() {
        line.push(' ');
        line.push_str(&props.join(","));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    line
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

pub struct WorkflowCommandLayer<W> {
    make_writer: W,
}

impl<W> WorkflowCommandLayer<W> {
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {fields}", self.message)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}

fn render(level: Level, message: &str) -> String {
    match level {
        Level::ERROR => format_command("error", &[], message),
        Level::WARN => format_command("warning", &[], message),
        Level::INFO => message.to_string(),
        _ => format_command("debug", &[], message),
    }
}

impl<S, W> Layer<S> for WorkflowCommandLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let line = render(*event.metadata().level(), &visitor.finish());
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{line}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` with every event rendered into the returned string.
    pub(crate) fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::registry()
            .with(WorkflowCommandLayer::new(move || sink.clone()));
        let value = tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        (value, String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn format_command_escapes_message_and_properties() {
        let line = format_command("set-env", &[("name", "A:B,C")], "50%\nnext");
        assert_eq!(line, "::set-env name=A%3AB%2CC::50%25%0Anext");
    }

    #[test]
    fn format_command_without_properties() {
        assert_eq!(format_command("endgroup", &[], ""), "::endgroup::");
        assert_eq!(format_command("add-path", &[], "/opt/bin"), "::add-path::/opt/bin");
    }

    #[test]
    fn layer_renders_levels_as_workflow_commands() {
        let ((), out) = capture(|| {
            tracing::error!("File {} does not exist", "demo.tape");
            tracing::warn!("Path /nope does not exist, skipping");
            tracing::info!("Running VHS");
            tracing::debug!(status = 3, "child exited");
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "::error::File demo.tape does not exist",
                "::warning::Path /nope does not exist, skipping",
                "Running VHS",
                "::debug::child exited status=3",
            ]
        );
    }

    #[test]
    fn failure_line_is_an_error_annotation_with_context_chain() {
        let err = anyhow::anyhow!("File exists (os error 17)").context("create /tmp/root");
        assert_eq!(
            failure_line(&err),
            "::error::create /tmp/root: File exists (os error 17)"
        );
    }

    #[test]
    fn failure_line_does_not_depend_on_subscriber() {
        let err = anyhow::anyhow!("first line\nsecond line");
        let (line, out) = capture(|| {
            let off = tracing_subscriber::registry().with(EnvFilter::new("off"));
            tracing::subscriber::with_default(off, || failure_line(&err))
        });
        assert_eq!(line, "::error::first line%0Asecond line");
        assert!(out.is_empty());
    }
}
