//! Console log writer: formats events as styled lines above the gauges.

use super::level::{level_style, level_for_verbosity};
use crate::display::Display;
use crate::style::{pad_left, Style, TermColor};
use std::fmt::{self, Write as _};
use std::time::{Duration, Instant, SystemTime};
use tracing::field::{Field, Visit};
use tracing::span::Attributes;
use tracing::{Event, Id, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Name of the field that carries an explicit logging context.
pub const CONTEXT_FIELD: &str = "context";

/// Compact duration: `"12.34s"` up to a minute, `"2m3.4s"` beyond.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 60.0 {
        format!("{}m{:.1}s", elapsed.as_secs() / 60, secs % 60.0)
    } else {
        format!("{secs:.2}s")
    }
}

/// A `tracing` layer that writes one line per event through a [`Display`].
///
/// Lines look like
///
/// ```text
/// [  0.12s] worker MSG gaugeline::demo: fetched 3 files
/// ```
///
/// with the elapsed time, optional process label, level tag, context (only
/// above INFO verbosity), and target in front of the message.
pub struct ConsoleLayer {
    display: Display,
    start: Instant,
    global_start: Option<SystemTime>,
    process: Option<String>,
    show_context: bool,
}

impl ConsoleLayer {
    /// Layer writing to `display`. `verbosity` decides whether the
    /// context column is shown; filtering is left to the subscriber.
    pub fn new(display: Display, verbosity: i32) -> Self {
        Self {
            display,
            start: Instant::now(),
            global_start: None,
            process: None,
            show_context: level_for_verbosity(verbosity) > Level::INFO,
        }
    }

    /// Label every line with a process name.
    #[must_use]
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = Some(process.into());
        self
    }

    /// Also show time elapsed since `start`, e.g. the start of a larger job.
    #[must_use]
    pub fn with_global_start(mut self, start: SystemTime) -> Self {
        self.global_start = Some(start);
        self
    }

    /// Build the console line for one event.
    fn format_line(&self, level: Level, target: &str, context: Option<&str>, message: &str) -> String {
        let green = Style::fg(TermColor::Green);
        let local = green.apply(&pad_left(&format_elapsed(self.start.elapsed()), 6));
        let stamp = match self.global_start {
            Some(global) => {
                let since = SystemTime::now().duration_since(global).unwrap_or_default();
                let global = Style::fg(TermColor::Blue).apply(&pad_left(&format_elapsed(since), 7));
                format!("[{global} / {local}]")
            }
            None => format!("[{local}]"),
        };

        let styles = level_style(level);
        let mut parts = vec![stamp];
        if let Some(process) = &self.process {
            parts.push(Style::fg(TermColor::Yellow).apply(process));
        }
        parts.push(styles.tag_style.apply(styles.tag));

        let mut labelled = false;
        if let Some(context) = context.filter(|_| self.show_context) {
            parts.push(Style::fg(TermColor::Cyan).apply(context));
            labelled = true;
        }
        if !target.is_empty() {
            parts.push(Style::fg(TermColor::Magenta).apply(target));
            labelled = true;
        }
        if labelled {
            if let Some(last) = parts.last_mut() {
                last.push(':');
            }
        }

        parts.push(styles.message_style.apply(message));
        parts.join(" ")
    }
}

impl fmt::Debug for ConsoleLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLayer")
            .field("process", &self.process)
            .field("show_context", &self.show_context)
            .finish_non_exhaustive()
    }
}

/// Context recorded on a span when it is created.
struct SpanContext(String);

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = MessageVisitor::default();
        attrs.record(&mut visitor);
        let context = visitor
            .context
            .unwrap_or_else(|| span.name().to_string());
        span.extensions_mut().insert(SpanContext(context));
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let context = visitor.context.clone().or_else(|| {
            for span in ctx.event_scope(event)? {
                if let Some(found) = span.extensions().get::<SpanContext>() {
                    return Some(found.0.clone());
                }
            }
            None
        });

        let line = self.format_line(
            *metadata.level(),
            metadata.target(),
            context.as_deref(),
            &visitor.message(),
        );
        // Logging never fails the caller.
        let _ = self.display.write_text(&line);
    }
}

/// Collects the message, the context field and any other fields.
#[derive(Default)]
pub(crate) struct MessageVisitor {
    pub(crate) message: Option<String>,
    pub(crate) context: Option<String>,
    pub(crate) fields: Vec<(&'static str, String)>,
}

impl MessageVisitor {
    /// The message followed by ` key=value` for each other field.
    pub(crate) fn message(&self) -> String {
        let mut out = self.message.clone().unwrap_or_default();
        for (name, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{name}={value}");
        }
        out
    }

    fn record(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            CONTEXT_FIELD => self.context = Some(value),
            name => self.fields.push((name, value)),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, value.to_string());
    }
}
