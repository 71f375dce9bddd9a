use std::fmt;
use std::io::IsTerminal;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// ANSI color codes for console output
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_BRIGHT_YELLOW: &str = "\x1b[93m";
const COLOR_BRIGHT_RED: &str = "\x1b[91m";
const COLOR_BRIGHT_GRAY: &str = "\x1b[90m";

/// Column widths for alignment
const COMPONENT_WIDTH: usize = 16;
const LOG_LEVEL_WIDTH: usize = 7;

/// `[timestamp] [component] [level] message` formatter
pub struct FuzzLogFormatter {
    service_name: String,
    color_enabled: bool,
}

/// Macro to create component-specific logging functions
#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => {
        tracing::info!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => {
        tracing::warn!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => {
        tracing::debug!(component = $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_error {
    ($component:expr, $($arg:tt)*) => {
        tracing::error!(component = $component, $($arg)*)
    };
}

impl FuzzLogFormatter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            color_enabled: is_terminal(),
        }
    }

    #[cfg(test)]
    fn plain(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            color_enabled: false,
        }
    }

    /// Component column, prefixed with the service name
    fn format_component(&self, component: Option<&str>) -> String {
        let name = match component {
            Some(comp) => format!("{}-{}", self.service_name, comp),
            None => self.service_name.clone(),
        };

        if name.chars().count() > COMPONENT_WIDTH {
            let cut: String = name.chars().take(COMPONENT_WIDTH - 1).collect();
            format!("{}…", cut)
        } else {
            format!("{:<width$}", name, width = COMPONENT_WIDTH)
        }
    }

    fn format_log_level(&self, level: &Level) -> String {
        let level_str = match *level {
            Level::ERROR => "✗ ERROR",
            Level::WARN => "⚠ WARN",
            Level::INFO => "ℹ INFO",
            Level::DEBUG => "◦ DEBUG",
            _ => "◦ TRACE",
        };

        format!("{:<width$}", level_str, width = LOG_LEVEL_WIDTH + 2) // +2 for icon
    }

    fn color_for_level(&self, level: &Level) -> &'static str {
        if !self.color_enabled {
            return "";
        }

        match *level {
            Level::ERROR => COLOR_BRIGHT_RED,
            Level::WARN => COLOR_BRIGHT_YELLOW,
            Level::INFO => COLOR_GREEN,
            _ => COLOR_BRIGHT_GRAY,
        }
    }

    fn write_line(
        &self,
        writer: &mut impl fmt::Write,
        timestamp: &str,
        level: &Level,
        fields: &FieldVisitor,
    ) -> fmt::Result {
        let color = self.color_for_level(level);
        let reset_color = if self.color_enabled { COLOR_RESET } else { "" };
        let cyan_color = if self.color_enabled { COLOR_CYAN } else { "" };

        write!(
            writer,
            "{}[{}] [{}] [{}{}{}] ",
            cyan_color,
            timestamp,
            self.format_component(fields.component.as_deref()),
            color,
            self.format_log_level(level),
            reset_color
        )?;
        writeln!(writer, "{}{}", fields.message, reset_color)
    }
}

impl<S, N> FormatEvent<S, N> for FuzzLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.write_line(&mut writer, &timestamp, event.metadata().level(), &visitor)
    }
}

/// Visitor to extract fields from the event
#[derive(Default)]
struct FieldVisitor {
    message: String,
    component: Option<String>,
}

fn strip_quotes(text: String) -> String {
    match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => text,
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = strip_quotes(format!("{:?}", value)),
            "component" => self.component = Some(strip_quotes(format!("{:?}", value))),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "component" => self.component = Some(value.to_string()),
            _ => {}
        }
    }
}

/// Colors only when stderr is a terminal that understands them
fn is_terminal() -> bool {
    if std::env::var("TERM").unwrap_or_default() == "dumb" {
        return false;
    }
    std::io::stderr().is_terminal()
}
