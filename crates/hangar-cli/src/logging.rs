use std::io::{self, Write};

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        match *event.metadata().level() {
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]")),
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]")),
            Level::INFO => write!(writer, ""),
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]")),
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]")),
        }?;

        if let Some(message) = visitor.message {
            writeln!(writer, "{message}")
        } else {
            writeln!(writer)
        }
    }
}

/// Sends INFO to stdout and every other level to stderr.
struct WriterBuilder;

enum StdWriter {
    Out(io::Stdout),
    Err(io::Stderr),
}

impl Write for StdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            StdWriter::Out(out) => out.write(buf),
            StdWriter::Err(err) => err.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            StdWriter::Out(out) => out.flush(),
            StdWriter::Err(err) => err.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for WriterBuilder {
    type Writer = StdWriter;

    fn make_writer(&'a self) -> Self::Writer {
        StdWriter::Out(io::stdout())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        if meta.level() == &Level::INFO {
            StdWriter::Out(io::stdout())
        } else {
            StdWriter::Err(io::stderr())
        }
    }
}

fn filter_level(args: &Args) -> Level {
    if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn setup_logging(args: &Args) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("hangar={}", filter_level(args)))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(WriterBuilder)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(CustomFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn level(argv: &[&str]) -> Level {
        filter_level(&Args::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_filter_level() {
        assert_eq!(level(&["hangar", "search"]), Level::INFO);
        assert_eq!(level(&["hangar", "-v", "search"]), Level::DEBUG);
        assert_eq!(level(&["hangar", "-vvv", "search"]), Level::TRACE);
        assert_eq!(level(&["hangar", "-q", "-v", "search"]), Level::ERROR);
    }
}
