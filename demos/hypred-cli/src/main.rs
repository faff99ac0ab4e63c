use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use ariadne::{ColorGenerator, Label, Report, Source};
use clap::Parser as ClapParser;
use hypred::{
    Error, OperatorFactory, Style,
    conf::FactoryConfig,
    registry::ClassRegistry,
    syntax::{self, BufferedVisitor, ParenPrinter, XmlPrinter},
    value::Value,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

const DEFAULT_PREDICATE: &str = r#"(and (is:String) (equals (get "foo")))"#;

#[derive(ClapParser)]
pub struct Arguments {
    /// Path to a predicate file; `.xml` files are read with the XML syntax
    input: Option<PathBuf>,

    /// Predicate text given inline, in paren syntax
    #[arg(short, long, conflicts_with = "input")]
    expr: Option<String>,

    /// Force the paren syntax
    #[arg(long, conflicts_with = "xml")]
    paren: bool,

    /// Force the XML syntax
    #[arg(long)]
    xml: bool,

    /// TOML factory configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print the simplified predicate
    #[arg(long)]
    pretty: bool,

    /// Print fully qualified class names
    #[arg(long)]
    verbose: bool,

    /// Only convert the source to the output syntax, without resolving it
    #[arg(long, requires = "to")]
    translate: bool,

    /// Output syntax for `--translate`
    #[arg(long, value_enum)]
    to: Option<Target>,

    /// Bind a `(get KEY)` placeholder, as KEY=VALUE
    #[arg(long = "set", value_name = "KEY=VALUE")]
    bindings: Vec<String>,

    /// String subject to evaluate the predicate against
    #[arg(short, long, default_value = "TEST")]
    subject: String,

    /// Increase log verbosity (-l info, -ll debug, -lll trace)
    #[arg(short = 'l', action = clap::ArgAction::Count)]
    log: u8,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Target {
    Paren,
    Xml,
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_record(record);
        }
    }

    fn flush(&self) {}
}

fn write_record(record: &Record) -> io::Result<()> {
    let color = match record.level() {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Cyan,
        Level::Trace => Color::Magenta,
    };
    let writer = BufferWriter::stderr(ColorChoice::Auto);
    let mut buffer = writer.buffer();
    buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(buffer, "{:>5}", record.level())?;
    buffer.reset()?;
    writeln!(buffer, " [{}] {}", record.target(), record.args())?;
    writer.print(&buffer)
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn report(name: &str, source: &str, error: &hypred::ParseError) -> ! {
    let Error::ParserErrors { errors } = &error.error else {
        fail(error);
    };
    let mut colors = ColorGenerator::new();
    let a = colors.next();
    for error in errors {
        let span = (name.to_string(), error.start..error.end);
        let printed = Report::build(ariadne::ReportKind::Error, span.clone())
            .with_message(&error.message)
            .with_label(Label::new(span).with_message("The error occurred here").with_color(a))
            .finish()
            .print((name.to_string(), Source::from(source)));
        if let Err(err) = printed {
            eprintln!("{}: {err}", error);
        }
    }
    std::process::exit(1);
}

/// Re-emits the raw events of `source` in the other syntax.
fn translate(source: &str, style: Style, target: Target, pretty: bool) -> Result<String, Error> {
    let mut buffer = BufferedVisitor::new();
    if style.contains(Style::XML) {
        syntax::xml::parse(source, &mut buffer)?;
    } else {
        syntax::paren::parse(source, &mut buffer)?;
    }
    let mut tokens = buffer.tokenizer();
    Ok(match target {
        Target::Paren => {
            let mut printer = ParenPrinter::new(pretty, false);
            tokens.replay(&mut printer);
            printer.finish()
        }
        Target::Xml => {
            let mut printer = XmlPrinter::new(pretty, false);
            tokens.replay(&mut printer);
            printer.finish()
        }
    })
}

fn main() {
    let args = Arguments::parse();
    init_logger(args.log);

    let config = match &args.config {
        Some(path) => FactoryConfig::from_path(path).unwrap_or_else(|err| fail(err)),
        None => FactoryConfig::default(),
    }
    .with_env_overrides();

    let (name, source) = match (&args.input, &args.expr) {
        (Some(path), _) => {
            let source = std::fs::read_to_string(path)
                .unwrap_or_else(|err| fail(format!("cannot read {}: {err}", path.display())));
            (path.display().to_string(), source)
        }
        (None, Some(expr)) => ("<expr>".to_string(), expr.clone()),
        (None, None) => ("<default>".to_string(), DEFAULT_PREDICATE.to_string()),
    };

    let is_xml_file = args
        .input
        .as_ref()
        .and_then(|path| path.extension())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    let syntax = if args.xml || (!args.paren && is_xml_file) {
        Style::XML
    } else if args.paren || args.input.is_none() {
        Style::PAREN
    } else {
        config.style() & (Style::XML | Style::PAREN)
    };

    if let Some(target) = args.to.filter(|_| args.translate) {
        match translate(&source, syntax, target, args.pretty) {
            Ok(text) => println!("{text}"),
            Err(err) => report(&name, &source, &err.into()),
        }
        return;
    }

    let mut output = syntax;
    output.set(Style::PRETTY, args.pretty || config.pretty);
    output.set(Style::VERBOSE, args.verbose || config.verbose);

    let factory = OperatorFactory::with_config(Arc::new(ClassRegistry::new()), config);
    let mut op = match factory.create_styled(syntax, &source) {
        Ok(op) => op,
        Err(err) => report(&name, &source, &err),
    };

    let mut bindings = args.bindings.clone();
    if args.input.is_none() && args.expr.is_none() && bindings.is_empty() {
        bindings.push("foo=TEST".to_string());
    }
    for binding in &bindings {
        let Some((key, value)) = binding.split_once('=') else {
            fail(format!("invalid binding `{binding}`, expecting KEY=VALUE"));
        };
        op.set_const(key, value).unwrap_or_else(|err| fail(err));
    }

    println!("{}", op.to_string_styled(output));
    match op.execute(&Value::from(args.subject.as_str())) {
        Ok(result) => println!("{:?} -> {result}", args.subject),
        Err(err) => fail(err),
    }
}
