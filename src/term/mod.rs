extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use ansi_term::Style;
use basic::error;
use basic::lang::{ast, Dialect, Error};
use basic::mach::{Event, Host, Runtime};
use clap::Parser;
use linefeed::{DefaultTerminal, Interface, ReadResult, Signal};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "basic")]
#[command(about = "Run a parsed BASIC program in the terminal")]
struct Cli {
    /// Program tree as JSON
    program: PathBuf,

    /// Dialect preset overriding the program's own: ECMA55, ALTAIR, HP or MODERN
    #[arg(long)]
    dialect: Option<String>,

    /// Write a log to this file
    #[arg(long)]
    log: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

pub fn main() {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        if let Err(error) = init_log(cli.log_level, path) {
            eprintln!("{}", error);
        }
    }
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        eprintln!("{}", error);
    }
    let runtime = match load(&cli) {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("{}", Style::new().bold().paint(format!("?{}", error)));
            return;
        }
    };
    if let Err(error) = main_loop(runtime, interrupted) {
        eprintln!("{}", error);
    }
}

fn init_log(level: LevelFilter, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}",
        )))
        .build(path)?;
    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn load(cli: &Cli) -> Result<Runtime, Error> {
    let file = File::open(&cli.program)
        .map_err(|e| error!(InternalError; format!("{}: {}", cli.program.display(), e)))?;
    let mut program: ast::Program = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| error!(SyntaxError; e.to_string()))?;
    if let Some(name) = &cli.dialect {
        program.dialect = match Dialect::named(name) {
            Some(dialect) => dialect,
            None => return Err(error!(Dialect; format!("NO DIALECT CALLED {}", name))),
        };
    }
    let mut runtime = Runtime::default();
    runtime.load(program)?;
    runtime.reset()?;
    Ok(runtime)
}

fn main_loop(mut runtime: Runtime, interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let interface = Interface::new("BASIC")?;
    interface.set_report_signal(Signal::Interrupt, true);
    let mut screen = Screen {
        interface: &interface,
        failed: None,
    };

    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            let error = runtime.interrupt();
            report(&interface, &error)?;
            break;
        }
        match runtime.step(&mut screen) {
            Event::Running => {}
            Event::Stopped => break,
            Event::Error(error) => {
                report(&interface, &error)?;
                break;
            }
            Event::Input(prompt, _) => {
                interface.set_prompt(&format!("{}? ", prompt))?;
                match interface.read_line()? {
                    ReadResult::Input(line) => {
                        let values = line.split(',').map(|v| v.trim().to_string()).collect();
                        if let Err(error) = runtime.input(values, &mut screen) {
                            report(&interface, &error)?;
                            break;
                        }
                    }
                    ReadResult::Signal(Signal::Interrupt) => {
                        interface.set_buffer("")?;
                        interrupted.store(true, Ordering::SeqCst);
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                }
            }
        }
        if let Some(error) = screen.failed.take() {
            return Err(error);
        }
    }
    Ok(())
}

fn report(interface: &Interface<DefaultTerminal>, error: &Error) -> std::io::Result<()> {
    interface.write_fmt(format_args!(
        "{}\n",
        Style::new().bold().paint(format!("?{}", error))
    ))
}

/// PRINT output goes through linefeed so it does not tear the prompt.
struct Screen<'a> {
    interface: &'a Interface<DefaultTerminal>,
    failed: Option<std::io::Error>,
}

impl Host for Screen<'_> {
    fn print(&mut self, text: &str) {
        if let Err(error) = self.interface.write_fmt(format_args!("{}", text)) {
            self.failed.get_or_insert(error);
        }
    }
}
