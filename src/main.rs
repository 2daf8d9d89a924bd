use std::fs::{self, File};
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use bf_tape::cli_util::print_engine_error;
use bf_tape::config::{Settings, parse_bool};
use bf_tape::{
    Cell, CellMode, CharReader, Engine, EngineConfig, EngineError, InputSource, RunControl,
    SeekableCharReader, StrInput, Tape, TraceTable, logging,
};
use clap::{ArgGroup, Parser};
use tracing::{debug, warn};

/// Grace period for the worker to notice cancellation before we give up on it.
const CANCEL_GRACE: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(
    name = "bf",
    version,
    about = "Run a Brainfuck program on an unbounded tape",
    after_help = r#"Notes:
- Characters outside of Brainfuck's ><+-.,[] are comments.
- Without --input/--input-file, every `,` stores the --eof value.
- Use `--input-file -` to read input from stdin.
- Defaults can be set in bf.toml in your XDG config home."#
)]
#[command(group(ArgGroup::new("source").required(true).args(["code", "program", "program_file"])))]
struct Cli {
    /// Brainfuck code parts (concatenated)
    #[arg(value_name = "CODE", trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,

    /// Brainfuck code given as a single string
    #[arg(long, value_name = "CODE", allow_hyphen_values = true)]
    program: Option<String>,

    /// Read Brainfuck code from PATH
    #[arg(short = 'f', long = "program-file", value_name = "PATH")]
    program_file: Option<PathBuf>,

    /// Literal text consumed by `,`
    #[arg(long, value_name = "TEXT", conflicts_with = "input_file")]
    input: Option<String>,

    /// Read `,` input from PATH (`-` for stdin)
    #[arg(long = "input-file", value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Track bracket depth when skipping loops [default: true]
    #[arg(long = "nested-loops", value_name = "BOOL", value_parser = parse_bool_arg)]
    nested_loops: Option<bool>,

    /// Print a trace row to stderr after every instruction [default: false]
    #[arg(long, value_name = "BOOL", value_parser = parse_bool_arg)]
    debug: Option<bool>,

    /// Shorthand for `--debug true`
    #[arg(short = 'd', conflicts_with = "debug")]
    debug_flag: bool,

    /// Value stored by `,` when input is exhausted or absent [default: 0]
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    eof: Option<Cell>,

    /// Use byte cells that wrap modulo 256 instead of unbounded integers
    #[arg(long)]
    wrap: bool,

    /// Print the final tape cells after the run
    #[arg(long = "dump-tape")]
    dump_tape: bool,

    /// Maximum interpreter steps before abort (fallback BF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    max_steps: Option<usize>,

    /// Wall-clock timeout in milliseconds (fallback BF_TIMEOUT_MS; default none)
    #[arg(long = "timeout", value_name = "MS")]
    timeout_ms: Option<u64>,
}

fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("expected a boolean (true/false, yes/no, on/off, 1/0), got '{value}'"))
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// Everything the worker thread needs to execute one program.
struct Job {
    code: String,
    config: EngineConfig,
    cell_mode: CellMode,
    input: Option<Box<dyn InputSource + Send>>,
    trace: Option<TraceTable<io::Stderr>>,
    trace_delay: Duration,
    control: RunControl,
}

impl Job {
    fn execute(mut self) -> (Result<(), EngineError>, Tape) {
        let mut tape = Tape::with_mode(self.cell_mode);
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let mut engine = Engine::new(&mut tape, &self.code, self.config)
            .with_output(&mut out)
            .with_trace_delay(self.trace_delay);
        if let Some(input) = self.input.as_deref_mut() {
            engine = engine.with_input(input);
        }
        if let Some(trace) = self.trace.as_mut() {
            engine = engine.with_trace(trace);
        }

        let result = engine.run_with_control(&self.control);
        (result, tape)
    }
}

fn load_code(program: &str, cli: &Cli) -> Result<String, i32> {
    if let Some(path) = cli.program_file.as_ref() {
        return fs::read_to_string(path).map_err(|e| {
            eprintln!("{program}: failed to read program file as UTF-8: {e}");
            1
        });
    }
    Ok(cli.program.clone().unwrap_or_else(|| cli.code.join("")))
}

fn open_input(program: &str, cli: &Cli) -> Result<Option<Box<dyn InputSource + Send>>, i32> {
    if let Some(text) = cli.input.as_ref() {
        return Ok(Some(Box::new(StrInput::new(text))));
    }
    let Some(path) = cli.input_file.as_ref() else {
        return Ok(None);
    };
    if path.as_os_str() == "-" {
        return Ok(Some(Box::new(CharReader::new(BufReader::new(io::stdin())))));
    }
    match File::open(path) {
        Ok(file) => Ok(Some(Box::new(SeekableCharReader::new(BufReader::new(file))))),
        Err(e) => {
            eprintln!("{program}: failed to open input file {}: {e}", path.display());
            Err(1)
        }
    }
}

fn run(program: &str, cli: Cli) -> i32 {
    let code = match load_code(program, &cli) {
        Ok(code) => code,
        Err(exit) => return exit,
    };
    let input = match open_input(program, &cli) {
        Ok(input) => input,
        Err(exit) => return exit,
    };

    // Resolve options: flags -> env -> settings file -> defaults
    let settings = Settings::load();
    let debug = cli.debug_flag || cli.debug.unwrap_or(false);
    let mut config = settings.engine_config(debug);
    if let Some(nested_loops) = cli.nested_loops {
        config.nested_loops = nested_loops;
    }
    if let Some(eof) = cli.eof {
        config.eof_sentinel = eof;
    }
    let cell_mode = if cli.wrap { CellMode::Wrapping } else { settings.cell_mode };
    let max_steps = cli.max_steps.or_else(|| env_number("BF_MAX_STEPS"));
    let timeout_ms = cli.timeout_ms.or_else(|| env_number("BF_TIMEOUT_MS"));
    debug!(?config, ?cell_mode, ?max_steps, ?timeout_ms, "resolved options");

    let trace = debug.then(|| {
        let table = TraceTable::new(io::stderr());
        if io::stderr().is_terminal() {
            table.with_colors(settings.colors)
        } else {
            table
        }
    });

    // Ctrl+C asks the engine to stop before its next instruction
    let cancel = Arc::new(AtomicBool::new(false));
    let interrupted = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed)) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let job = Job {
        code: code.clone(),
        config,
        cell_mode,
        input,
        trace,
        trace_delay: settings.trace_delay,
        control: RunControl::new(max_steps, cancel.clone()),
    };

    // Execute on a worker thread so a wall-clock timeout can cancel it
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job.execute());
    });

    let mut timed_out = false;
    let finished = match timeout_ms {
        Some(ms) => match rx.recv_timeout(Duration::from_millis(ms)) {
            Ok(done) => Some(done),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                timed_out = true;
                cancel.store(true, Ordering::Relaxed);
                rx.recv_timeout(CANCEL_GRACE).ok()
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => None,
        },
        None => rx.recv().ok(),
    };

    let Some((result, tape)) = finished else {
        if timed_out {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({} ms)", timeout_ms.unwrap_or_default());
        } else {
            eprintln!("{program}: interpreter thread stopped unexpectedly");
        }
        let _ = io::stderr().flush();
        return 1;
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(EngineError::Canceled) if timed_out => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({} ms)", timeout_ms.unwrap_or_default());
            1
        }
        Err(EngineError::Canceled) => {
            eprintln!("Execution aborted: interrupted");
            130
        }
        Err(err) => {
            print_engine_error(Some(program), &code, &err);
            1
        }
    };
    let _ = io::stderr().flush();

    let mut stdout = io::stdout().lock();
    if cli.dump_tape {
        let _ = writeln!(stdout, "\n{:?}", tape.cells());
    } else if stdout.is_terminal() {
        // For readability, end interactive output with a newline
        let _ = writeln!(stdout);
    }
    let _ = stdout.flush();

    exit_code
}

fn main() {
    logging::init();

    // Program name for error prefixes, matching how we were invoked
    let program = std::env::args()
        .next()
        .and_then(|arg0| {
            PathBuf::from(arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();
    std::process::exit(run(&program, cli));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_parts_are_concatenated() {
        let cli = Cli::try_parse_from(["bf", "+++", "->", "."]).unwrap();
        assert_eq!(load_code("bf", &cli).unwrap(), "+++->.");
    }

    #[test]
    fn long_flag_spelling_is_accepted() {
        let cli = Cli::try_parse_from([
            "bf",
            "--program",
            ",.",
            "--input",
            "hi",
            "--nested-loops",
            "off",
            "--debug",
            "yes",
            "--eof",
            "-1",
            "--dump-tape",
        ])
        .unwrap();
        assert_eq!(cli.program.as_deref(), Some(",."));
        assert_eq!(cli.nested_loops, Some(false));
        assert_eq!(cli.debug, Some(true));
        assert_eq!(cli.eof, Some(-1));
        assert!(cli.dump_tape);
    }

    #[test]
    fn exactly_one_program_source() {
        assert!(Cli::try_parse_from(["bf"]).is_err());
        assert!(Cli::try_parse_from(["bf", "--program", "+", "-f", "x.bf"]).is_err());
    }

    #[test]
    fn input_and_input_file_conflict() {
        assert!(Cli::try_parse_from(["bf", "--input", "a", "--input-file", "b", "+"]).is_err());
    }

    #[test]
    fn options_after_code_are_code() {
        let cli = Cli::try_parse_from(["bf", "+", "--input", "a"]).unwrap();
        assert_eq!(load_code("bf", &cli).unwrap(), "+--inputa");
        assert!(cli.input.is_none());
    }

    #[test]
    fn bad_boolean_is_rejected() {
        assert!(Cli::try_parse_from(["bf", "--nested-loops", "maybe", "+"]).is_err());
    }
}
