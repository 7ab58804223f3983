use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::ValueEnum;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::lox::{Lox, EX_DATAERR, EX_OK, EX_USAGE, STACK_SIZE};
use rox::parser::Parser;
use rox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    #[arg(value_name = "script")]
    scripts: Vec<PathBuf>,

    /// Enable logging to a file
    #[arg(long)]
    log: bool,

    /// Where `--log` writes
    #[arg(long, value_name = "PATH", default_value = "app.log")]
    log_file: PathBuf,

    /// Print an intermediate form of the script instead of running it
    #[arg(long, value_enum)]
    emit: Option<Emit>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// One token per line: `TYPE lexeme literal`
    Tokens,

    /// One JSON object per token
    TokensJson,

    /// The parsed program as s-expressions
    Ast,
}

fn read_file(filename: &Path) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // RUST_LOG overrides
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Dumps tokens or the AST; returns the exit code.
fn emit(kind: Emit, source: &str) -> Result<i32> {
    let mut failed = false;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match kind {
        Emit::Tokens | Emit::TokensJson => {
            for item in Scanner::new(source) {
                match item {
                    Ok(token) if kind == Emit::Tokens => writeln!(out, "{}", token)?,
                    Ok(token) => writeln!(out, "{}", serde_json::to_string(&token)?)?,
                    Err(e) => {
                        failed = true;
                        eprintln!("{}", e);
                    }
                }
            }
        }

        Emit::Ast => {
            let (tokens, lex_errors) = Scanner::new(source).scan_all();
            let (statements, parse_errors) = Parser::new(tokens).parse();

            for e in lex_errors.iter().chain(parse_errors.iter()) {
                failed = true;
                eprintln!("{}", e);
            }

            if !failed {
                for stmt in &statements {
                    writeln!(out, "{}", AstPrinter::print_stmt(stmt))?;
                }
            }
        }
    }

    Ok(if failed { EX_DATAERR } else { EX_OK })
}

fn run_file(path: &Path, emit_kind: Option<Emit>) -> Result<i32> {
    let bytes = read_file(path)?;
    let source = std::str::from_utf8(&bytes).context(format!("{:?} is not UTF-8", path))?;

    if let Some(kind) = emit_kind {
        return emit(kind, source);
    }

    let mut lox = Lox::new();
    lox.run(source);

    debug!("File run finished with exit code {}", lox.exit_code());

    Ok(lox.exit_code())
}

fn run_prompt() -> Result<i32> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        lox.run(line.trim_end_matches(['\n', '\r']));
        lox.reset_error();
    }

    Ok(EX_OK)
}

fn dispatch(args: Cli) -> Result<i32> {
    match args.scripts.as_slice() {
        [] => run_prompt(),
        [script] => run_file(script, args.emit),
        _ => {
            println!("usage: jlox [script]");
            Ok(EX_USAGE)
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // A minimal logger avoids "no logger" noise from dependencies.
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    // Deep Lox recursion needs more native stack than `main` gets.
    let code = thread::Builder::new()
        .name("lox".into())
        .stack_size(STACK_SIZE)
        .spawn(move || dispatch(args))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    std::process::exit(code);
}
