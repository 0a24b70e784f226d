//! blocklight - highlight source files from the command line
//!
//! Prints a file highlighted to the terminal, or an HTML preview fragment of
//! a few lines around a given line.

mod terminal;

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use blocklight::syntax::{BlockId, BlockStore, Document, Highlighter, StyleResolver, SyntaxManager, TextStyle};
use blocklight::{Config, Error, Result};
use terminal::Terminal;

/// Environment variable holding the log filter
const LOG_ENV: &str = "BLOCKLIGHT_LOG";

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    file: Option<PathBuf>,
    language: Option<String>,
    config: Option<PathBuf>,
    list: bool,
    html: bool,
    /// 1-based line the preview is centred on
    line: usize,
    blocks: Option<usize>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Run(Options),
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options {
        line: 1,
        ..Default::default()
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| Error::Message(format!("{} needs a value", arg)))
        };
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--list" | "-l" => options.list = true,
            "--html" => options.html = true,
            "--language" | "-L" => options.language = Some(value()?),
            "--config" | "-c" => options.config = Some(PathBuf::from(value()?)),
            "--line" => options.line = parse_number(&arg, &value()?)?,
            "--blocks" => options.blocks = Some(parse_number(&arg, &value()?)?),
            "-" => options.file = None,
            _ if arg.starts_with('-') => {
                return Err(Error::Message(format!("unknown option: {}", arg)));
            }
            _ => options.file = Some(PathBuf::from(&arg)),
        }
    }
    Ok(Command::Run(options))
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Message(format!("{} needs a positive number, got {:?}", name, value))),
    }
}

fn run() -> Result<()> {
    let options = match parse_args(env::args().skip(1))? {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
        Command::Run(options) => options,
    };

    let config = match &options.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let mut manager = SyntaxManager::from_config(&config);

    if options.list {
        for language in manager.list_languages() {
            println!("{:<12} {:<12} {}", language.id, language.name, language.globs.join(" "));
        }
        return Ok(());
    }

    let text = read_input(&options)?;
    let text = text.strip_suffix('\n').unwrap_or(&text);
    let filename = options.file.as_ref().and_then(|p| p.to_str());

    let language = match &options.language {
        Some(id) => Some(
            manager
                .load_language_by_id(id)
                .ok_or_else(|| Error::LanguageNotFound(id.clone()))?,
        ),
        None => manager.load_language_by_mime_or_filename(None, filename),
    };
    debug!(language = ?language.as_ref().map(|l| l.id()), "highlighting");

    let document = match language {
        Some(language) => Document::with_highlighter(text, Highlighter::new(language)),
        None => Document::new(text),
    };

    if options.html {
        let block = options.line.saturating_sub(1).min(document.len() - 1);
        let position = document.block_position(BlockId(block));
        let blocks = options.blocks.unwrap_or(config.preview_blocks);
        println!(
            "{}",
            document.render_preview_fragment(position, blocks, &config.preview_font, manager.theme())
        );
        return Ok(());
    }

    let theme = manager.theme();
    let graph = document.highlighter().map(|h| h.language().graph());
    let mut terminal = Terminal::stdout();
    for index in 0..document.len() {
        let block = BlockId(index);
        let text = document.text(block).unwrap_or_default();
        terminal.write_block(text, document.paints(block), |style| match graph {
            Some(graph) => theme.resolve(graph, style),
            None => TextStyle::default(),
        })?;
    }
    terminal.flush()
}

/// The file named on the command line, or stdin
fn read_input(options: &Options) -> Result<String> {
    let bytes = match &options.file {
        Some(path) => fs::read(path)?,
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            bytes
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_usage() {
    println!("blocklight {} - block-incremental syntax highlighter", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: blocklight [OPTIONS] [FILE]");
    println!();
    println!("Reads standard input when FILE is missing or '-'.");
    println!();
    println!("Options:");
    println!("  -L, --language ID   Use this language instead of detecting one");
    println!("  -l, --list          List available languages");
    println!("      --html          Print an HTML preview fragment instead");
    println!("      --line N        Line the preview is centred on (default 1)");
    println!("      --blocks N      Number of lines in the preview");
    println!("  -c, --config PATH   Read settings from PATH instead of ~/.blocklight.toml");
    println!("  -h, --help          Show this help message");
    println!("  -V, --version       Show version information");
    println!();
    println!("Set {}=debug to see what the loader does.", LOG_ENV);
}

fn print_version() {
    println!("blocklight {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_args(args(&["-h"])).unwrap(), Command::Help);
        assert_eq!(parse_args(args(&["x.rs", "--version"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_run_options() {
        let command = parse_args(args(&["--html", "--line", "12", "-L", "c", "main.txt"])).unwrap();
        assert_eq!(
            command,
            Command::Run(Options {
                file: Some(PathBuf::from("main.txt")),
                language: Some("c".to_string()),
                html: true,
                line: 12,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_defaults() {
        let Command::Run(options) = parse_args(Vec::new()).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(options.line, 1);
        assert!(options.file.is_none());
        assert!(!options.html);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse_args(args(&["--frobnicate"])).is_err());
        assert!(parse_args(args(&["--language"])).is_err());
        assert!(parse_args(args(&["--blocks", "0"])).is_err());
        assert!(parse_args(args(&["--line", "x"])).is_err());
    }
}
