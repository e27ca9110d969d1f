use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use curlang::currencies::CurrencyCatalog;
use curlang::interpreter::Interpreter;
use curlang::lexer::Lexer;
use curlang::parser::Parser;
use curlang::source::StringSource;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut catalog_path: Option<PathBuf> = None;
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--currencies" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing file path after {arg}"))?;
                catalog_path = Some(PathBuf::from(path));
            }
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let catalog = match catalog_path {
        Some(path) => CurrencyCatalog::load(&path)?,
        None => CurrencyCatalog::default_set(),
    };

    let lexer = Lexer::new(StringSource::new(&source), &catalog);
    let mut parser = Parser::new(lexer)?;
    let program = parser.parse_program()?;

    let mut interpreter = Interpreter::new();
    interpreter.run(&program)?;
    for line in interpreter.output() {
        println!("{line}");
    }
    Ok(())
}
