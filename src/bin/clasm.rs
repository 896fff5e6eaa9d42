// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs;
use std::sync::Arc;

use clap::{arg, Arg, ArgMatches, Command};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
//
use clasm::compiler;
use clasm::parser;
use clasm::source::Source;
use clasm::util::ToHexString;

fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments
    let matches = Command::new("clasm")
        .about("CLARA assembler")
        .version("0.1.0")
        .subcommand_required(true)
        .arg(arg!(--verbose "Show verbose output"))
        .subcommand(
            Command::new("assemble")
                .about("Assemble a source file into CLARA bytecode")
                .arg(Arg::new("file").required(true))
                .arg(Arg::new("output").short('o').long("output").takes_value(true))
                .visible_alias("a"),
        )
        .get_matches();
    // Extract top-level flags
    let verbose = matches.is_present("verbose");
    // Initialise logging
    if verbose {
        init_logging(LevelFilter::Info);
    }
    // Dispatch on outcome
    let ok = match matches.subcommand() {
        Some(("assemble", args)) => assemble(args),
        _ => unreachable!(),
    }?;
    // Determine appropriate exit code
    let exitcode = if ok { 0 } else { 1 };
    // Done
    std::process::exit(exitcode);
}

/// Assemble a given source file.
fn assemble(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    // Extract the file to be assembled.
    let filename = args.get_one::<String>("file").unwrap();
    // Read the source file
    let input = fs::read_to_string(filename)?;
    info!("parsing {filename} ({} bytes)", input.len());
    // Index the source and parse it
    let source = Arc::new(Source::new(filename, &input)?);
    let mut parsed = parser::tokenize(&parser::Options::default(), source);
    if !parsed.ok() {
        return Ok(false);
    }
    // Emit bytecode from the parsed streams
    let mut bytes: Vec<u8> = Vec::new();
    let compiled = compiler::compile(&compiler::Options::default(), &mut parsed.info, &mut bytes);
    if !compiled.ok() {
        return Ok(false);
    }
    info!("assembled {} bytes", bytes.len());
    // Write raw bytes, or print the final hex string
    match args.get_one::<String>("output") {
        Some(path) => fs::write(path, &bytes)?,
        None => println!("{}", bytes.to_hex_string()),
    }
    //
    Ok(true)
}

/// Initialise logging using a suitable pattern.
pub fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    //
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(encoder))
        .build();
    //
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    //
    let _handle = log4rs::init_config(config).unwrap();
}
