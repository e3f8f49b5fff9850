use color_print::{cformat, cprintln};
use std::io::BufRead;
use std::path::Path;

use psasm::{pass1::Pass1, pass2::Pass2, token};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, clap::Subcommand)]
enum Cmd {
    /// Build tables and intermediate code from source
    Pass1 {
        /// Input file
        #[clap(default_value = "main.ps")]
        input: String,

        /// Artifact directory
        #[clap(short, long, default_value = "out")]
        out: String,

        /// Dump tables and intermediate code
        #[clap(short, long)]
        dump: bool,
    },

    /// Resolve intermediate code into machine code
    Pass2 {
        /// Artifact directory
        #[clap(short, long, default_value = "out")]
        dir: String,

        /// Output file
        #[clap(short, long, default_value = "machine.txt")]
        output: String,
    },
}

fn main() {
    use clap::Parser;

    let args = Args::parse();
    println!("Pseudo-machine two-pass assembler");
    match args.cmd {
        Cmd::Pass1 { input, out, dump } => pass1(&input, &out, dump),
        Cmd::Pass2 { dir, output } => pass2(&dir, &output),
    }
}

fn pass1(input: &str, out: &str, dump: bool) {
    println!("1. Read Source");
    println!("  < {}", input);
    let file = std::fs::File::open(input)
        .expect(&cformat!("<r,s>Failed to open file</>: {}", input));
    let mut lines = vec![];
    for raw in std::io::BufReader::new(file).lines() {
        let raw = raw.expect(&cformat!("<r,s>Failed to read line</>: {}", input));
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            continue;
        }
        // reading stops at (and includes) the first line with an END token
        let stop = token::tokenize(&raw).iter().any(|t| t.eq_ignore_ascii_case("END"));
        lines.push(raw);
        if stop {
            break;
        }
    }

    println!("2. Build Tables and Intermediate Code");
    let (pass, msgs) = Pass1::run(input, &lines);
    msgs.dump();

    println!("3. Write Artifacts");
    println!("  > {}", out);
    if let Err(e) = pass.write_artifacts(Path::new(out)) {
        cprintln!("<red,bold>error</>: {}", e);
        std::process::exit(1);
    }

    if dump {
        pass.dump();
    }
}

fn pass2(dir: &str, output: &str) {
    println!("1. Load Artifacts");
    println!("  < {}", dir);
    let (pass, msgs) = match Pass2::load(Path::new(dir)) {
        Ok(ok) => ok,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            std::process::exit(1);
        }
    };
    msgs.dump();

    println!("2. Resolve Machine Code");
    let (rows, msgs) = pass.resolve();
    msgs.dump();
    for row in &rows {
        println!("{}", row);
    }

    println!("3. Write Output");
    println!("  > {}", output);
    let text: String = rows.iter().map(|r| format!("{}\n", r)).collect();
    std::fs::write(output, text)
        .expect(&cformat!("<r,s>Failed to write file</>: {}", output));
}
