/*!
Command-line converter from TrueType/OpenType fonts to embedded binary
fonts.

```text
user@system:/path$ font2bin -h
font2bin
Convert TrueType/OpenType fonts into embedded binary bitmap or vector fonts.

USAGE:
    font2bin [OPTIONS] <CONFIG>

ARGS:
    <CONFIG>    path to the JSON conversion config

OPTIONS:
        --bold                       force bold on for every font entry
    -h, --help                       Print help information
    -i, --italic                     force italic on for every font entry
    -m, --render-mode <RENDER_MODE>  override bits per pixel (1, 2, 4 or 8)
        --no-bold                    force bold off for every font entry
        --no-italic                  force italic off for every font entry
    -o, --output <OUTPUT>            override the output directory
    -r, --rotation <ROTATION>        override rotation (0, 90, 180 or 270)
    -s, --size <SIZE>                override the pixel size
    -v, --verbose                    log more (-v info, -vv debug)
    -V, --version                    Print version information
```

The config file describes one or more fonts to convert; see the
`embfont::config` docs for its shape. A value given on the command line
wins over the config-file value for every font entry in the file.

Exit codes: 0 success, 2 a named file is missing, 3 configuration
trouble, 4 the font would not load, 5 character-set resolution failed,
6 rendering failed, 7 the output could not be written, 99 a bug.
*/

use std::path::PathBuf;

use clap::Parser;

use embfont::config::{FontConfig, Rotation};
use embfont::{config, driver, Error};

#[derive(Parser, Debug)]
#[clap(
    name = "font2bin",
    version,
    about = "Convert TrueType/OpenType fonts into embedded binary bitmap or vector fonts."
)]
struct Args {
    /// path to the JSON conversion config
    config: PathBuf,

    /// override the pixel size
    #[clap(short, long)]
    size: Option<u8>,

    /// force bold on for every font entry
    #[clap(long)]
    bold: bool,

    /// force bold off for every font entry
    #[clap(long = "no-bold")]
    no_bold: bool,

    /// force italic on for every font entry
    #[clap(short, long)]
    italic: bool,

    /// force italic off for every font entry
    #[clap(long = "no-italic")]
    no_italic: bool,

    /// override bits per pixel (1, 2, 4 or 8)
    #[clap(short = 'm', long)]
    render_mode: Option<u8>,

    /// override the output directory
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// override rotation (0, 90, 180 or 270)
    #[clap(short, long)]
    rotation: Option<u16>,

    /// log more (-v info, -vv debug)
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

impl Args {
    /// Lay the command-line values over one font entry.
    fn apply_to(&self, font: &mut FontConfig) -> Result<(), Error> {
        if let Some(size) = self.size {
            font.font_size = size;
        }
        if self.bold {
            font.bold = true;
        }
        if self.no_bold {
            font.bold = false;
        }
        if self.italic {
            font.italic = true;
        }
        if self.no_italic {
            font.italic = false;
        }
        if let Some(mode) = self.render_mode {
            font.render_mode = mode;
        }
        if let Some(output) = &self.output {
            font.output_path = output.clone();
        }
        if let Some(degrees) = self.rotation {
            font.rotation = Rotation::try_from(degrees).map_err(Error::ConfigValidation)?;
        }
        font.validate()
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut fonts = config::load_config(&args.config)?;
    log::debug!(
        "{}: {} font entries",
        args.config.display(),
        fonts.len()
    );
    for font in fonts.iter_mut() {
        args.apply_to(font)?;
    }
    driver::run_all(&fonts)
}

fn exit_code(e: &Error) -> i32 {
    match e {
        Error::FileNotFound(_) => 2,
        Error::ConfigValidation(_) | Error::ParseError(_) => 3,
        Error::FontLoadError(_) => 4,
        Error::InvalidRange(_)
        | Error::CharsetFileMissing(_)
        | Error::CharsetParseError(_)
        | Error::CodepageUnsupported(_) => 5,
        Error::GlyphRenderFailed { .. } => 6,
        Error::WriteError(_) => 7,
    }
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        _ => simplelog::LevelFilter::Debug,
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );

    // A panic is a bug, not an input problem; keep its exit code apart
    // from the documented failure codes.
    let outcome = std::panic::catch_unwind(|| run(&args));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(exit_code(&e));
        }
        Err(_) => {
            eprintln!("font2bin: unexpected internal error");
            std::process::exit(99);
        }
    }
}
