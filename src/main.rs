//! The `mdtree` command line: Markdown files in, HTML out.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use mdtree::{render_document, Options, Parser, PipelinePreset};

#[derive(Debug, ClapParser)]
#[command(
    name = "mdtree",
    about = "A CommonMark + GFM Markdown parser with a position-annotated document tree",
    version
)]
struct Cli {
    /// The Markdown file to parse; stdin when omitted.
    file: Option<PathBuf>,

    /// Follow relative links to other Markdown files.
    #[arg(short, long)]
    recursive: bool,

    /// File extensions treated as Markdown when recursing.
    #[arg(long, value_delimiter = ',', default_values_t = ["md".to_string(), "markdown".to_string()])]
    extensions: Vec<String>,

    /// Use the strict CommonMark pipelines (no GFM, math, footnotes or
    /// front matter).
    #[arg(long)]
    commonmark: bool,

    /// Do not wrap the output in an <article> tag.
    #[arg(long)]
    no_article: bool,

    /// Write the HTML here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let mut options = Options::default();
    options.parse.recursive = cli.recursive;
    options.parse.allowed_extensions = cli.extensions.clone();
    options.parse.pipeline = if cli.commonmark {
        PipelinePreset::CommonMark
    } else {
        PipelinePreset::Default
    };
    options.render.wrapped_in_article = !cli.no_article;

    let parser = Parser::new(options.clone());

    let doc = match &cli.file {
        Some(file) => parser.parse_file(&file.to_string_lossy()),
        None => {
            let mut text = String::new();

            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("mdtree: reading stdin: {}", e);
                process::exit(1);
            }

            parser.parse(&text, "", "stdin")
        }
    };

    let html = render_document(&doc, &options);

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, html) {
                eprintln!("mdtree: writing {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();

            if let Err(e) = out.write_all(html.as_bytes()) {
                eprintln!("mdtree: writing stdout: {}", e);
                process::exit(1);
            }
        }
    }
}
