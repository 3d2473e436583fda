use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use twotree::pipeline::{BuildError, Pipeline, Progress, Step};
use twotree::{config, output};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Empty the output and temp roots, then stop
    Clean,
    /// Print the resolved metadata before rendering
    Verbose,
}

#[derive(Parser)]
#[command(name = "twotree")]
#[command(about = "Static site builder with preview and published output trees")]
#[command(long_about = "\
Static site builder with preview and published output trees

Directories carry metadata that everything inside them inherits. Markdown
becomes pages, templates become views, everything else is copied.

Project structure:

  project/
  ├── twotree.toml                 # Optional, see --print-config
  ├── templates/                   # Layouts and content types
  │   ├── default_layout.mustache  # Wraps every page via {{{yield}}}
  │   └── post.mustache            # content_type: post
  ├── src/
  │   ├── site.yml                 # Metadata for src/ and below
  │   ├── index.md                 # Front matter, then markdown
  │   ├── blog/
  │   │   ├── blog.yml             # content_type: post
  │   │   ├── hello.md             # → blog/hello/index.html
  │   │   └── index.html.mustache  # View → blog/index.html
  │   └── style.css                # Copied as-is
  ├── preview/                     # Everything
  └── published/                   # Content with published: true, views, assets

Metadata precedence (highest first):
  own declaration → parent directory (unless inherit_metadata: false) → [defaults]")]
#[command(version)]
struct Cli {
    /// Project root containing src/ and templates/
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Print a stock twotree.toml with all options documented
    #[arg(long)]
    print_config: bool,

    /// `clean` and/or `verbose`, in any order
    #[arg(value_enum)]
    modes: Vec<Mode>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    match build(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build(cli: &Cli) -> Result<(), BuildError> {
    let pipeline = Pipeline::load(&cli.project)?;
    let roots = pipeline.roots();

    if cli.modes.contains(&Mode::Clean) {
        println!("{}", output::format_step(Step::Prepare, roots));
        pipeline.prepare()?;
        println!("==> Clean complete");
        return Ok(());
    }

    let verbose = cli.modes.contains(&Mode::Verbose);
    let backend = pipeline.backend()?;
    init_thread_pool(&pipeline.config().processing);

    let report = pipeline.run_with(&backend, |progress| match progress {
        Progress::Starting(step) => println!("{}", output::format_step(step, roots)),
        Progress::Resolved(records) if verbose => output::print_records(records, &roots.source),
        Progress::Resolved(_) => {}
    })?;

    output::print_build_output(&report);
    println!(
        "==> Build complete: {}, {}",
        roots.preview.display(),
        roots.published.display()
    );
    Ok(())
}

/// Size the global rayon pool used for asset copies.
///
/// `max_processes` can lower the worker count below the core count, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
