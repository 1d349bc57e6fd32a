use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

use attribute_survey::data::filter::NameFilter;
use attribute_survey::data::handler::default_handlers;
use attribute_survey::pipeline::{ExtractionRun, FileOutcome};
use attribute_survey::report::write_reports;
use attribute_survey::scan::discover_files;
use attribute_survey::{init_logging, prompt};

const CONFIG_FILE: &str = "config.txt";
const OUTPUT_DIR: &str = "output";

fn main() -> Result<()> {
    init_logging();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let root = prompt::ask(
        &mut input,
        &mut output,
        "Enter the root folder path (or press Enter for current directory): ",
        ".",
    )?;
    let root = Path::new(&root);
    if !root.is_dir() {
        bail!("folder '{}' does not exist", root.display());
    }

    let filter = if prompt::confirm(
        &mut input,
        &mut output,
        &format!("Apply file name filters from {CONFIG_FILE}?"),
        false,
    )? {
        NameFilter::load(Path::new(CONFIG_FILE))?
    } else {
        NameFilter::match_all()
    };
    if !filter.is_empty() {
        println!("Filtering on: {}", filter.substrings().join(", "));
    }

    let handlers = default_handlers();
    let files = discover_files(root, &handlers, &filter);
    println!("\nFound {} candidate file(s) under {}", files.len(), root.display());

    let mut run = ExtractionRun::new(&handlers);
    for path in &files {
        match run.process(path) {
            FileOutcome::Processed(_) => println!("  Processed: {}", path.display()),
            FileOutcome::Duplicate(_) => println!("  Skipped (duplicate): {}", path.display()),
            FileOutcome::Failed(_, err) => println!("  Failed (unreadable): {err}"),
            FileOutcome::Unsupported(_) => {}
        }
    }
    let groups = run.into_groups();

    let written = write_reports(&groups, Path::new(OUTPUT_DIR))
        .with_context(|| format!("writing reports to {OUTPUT_DIR}"))?;

    println!();
    for (kind, group) in &groups {
        println!(
            "{}: processed {}, skipped {}, failed {}, without sample {}",
            kind.label(),
            group.processed(),
            group.duplicates,
            group.failures,
            group.without_sample()
        );
    }
    for path in &written {
        println!("Results saved to: {}", path.display());
    }
    if written.is_empty() {
        println!("No supported files were processed.");
    }

    println!("\n✓ Extraction complete!");
    Ok(())
}
