use std::io;
use std::path::Path;

use anyhow::{bail, Result};

use attribute_survey::overlap::analyze_report_dir;
use attribute_survey::{init_logging, prompt};

fn main() -> Result<()> {
    init_logging();

    println!("ATTRIBUTE OVERLAP VISUALIZATION TOOL\n");

    let folder = prompt::ask(
        &mut io::stdin().lock(),
        &mut io::stdout(),
        "Enter path to output folder (or press Enter for './output'): ",
        "output",
    )?;
    let folder = Path::new(&folder);
    if !folder.is_dir() {
        bail!("folder '{}' does not exist", folder.display());
    }

    let analyses = analyze_report_dir(folder)?;
    if analyses.is_empty() {
        println!("No analyzable *_attributes.txt reports in '{}'", folder.display());
        return Ok(());
    }

    for report in &analyses {
        let a = &report.analysis;
        println!("\n{} summary:", report.slug.to_uppercase());
        println!("  Total files:         {}", a.total_files);
        println!("  Unique attributes:   {}", a.total_unique_attributes);
        println!("  Common to all:       {}", a.common_attributes.len());
        println!("  Unique to one file:  {}", a.unique_attributes.len());
        for path in &report.outputs {
            println!("  ✓ {}", path.display());
        }
    }

    println!(
        "\n✓ Visualization complete! Check '{}'",
        folder.join("visualizations").display()
    );
    Ok(())
}
