use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const OUTPUT_DIR: &str = "sample_data";

fn write_text(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

/// Station table with a gap in every row but the last few.
fn write_stations(path: &Path) -> Result<()> {
    let n = 12;
    let names: Vec<Option<String>> = (0..n)
        .map(|i| (i % 3 != 0).then(|| format!("station-{i:02}")))
        .collect();
    let elevation: Vec<Option<f64>> = (0..n)
        .map(|i| (i >= 8).then(|| 120.0 + 7.5 * i as f64))
        .collect();
    let ids: Vec<i64> = (1..=n as i64).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("station_id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("elevation_m", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(elevation)),
        ],
    )
    .context("building record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let root = Path::new(OUTPUT_DIR);

    write_text(
        root,
        "city/people.csv",
        "id,name,age\n1,,20\n2,Bob,\n3,Carl,25\n",
    )?;
    // Same name in another folder: only the first in sorted order is reported.
    write_text(
        root,
        "county/people.csv",
        "id,name,age,district\n10,Ann,41,North\n",
    )?;
    write_text(
        root,
        "city/parcels.csv",
        "parcel_id,owner,area_m2,zoning\nP-1,Lee,402.5,R1\nP-2,Kim,,C2\n",
    )?;
    write_text(
        root,
        "county/boundary_2020.csv",
        "id,name,population\n1,North,NA\n2,South,\n",
    )?;
    write_text(
        root,
        "config.txt",
        "# One substring per line, matched case-insensitively against file names.\n# boundary\n# parcel\n",
    )?;

    fs::create_dir_all(root.join("sensors"))?;
    write_stations(&root.join("sensors/stations.parquet"))?;

    println!("Wrote sample tree to {OUTPUT_DIR}/");
    Ok(())
}
