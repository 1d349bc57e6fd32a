use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use shapefile::dbase::{self, FieldValue, Record};
use shapefile::{Shape, ShapeReader};

use super::model::{AttributeValue, Extraction, FileKind};

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// A strategy that recognises one file format and reads its attribute table.
pub trait FileHandler {
    /// The report group this handler's results land in.
    fn kind(&self) -> FileKind;

    /// Pure predicate on the path, no I/O.
    fn can_handle(&self, path: &Path) -> bool;

    /// Read the whole file and return its attribute names together with the
    /// first record in which every attribute is populated.
    fn extract(&self, path: &Path) -> Result<Extraction>;
}

/// Handlers in dispatch order: the first one whose `can_handle` accepts a
/// path processes it.
pub fn default_handlers() -> Vec<Box<dyn FileHandler>> {
    vec![
        Box::new(ShapefileHandler),
        Box::new(CsvHandler),
        Box::new(ParquetHandler),
    ]
}

/// Lowercase extension of `path`, empty when there is none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Shapefile handler
// ---------------------------------------------------------------------------

/// Name of the synthetic attribute carrying each record's shape type.
pub const GEOMETRY_ATTRIBUTE: &str = "geometry";

/// Name `dbase` gives the hidden record-deletion column.
const DELETION_FLAG_FIELD: &str = "DeletionFlag";

/// Reads `.shp` files. The attribute table lives in the `.dbf` companion next
/// to the geometry file; the optional `.shx` index is used when present.
pub struct ShapefileHandler;

impl FileHandler for ShapefileHandler {
    fn kind(&self) -> FileKind {
        FileKind::Shapefile
    }

    fn can_handle(&self, path: &Path) -> bool {
        extension_of(path) == "shp"
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        let dbf_path = find_companion(path, "dbf").with_context(|| {
            format!("missing attribute table {}", path.with_extension("dbf").display())
        })?;
        let table = dbase::Reader::from_path(&dbf_path)
            .with_context(|| format!("opening attribute table {}", dbf_path.display()))?;
        let field_names: Vec<String> = table
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .filter(|name| name != DELETION_FLAG_FIELD)
            .collect();

        let source = BufReader::new(File::open(path).context("opening shapefile")?);
        let shapes = match find_companion(path, "shx") {
            Some(shx_path) => {
                let index = File::open(&shx_path)
                    .with_context(|| format!("opening index {}", shx_path.display()))?;
                ShapeReader::with_shx(source, BufReader::new(index))
            }
            None => ShapeReader::new(source),
        }
        .context("reading shapefile header")?;

        let mut reader = shapefile::Reader::new(shapes, table);
        let mut rows = Vec::new();
        for (record_no, item) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) =
                item.with_context(|| format!("reading shapefile record {record_no}"))?;
            rows.push(record_row(&field_names, &shape, &record));
        }

        let mut attributes = field_names;
        attributes.push(GEOMETRY_ATTRIBUTE.to_string());
        Ok(Extraction::from_rows(attributes, rows))
    }
}

/// Sibling of `path` with the same stem and extension `ext`, ignoring ASCII
/// case on both, so `TOWNS.SHP` finds `TOWNS.DBF`.
fn find_companion(path: &Path, ext: &str) -> Option<PathBuf> {
    let exact = path.with_extension(ext);
    if exact.is_file() {
        return Some(exact);
    }
    let stem = path.file_stem()?.to_str()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::read_dir(parent)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|candidate| {
            let stem_matches = candidate
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case(stem));
            let ext_matches = candidate
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            stem_matches && ext_matches && candidate.is_file()
        })
}

/// Table cells in field order, then the geometry.
fn record_row(field_names: &[String], shape: &Shape, record: &Record) -> Vec<AttributeValue> {
    let mut row: Vec<AttributeValue> = field_names
        .iter()
        .map(|name| {
            record
                .get(name)
                .map(field_to_value)
                .unwrap_or(AttributeValue::Null)
        })
        .collect();
    row.push(geometry_to_value(shape));
    row
}

fn geometry_to_value(shape: &Shape) -> AttributeValue {
    match shape {
        Shape::NullShape => AttributeValue::Null,
        other => AttributeValue::Geometry(format!("{:?}", other.shapetype())),
    }
}

/// Convert one dBASE cell; the reader reports blank cells as `None`.
fn field_to_value(value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) if !s.trim().is_empty() => {
            AttributeValue::String(s.trim_end().to_string())
        }
        FieldValue::Character(_) | FieldValue::Memo(_) => AttributeValue::Null,
        FieldValue::Numeric(Some(n)) => AttributeValue::Float(*n),
        FieldValue::Float(Some(n)) => AttributeValue::Float(f64::from(*n)),
        FieldValue::Numeric(None) | FieldValue::Float(None) => AttributeValue::Null,
        FieldValue::Integer(i) => AttributeValue::Integer(i64::from(*i)),
        FieldValue::Double(d) => AttributeValue::Float(*d),
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(*b),
        FieldValue::Logical(None) => AttributeValue::Null,
        FieldValue::Date(Some(d)) => AttributeValue::Date(format!("{d:?}")),
        FieldValue::Date(None) => AttributeValue::Null,
        other => AttributeValue::String(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// CSV handler
// ---------------------------------------------------------------------------

/// Cell texts read as missing values, on top of the empty string.
const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// Reads `.csv` files; the first row holds the attribute names.
pub struct CsvHandler;

impl FileHandler for CsvHandler {
    fn kind(&self) -> FileKind {
        FileKind::Csv
    }

    fn can_handle(&self, path: &Path) -> bool {
        extension_of(path) == "csv"
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .context("opening CSV")?;
        let headers: Vec<String> = reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            bail!("CSV has no header row");
        }

        let mut rows = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            // Rows shorter than the header leave trailing attributes null.
            let row: Vec<AttributeValue> = (0..headers.len())
                .map(|i| {
                    record
                        .get(i)
                        .map(guess_value_type)
                        .unwrap_or(AttributeValue::Null)
                })
                .collect();
            rows.push(row);
        }

        Ok(Extraction::from_rows(headers, rows))
    }
}

fn guess_value_type(s: &str) -> AttributeValue {
    if s.is_empty() || MISSING_TOKENS.contains(&s) {
        return AttributeValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return AttributeValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return AttributeValue::Float(f);
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return AttributeValue::Bool(s.eq_ignore_ascii_case("true"));
    }
    AttributeValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet handler
// ---------------------------------------------------------------------------

/// Reads `.parquet` / `.pq` files written by Pandas, Polars or Arrow.
pub struct ParquetHandler;

impl FileHandler for ParquetHandler {
    fn kind(&self) -> FileKind {
        FileKind::Parquet
    }

    fn can_handle(&self, path: &Path) -> bool {
        matches!(extension_of(path).as_str(), "parquet" | "pq")
    }

    fn extract(&self, path: &Path) -> Result<Extraction> {
        let file = std::fs::File::open(path).context("opening parquet file")?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
        let attributes: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let reader = builder.build().context("building parquet reader")?;

        let mut rows = Vec::new();
        for batch_result in reader {
            let batch = batch_result.context("reading parquet record batch")?;
            for row in 0..batch.num_rows() {
                rows.push(
                    batch
                        .columns()
                        .iter()
                        .map(|col| extract_attribute_value(col, row))
                        .collect(),
                );
            }
        }

        Ok(Extraction::from_rows(attributes, rows))
    }
}

/// Extract a single scalar from an Arrow column at a given row.
fn extract_attribute_value(col: &ArrayRef, row: usize) -> AttributeValue {
    if col.is_null(row) {
        return AttributeValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => AttributeValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            AttributeValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int8 => AttributeValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => {
            AttributeValue::Integer(col.as_primitive::<Int16Type>().value(row).into())
        }
        DataType::Int32 => {
            AttributeValue::Integer(col.as_primitive::<Int32Type>().value(row).into())
        }
        DataType::Int64 => AttributeValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => {
            AttributeValue::Integer(col.as_primitive::<UInt8Type>().value(row).into())
        }
        DataType::UInt16 => {
            AttributeValue::Integer(col.as_primitive::<UInt16Type>().value(row).into())
        }
        DataType::UInt32 => {
            AttributeValue::Integer(col.as_primitive::<UInt32Type>().value(row).into())
        }
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v)
                .map(AttributeValue::Integer)
                .unwrap_or(AttributeValue::Float(v as f64))
        }
        DataType::Float32 => {
            AttributeValue::Float(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => AttributeValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => AttributeValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            AttributeValue::Date(display_cell(col, row))
        }
        _ => AttributeValue::String(display_cell(col, row)),
    }
}

fn display_cell(col: &ArrayRef, row: usize) -> String {
    array_value_to_string(col, row).unwrap_or_else(|_| format!("{:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn dispatch_is_by_lowercase_extension() {
        let handlers = default_handlers();
        let claim = |p: &str| {
            handlers
                .iter()
                .find(|h| h.can_handle(Path::new(p)))
                .map(|h| h.kind())
        };
        assert_eq!(claim("roads.SHP"), Some(FileKind::Shapefile));
        assert_eq!(claim("a/b/data.Csv"), Some(FileKind::Csv));
        assert_eq!(claim("table.pq"), Some(FileKind::Parquet));
        assert_eq!(claim("roads.dbf"), None);
        assert_eq!(claim("README"), None);
    }

    #[test]
    fn csv_sample_is_first_complete_row() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "people.csv", "id,name,age\n1,,20\n2,Bob,\n3,Carl,25\n4,Dora,31\n");

        let extraction = CsvHandler.extract(&path).unwrap();
        assert_eq!(extraction.attributes, vec!["id", "name", "age"]);
        assert_eq!(
            extraction.sample,
            Some(vec![
                ("id".to_string(), AttributeValue::Integer(3)),
                ("name".to_string(), AttributeValue::String("Carl".into())),
                ("age".to_string(), AttributeValue::Integer(25)),
            ])
        );
    }

    #[test]
    fn csv_missing_tokens_and_short_rows_are_null() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "gaps.csv", "a,b,c\nNA,x,1\n1,null,2\n5,y\n");

        let extraction = CsvHandler.extract(&path).unwrap();
        assert_eq!(extraction.attributes.len(), 3);
        assert!(extraction.sample.is_none());
    }

    #[test]
    fn csv_header_only_has_attributes_but_no_sample() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "header.csv", "x,y\n");

        let extraction = CsvHandler.extract(&path).unwrap();
        assert_eq!(extraction.attributes, vec!["x", "y"]);
        assert!(extraction.sample.is_none());
    }

    #[test]
    fn empty_csv_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.csv", "");
        assert!(CsvHandler.extract(&path).is_err());
    }

    #[test]
    fn value_types_are_guessed() {
        assert_eq!(guess_value_type("42"), AttributeValue::Integer(42));
        assert_eq!(guess_value_type("2.5"), AttributeValue::Float(2.5));
        assert_eq!(guess_value_type("True"), AttributeValue::Bool(true));
        assert_eq!(guess_value_type("N/A"), AttributeValue::Null);
        assert_eq!(
            guess_value_type("Main St"),
            AttributeValue::String("Main St".into())
        );
    }

    #[test]
    fn parquet_nulls_are_skipped_across_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stations.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("station", DataType::Utf8, true),
            Field::new("elevation", DataType::Float64, true),
            Field::new("id", DataType::Int64, false),
        ]));
        let first = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("north"), None])),
                Arc::new(Float64Array::from(vec![None, Some(12.5)])),
                Arc::new(Int64Array::from(vec![1, 2])),
            ],
        )
        .unwrap();
        let second = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("south")])),
                Arc::new(Float64Array::from(vec![Some(3.0)])),
                Arc::new(Int64Array::from(vec![3])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&first).unwrap();
        writer.write(&second).unwrap();
        writer.close().unwrap();

        let extraction = ParquetHandler.extract(&path).unwrap();
        assert_eq!(extraction.attributes, vec!["station", "elevation", "id"]);
        assert_eq!(
            extraction.sample,
            Some(vec![
                ("station".to_string(), AttributeValue::String("south".into())),
                ("elevation".to_string(), AttributeValue::Float(3.0)),
                ("id".to_string(), AttributeValue::Integer(3)),
            ])
        );
    }

    #[test]
    fn corrupt_parquet_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.parquet", "not parquet at all");
        assert!(ParquetHandler.extract(&path).is_err());
    }

    #[test]
    fn shapefile_without_companions_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "lonely.shp", "");
        let err = ShapefileHandler.extract(&path).unwrap_err();
        assert!(format!("{err:#}").contains("lonely.dbf"));
    }

    /// Point shapefile with a NAME/POP table. Only the second record has
    /// every cell filled.
    fn write_towns(dir: &Path, stem: &str) -> PathBuf {
        use shapefile::dbase::{FieldName, TableWriterBuilder};
        use shapefile::Point;

        let shp = dir.join(format!("{stem}.shp"));
        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("NAME").unwrap(), 20)
            .add_numeric_field(FieldName::try_from("POP").unwrap(), 10, 0);
        let mut writer = shapefile::Writer::from_path(&shp, table).unwrap();
        let rows = [(None, Some(3.0)), (Some("Elm"), Some(7.0)), (Some("Oak"), None)];
        for (i, (name, pop)) in rows.into_iter().enumerate() {
            let mut record = Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(name.map(String::from)));
            record.insert("POP".to_string(), FieldValue::Numeric(pop));
            writer
                .write_shape_and_record(&Point::new(i as f64, 1.0), &record)
                .unwrap();
        }
        drop(writer);
        shp
    }

    fn expected_towns_sample() -> Vec<(String, AttributeValue)> {
        vec![
            ("NAME".into(), AttributeValue::String("Elm".into())),
            ("POP".into(), AttributeValue::Float(7.0)),
            ("geometry".into(), AttributeValue::Geometry("Point".into())),
        ]
    }

    #[test]
    fn shapefile_sample_is_first_complete_record_with_geometry() {
        let dir = TempDir::new().unwrap();
        let shp = write_towns(dir.path(), "towns");

        let ex = ShapefileHandler.extract(&shp).unwrap();
        assert_eq!(ex.attributes, vec!["NAME", "POP", "geometry"]);
        assert_eq!(ex.sample, Some(expected_towns_sample()));
    }

    #[test]
    fn uppercase_shapefile_companions_are_found() {
        let dir = TempDir::new().unwrap();
        write_towns(dir.path(), "towns");
        for ext in ["shp", "shx", "dbf"] {
            std::fs::rename(
                dir.path().join(format!("towns.{ext}")),
                dir.path().join(format!("TOWNS.{}", ext.to_uppercase())),
            )
            .unwrap();
        }

        let shp = dir.path().join("TOWNS.SHP");
        assert!(ShapefileHandler.can_handle(&shp));
        let ex = ShapefileHandler.extract(&shp).unwrap();
        assert_eq!(ex.sample, Some(expected_towns_sample()));
    }

    #[test]
    fn null_shape_leaves_record_incomplete() {
        use shapefile::dbase::{FieldName, TableWriterBuilder};
        use shapefile::Point;

        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("ash.shp");
        let table =
            TableWriterBuilder::new().add_character_field(FieldName::try_from("NAME").unwrap(), 20);
        let mut writer = shapefile::Writer::from_path(&shp, table).unwrap();
        let mut record = Record::default();
        record.insert("NAME".to_string(), FieldValue::Character(Some("Ash".into())));
        writer.write_shape_and_record(&Point::new(0.0, 0.0), &record).unwrap();
        drop(writer);

        // The writer has no null-shape type; zero the record's shape type word
        // (100-byte header, then 8 bytes of record header).
        let mut bytes = std::fs::read(&shp).unwrap();
        bytes[108..112].copy_from_slice(&0i32.to_le_bytes());
        std::fs::write(&shp, bytes).unwrap();

        let ex = ShapefileHandler.extract(&shp).unwrap();
        assert_eq!(ex.attributes, vec!["NAME", "geometry"]);
        assert_eq!(ex.sample, None);
    }

    #[test]
    fn record_row_puts_geometry_last() {
        let mut record = Record::default();
        record.insert("NAME".to_string(), FieldValue::Character(Some("Ash".into())));
        let row = record_row(&["NAME".to_string()], &Shape::NullShape, &record);
        assert_eq!(row, vec![AttributeValue::String("Ash".into()), AttributeValue::Null]);
    }

    #[test]
    fn dbase_cells_map_to_attribute_values() {
        assert_eq!(
            field_to_value(&FieldValue::Character(Some("Elm  ".into()))),
            AttributeValue::String("Elm".into())
        );
        assert_eq!(
            field_to_value(&FieldValue::Character(Some("   ".into()))),
            AttributeValue::Null
        );
        assert_eq!(field_to_value(&FieldValue::Numeric(None)), AttributeValue::Null);
        assert_eq!(
            field_to_value(&FieldValue::Numeric(Some(4.0))),
            AttributeValue::Float(4.0)
        );
        assert_eq!(
            field_to_value(&FieldValue::Logical(Some(false))),
            AttributeValue::Bool(false)
        );
        assert_eq!(geometry_to_value(&Shape::NullShape), AttributeValue::Null);
    }
}
