use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// AttributeValue – a single cell in an attribute column
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value covering the scalar types the
/// supported formats produce.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date kept as text, formatted by the source reader.
    Date(String),
    /// Shape type name of a shapefile record.
    Geometry(String),
    Null,
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Date(d) => write!(f, "{d}"),
            AttributeValue::Geometry(g) => write!(f, "{g}"),
            AttributeValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction output
// ---------------------------------------------------------------------------

/// Ordered `(attribute, value)` pairs of one fully populated record.
pub type SampleRecord = Vec<(String, AttributeValue)>;

/// What a handler recovers from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Attribute names in column order.
    pub attributes: Vec<String>,
    /// First record in file order with no null attribute, if any.
    pub sample: Option<SampleRecord>,
}

impl Extraction {
    /// Build an extraction by scanning `rows` (each aligned with `attributes`)
    /// for the first one without nulls.
    pub fn from_rows<I>(attributes: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<AttributeValue>>,
    {
        let sample = first_complete_row(&attributes, rows);
        Extraction { attributes, sample }
    }
}

/// Return the first row whose values are all non-null, zipped with the
/// attribute names. A row shorter than `attributes` counts as incomplete, and
/// a file without attributes never has a sample.
pub fn first_complete_row<I>(attributes: &[String], rows: I) -> Option<SampleRecord>
where
    I: IntoIterator<Item = Vec<AttributeValue>>,
{
    if attributes.is_empty() {
        return None;
    }
    rows.into_iter()
        .find(|row| row.len() >= attributes.len() && row.iter().all(|v| !v.is_null()))
        .map(|row| attributes.iter().cloned().zip(row).collect())
}

// ---------------------------------------------------------------------------
// FileKind / FileResult
// ---------------------------------------------------------------------------

/// File family a handler is responsible for. Ordering is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKind {
    Shapefile,
    Csv,
    Parquet,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Shapefile, FileKind::Csv, FileKind::Parquet];

    /// Lowercase stem used in output file names (`csv_attributes.txt`).
    pub fn slug(self) -> &'static str {
        match self {
            FileKind::Shapefile => "shapefile",
            FileKind::Csv => "csv",
            FileKind::Parquet => "parquet",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Shapefile => "Shapefile",
            FileKind::Csv => "CSV",
            FileKind::Parquet => "Parquet",
        }
    }

    pub fn report_file_name(self) -> String {
        format!("{}_attributes.txt", self.slug())
    }

    pub fn from_slug(slug: &str) -> Option<FileKind> {
        FileKind::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// One successfully processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResult {
    pub file_name: String,
    pub path: PathBuf,
    pub attributes: Vec<String>,
    pub sample: Option<SampleRecord>,
}

impl FileResult {
    pub fn new(path: PathBuf, extraction: Extraction) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        FileResult {
            file_name,
            path,
            attributes: extraction.attributes,
            sample: extraction.sample,
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Results of one file kind plus the bookkeeping shown in the report summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileGroup {
    pub results: Vec<FileResult>,
    /// Files claimed by the kind's handler, duplicates and failures included.
    pub found: usize,
    pub duplicates: usize,
    pub failures: usize,
}

impl FileGroup {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn without_sample(&self) -> usize {
        self.results.iter().filter(|r| r.sample.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_first_row_without_nulls() {
        use AttributeValue::*;
        let rows = vec![
            vec![Integer(1), Null, Integer(20)],
            vec![Integer(2), String("Bob".into()), Null],
            vec![Integer(3), String("Carl".into()), Integer(25)],
            vec![Integer(4), String("Dora".into()), Integer(30)],
        ];
        let extraction = Extraction::from_rows(names(&["id", "name", "age"]), rows);
        assert_eq!(
            extraction.sample,
            Some(vec![
                ("id".to_string(), Integer(3)),
                ("name".to_string(), String("Carl".into())),
                ("age".to_string(), Integer(25)),
            ])
        );
    }

    #[test]
    fn no_sample_when_every_row_has_a_null() {
        use AttributeValue::*;
        let rows = vec![vec![Integer(1), Null], vec![Null, Bool(true)]];
        let extraction = Extraction::from_rows(names(&["a", "b"]), rows);
        assert_eq!(extraction.attributes, names(&["a", "b"]));
        assert!(extraction.sample.is_none());
    }

    #[test]
    fn no_sample_for_empty_table_or_short_rows() {
        let empty = Extraction::from_rows(names(&["a"]), Vec::<Vec<AttributeValue>>::new());
        assert!(empty.sample.is_none());

        let short = first_complete_row(&names(&["a", "b"]), vec![vec![AttributeValue::Integer(1)]]);
        assert!(short.is_none());

        let no_columns = first_complete_row(&[], vec![vec![AttributeValue::Integer(1)]]);
        assert!(no_columns.is_none());
    }

    #[test]
    fn file_kind_slugs_round_trip() {
        for kind in FileKind::ALL {
            assert_eq!(FileKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(FileKind::Csv.report_file_name(), "csv_attributes.txt");
        assert_eq!(FileKind::from_slug("excel"), None);
    }
}
