//! SWEET-Cat RDB catalog: one star per line, 27 tab-separated fields, `NULL` for unknown.
//!
//! Every field is kept as the text it was read with, so a record that is parsed and
//! written back produces the same line.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::RDB_FIELD_COUNT;
use crate::domain::{Measurement, Numeric, StarRecord};
use crate::error::{Result, SweetCatError};
use crate::pipeline::processing::names::normalize;

/// Parse one catalog line. Trailing line breaks are ignored.
pub fn parse_record(line: &str) -> Result<StarRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() != RDB_FIELD_COUNT {
        return Err(SweetCatError::parse(
            "record",
            format!("expected {} fields, found {}", RDB_FIELD_COUNT, fields.len()),
        ));
    }

    let text = |i: usize| fields[i].to_string();
    let number = |i: usize| Numeric::from_raw(fields[i]);
    let pair = |i: usize| Measurement::new(number(i), number(i + 1));

    Ok(StarRecord {
        name: text(0),
        cross_id: text(1),
        ra: text(2),
        dec: text(3),
        v_mag: pair(4),
        parallax: pair(6),
        parallax_flag: text(8),
        teff: pair(9),
        logg: pair(11),
        reserved1: text(13),
        reserved2: text(14),
        microturbulence: pair(15),
        feh: pair(17),
        mass: pair(19),
        author: text(21),
        link: text(22),
        source_flag: text(23),
        update_date: text(24),
        comment: text(25),
        reserved3: text(26),
    })
}

/// Render a record as one line, without the line break.
pub fn format_record(record: &StarRecord) -> String {
    let fields: [&str; RDB_FIELD_COUNT] = [
        &record.name,
        &record.cross_id,
        &record.ra,
        &record.dec,
        record.v_mag.value.as_str(),
        record.v_mag.error.as_str(),
        record.parallax.value.as_str(),
        record.parallax.error.as_str(),
        &record.parallax_flag,
        record.teff.value.as_str(),
        record.teff.error.as_str(),
        record.logg.value.as_str(),
        record.logg.error.as_str(),
        &record.reserved1,
        &record.reserved2,
        record.microturbulence.value.as_str(),
        record.microturbulence.error.as_str(),
        record.feh.value.as_str(),
        record.feh.error.as_str(),
        record.mass.value.as_str(),
        record.mass.error.as_str(),
        &record.author,
        &record.link,
        &record.source_flag,
        &record.update_date,
        &record.comment,
        &record.reserved3,
    ];
    fields.join("\t")
}

/// Fields of `record` that cannot be interpreted: numbers whose token is neither `NULL`
/// nor a number, and a parallax flag that is not a known label.
pub fn malformed_fields(record: &StarRecord) -> Vec<&'static str> {
    let checks: [(&'static str, &Numeric); 14] = [
        ("V", &record.v_mag.value),
        ("V error", &record.v_mag.error),
        ("parallax", &record.parallax.value),
        ("parallax error", &record.parallax.error),
        ("Teff", &record.teff.value),
        ("Teff error", &record.teff.error),
        ("logg", &record.logg.value),
        ("logg error", &record.logg.error),
        ("vt", &record.microturbulence.value),
        ("vt error", &record.microturbulence.error),
        ("[Fe/H]", &record.feh.value),
        ("[Fe/H] error", &record.feh.error),
        ("mass", &record.mass.value),
        ("mass error", &record.mass.error),
    ];
    let mut fields: Vec<&'static str> = checks
        .into_iter()
        .filter(|(_, n)| n.is_malformed())
        .map(|(field, _)| field)
        .collect();
    if record.provenance().is_none() {
        fields.push("parallax flag");
    }
    fields
}

/// The SWEET-Cat catalog held in memory, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<StarRecord>,
    /// Lines that could not be parsed and were left out.
    skipped: usize,
}

impl Catalog {
    pub fn new(records: Vec<StarRecord>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }

    /// Read a catalog file. Failing to read the file is an error; a bad line is logged
    /// and left out.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SweetCatError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read catalog {}: {}", path.display(), e),
            ))
        })?;
        let catalog = Self::parse(&content);
        info!(
            "Loaded {} stars from {} ({} lines skipped)",
            catalog.len(),
            path.display(),
            catalog.skipped
        );
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Self {
        let mut catalog = Self::default();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(line) {
                Ok(record) => {
                    for field in malformed_fields(&record) {
                        let err = SweetCatError::parse(field, format!("'{}' on line {}", record.name, line_no + 1));
                        warn!("{}; read as unknown", err);
                    }
                    catalog.records.push(record);
                }
                Err(e) => {
                    warn!("Skipping catalog line {}: {}", line_no + 1, e);
                    catalog.skipped += 1;
                }
            }
        }
        catalog
    }

    pub fn to_rdb(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&format_record(record));
            out.push('\n');
        }
        out
    }

    pub fn records(&self) -> &[StarRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn push(&mut self, record: StarRecord) {
        self.records.push(record);
    }

    /// First record whose normalised name equals the normalised `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&StarRecord> {
        let wanted = normalize(name);
        self.records.iter().find(|r| normalize(&r.name) == wanted)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "51 Peg\t217014\t22 57 27.98\t+20 46 07.78\t5.46\t0.01\t64.07\t0.19\tGAIADR2\t5787\t18\t4.45\t0.03\tNULL\tNULL\t1.03\t0.02\t0.20\t0.01\t1.11\t0.02\tSousa et al.\thttps://example.org/ads\t1\t2018-01-01\tNULL\tNULL";

    #[test]
    fn test_parse_and_format_is_lossless() {
        let record = parse_record(LINE).unwrap();
        assert_eq!(record.name, "51 Peg");
        assert_eq!(record.teff.value.value(), Some(5787.0));
        assert_eq!(record.feh.value.as_str(), "0.20");
        assert_eq!(record.parallax_flag, "GAIADR2");
        assert_eq!(record.reserved1, "NULL");
        assert_eq!(format_record(&record), LINE);
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        let short = LINE.rsplit_once('\t').unwrap().0;
        assert!(matches!(parse_record(short), Err(SweetCatError::Parse { .. })));
    }

    #[test]
    fn test_malformed_numbers_are_kept() {
        let line = LINE.replacen("5787", "57x7", 1);
        let record = parse_record(&line).unwrap();
        assert_eq!(malformed_fields(&record), vec!["Teff"]);
        assert!(record.teff.is_unknown());
        assert_eq!(format_record(&record), line);
    }

    #[test]
    fn test_unknown_parallax_flag_is_reported_but_kept() {
        let legacy = parse_record(&LINE.replacen("GAIADR2", "Simbad", 1)).unwrap();
        assert!(malformed_fields(&legacy).is_empty());

        let line = LINE.replacen("GAIADR2", "Hipparcos", 1);
        let record = parse_record(&line).unwrap();
        assert_eq!(malformed_fields(&record), vec!["parallax flag"]);
        assert_eq!(Catalog::parse(&line).len(), 1);
        assert_eq!(format_record(&record), line);
    }

    #[test]
    fn test_catalog_skips_blank_and_bad_lines() {
        let content = format!("{}\n\n   \nbroken line\n{}\r\n", LINE, LINE.replace("51 Peg", "HD 1"));
        let catalog = Catalog::parse(&content);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.skipped(), 1);
        assert_eq!(catalog.records()[1].name, "HD 1");
        assert_eq!(catalog.records()[1].reserved3, "NULL");
    }

    #[test]
    fn test_find_by_normalized_name() {
        let catalog = Catalog::parse(LINE);
        assert!(catalog.contains_name("51peg"));
        assert!(catalog.contains_name(" 51-PEG "));
        assert!(!catalog.contains_name("52 Peg"));
    }

    #[test]
    fn test_written_catalog_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.rdb");
        let mut catalog = Catalog::parse(LINE);
        catalog.push(StarRecord::empty("New Star"));
        fs::write(&path, catalog.to_rdb()).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.records()[0], catalog.records()[0]);
        assert_eq!(format_record(&loaded.records()[1]).matches("NULL").count(), 26);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Catalog::load(&dir.path().join("absent.rdb")).is_err());
    }
}
