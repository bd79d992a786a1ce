use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::domain::ExoplanetRow;
use crate::error::{Result, SweetCatError};

/// Read the exoplanet.eu CSV export, keeping only the rows SWEET-Cat tracks.
pub fn load_exoplanets(path: &Path, include_unconfirmed: bool) -> Result<Vec<ExoplanetRow>> {
    let file = File::open(path).map_err(|e| {
        SweetCatError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open exoplanet export {}: {}", path.display(), e),
        ))
    })?;
    let rows = read_exoplanets(file, include_unconfirmed)?;
    info!("Loaded {} tracked planets from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn read_exoplanets<R: Read>(reader: R, include_unconfirmed: bool) -> Result<Vec<ExoplanetRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    // Older exports prefix the first header with '#'.
    let headers = csv_reader.headers()?.clone();
    let cleaned: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim_start_matches('#').trim())
        .collect();
    csv_reader.set_headers(cleaned);

    let mut rows = Vec::new();
    let mut untracked = 0usize;
    for (i, result) in csv_reader.deserialize::<ExoplanetRow>().enumerate() {
        match result {
            Ok(row) if row.is_tracked(include_unconfirmed) => rows.push(row),
            Ok(_) => untracked += 1,
            Err(e) => warn!("Skipping exoplanet row {}: {}", i + 1, e),
        }
    }
    debug!("{} exoplanet rows not tracked", untracked);
    Ok(rows)
}

/// The first row whose `star_name` equals `name` (both trimmed).
pub fn find_by_star_name<'a>(rows: &'a [ExoplanetRow], name: &str) -> Option<&'a ExoplanetRow> {
    let name = name.trim();
    rows.iter().find(|row| row.star_name() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
# name,star_name,ra,dec,detection_type,planet_status,mag_v,star_metallicity,star_metallicity_error_min,star_metallicity_error_max,star_teff,star_teff_error_min,star_teff_error_max
51 Peg b,51 Peg,344.3666,20.7689,Radial Velocity,Confirmed,5.46,0.2,0.01,0.01,5787,18,18
WASP-12 b,WASP-12,97.6364,29.6722,Primary Transit,Confirmed,11.69,0.3,0.1,0.1,6300,150,150
2M 0103 b,2M 0103,15.7,-55.3,Imaging,Confirmed,,,,,,,
KOI-1 b,KOI-1,290.1,40.2,Primary Transit,Candidate,,,,,,,
Odd b,Odd,not-a-number,10.0,Astrometry,,,,,,,,
";

    #[test]
    fn test_reads_tracked_rows() {
        let rows = read_exoplanets(EXPORT.as_bytes(), false).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["51 Peg b", "WASP-12 b", "Odd b"]);
        assert_eq!(rows[0].teff(), (Some(5787.0), Some(18.0)));
        assert_eq!(rows[2].ra, None);
        assert!(rows[2].sky_position().is_err());
    }

    #[test]
    fn test_include_unconfirmed() {
        let rows = read_exoplanets(EXPORT.as_bytes(), true).unwrap();
        assert!(rows.iter().any(|r| r.name == "KOI-1 b"));
        assert!(!rows.iter().any(|r| r.name == "2M 0103 b"));
    }

    #[test]
    fn test_find_by_star_name_is_exact() {
        let rows = read_exoplanets(EXPORT.as_bytes(), false).unwrap();
        assert_eq!(find_by_star_name(&rows, " WASP-12 ").unwrap().name, "WASP-12 b");
        assert!(find_by_star_name(&rows, "wasp-12").is_none());
    }
}
