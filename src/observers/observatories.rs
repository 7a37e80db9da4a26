use std::io::BufRead;

use camino::Utf8Path;
use tracing::{info, warn};

use super::{Site, SiteTable};
use crate::conversion::parse_obscode;
use crate::digest_errors::DigestError;

impl SiteTable {
    /// Load a site table from the MPC `ObsCodes` list.
    ///
    /// The list is a fixed-width text table (optionally wrapped in HTML `<pre>` tags):
    ///
    /// ```text
    /// Code  Long.   cos      sin    Name
    /// 000   0.0000 0.62411 +0.77873 Greenwich
    /// 250                           Hubble Space Telescope
    /// ```
    ///
    /// Lines whose first three characters are not an observatory code (headers, markup) are
    /// skipped. Sites listed without parallax constants are registered with zero parallax,
    /// which marks them as non-ground-based.
    ///
    /// Arguments
    /// -----------------
    /// * `reader`: any buffered source of the list.
    ///
    /// Return
    /// ----------
    /// * The populated [`SiteTable`], or an I/O error.
    ///
    /// See also
    /// ------------
    /// * [`SiteTable::from_obscodes_file`] – same, reading from a path.
    pub fn from_obscodes_reader<R: BufRead>(reader: R) -> Result<Self, DigestError> {
        let mut table = SiteTable::new();
        let mut loaded = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();

            let Some((code, remain)) = line.split_at_checked(3) else {
                continue;
            };
            let Ok(index) = parse_obscode(code) else {
                continue;
            };

            let (longitude, cos, sin, name) = parse_remain(remain, code);
            table.insert(index, Site::from_parallax(longitude, cos, sin, name))?;
            loaded += 1;
        }

        info!(
            loaded,
            ground_based = table.ground_based_count(),
            "observatory codes loaded"
        );
        Ok(table)
    }

    /// Load a site table from an `ObsCodes` file on disk.
    pub fn from_obscodes_file(path: &Utf8Path) -> Result<Self, DigestError> {
        let file = std::fs::File::open(path)?;
        Self::from_obscodes_reader(std::io::BufReader::new(file))
    }
}

fn parse_f64(s: &str, slice: std::ops::Range<usize>) -> Option<f64> {
    s.get(slice)?.trim().parse().ok()
}

/// Extract longitude, ρ·cosφ, ρ·sinφ, and name from the fixed-width tail of an `ObsCodes` row.
///
/// Missing or malformed numeric fields are returned as zeros, so a site listed without
/// coordinates still gets registered.
///
/// Arguments
/// -----------------
/// * `remain`: Fixed-width tail of the line (after the 3-char MPC code).
/// * `code`:   MPC code (for diagnostics).
///
/// Return
/// ----------
/// * `(longitude_deg, rho_cos_phi, rho_sin_phi, name)`
fn parse_remain(remain: &str, code: &str) -> (f64, f64, f64, Option<String>) {
    let name = remain
        .get(27..)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let Some(longitude) = parse_f64(remain, 1..10) else {
        return (0.0, 0.0, 0.0, name);
    };

    let (Some(cos), Some(sin)) = (parse_f64(remain, 10..18), parse_f64(remain, 18..27)) else {
        warn!(code, "observatory has a longitude but incomplete parallax constants");
        return (longitude, 0.0, 0.0, name);
    };
    (longitude, cos, sin, name)
}
