//! Population model files.
//!
//! A model file is a CSV table with the header
//! `Model,Class,Q,e,i,H6,H8,…,H25.5` (one `H` column per absolute magnitude boundary).
//! Each record holds the 18 H bins of one (q, e, i) cell, identified by the upper boundaries of
//! the cell. The file stores 32 blocks of `29 × 8 × 11` records, cells in `q`, then `e`, then `i`
//! order:
//!
//! * `All,SS` then `Unk,SS` for the whole population,
//! * `All,<abbr>` then `Unk,<abbr>` for every class, in catalog order.
//!
//! Empty H fields read as zero. Records after the last block are ignored.

use std::io::{Read, Write};

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, StringRecordsIter, Trim, WriterBuilder};
use tracing::info;

use super::{
    bins::{BinIndex, E_PARTITION, HX, H_PARTITION, I_PARTITION, Q_PARTITION},
    Histograms, PopulationModel,
};
use crate::{digest_errors::DigestError, orbit_class::OrbitClass};

/// Tolerance on the (q, e, i) cell boundaries written in each record
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Number of leading columns before the H bins
const KEY_COLUMNS: usize = 5;

fn expected_header() -> Vec<String> {
    ["Model", "Class", "Q", "e", "i"]
        .into_iter()
        .map(String::from)
        .chain(H_PARTITION.iter().map(|h| format!("H{h}")))
        .collect()
}

/// Walks the records of a model file, one block at a time.
struct BlockReader<'r, R: Read> {
    records: StringRecordsIter<'r, R>,
}

impl<R: Read> BlockReader<'_, R> {
    fn read_block(
        &mut self,
        model: &str,
        class: &str,
        target: &mut [f64],
    ) -> Result<(), DigestError> {
        for (iq, &q) in Q_PARTITION.iter().enumerate() {
            for (ie, &e) in E_PARTITION.iter().enumerate() {
                for (ii, &i) in I_PARTITION.iter().enumerate() {
                    let record = self.records.next().ok_or_else(|| {
                        DigestError::InvalidModelRecord {
                            line: 0,
                            reason: format!("unexpected end of file in block {model},{class}"),
                        }
                    })??;
                    let line = record.position().map_or(0, |p| p.line());

                    check_key(&record, line, model, class, [q, e, i])?;

                    let base = BinIndex {
                        q: iq,
                        e: ie,
                        i: ii,
                        h: 0,
                    }
                    .flat();
                    for (ih, field) in record.iter().skip(KEY_COLUMNS).enumerate() {
                        target[base + ih] = parse_population(field).ok_or_else(|| {
                            DigestError::InvalidModelRecord {
                                line,
                                reason: format!(
                                    "invalid value {field:?} in column H{}",
                                    H_PARTITION[ih]
                                ),
                            }
                        })?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_key(
    record: &StringRecord,
    line: u64,
    model: &str,
    class: &str,
    bounds: [f64; 3],
) -> Result<(), DigestError> {
    let err = |reason: String| DigestError::InvalidModelRecord { line, reason };

    if record.len() != KEY_COLUMNS + HX {
        return Err(err(format!(
            "expected {} fields, got {}",
            KEY_COLUMNS + HX,
            record.len()
        )));
    }
    if &record[0] != model {
        return Err(err(format!("expected model {model}, got {}", &record[0])));
    }
    if &record[1] != class {
        return Err(err(format!("expected class {class}, got {}", &record[1])));
    }
    for (field, (name, bound)) in record
        .iter()
        .skip(2)
        .zip(["Q", "e", "i"].into_iter().zip(bounds))
    {
        match field.parse::<f64>() {
            Ok(v) if (v - bound).abs() <= BOUNDARY_TOLERANCE => {}
            _ => return Err(err(format!("expected {name} = {bound}, got {field:?}"))),
        }
    }
    Ok(())
}

fn parse_population(field: &str) -> Option<f64> {
    if field.is_empty() {
        Some(0.0)
    } else {
        field.parse().ok()
    }
}

impl PopulationModel {
    /// Load a population model from a CSV stream.
    ///
    /// Arguments
    /// ---------
    /// * `reader`: CSV source, header line included
    ///
    /// Return
    /// ----------
    /// * The model, or:
    ///   - [`DigestError::InvalidModelHeader`] if the header differs from the expected one,
    ///   - [`DigestError::InvalidModelRecord`] for a record with a wrong key, an unparsable
    ///     value, or a file ending before the last block,
    ///   - [`DigestError::CsvError`] for malformed CSV.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DigestError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header = csv_reader.headers()?.clone();
        let expected = expected_header();
        if header.iter().ne(expected.iter().map(String::as_str)) {
            return Err(DigestError::InvalidModelHeader(format!(
                "expected \"{}\", got \"{}\"",
                expected.join(","),
                header.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let mut blocks = BlockReader {
            records: csv_reader.records(),
        };

        let mut solar_system = Histograms::zeroed();
        blocks.read_block("All", "SS", &mut solar_system.all)?;
        blocks.read_block("Unk", "SS", &mut solar_system.unknown)?;

        let mut classes = Vec::with_capacity(OrbitClass::COUNT);
        for class in OrbitClass::ALL {
            let mut hist = Histograms::zeroed();
            blocks.read_block("All", class.abbreviation(), &mut hist.all)?;
            blocks.read_block("Unk", class.abbreviation(), &mut hist.unknown)?;
            classes.push(hist);
        }

        let model = PopulationModel {
            solar_system,
            classes,
        };
        let total = model.total_population();
        info!(
            all = total.all,
            unknown = total.unknown,
            "Population model loaded"
        );
        Ok(model)
    }

    /// Load a population model from a CSV file.
    ///
    /// See also
    /// ------------
    /// * [`PopulationModel::from_csv_reader`] – format and errors.
    pub fn from_csv_file(path: &Utf8Path) -> Result<Self, DigestError> {
        info!(%path, "Reading population model");
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    /// Write the model in the format read by [`PopulationModel::from_csv_reader`].
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), DigestError> {
        let mut csv_writer = WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(expected_header())?;

        let mut blocks: Vec<(&str, &str, &[f64])> = vec![
            ("All", "SS", &self.solar_system.all[..]),
            ("Unk", "SS", &self.solar_system.unknown[..]),
        ];
        for (class, hist) in OrbitClass::ALL.iter().zip(&self.classes) {
            blocks.push(("All", class.abbreviation(), &hist.all[..]));
            blocks.push(("Unk", class.abbreviation(), &hist.unknown[..]));
        }

        for (model, class, values) in blocks {
            for (iq, q) in Q_PARTITION.iter().enumerate() {
                for (ie, e) in E_PARTITION.iter().enumerate() {
                    for (ii, i) in I_PARTITION.iter().enumerate() {
                        let base = BinIndex {
                            q: iq,
                            e: ie,
                            i: ii,
                            h: 0,
                        }
                        .flat();
                        let mut row = vec![
                            model.to_string(),
                            class.to_string(),
                            q.to_string(),
                            e.to_string(),
                            i.to_string(),
                        ];
                        row.extend(values[base..base + HX].iter().map(|v| v.to_string()));
                        csv_writer.write_record(&row)?;
                    }
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}
