use crate::{constants::SITE_NAMESPACE_SIZE, digest_errors::DigestError};

/// Value of the leading character of an observatory code.
///
/// Digits map to 0..=9 and upper-case letters to 10..=35, so that the 3-character code
/// namespace `000`..`Z99` packs densely into 0..3600.
fn leading_code_value(c: u8) -> Option<usize> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as usize),
        b'A'..=b'Z' => Some((c - b'A') as usize + 10),
        _ => None,
    }
}

/// Convert a 3-character MPC observatory code to its site index.
///
/// Arguments
/// ---------
/// * `code`: the observatory code (e.g. `"G96"`, `"500"`, `"F51"`). Only the first three
///   characters are read, so a full 80-column field slice may be passed directly.
///
/// Return
/// ----------
/// * `Result<usize, DigestError>`: the site index in `0..3600`, or
///   [`DigestError::InvalidObsCode`] if the code is malformed.
///
/// See also
/// ------------
/// * [`obscode_from_index`] – the reverse mapping.
pub fn parse_obscode(code: &str) -> Result<usize, DigestError> {
    let bytes = code.as_bytes();
    if bytes.len() < 3 {
        return Err(DigestError::InvalidObsCode(code.to_string()));
    }

    let lead = leading_code_value(bytes[0]);
    let tens = bytes[1].is_ascii_digit().then(|| (bytes[1] - b'0') as usize);
    let units = bytes[2].is_ascii_digit().then(|| (bytes[2] - b'0') as usize);

    match (lead, tens, units) {
        (Some(l), Some(t), Some(u)) => Ok(l * 100 + t * 10 + u),
        _ => Err(DigestError::InvalidObsCode(code.to_string())),
    }
}

/// Format a site index back into its 3-character MPC observatory code.
///
/// Return
/// ----------
/// * `Result<String, DigestError>`: the code, or [`DigestError::SiteIndexOutOfRange`] if
///   `index >= 3600`.
pub fn obscode_from_index(index: usize) -> Result<String, DigestError> {
    if index >= SITE_NAMESPACE_SIZE {
        return Err(DigestError::SiteIndexOutOfRange(index));
    }
    let lead = index / 100;
    let lead_char = if lead < 10 {
        (b'0' + lead as u8) as char
    } else {
        (b'A' + (lead - 10) as u8) as char
    };
    Ok(format!("{lead_char}{:02}", index % 100))
}
