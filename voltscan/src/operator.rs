//! Operator metadata captured before a sweep may start.

use std::{
    io::{self, BufRead, Write},
    sync::LazyLock,
};

use regex::Regex;
use thiserror::Error;

static ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Regex literal is valid"));

/// The three identifiers an operator has to supply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Operator ID, exactly 7 alphanumeric characters.
    pub opid: String,
    /// Manufacturing order, alphanumeric.
    pub mo: String,
    /// Part number, exactly 14 alphanumeric characters.
    pub pn: String,
}

/// Validation errors for [`OperatorInfo`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperatorError {
    /// One of the fields was left empty.
    #[error("All fields are required.")]
    MissingField,
    /// The operator ID has the wrong shape.
    #[error("OPID must be exactly 7 alphanumeric characters.")]
    BadOpid,
    /// The manufacturing order has the wrong shape.
    #[error("MO must be alphanumeric.")]
    BadMo,
    /// The part number has the wrong shape.
    #[error("PN must be exactly 14 alphanumeric characters.")]
    BadPn,
}

impl OperatorInfo {
    /// Create operator info from raw input; surrounding whitespace is trimmed.
    pub fn new(opid: &str, mo: &str, pn: &str) -> Self {
        OperatorInfo {
            opid: opid.trim().to_string(),
            mo: mo.trim().to_string(),
            pn: pn.trim().to_string(),
        }
    }

    /// Check all three fields against their shape rules.
    pub fn validate(&self) -> Result<(), OperatorError> {
        if self.opid.is_empty() || self.mo.is_empty() || self.pn.is_empty() {
            return Err(OperatorError::MissingField);
        }
        if self.opid.len() != 7 || !ALNUM.is_match(&self.opid) {
            return Err(OperatorError::BadOpid);
        }
        if !ALNUM.is_match(&self.mo) {
            return Err(OperatorError::BadMo);
        }
        if self.pn.len() != 14 || !ALNUM.is_match(&self.pn) {
            return Err(OperatorError::BadPn);
        }
        Ok(())
    }
}

/// Interactively collect operator info, re-asking until the input validates.
///
/// Returns `Ok(None)` when the operator cancels, either by typing `q` into any field or by
/// closing the input stream.
pub fn prompt(
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<Option<OperatorInfo>> {
    loop {
        let Some(opid) = ask(input, output, "OPID (7 alphanumeric): ")? else {
            return Ok(None);
        };
        let Some(mo) = ask(input, output, "MO (alphanumeric): ")? else {
            return Ok(None);
        };
        let Some(pn) = ask(input, output, "PN (14 alphanumeric): ")? else {
            return Ok(None);
        };

        let info = OperatorInfo::new(&opid, &mo, &pn);
        match info.validate() {
            Ok(()) => return Ok(Some(info)),
            Err(err) => writeln!(output, "{err}")?,
        }
    }
}

fn ask(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> io::Result<Option<String>> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None); // end of input, treat as cancel
    }
    let line = line.trim().to_string();
    if line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::*;

    use super::*;

    #[rstest]
    #[case("A123456", "MO001", "PN000012345678", Ok(()))]
    #[case("", "MO001", "PN000012345678", Err(OperatorError::MissingField))]
    #[case("A12345", "MO001", "PN000012345678", Err(OperatorError::BadOpid))]
    #[case("A1234567", "MO001", "PN000012345678", Err(OperatorError::BadOpid))]
    #[case("A12345!", "MO001", "PN000012345678", Err(OperatorError::BadOpid))]
    #[case("A123456", "MO-001", "PN000012345678", Err(OperatorError::BadMo))]
    #[case("A123456", "MO001", "PN0000123456789", Err(OperatorError::BadPn))]
    #[case("A123456", "MO001", "PN00001234567!", Err(OperatorError::BadPn))]
    fn test_validate(
        #[case] opid: &str,
        #[case] mo: &str,
        #[case] pn: &str,
        #[case] expected: Result<(), OperatorError>,
    ) {
        assert_eq!(OperatorInfo::new(opid, mo, pn).validate(), expected);
    }

    #[test]
    fn test_prompt_accepts_valid_input() {
        let mut input = Cursor::new("A123456\nMO001\nPN000012345678\n");
        let mut output = Vec::new();

        let info = prompt(&mut input, &mut output).unwrap().unwrap();
        assert_eq!(info, OperatorInfo::new("A123456", "MO001", "PN000012345678"));
    }

    #[test]
    fn test_prompt_reasks_until_valid() {
        let mut input =
            Cursor::new("bad\nMO001\nPN000012345678\nA123456\nMO001\nPN000012345678\n");
        let mut output = Vec::new();

        let info = prompt(&mut input, &mut output).unwrap().unwrap();
        assert_eq!(info.opid, "A123456");

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("OPID must be exactly 7 alphanumeric characters."));
    }

    #[test]
    fn test_prompt_cancelled_with_q() {
        let mut input = Cursor::new("q\n");
        let mut output = Vec::new();

        assert_eq!(prompt(&mut input, &mut output).unwrap(), None);
    }

    #[test]
    fn test_prompt_cancelled_on_eof() {
        let mut input = Cursor::new("A123456\n");
        let mut output = Vec::new();

        assert_eq!(prompt(&mut input, &mut output).unwrap(), None);
    }
}
