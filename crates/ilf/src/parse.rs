use super::*;
use qlib_core::FormatError;
use std::collections::HashMap;

/// One section of an ILF document. Type and method are the raw marker
/// words; an empty word selects the default for that axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub name: String,
    pub kind: String,
    pub method: String,
    pub body: String,
    /// 1-based line of the section marker.
    pub line: usize,
}

/// A parsed ILF document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ilf {
    pub preface: String,
    pub symbols: Vec<RawSymbol>,
}

/// Splits ILF text into its preface and sections, in declaration order.
///
/// Section bodies are kept verbatim apart from leading and trailing blank
/// lines. Text without any marker is all preface.
pub fn parse(text: &str) -> Result<Ilf, FormatError> {
    let mut ilf = Ilf::default();
    let mut seen = HashMap::<String, usize>::new();
    let mut open = None::<(RawSymbol, Vec<&str>)>;
    let mut offset = 0;
    for (i, raw) in text.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        if !is_marker(line) {
            if let Some((_, ref mut body)) = open {
                body.push(line);
            }
            continue;
        }
        let number = i + 1;
        let mark = line.trim_end();
        let marker = Marker::parse(mark).ok_or_else(|| FormatError::Marker {
            line: number,
            text: mark.to_string(),
        })?;
        if marker.name.is_empty() {
            return Err(FormatError::Unnamed {
                line: number,
                text: mark.to_string(),
            });
        }
        if marker.name.chars().any(char::is_whitespace) {
            return Err(FormatError::Marker {
                line: number,
                text: mark.to_string(),
            });
        }
        if let Some(&first) = seen.get(marker.name) {
            return Err(FormatError::Duplicate {
                line: number,
                first,
                name: marker.name.to_string(),
            });
        }
        seen.insert(marker.name.to_string(), number);
        match open.take() {
            Some((symbol, body)) => ilf.symbols.push(close(symbol, body)),
            None => ilf.preface = text[..start].to_string(),
        }
        open = Some((
            RawSymbol {
                name: marker.name.to_string(),
                kind: marker.kind.to_string(),
                method: marker.method.to_string(),
                body: String::new(),
                line: number,
            },
            Vec::new(),
        ));
    }
    match open {
        Some((symbol, body)) => ilf.symbols.push(close(symbol, body)),
        None => ilf.preface = text.to_string(),
    }
    log::debug!("parsed {} ilf sections", ilf.symbols.len());
    Ok(ilf)
}

fn close(mut symbol: RawSymbol, body: Vec<&str>) -> RawSymbol {
    let head = body.iter().take_while(|l| l.trim().is_empty()).count();
    let tail = body.iter().rev().take_while(|l| l.trim().is_empty()).count();
    symbol.body = match head == body.len() {
        true => String::new(),
        false => body[head..body.len() - tail].join("\n"),
    };
    symbol
}
