//! XML parsing utilities for extracting cell fill colors from XLSX files

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

use crate::error::{Result, ReviewError};

/// Solid fill color of every styled cell in a worksheet, keyed by 0-based (row, col).
///
/// Colors are 6-digit uppercase RGB hex without the alpha byte. Cells whose
/// style has no solid fill are absent from the map.
pub fn cell_fills<P: AsRef<Path>>(
    path: P,
    sheet_index: usize,
) -> Result<HashMap<(u32, u32), String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReviewError::unreadable(path, e))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ReviewError::unreadable(path, e))?;

    let fills = parse_fill_styles(&mut archive).map_err(|e| ReviewError::unreadable(path, e))?;
    let cell_styles = extract_cell_style_indices_from_xlsx(&mut archive, sheet_index)
        .map_err(|e| ReviewError::unreadable(path, e))?;

    Ok(cell_styles
        .into_iter()
        .filter_map(|(pos, style_idx)| {
            fills
                .get(style_idx)
                .cloned()
                .flatten()
                .map(|color| (pos, color))
        })
        .collect())
}

/// Resolve each cell format (`cellXfs/xf`) to the solid fill color it uses
fn parse_fill_styles(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
) -> std::result::Result<Vec<Option<String>>, String> {
    let styles_xml = match archive.by_name("xl/styles.xml") {
        Ok(file) => file,
        Err(_) => return Ok(Vec::new()),
    };

    let buf_reader = BufReader::new(styles_xml);
    let mut reader = Reader::from_reader(buf_reader);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    // Fill color per entry of <fills>, None for non-solid patterns
    let mut fills: Vec<Option<String>> = Vec::new();
    let mut fill_ids: Vec<usize> = Vec::new();
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut solid = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(format!("Error parsing styles.xml: {}", e)),
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"fills" => in_fills = true,
                b"fill" if in_fills => {
                    fills.push(None);
                    solid = false;
                }
                b"patternFill" if in_fills => {
                    solid = attr_value(&e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if in_fills && solid => {
                    if let (Some(rgb), Some(last)) = (attr_value(&e, b"rgb"), fills.last_mut()) {
                        *last = Some(normalize_rgb(&rgb));
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let fill_id = attr_value(&e, b"fillId")
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    fill_ids.push(fill_id);
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(fill_ids
        .into_iter()
        .map(|id| fills.get(id).cloned().flatten())
        .collect())
}

/// Extract cell style indices from a worksheet
fn extract_cell_style_indices_from_xlsx(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
    sheet_index: usize,
) -> std::result::Result<HashMap<(u32, u32), usize>, String> {
    let mut cell_styles = HashMap::new();

    let sheet_path = format!("xl/worksheets/sheet{}.xml", sheet_index + 1);
    let sheet_xml = match archive.by_name(&sheet_path) {
        Ok(file) => file,
        Err(_) => return Err(format!("missing {}", sheet_path)),
    };

    let buf_reader = BufReader::new(sheet_xml);
    let mut reader = Reader::from_reader(buf_reader);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(format!("Error parsing {}: {}", sheet_path, e)),
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {
                let pos = attr_value(&e, b"r").and_then(|r| parse_cell_ref(&r));
                let style = attr_value(&e, b"s").and_then(|s| s.parse::<usize>().ok());
                if let (Some(pos), Some(style)) = (pos, style) {
                    cell_styles.insert(pos, style);
                }
            }
            Ok(Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cell_styles)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// "FF00FF00" (ARGB) and "00FF00" (RGB) both become "00FF00"
fn normalize_rgb(rgb: &str) -> String {
    let rgb = rgb.trim().to_ascii_uppercase();
    if rgb.len() == 8 {
        rgb[2..].to_string()
    } else {
        rgb
    }
}

/// Parse "B12" into 0-based (row, col)
fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        }
    }

    if row_str.is_empty() {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;

    // Convert to 0-based
    Some((row.saturating_sub(1), col.saturating_sub(1)))
}
