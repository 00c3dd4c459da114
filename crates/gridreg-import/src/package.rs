// crates/gridreg-import/src/package.rs
// ============================================================================
// Module: Workbook Package Access
// Description: Zip container access for worksheets, media, and drawings.
// Purpose: Surface the package parts the importer reconciles.
// Dependencies: quick-xml, zip
// ============================================================================

//! ## Overview
//! An `.xlsx` file is a zip package. This module lists and reads the parts
//! the importer needs: the first worksheet, the shared string table, every
//! `xl/media/*` raster entry in file order, and drawing anchors that pin an
//! image to an explicit cell. Anchors are resolved through the drawing's
//! relationship part, mirroring how desktop spreadsheet tools attach images.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Cursor;
use std::io::Read;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use zip::ZipArchive;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard cap on one extracted media entry.
const MAX_MEDIA_BYTES: u64 = 8 * 1024 * 1024;
/// Hard cap on one XML part.
const MAX_PART_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Package access errors.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Container could not be opened or read.
    #[error("package error: {0}")]
    Container(String),
    /// Package holds no worksheet.
    #[error("package has no worksheet")]
    MissingSheet,
    /// A part exceeded its size cap.
    #[error("package part too large: {name}")]
    PartTooLarge {
        /// Offending part name.
        name: String,
    },
    /// Malformed XML inside a part.
    #[error("package xml error: {0}")]
    Xml(String),
}

// ============================================================================
// SECTION: Package Model
// ============================================================================

/// One extracted media entry, in package file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Entry name inside the package, e.g. `xl/media/image1.png`.
    pub name: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

/// One drawing anchor pinning an image to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredImage {
    /// Zero-based anchor row.
    pub row: u32,
    /// Zero-based anchor column.
    pub column: u32,
    /// Media entry name the anchor resolves to.
    pub media_name: String,
}

/// Parts of one workbook package relevant to the importer.
#[derive(Debug, Clone, Default)]
pub struct WorkbookPackage {
    /// First worksheet XML.
    pub sheet_xml: String,
    /// Shared string table XML, when present.
    pub shared_strings_xml: Option<String>,
    /// Media entries in package file order.
    pub media: Vec<MediaEntry>,
    /// Anchored images resolved through drawing relationships.
    pub anchored: Vec<AnchoredImage>,
}

// ============================================================================
// SECTION: Package Reading
// ============================================================================

/// Reads the importer-relevant parts out of workbook bytes.
///
/// # Errors
///
/// Returns [`PackageError`] when the container is unreadable or holds no
/// worksheet.
pub fn read_package(bytes: &[u8]) -> Result<WorkbookPackage, PackageError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| PackageError::Container(err.to_string()))?;

    let mut sheet_names: Vec<String> = Vec::new();
    let mut drawing_names: Vec<String> = Vec::new();
    let mut media_names: Vec<String> = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| PackageError::Container(err.to_string()))?;
        let name = entry.name().to_string();
        if name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml") {
            sheet_names.push(name);
        } else if name.starts_with("xl/drawings/") && name.ends_with(".xml") {
            drawing_names.push(name);
        } else if name.starts_with("xl/media/") {
            media_names.push(name);
        }
    }
    sheet_names.sort();
    drawing_names.sort();

    let sheet_name = sheet_names.first().ok_or(PackageError::MissingSheet)?.clone();
    let sheet_xml = read_text_part(&mut archive, &sheet_name)?;
    let shared_strings_xml = if part_exists(&mut archive, "xl/sharedStrings.xml") {
        Some(read_text_part(&mut archive, "xl/sharedStrings.xml")?)
    } else {
        None
    };

    // Media entries keep package file order; the loose-media matching path
    // depends on it.
    let mut media = Vec::new();
    for name in media_names {
        let data = read_binary_part(&mut archive, &name, MAX_MEDIA_BYTES)?;
        media.push(MediaEntry { name, data });
    }

    let mut anchored = Vec::new();
    for drawing_name in drawing_names {
        let drawing_xml = read_text_part(&mut archive, &drawing_name)?;
        let rels_name = rels_part_name(&drawing_name);
        let relationships = if part_exists(&mut archive, &rels_name) {
            let rels_xml = read_text_part(&mut archive, &rels_name)?;
            parse_relationships(&rels_xml)?
        } else {
            BTreeMap::new()
        };
        anchored.extend(parse_drawing_anchors(&drawing_xml, &relationships)?);
    }

    Ok(WorkbookPackage {
        sheet_xml,
        shared_strings_xml,
        media,
        anchored,
    })
}

/// True when the package holds a part with the name.
fn part_exists(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> bool {
    archive.by_name(name).is_ok()
}

/// Reads one XML part as UTF-8 text.
fn read_text_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, PackageError> {
    let bytes = read_binary_part(archive, name, MAX_PART_BYTES)?;
    String::from_utf8(bytes)
        .map_err(|_| PackageError::Xml(format!("part is not utf-8: {name}")))
}

/// Reads one part into bytes with a size cap.
fn read_binary_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    cap: u64,
) -> Result<Vec<u8>, PackageError> {
    let entry =
        archive.by_name(name).map_err(|err| PackageError::Container(err.to_string()))?;
    if entry.size() > cap {
        return Err(PackageError::PartTooLarge {
            name: name.to_string(),
        });
    }
    let mut data = Vec::new();
    entry
        .take(cap)
        .read_to_end(&mut data)
        .map_err(|err| PackageError::Container(err.to_string()))?;
    Ok(data)
}

/// Derives the relationship part name for a drawing part.
fn rels_part_name(drawing_name: &str) -> String {
    match drawing_name.rsplit_once('/') {
        Some((directory, file)) => format!("{directory}/_rels/{file}.rels"),
        None => format!("_rels/{drawing_name}.rels"),
    }
}

// ============================================================================
// SECTION: Relationship Parsing
// ============================================================================

/// Parses a `.rels` part into an id-to-media-name map.
///
/// Targets are normalized to full `xl/...` part names; only media targets
/// are kept.
fn parse_relationships(xml: &str) -> Result<BTreeMap<String, String>, PackageError> {
    let mut reader = Reader::from_str(xml);
    let mut map = BTreeMap::new();
    loop {
        let event = reader.read_event().map_err(|err| PackageError::Xml(err.to_string()))?;
        match event {
            Event::Start(element) | Event::Empty(element) => {
                if local_name(element.name().as_ref()) != b"Relationship" {
                    continue;
                }
                let mut id = None;
                let mut target = None;
                for attribute in element.attributes() {
                    let attribute =
                        attribute.map_err(|err| PackageError::Xml(err.to_string()))?;
                    match attribute.key.as_ref() {
                        b"Id" => {
                            id = Some(String::from_utf8_lossy(&attribute.value).into_owned());
                        }
                        b"Target" => {
                            target =
                                Some(String::from_utf8_lossy(&attribute.value).into_owned());
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    let normalized = normalize_media_target(&target);
                    if let Some(media_name) = normalized {
                        map.insert(id, media_name);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(map)
}

/// Normalizes a relationship target like `../media/image1.png` to
/// `xl/media/image1.png`; non-media targets yield `None`.
fn normalize_media_target(target: &str) -> Option<String> {
    let trimmed = target.trim_start_matches("../").trim_start_matches("/xl/");
    let file = trimmed.strip_prefix("media/")?;
    Some(format!("xl/media/{file}"))
}

// ============================================================================
// SECTION: Drawing Parsing
// ============================================================================

/// Strips a namespace prefix from an element name.
fn local_name(name: &[u8]) -> &[u8] {
    name.rsplit(|byte| *byte == b':').next().unwrap_or(name)
}

/// Parses drawing anchors: each anchor's `from` cell plus its first image
/// relationship id, resolved through `relationships`.
fn parse_drawing_anchors(
    xml: &str,
    relationships: &BTreeMap<String, String>,
) -> Result<Vec<AnchoredImage>, PackageError> {
    let mut reader = Reader::from_str(xml);
    let mut anchors = Vec::new();
    let mut in_from = false;
    let mut capture: Option<FromField> = None;
    let mut row: Option<u32> = None;
    let mut column: Option<u32> = None;
    let mut embed: Option<String> = None;

    /// Which `from` coordinate is being captured.
    enum FromField {
        /// The `<xdr:col>` value.
        Column,
        /// The `<xdr:row>` value.
        Row,
    }

    loop {
        let event = reader.read_event().map_err(|err| PackageError::Xml(err.to_string()))?;
        match event {
            Event::Start(element) => match local_name(element.name().as_ref()) {
                b"from" => {
                    in_from = true;
                    row = None;
                    column = None;
                }
                b"col" if in_from => capture = Some(FromField::Column),
                b"row" if in_from => capture = Some(FromField::Row),
                name if name == b"blip" => {
                    if embed.is_none() {
                        embed = read_embed_id(&element)?;
                    }
                }
                _ => {}
            },
            Event::Empty(element) => {
                if local_name(element.name().as_ref()) == b"blip" && embed.is_none() {
                    embed = read_embed_id(&element)?;
                }
            }
            Event::Text(text) => {
                let piece =
                    text.unescape().map_err(|err| PackageError::Xml(err.to_string()))?;
                match capture {
                    Some(FromField::Column) => column = piece.trim().parse().ok(),
                    Some(FromField::Row) => row = piece.trim().parse().ok(),
                    None => {}
                }
            }
            Event::End(element) => match local_name(element.name().as_ref()) {
                b"col" | b"row" => capture = None,
                b"from" => in_from = false,
                name if name.ends_with(b"CellAnchor") => {
                    if let (Some(anchor_row), Some(anchor_column), Some(id)) =
                        (row, column, embed.take())
                        && let Some(media_name) = relationships.get(&id)
                    {
                        anchors.push(AnchoredImage {
                            row: anchor_row,
                            column: anchor_column,
                            media_name: media_name.clone(),
                        });
                    }
                    row = None;
                    column = None;
                    embed = None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(anchors)
}

/// Reads the `r:embed` attribute of a `blip` element.
fn read_embed_id(
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<Option<String>, PackageError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| PackageError::Xml(err.to_string()))?;
        let key = attribute.key.as_ref();
        if key == b"r:embed" || key.ends_with(b":embed") || key == b"embed" {
            return Ok(Some(String::from_utf8_lossy(&attribute.value).into_owned()));
        }
    }
    Ok(None)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::normalize_media_target;
    use super::parse_drawing_anchors;
    use super::parse_relationships;
    use super::rels_part_name;

    #[test]
    fn rels_name_sits_beside_the_part() {
        assert_eq!(
            rels_part_name("xl/drawings/drawing1.xml"),
            "xl/drawings/_rels/drawing1.xml.rels"
        );
    }

    #[test]
    fn media_targets_normalize() {
        assert_eq!(
            normalize_media_target("../media/image1.png").as_deref(),
            Some("xl/media/image1.png")
        );
        assert!(normalize_media_target("../charts/chart1.xml").is_none());
    }

    #[test]
    fn drawing_anchor_resolves_through_rels() {
        let rels = "<Relationships>\
                    <Relationship Id=\"rId1\" Target=\"../media/image1.png\"/>\
                    </Relationships>";
        let relationships = parse_relationships(rels).unwrap();
        let drawing = "<xdr:wsDr>\
             <xdr:twoCellAnchor>\
             <xdr:from><xdr:col>6</xdr:col><xdr:row>3</xdr:row></xdr:from>\
             <xdr:to><xdr:col>7</xdr:col><xdr:row>4</xdr:row></xdr:to>\
             <xdr:pic><xdr:blipFill><a:blip r:embed=\"rId1\"/></xdr:blipFill></xdr:pic>\
             </xdr:twoCellAnchor></xdr:wsDr>";
        let anchors = parse_drawing_anchors(drawing, &relationships).unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].row, 3);
        assert_eq!(anchors[0].column, 6);
        assert_eq!(anchors[0].media_name, "xl/media/image1.png");
    }

    #[test]
    fn anchor_without_relationship_is_dropped() {
        let drawing = "<xdr:wsDr><xdr:twoCellAnchor>\
             <xdr:from><xdr:col>0</xdr:col><xdr:row>0</xdr:row></xdr:from>\
             <xdr:pic><xdr:blipFill><a:blip r:embed=\"rId9\"/></xdr:blipFill></xdr:pic>\
             </xdr:twoCellAnchor></xdr:wsDr>";
        let anchors = parse_drawing_anchors(drawing, &BTreeMap::new()).unwrap();
        assert!(anchors.is_empty());
    }
}
