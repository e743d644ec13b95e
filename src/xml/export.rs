// XML and zip writers

use super::{XmlRecord, DOCUMENTS_DIR, ICONS_DIR, ROOT, SECTIONS, XML_ENTRY};
use crate::dao::MoneyDump;
use crate::error::Result;
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

fn write_section<W: Write, T: XmlRecord>(writer: &mut Writer<W>, name: &str, records: &[T]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for record in records {
        let mut element = BytesStart::new(T::TAG);
        for attribute in record.to_attributes().iter() {
            element.push_attribute(attribute);
        }
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    debug!("Wrote {} {} records", records.len(), name);
    Ok(())
}

/// Whole dump as an XML document
pub fn write_xml<W: Write>(dump: &MoneyDump, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

    write_section(&mut writer, SECTIONS[0], &dump.icons)?;
    write_section(&mut writer, SECTIONS[1], &dump.categories)?;
    write_section(&mut writer, SECTIONS[2], &dump.currencies)?;
    write_section(&mut writer, SECTIONS[3], &dump.securities)?;
    write_section(&mut writer, SECTIONS[4], &dump.accounts)?;
    write_section(&mut writer, SECTIONS[5], &dump.cards)?;
    write_section(&mut writer, SECTIONS[6], &dump.contacts)?;
    write_section(&mut writer, SECTIONS[7], &dump.transactions_parents_first())?;
    write_section(&mut writer, SECTIONS[8], &dump.documents)?;
    write_section(&mut writer, SECTIONS[9], &dump.periodic_payments)?;

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    writer.get_mut().flush()?;
    Ok(())
}

/// XML document plus binary payloads in a zip container
pub fn write_zip<W: Write + Seek>(dump: &MoneyDump, out: W) -> Result<()> {
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default();

    zip.start_file(XML_ENTRY, options)?;
    write_xml(dump, &mut zip)?;

    for (uuid, bytes) in &dump.blobs {
        zip.start_file(format!("{}/{}", DOCUMENTS_DIR, uuid), options)?;
        zip.write_all(bytes)?;
    }
    for icon in dump.icons.iter().filter(|i| !i.bytes.is_empty()) {
        zip.start_file(format!("{}/{}", ICONS_DIR, icon.uuid), options)?;
        zip.write_all(&icon.bytes)?;
    }

    zip.finish()?;
    Ok(())
}

/// Create `path` as plain XML or as a zip container
pub fn write_file(path: &Path, dump: &MoneyDump, zip: bool) -> Result<()> {
    let file = File::create(path)?;
    if zip {
        write_zip(dump, file)
    } else {
        write_xml(dump, BufWriter::new(file))
    }
}
