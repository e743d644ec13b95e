// XML and zip readers
//
// The reader is event driven: depth 0 must be <Money>, depth 1 a known
// section, depth 2 a record element. Anything else aborts the import;
// no partial dump is ever returned.

use super::{Attributes, XmlRecord, DOCUMENTS_DIR, ICONS_DIR, ROOT, SECTIONS, XML_ENTRY};
use crate::dao::MoneyDump;
use crate::entities::{
    Account, Card, Category, Contact, Currency, ExchangeSecurity, Icon, MoneyDocument, PeriodicPayment, Transaction,
};
use crate::error::{MoneyError, Result};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

fn element_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn read_attributes(element: &BytesStart) -> Result<Attributes> {
    let mut attributes = Attributes::new(element_name(element));
    for attribute in element.attributes() {
        let attribute = attribute?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(name, value);
    }
    Ok(attributes)
}

fn push_record(dump: &mut MoneyDump, element: &BytesStart) -> Result<()> {
    let attrs = read_attributes(element)?;
    match attrs.tag() {
        Icon::TAG => dump.icons.push(Icon::from_attributes(&attrs)?),
        Category::TAG => dump.categories.push(Category::from_attributes(&attrs)?),
        Currency::TAG => dump.currencies.push(Currency::from_attributes(&attrs)?),
        ExchangeSecurity::TAG => dump.securities.push(ExchangeSecurity::from_attributes(&attrs)?),
        Account::TAG => dump.accounts.push(Account::from_attributes(&attrs)?),
        Card::TAG => dump.cards.push(Card::from_attributes(&attrs)?),
        Contact::TAG => dump.contacts.push(Contact::from_attributes(&attrs)?),
        Transaction::TAG => dump.transactions.push(Transaction::from_attributes(&attrs)?),
        MoneyDocument::TAG => dump.documents.push(MoneyDocument::from_attributes(&attrs)?),
        PeriodicPayment::TAG => dump.periodic_payments.push(PeriodicPayment::from_attributes(&attrs)?),
        other => return Err(MoneyError::xml(format!("unknown record element <{}>", other))),
    }
    Ok(())
}

fn open_element(dump: &mut MoneyDump, element: &BytesStart, depth: usize) -> Result<()> {
    match depth {
        0 => {
            let name = element_name(element);
            if name != ROOT {
                return Err(MoneyError::xml(format!("root element must be <{}>, found <{}>", ROOT, name)));
            }
        }
        1 => {
            let name = element_name(element);
            if !SECTIONS.contains(&name.as_str()) {
                return Err(MoneyError::xml(format!("unknown section <{}>", name)));
            }
        }
        2 => push_record(dump, element)?,
        _ => {
            return Err(MoneyError::xml(format!(
                "unexpected nested element <{}>",
                element_name(element)
            )))
        }
    }
    Ok(())
}

/// Parse an XML document into a dump
pub fn read_xml<R: BufRead>(input: R) -> Result<MoneyDump> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut dump = MoneyDump::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                open_element(&mut dump, &element, depth)?;
                seen_root = true;
                depth += 1;
            }
            Event::Empty(element) => {
                open_element(&mut dump, &element, depth)?;
                seen_root = true;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(MoneyError::xml("document has no root element"));
    }
    if depth != 0 {
        return Err(MoneyError::xml("unexpected end of document"));
    }

    debug!("Read {} records from XML", dump.record_count());
    Ok(dump)
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse a zip container: `money.xml` plus document and icon payloads
pub fn read_zip<R: Read + Seek>(input: R) -> Result<MoneyDump> {
    let mut archive = ZipArchive::new(input)?;
    let mut dump = {
        let entry = archive.by_name(XML_ENTRY)?;
        read_xml(BufReader::new(entry))?
    };

    for icon in &mut dump.icons {
        if let Some(bytes) = read_entry(&mut archive, &format!("{}/{}", ICONS_DIR, icon.uuid))? {
            icon.bytes = bytes;
        }
    }
    for document in &dump.documents {
        if let Some(bytes) = read_entry(&mut archive, &format!("{}/{}", DOCUMENTS_DIR, document.uuid))? {
            dump.blobs.push((document.uuid, bytes));
        }
    }

    Ok(dump)
}

/// Read a file written by `write_file`; the format is sniffed from content
pub fn read_file(path: &Path) -> Result<MoneyDump> {
    let bytes = std::fs::read(path)?;
    if bytes.starts_with(ZIP_MAGIC) {
        read_zip(Cursor::new(bytes))
    } else {
        read_xml(bytes.as_slice())
    }
}
