use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;

use super::document::{KmlDocument, LineStyle, Placemark};
use super::error::Error;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

impl KmlDocument {
    /// Serializes the document as indented UTF-8 KML.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        let mut kml = BytesStart::new("kml");
        kml.push_attribute(("xmlns", KML_NAMESPACE));
        write(&mut writer, Event::Start(kml))?;
        write(&mut writer, Event::Start(BytesStart::new("Document")))?;
        text_element(&mut writer, "name", &self.name)?;

        for placemark in &self.placemarks {
            write_placemark(&mut writer, placemark, &self.style)?;
        }
        for folder in &self.folders {
            write(&mut writer, Event::Start(BytesStart::new("Folder")))?;
            text_element(&mut writer, "name", &folder.name)?;
            for placemark in &folder.placemarks {
                write_placemark(&mut writer, placemark, &self.style)?;
            }
            write(&mut writer, Event::End(BytesEnd::new("Folder")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("Document")))?;
        write(&mut writer, Event::End(BytesEnd::new("kml")))?;
        Ok(writer.into_inner())
    }

    pub fn write_to<P>(&self, path: P) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn write_placemark(
    writer: &mut Writer<Vec<u8>>,
    placemark: &Placemark,
    style: &LineStyle,
) -> Result<(), Error> {
    write(writer, Event::Start(BytesStart::new("Placemark")))?;
    text_element(writer, "name", &placemark.name)?;

    write(writer, Event::Start(BytesStart::new("Style")))?;
    write(writer, Event::Start(BytesStart::new("LineStyle")))?;
    text_element(writer, "color", &style.color)?;
    text_element(writer, "width", &style.width.to_string())?;
    write(writer, Event::End(BytesEnd::new("LineStyle")))?;
    write(writer, Event::End(BytesEnd::new("Style")))?;

    write(writer, Event::Start(BytesStart::new("LineString")))?;
    text_element(writer, "tessellate", "1")?;
    // KML tuples are longitude first
    let coordinates = placemark
        .coordinates
        .iter()
        .map(|p| p.to_lng_lat())
        .collect::<Vec<String>>()
        .join(" ");
    text_element(writer, "coordinates", &coordinates)?;
    write(writer, Event::End(BytesEnd::new("LineString")))?;

    write(writer, Event::End(BytesEnd::new("Placemark")))
}

fn text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<(), Error> {
    write(writer, Event::Start(BytesStart::new(tag)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(tag)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), Error> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(e.to_string()))
}
