//! UTF-8 XML event reading with byte-offset bookkeeping.
//!
//! A lenient wrapper around `quick-xml`: malformed constructs surface as
//! [`XmlIssue`] values carrying the reader offset so callers can turn them
//! into located messages. Recoverable oddities (unknown entities, duplicate
//! attributes) are passed through or skipped rather than failed, since rule
//! checking happens in the validators, not here.

use crate::parser::{ParserResult, XmlIssue};
use crate::util::str::StringExt;
use quick_xml::Decoder;
use quick_xml::escape;
use quick_xml::events::attributes::Attribute as QuickXmlAttribute;
use quick_xml::events::{BytesCData, BytesEnd, BytesRef, BytesStart, BytesText, Event};
use std::borrow::Cow;

pub(crate) enum XmlEvent<'a> {
    /// Represent a start element:
    /// - `<start x="y"></start>`
    /// - `<start x="y"/>`
    Start(XmlStartElement<'a>),
    End(BytesEnd<'a>),
    Text(BytesText<'a>),
    CData(BytesCData<'a>),
    GeneralRef(BytesRef<'a>),
    Eof,
    /// Skipped events: comments, declarations, processing instructions,
    /// doctypes.
    Skipped,
}

impl<'a> XmlEvent<'a> {
    fn new(decoder: Decoder, offset: usize, event: Event<'a>) -> Self {
        match event {
            // `Start` and `Empty` are merged for convenience.
            // - `XmlStartElement::is_self_closing` indicates if the element is empty.
            Event::Start(e) => XmlEvent::Start(XmlStartElement::new(decoder, offset, e, false)),
            Event::Empty(e) => XmlEvent::Start(XmlStartElement::new(decoder, offset, e, true)),
            Event::End(e) => XmlEvent::End(e),
            Event::Text(e) => XmlEvent::Text(e),
            Event::CData(e) => XmlEvent::CData(e),
            Event::GeneralRef(e) => XmlEvent::GeneralRef(e),
            Event::Eof => XmlEvent::Eof,
            _ => XmlEvent::Skipped,
        }
    }
}

pub(crate) struct XmlReader<'a> {
    reader: quick_xml::Reader<&'a [u8]>,
}

impl<'a> XmlReader<'a> {
    pub(crate) fn from_bytes(reader: &'a [u8]) -> Self {
        Self {
            reader: quick_xml::Reader::from_reader(reader),
        }
    }

    /// The byte offset immediately after the last returned event.
    pub(crate) fn buffer_position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Iterator-like method to read the next [`XmlEvent`].
    pub(crate) fn next(&mut self) -> Option<ParserResult<XmlEvent<'a>>> {
        let offset = self.buffer_position();

        match self.reader.read_event() {
            Ok(Event::Eof) => None,
            Ok(event) => Some(Ok(XmlEvent::new(self.reader.decoder(), offset, event))),
            Err(error) => Some(Err(XmlIssue {
                offset: self.reader.error_position() as usize,
                message: error.to_string(),
            })),
        }
    }

    /// Retrieve consolidated text for a specified element up to its end tag.
    pub(crate) fn get_element_text(&mut self, start: &XmlStartElement<'_>) -> ParserResult<String> {
        let mut value = String::new();

        if start.is_self_closing() {
            return Ok(value);
        }
        let mut depth = 0usize;

        while let Some(result) = self.next() {
            match result? {
                XmlEvent::Start(el) if !el.is_self_closing() => depth += 1,
                XmlEvent::End(el) => {
                    if depth == 0 && el.name().0 == start.name() {
                        break;
                    }
                    depth = depth.saturating_sub(1);
                }
                XmlEvent::Text(mut text) => Self::handle_text(&mut value, &mut text)?,
                XmlEvent::CData(cdata) => Self::handle_cdata(&mut value, &cdata)?,
                XmlEvent::GeneralRef(general_ref) => {
                    Self::handle_general_ref(&mut value, &general_ref)?;
                }
                _ => {}
            }
        }
        value.trim_in_place();
        Ok(value)
    }

    fn handle_general_ref(value: &mut String, general_ref: &BytesRef) -> ParserResult<()> {
        fn push_unsupported(value: &mut String, reference: &str) {
            // Unresolvable custom entity; keep the raw reference text.
            value.push('&');
            value.push_str(reference);
            value.push(';');
        }

        if general_ref.is_char_ref() {
            if let Ok(Some(resolved)) = general_ref.resolve_char_ref() {
                value.push(resolved);
            }
            return Ok(());
        }

        let decoded = general_ref.decode().map_err(|error| XmlIssue {
            offset: 0,
            message: error.to_string(),
        })?;

        match escape::resolve_predefined_entity(&decoded) {
            Some(resolved) => value.push_str(resolved),
            None => push_unsupported(value, &decoded),
        }
        Ok(())
    }

    fn handle_cdata(value: &mut String, cdata: &BytesCData) -> ParserResult<()> {
        let decoded = cdata.decode().map_err(|error| XmlIssue {
            offset: 0,
            message: error.to_string(),
        })?;
        value.push_str(decoded.trim());
        Ok(())
    }

    fn handle_text(value: &mut String, text: &mut BytesText) -> ParserResult<()> {
        let decoded = text.decode().map_err(|error| XmlIssue {
            offset: 0,
            message: error.to_string(),
        })?;

        // Consolidate interior whitespace into single spaces.
        for word in decoded.split_whitespace() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(word);
        }
        Ok(())
    }
}

pub(crate) struct XmlStartElement<'a> {
    decoder: Decoder,
    /// Byte offset of the `<` opening this element.
    offset: usize,
    element: BytesStart<'a>,
    is_self_closing: bool,
}

impl<'a> XmlStartElement<'a> {
    fn new(decoder: Decoder, offset: usize, element: BytesStart<'a>, is_self_closing: bool) -> Self {
        Self {
            decoder,
            offset,
            element,
            is_self_closing,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn name(&self) -> &[u8] {
        self.element.name().0
    }

    pub(crate) fn local_name(&self) -> &[u8] {
        self.element.local_name().into_inner()
    }

    pub(crate) fn is_local_name(&self, target_local_name: impl AsRef<[u8]>) -> bool {
        self.local_name() == target_local_name.as_ref()
    }

    pub(crate) fn name_decoded(&self) -> String {
        self.decoder
            .decode(self.name())
            .map(Cow::into_owned)
            .unwrap_or_default()
    }

    pub(crate) fn is_self_closing(&self) -> bool {
        self.is_self_closing
    }

    /// Returns the unescaped attribute value, or [`None`] when absent or
    /// malformed.
    pub(crate) fn get_attribute(&self, key: impl AsRef<[u8]>) -> Option<String> {
        let attribute = self.element.try_get_attribute(key).ok()??;
        Some(self.unescape_value(&attribute.value))
    }

    pub(crate) fn attributes(&self) -> XmlAttributes<'_> {
        let attributes = self
            .element
            .attributes()
            // Malformed attributes are dropped; well-formedness violations
            // that matter surface from the reader itself.
            .filter_map(Result::ok)
            .collect();

        XmlAttributes {
            decoder: self.decoder,
            attributes,
        }
    }

    fn unescape_value(&self, bytes: &[u8]) -> String {
        let decoded = match self.decoder.decode(bytes) {
            Ok(decoded) => decoded,
            Err(_) => return String::new(),
        };
        match escape::unescape(&decoded) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => decoded.into_owned(),
        }
    }
}

pub(crate) struct XmlAttributes<'a> {
    decoder: Decoder,
    attributes: Vec<QuickXmlAttribute<'a>>,
}

impl XmlAttributes<'_> {
    /// Removes and returns the value of the attribute by `name`.
    pub(crate) fn remove(&mut self, name: impl AsRef<[u8]>) -> Option<String> {
        let name = name.as_ref();

        self.attributes
            .iter()
            .position(|attribute| attribute.key.as_ref() == name)
            .map(|i| {
                let attribute = self.attributes.swap_remove(i);
                self.unescape_value(&attribute.value)
            })
    }

    fn unescape_value(&self, bytes: &[u8]) -> String {
        let decoded = match self.decoder.decode(bytes) {
            Ok(decoded) => decoded,
            Err(_) => return String::new(),
        };
        match escape::unescape(&decoded) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => decoded.into_owned(),
        }
    }
}
