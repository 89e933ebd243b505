//! Torznab feed parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::instance::SourceKind;

use super::normalize::{parse_feed_date, ResultBuilder};
use super::{SearchError, SearchResult};

/// Parse a Torznab RSS feed into normalized results.
///
/// Only `<item>` elements directly under `<channel>` are read. Items without
/// a title or with malformed numeric fields are skipped; a document the XML
/// reader cannot tokenize is a `ParseError`.
pub fn parse_feed(xml: &str, source: &str) -> Result<Vec<SearchResult>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ItemState> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = tag_name(e);
                if tag == "item" && path.last().map(String::as_str) == Some("channel") {
                    current = Some(ItemState::default());
                } else if let Some(item) = current.as_mut().filter(|_| in_item(&path)) {
                    if tag == "torznab:attr" {
                        item.apply_attr(e);
                    }
                }
                path.push(tag);
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(item) = current.as_mut().filter(|_| in_item(&path)) {
                    if tag_name(e) == "torznab:attr" {
                        item.apply_attr(e);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(item) = current.as_mut().filter(|_| in_item_child(&path)) {
                    if let Some(field) = path.last() {
                        match e.unescape() {
                            Ok(text) => item.apply_text(field, &text),
                            Err(_) => item.mark_invalid(field, &String::from_utf8_lossy(e)),
                        }
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(item) = current.as_mut().filter(|_| in_item_child(&path)) {
                    let text = String::from_utf8_lossy(e).to_string();
                    if let Some(field) = path.last() {
                        item.apply_text(field, &text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let closed = path.pop();
                if closed.as_deref() == Some("item")
                    && path.last().map(String::as_str) == Some("channel")
                {
                    if let Some(item) = current.take() {
                        if let Some(result) = item.finish(source) {
                            results.push(result);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SearchError::ParseError(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(results)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Cursor is directly inside an `<item>`.
fn in_item(path: &[String]) -> bool {
    path.last().map(String::as_str) == Some("item")
}

/// Cursor is inside a direct child element of an `<item>`.
fn in_item_child(path: &[String]) -> bool {
    path.len() >= 2 && path[path.len() - 2] == "item"
}

#[derive(Default)]
struct ItemState {
    builder: ResultBuilder,
    /// `<size>` element, preferred over the `size` attribute.
    size_element: Option<u64>,
    size_attr: Option<u64>,
    /// First malformed field, if any. The item is dropped.
    invalid: Option<String>,
}

impl ItemState {
    fn apply_text(&mut self, field: &str, text: &str) {
        let b = &mut self.builder;
        match field {
            "title" => append(&mut b.title, text),
            "size" => match text.trim().parse::<u64>() {
                Ok(size) => self.size_element = Some(size),
                Err(_) => self.mark_invalid("size", text),
            },
            "pubDate" => b.date = parse_feed_date(text),
            "category" => {
                if b.category.is_none() {
                    b.category = Some(text.to_string());
                }
            }
            "jackettindexer" => append(&mut b.indexer, text),
            "link" => append(&mut b.torrent_url, text),
            "comments" => append(&mut b.info_url, text),
            "guid" => append(&mut b.guid, text),
            _ => {}
        }
    }

    fn apply_attr(&mut self, e: &BytesStart<'_>) {
        let mut name = None;
        let mut value = None;
        for attr in e.attributes().flatten() {
            let decoded = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            match attr.key.as_ref() {
                b"name" => name = Some(decoded),
                b"value" => value = Some(decoded),
                _ => {}
            }
        }
        let (Some(name), Some(value)) = (name, value) else {
            return;
        };

        match name.as_str() {
            "size" => match value.trim().parse::<u64>() {
                Ok(size) => {
                    if self.size_attr.is_none() {
                        self.size_attr = Some(size);
                    }
                }
                Err(_) => self.mark_invalid("size", &value),
            },
            "seeders" => match parse_count(&value) {
                Some(n) => self.builder.seeders = Some(n),
                None => self.mark_invalid("seeders", &value),
            },
            "peers" => match parse_count(&value) {
                Some(n) => self.builder.peers = Some(n),
                None => self.mark_invalid("peers", &value),
            },
            "magneturl" => {
                if self.builder.magnet_link.is_none() {
                    self.builder.magnet_link = Some(value);
                }
            }
            _ => {}
        }
    }

    fn mark_invalid(&mut self, field: &str, value: &str) {
        if self.invalid.is_none() {
            self.invalid = Some(format!("{} = {:?}", field, value));
        }
    }

    fn finish(mut self, source: &str) -> Option<SearchResult> {
        if let Some(reason) = self.invalid {
            debug!(source = %source, reason = %reason, "Skipping malformed Torznab item");
            return None;
        }
        self.builder.size = self.size_element.or(self.size_attr);
        let result = self.builder.build(source, SourceKind::Jackett);
        if result.is_none() {
            debug!(source = %source, "Skipping Torznab item without title");
        }
        result
    }
}

fn append(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Parse a peer count, clamping negatives to zero.
fn parse_count(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .map(super::normalize::clamp_count)
}
