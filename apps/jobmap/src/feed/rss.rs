//! RSS 2.0 decoding. Only the `<item>` fields the pipeline consumes are read;
//! everything else in the document is skipped.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::feed::{FeedError, RawFeedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    Description,
    PubDate,
    Guid,
    Author,
}

impl ItemField {
    /// Matches on the local name, so `dc:creator` and `creator` are the same field.
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(ItemField::Title),
            b"link" => Some(ItemField::Link),
            b"description" => Some(ItemField::Description),
            b"pubDate" => Some(ItemField::PubDate),
            b"guid" => Some(ItemField::Guid),
            b"creator" | b"author" => Some(ItemField::Author),
            _ => None,
        }
    }
}

fn append(item: &mut RawFeedItem, field: ItemField, text: &str) {
    let target = match field {
        ItemField::Title => &mut item.title,
        ItemField::Link => &mut item.link,
        ItemField::Description => &mut item.description,
        ItemField::PubDate => &mut item.pub_date,
        ItemField::Guid => item.guid.get_or_insert_with(String::new),
        ItemField::Author => item.author.get_or_insert_with(String::new),
    };
    target.push_str(text);
}

/// Decodes every `<item>` of an RSS document. Text and CDATA content are both
/// accepted; entities are unescaped. A document without `<channel>` is an error.
pub fn parse_rss(xml: &str) -> Result<Vec<RawFeedItem>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut saw_channel = false;
    let mut current: Option<RawFeedItem> = None;
    let mut field: Option<ItemField> = None;
    // Element depth below the open `<item>`; only depth 1 children are fields.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"channel" => saw_channel = true,
                b"item" if current.is_none() => {
                    current = Some(RawFeedItem::default());
                    field = None;
                    depth = 0;
                }
                name if current.is_some() => {
                    depth += 1;
                    field = if depth == 1 {
                        ItemField::from_local_name(name)
                    } else {
                        None
                    };
                }
                _ => {}
            },
            Event::Text(t) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    append(item, f, &t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    append(item, f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) if current.is_some() && depth > 0 => {
                depth -= 1;
                field = None;
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_channel {
        return Err(FeedError::MissingChannel);
    }

    Ok(items)
}
