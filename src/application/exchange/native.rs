//! Import of documents produced by our own export.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::application::exchange::request::{EntityCreationRequest, NewPage, NewPost};
use crate::application::exchange::xml::{XmlElement, parse_document};
use crate::application::exchange::{
    ATOM_NS, ExchangeError, FOLIO_NS, GENERATOR_NAME, document_text,
};
use crate::domain::types::{FeedKind, PostStatus, parse_flag};

/// Decode a native export.
///
/// Every entry is validated before the batch is returned, so a document with
/// one bad entry yields nothing.
pub fn decode_native(xml: &[u8]) -> Result<NativeBatch, ExchangeError> {
    let text = document_text(xml)?;
    let root = parse_document(text)?;

    if !root.is(ATOM_NS, "feed") {
        return Err(ExchangeError::invalid(format!(
            "expected an Atom <feed> root element, found <{}>",
            root.name
        )));
    }

    let generator = root.child_text(ATOM_NS, "generator").unwrap_or_default();
    if generator != GENERATOR_NAME {
        return Err(ExchangeError::invalid(format!(
            "generator `{generator}` is not {GENERATOR_NAME}"
        )));
    }

    let kind = root
        .child_text(FOLIO_NS, "kind")
        .and_then(|kind| FeedKind::try_from(kind).ok())
        .ok_or_else(|| ExchangeError::invalid("missing or unknown folio:kind"))?;

    let requests = root
        .children_named(ATOM_NS, "entry")
        .enumerate()
        .map(|(index, entry)| {
            let translated = match kind {
                FeedKind::Posts => post_request(entry).map(EntityCreationRequest::Post),
                FeedKind::Pages => page_request(entry).map(EntityCreationRequest::Page),
            };
            translated.map_err(|reason| {
                ExchangeError::invalid(format!("entry {}: {reason}", index + 1))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NativeBatch {
        kind,
        requests: requests.into_iter(),
    })
}

/// Creation requests of one native document, in document order.
#[derive(Debug)]
pub struct NativeBatch {
    kind: FeedKind,
    requests: std::vec::IntoIter<EntityCreationRequest>,
}

impl NativeBatch {
    pub fn kind(&self) -> FeedKind {
        self.kind
    }
}

impl Iterator for NativeBatch {
    type Item = EntityCreationRequest;

    fn next(&mut self) -> Option<Self::Item> {
        self.requests.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.requests.size_hint()
    }
}

impl ExactSizeIterator for NativeBatch {}

fn post_request(entry: &XmlElement) -> Result<NewPost, String> {
    let feather = extension(entry, "feather");
    if feather.is_empty() {
        return Err("post has no feather".to_string());
    }

    let content = entry.child(ATOM_NS, "content");
    let mut fields: BTreeMap<String, String> = content
        .map(|content| {
            content
                .children_named(FOLIO_NS, "field")
                .filter_map(|field| {
                    field
                        .attribute("", "name")
                        .map(|name| (name.to_string(), field.text.clone()))
                })
                .collect()
        })
        .unwrap_or_default();
    if fields.is_empty()
        && let Some(content) = content
        && !content.text.trim().is_empty()
    {
        fields.insert("body".to_string(), content.text.clone());
    }

    let clean = extension(entry, "clean").to_string();
    let status = match extension(entry, "status") {
        "" => PostStatus::Public,
        status => PostStatus::from(status),
    };

    Ok(NewPost {
        feather: feather.to_string(),
        fields,
        url: url_or_clean(entry, &clean),
        clean,
        pinned: flag(entry, "pinned")?,
        status,
        created_at: timestamp(entry, "created_at")?,
        updated_at: timestamp(entry, "updated_at")?,
        author_login: author_login(entry),
        media: Vec::new(),
    })
}

fn page_request(entry: &XmlElement) -> Result<NewPage, String> {
    let title = entry
        .child(ATOM_NS, "title")
        .map(|title| title.text.clone())
        .unwrap_or_default();
    let body = entry
        .child(ATOM_NS, "content")
        .map(|content| content.text.clone())
        .unwrap_or_default();

    let parent_id = match entry.attribute(FOLIO_NS, "parent_id").map(str::trim) {
        None | Some("") | Some("0") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| format!("parent_id `{raw}` is not an integer"))?,
        ),
    };
    let list_order = match extension(entry, "list_order") {
        "" => 0,
        raw => raw
            .parse::<i32>()
            .map_err(|_| format!("list_order `{raw}` is not an integer"))?,
    };
    let clean = extension(entry, "clean").to_string();

    Ok(NewPage {
        title,
        body,
        parent_id,
        show_in_list: flag(entry, "show_in_list")?,
        list_order,
        url: url_or_clean(entry, &clean),
        clean,
        created_at: timestamp(entry, "created_at")?,
        updated_at: timestamp(entry, "updated_at")?,
        author_login: author_login(entry),
        media: Vec::new(),
    })
}

fn extension<'a>(entry: &'a XmlElement, name: &str) -> &'a str {
    entry.child_text(FOLIO_NS, name).unwrap_or_default()
}

fn url_or_clean(entry: &XmlElement, clean: &str) -> String {
    match extension(entry, "url") {
        "" => clean.to_string(),
        url => url.to_string(),
    }
}

fn flag(entry: &XmlElement, name: &str) -> Result<bool, String> {
    parse_flag(extension(entry, name)).map_err(|err| format!("{name}: {err}"))
}

fn timestamp(entry: &XmlElement, name: &str) -> Result<Option<OffsetDateTime>, String> {
    match extension(entry, name) {
        "" => Ok(None),
        raw => OffsetDateTime::parse(raw, &Rfc3339)
            .map(Some)
            .map_err(|err| format!("{name} `{raw}` is not RFC 3339: {err}")),
    }
}

fn author_login(entry: &XmlElement) -> Option<String> {
    entry
        .child(ATOM_NS, "author")
        .and_then(|author| author.child_text(FOLIO_NS, "login"))
        .filter(|login| !login.is_empty())
        .map(str::to_string)
}
