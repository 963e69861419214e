//! Export encoding: entities to [`FeedDocument`] to XML text.

use std::collections::HashMap;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::application::exchange::document::{
    FeedAuthor, FeedContent, FeedDocument, FeedEntry, Generator,
};
use crate::application::exchange::hooks::ExportHooks;
use crate::application::exchange::{ATOM_NS, FOLIO_NS, FOLIO_PREFIX, GENERATOR_NAME, GENERATOR_URI};
use crate::application::site::SiteMetadata;
use crate::domain::entities::{PageRecord, PostRecord, UserRecord};
use crate::domain::types::FeedKind;

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Entities of one kind, in the order they should be exported.
#[derive(Debug, Clone, Copy)]
pub enum ExportSource<'a> {
    Posts(&'a [PostRecord]),
    Pages(&'a [PageRecord]),
}

impl ExportSource<'_> {
    pub fn kind(&self) -> FeedKind {
        match self {
            ExportSource::Posts(_) => FeedKind::Posts,
            ExportSource::Pages(_) => FeedKind::Pages,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ExportSource::Posts(posts) => posts.len(),
            ExportSource::Pages(pages) => pages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn latest_timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            ExportSource::Posts(posts) => posts.iter().map(PostRecord::effective_updated_at).max(),
            ExportSource::Pages(pages) => pages.iter().map(PageRecord::effective_updated_at).max(),
        }
    }
}

pub struct FeedEncoder<'a> {
    site: &'a SiteMetadata,
    hooks: &'a ExportHooks,
    authors: &'a HashMap<i64, UserRecord>,
}

impl<'a> FeedEncoder<'a> {
    pub fn new(
        site: &'a SiteMetadata,
        hooks: &'a ExportHooks,
        authors: &'a HashMap<i64, UserRecord>,
    ) -> Self {
        Self {
            site,
            hooks,
            authors,
        }
    }

    pub fn encode(&self, source: ExportSource<'_>) -> Vec<u8> {
        render_document(&self.build(source)).into_bytes()
    }

    pub fn build(&self, source: ExportSource<'_>) -> FeedDocument {
        let kind = source.kind();
        let updated = source
            .latest_timestamp()
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let year = updated.year();
        let host = self.site.host();

        let entries = match source {
            ExportSource::Posts(posts) => posts
                .iter()
                .map(|post| self.post_entry(post, host, year))
                .collect(),
            ExportSource::Pages(pages) => pages
                .iter()
                .map(|page| self.page_entry(page, host, year))
                .collect(),
        };

        let title = match self.site.name.trim() {
            "" => kind.label().to_string(),
            name => format!("{name} {}", kind.label()),
        };

        FeedDocument {
            kind,
            title,
            subtitle: self.site.description.clone(),
            id: format!("tag:{host},{year}:{GENERATOR_NAME}"),
            updated,
            link: self.site.base_url(),
            generator: Generator {
                name: GENERATOR_NAME.to_string(),
                uri: GENERATOR_URI.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            entries,
        }
    }

    fn post_entry(&self, post: &PostRecord, host: &str, year: i32) -> FeedEntry {
        let permalink = self.site.post_permalink(&post.url);
        let link = self.hooks.post_url(permalink.clone(), post);

        let mut entry = FeedEntry {
            title: post.display_title(),
            id: tag_uri(&permalink, host, year),
            updated: post.effective_updated_at(),
            published: post.created_at,
            link,
            base: permalink,
            author: self.author(post.user_id),
            content: FeedContent::Structured(post.fields.clone()),
            extension_fields: vec![
                ("feather".to_string(), post.feather.clone()),
                ("clean".to_string(), post.clean.clone()),
                ("url".to_string(), post.url.clone()),
                ("pinned".to_string(), flag(post.pinned)),
                ("status".to_string(), post.status.as_str().to_string()),
                ("created_at".to_string(), format_timestamp(post.created_at)),
                (
                    "updated_at".to_string(),
                    post.updated_at.map(format_timestamp).unwrap_or_default(),
                ),
            ],
            extension_attributes: Vec::new(),
        };

        self.hooks.post_entry(&mut entry, post);
        entry
    }

    fn page_entry(&self, page: &PageRecord, host: &str, year: i32) -> FeedEntry {
        let permalink = self.site.page_permalink(&page.url);
        let link = self.hooks.page_url(permalink.clone(), page);

        let mut entry = FeedEntry {
            title: page.title.clone(),
            id: tag_uri(&permalink, host, year),
            updated: page.effective_updated_at(),
            published: page.created_at,
            link,
            base: permalink,
            author: self.author(page.user_id),
            content: FeedContent::Html(page.body.clone()),
            extension_fields: vec![
                ("show_in_list".to_string(), flag(page.show_in_list)),
                ("list_order".to_string(), page.list_order.to_string()),
                ("clean".to_string(), page.clean.clone()),
                ("url".to_string(), page.url.clone()),
                ("created_at".to_string(), format_timestamp(page.created_at)),
                (
                    "updated_at".to_string(),
                    page.updated_at.map(format_timestamp).unwrap_or_default(),
                ),
            ],
            extension_attributes: vec![(
                "parent_id".to_string(),
                page.parent_id.unwrap_or(0).to_string(),
            )],
        };

        self.hooks.page_entry(&mut entry, page);
        entry
    }

    fn author(&self, user_id: i64) -> FeedAuthor {
        match self.authors.get(&user_id) {
            Some(user) => FeedAuthor {
                name: user.display_name().to_string(),
                uri: user
                    .website
                    .as_deref()
                    .map(str::trim)
                    .filter(|website| !website.is_empty())
                    .map(str::to_string),
                login: user.login.clone(),
                user_id,
            },
            None => FeedAuthor {
                name: UNKNOWN_AUTHOR.to_string(),
                uri: None,
                login: String::new(),
                user_id,
            },
        }
    }
}

/// Build a `tag:` URI from a permalink.
///
/// The scheme is dropped, `#` becomes `/`, and `,<year>:` is inserted right
/// after the first occurrence of `host`.
pub fn tag_uri(permalink: &str, host: &str, year: i32) -> String {
    let without_scheme = match permalink.find("//") {
        Some(index) => &permalink[index + 2..],
        None => permalink,
    };
    let path = without_scheme.replace('#', "/");

    let dated = if !host.is_empty()
        && let Some(index) = path.find(host)
    {
        let split = index + host.len();
        format!("{},{year}:{}", &path[..split], &path[split..])
    } else {
        path
    };

    format!("tag:{dated}")
}

pub fn render_document(document: &FeedDocument) -> String {
    let mut entries = String::new();
    for entry in &document.entries {
        entries.push_str(&render_entry(entry));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"{ATOM_NS}\" xmlns:{FOLIO_PREFIX}=\"{FOLIO_NS}\">\n  <title type=\"text\">{}</title>\n  <subtitle type=\"text\">{}</subtitle>\n  <id>{}</id>\n  <updated>{}</updated>\n  <link href=\"{}\" rel=\"self\" type=\"application/atom+xml\"/>\n  <generator uri=\"{}\" version=\"{}\">{}</generator>\n  <{FOLIO_PREFIX}:kind>{}</{FOLIO_PREFIX}:kind>\n{}</feed>\n",
        xml_escape(&document.title),
        xml_escape(&document.subtitle),
        xml_escape(&document.id),
        format_timestamp(document.updated),
        xml_escape(&document.link),
        xml_escape(&document.generator.uri),
        xml_escape(&document.generator.version),
        xml_escape(&document.generator.name),
        document.kind.as_str(),
        entries,
    )
}

fn render_entry(entry: &FeedEntry) -> String {
    let mut attributes = String::new();
    for (name, value) in &entry.extension_attributes {
        if !is_xml_name(name) {
            warn!(target = "folio::exchange::encode", attribute = %name, "Skipping extension attribute with invalid name");
            continue;
        }
        attributes.push_str(&format!(" {FOLIO_PREFIX}:{name}=\"{}\"", xml_escape(value)));
    }

    let author_uri = entry
        .author
        .uri
        .as_deref()
        .map(|uri| format!("      <uri>{}</uri>\n", xml_escape(uri)))
        .unwrap_or_default();

    let content = match &entry.content {
        FeedContent::Structured(fields) => {
            let mut body = String::from("    <content type=\"application/xml\">\n");
            for (name, value) in fields {
                body.push_str(&format!(
                    "      <{FOLIO_PREFIX}:field name=\"{}\">{}</{FOLIO_PREFIX}:field>\n",
                    xml_escape(name),
                    xml_escape(value),
                ));
            }
            body.push_str("    </content>\n");
            body
        }
        FeedContent::Html(html) => {
            format!("    <content type=\"html\">{}</content>\n", xml_escape(html))
        }
    };

    let mut extensions = String::new();
    for (name, value) in &entry.extension_fields {
        if !is_xml_name(name) {
            warn!(target = "folio::exchange::encode", field = %name, "Skipping extension field with invalid name");
            continue;
        }
        extensions.push_str(&format!(
            "    <{FOLIO_PREFIX}:{name}>{}</{FOLIO_PREFIX}:{name}>\n",
            xml_escape(value)
        ));
    }

    format!(
        "  <entry xml:base=\"{}\"{}>\n    <title type=\"text\">{}</title>\n    <id>{}</id>\n    <updated>{}</updated>\n    <published>{}</published>\n    <link rel=\"alternate\" type=\"text/html\" href=\"{}\"/>\n    <author {FOLIO_PREFIX}:user_id=\"{}\">\n      <name>{}</name>\n{}      <{FOLIO_PREFIX}:login>{}</{FOLIO_PREFIX}:login>\n    </author>\n{}{}  </entry>\n",
        xml_escape(&entry.base),
        attributes,
        xml_escape(&entry.title),
        xml_escape(&entry.id),
        format_timestamp(entry.updated),
        format_timestamp(entry.published),
        xml_escape(&entry.link),
        entry.author.user_id,
        xml_escape(&entry.author.name),
        author_uri,
        xml_escape(&entry.author.login),
        content,
        extensions,
    )
}

pub(crate) fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

pub(crate) fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
