//! WordPress eXtended RSS import.

use std::collections::BTreeMap;

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::application::exchange::repair::repair_foreign_xml;
use crate::application::exchange::request::{
    EntityCreationRequest, MediaMatcher, NewPage, NewPost,
};
use crate::application::exchange::xml::{XmlElement, parse_document};
use crate::application::exchange::{ExchangeError, document_text};
use crate::domain::slug::derive_slug_or_fallback;
use crate::domain::types::PostStatus;

/// Feather every foreign post is imported as.
pub const FOREIGN_FEATHER: &str = "text";

const WORDPRESS_NS_PREFIX: &str = "http://wordpress.org/export/";
const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const WORDPRESS_GENERATOR: &str = "wordpress.org";
const PLACEHOLDER_TITLE: &str = "zz_placeholder";
const ATTACHMENT: &str = "attachment";
const EMPTY_DATE: &str = "0000-00-00 00:00:00";

#[derive(Debug, Clone, Default)]
pub struct ForeignOptions {
    /// Base url of media worth ingesting, e.g. `http://old.example/wp-content/uploads/`.
    pub media_base: Option<String>,
}

/// Map a WordPress status onto a local one; unknown values pass through.
pub fn translate_status(status: &str) -> PostStatus {
    match status {
        "publish" | "static" | "object" | "inherit" => PostStatus::Public,
        "draft" | "future" | "pending" => PostStatus::Draft,
        "private" => PostStatus::Private,
        other => PostStatus::from(other),
    }
}

pub fn decode_foreign(xml: &[u8], options: &ForeignOptions) -> Result<ForeignBatch, ExchangeError> {
    let text = document_text(xml)?;
    let repaired = repair_foreign_xml(text)?;
    let mut root = parse_document(&repaired.text)?;

    if !root.is("", "rss") {
        return Err(ExchangeError::invalid(format!(
            "expected an <rss> root element, found <{}>",
            root.name
        )));
    }
    let channel = root
        .take_child("", "channel")
        .ok_or_else(|| ExchangeError::invalid("missing <channel> element"))?;

    let generator = channel.child_text("", "generator").unwrap_or_default();
    if !generator.contains(WORDPRESS_GENERATOR) {
        return Err(ExchangeError::invalid(format!(
            "generator `{generator}` is not a WordPress export"
        )));
    }

    let items = channel.into_children_named("", "item");
    Ok(ForeignBatch {
        items: items.into_iter(),
        media: options
            .media_base
            .as_deref()
            .and_then(MediaMatcher::new),
        skipped: 0,
        repair_passes: repaired.passes,
    })
}

/// Items of a validated WordPress export, translated as they are pulled.
#[derive(Debug)]
pub struct ForeignBatch {
    items: std::vec::IntoIter<XmlElement>,
    media: Option<MediaMatcher>,
    skipped: usize,
    repair_passes: usize,
}

impl ForeignBatch {
    /// Items skipped so far (attachments, placeholders, unsupported types).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn repair_passes(&self) -> usize {
        self.repair_passes
    }

    fn translate(&self, item: &XmlElement) -> Option<EntityCreationRequest> {
        let title = item.child_text("", "title").unwrap_or_default();
        let post_type = wordpress_text(item, "post_type");
        let status = wordpress_text(item, "status");

        if post_type == ATTACHMENT || status == ATTACHMENT || title == PLACEHOLDER_TITLE {
            return None;
        }

        let clean = match wordpress_text(item, "post_name") {
            "" => derive_slug_or_fallback(title),
            name => name.to_string(),
        };
        let body = item
            .child(CONTENT_NS, "encoded")
            .map(|content| content.text.trim())
            .unwrap_or_default()
            .to_string();
        let media = self
            .media
            .as_ref()
            .map(|matcher| matcher.find(&body))
            .unwrap_or_default();
        let author_login = item
            .child_text(DC_NS, "creator")
            .filter(|login| !login.is_empty())
            .map(str::to_string);
        let created_at = parse_post_date(wordpress_text(item, "post_date"));

        match post_type {
            "" | "post" => Some(EntityCreationRequest::Post(NewPost {
                feather: FOREIGN_FEATHER.to_string(),
                fields: BTreeMap::from([
                    ("title".to_string(), title.to_string()),
                    ("body".to_string(), body),
                ]),
                url: clean.clone(),
                clean,
                pinned: false,
                status: translate_status(status),
                created_at,
                updated_at: None,
                author_login,
                media,
            })),
            "page" => Some(EntityCreationRequest::Page(NewPage {
                title: title.to_string(),
                body,
                parent_id: None,
                show_in_list: true,
                list_order: 0,
                url: clean.clone(),
                clean,
                created_at,
                updated_at: None,
                author_login,
                media,
            })),
            _ => None,
        }
    }
}

impl Iterator for ForeignBatch {
    type Item = EntityCreationRequest;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.items.next()?;
            match self.translate(&item) {
                Some(request) => return Some(request),
                None => self.skipped += 1,
            }
        }
    }
}

fn wordpress_text<'a>(item: &'a XmlElement, name: &str) -> &'a str {
    item.child_in(WORDPRESS_NS_PREFIX, name)
        .map(|child| child.text.trim())
        .unwrap_or_default()
}

/// `None` for the all-zero placeholder date or anything unparseable.
fn parse_post_date(value: &str) -> Option<OffsetDateTime> {
    if value.is_empty() || value == EMPTY_DATE {
        return None;
    }
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(value, format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn wxr(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
  xmlns:content="http://purl.org/rss/1.0/modules/content/"
  xmlns:dc="http://purl.org/dc/elements/1.1/"
  xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
  <title>Old Blog</title>
  <generator>https://wordpress.org/?v=6.4</generator>
{items}
</channel>
</rss>"#
        )
    }

    #[test]
    fn status_table_translates_known_values() {
        assert_eq!(translate_status("publish"), PostStatus::Public);
        assert_eq!(translate_status("inherit"), PostStatus::Public);
        assert_eq!(translate_status("future"), PostStatus::Draft);
        assert_eq!(translate_status("pending"), PostStatus::Draft);
        assert_eq!(translate_status("private"), PostStatus::Private);
        assert_eq!(
            translate_status("trash"),
            PostStatus::Other("trash".to_string())
        );
    }

    #[test]
    fn translates_posts_and_pages_and_skips_the_rest() {
        let xml = wxr(r#"
  <item>
    <title>Hello &amp; welcome</title>
    <dc:creator>ada</dc:creator>
    <content:encoded><p>Fish & chips</p></content:encoded>
    <wp:post_date>2009-04-01 10:20:30</wp:post_date>
    <wp:post_name>hello-welcome</wp:post_name>
    <wp:status>publish</wp:status>
    <wp:post_type>post</wp:post_type>
  </item>
  <item>
    <title>logo.png</title>
    <wp:status>inherit</wp:status>
    <wp:post_type>attachment</wp:post_type>
  </item>
  <item>
    <title>zz_placeholder</title>
    <wp:post_type>post</wp:post_type>
  </item>
  <item>
    <title>Menu</title>
    <wp:post_type>nav_menu_item</wp:post_type>
  </item>
  <item>
    <title>About Me</title>
    <content:encoded><![CDATA[<p>Hi</p>]]></content:encoded>
    <wp:post_date>0000-00-00 00:00:00</wp:post_date>
    <wp:post_name></wp:post_name>
    <wp:status>draft</wp:status>
    <wp:post_type>page</wp:post_type>
  </item>"#);

        let mut batch = decode_foreign(xml.as_bytes(), &ForeignOptions::default()).expect("batch");
        let requests: Vec<_> = batch.by_ref().collect();
        assert_eq!(requests.len(), 2);
        assert_eq!(batch.skipped(), 3);

        let EntityCreationRequest::Post(post) = &requests[0] else {
            panic!("expected post");
        };
        assert_eq!(post.feather, "text");
        assert_eq!(post.fields["title"], "Hello & welcome");
        assert_eq!(post.fields["body"], "<p>Fish & chips</p>");
        assert_eq!(post.clean, "hello-welcome");
        assert_eq!(post.status, PostStatus::Public);
        assert_eq!(post.created_at, Some(datetime!(2009-04-01 10:20:30 UTC)));
        assert_eq!(post.author_login.as_deref(), Some("ada"));

        let EntityCreationRequest::Page(page) = &requests[1] else {
            panic!("expected page");
        };
        assert_eq!(page.title, "About Me");
        assert_eq!(page.body, "<p>Hi</p>");
        assert_eq!(page.clean, "about-me");
        assert_eq!(page.parent_id, None);
        assert!(page.show_in_list);
        assert_eq!(page.created_at, None);
    }

    #[test]
    fn records_media_under_base_url() {
        let xml = wxr(r#"
  <item>
    <title>Gallery</title>
    <content:encoded><img src="http://old.example/uploads/a.jpg"/><img src="http://cdn.example/b.jpg"/></content:encoded>
    <wp:post_type>post</wp:post_type>
  </item>"#);
        let options = ForeignOptions {
            media_base: Some("http://old.example/uploads/".to_string()),
        };

        let requests: Vec<_> = decode_foreign(xml.as_bytes(), &options).expect("batch").collect();
        assert_eq!(requests[0].media(), ["http://old.example/uploads/a.jpg".to_string()]);
    }

    #[test]
    fn html_entities_in_meta_values_do_not_break_decoding() {
        let xml = wxr(r#"
  <item>
    <title>Lunch</title>
    <wp:post_name>lunch</wp:post_name>
    <wp:post_type>post</wp:post_type>
    <wp:postmeta>
      <wp:meta_key>_subtitle</wp:meta_key>
      <wp:meta_value>Fish&nbsp;chips & peas&hellip;</wp:meta_value>
    </wp:postmeta>
  </item>"#);

        let requests: Vec<_> = decode_foreign(xml.as_bytes(), &ForeignOptions::default())
            .expect("batch")
            .collect();
        assert_eq!(requests.len(), 1);
        let EntityCreationRequest::Post(post) = &requests[0] else {
            panic!("expected post");
        };
        assert_eq!(post.fields["title"], "Lunch");
        assert_eq!(post.clean, "lunch");
    }

    #[test]
    fn rejects_documents_from_other_generators() {
        let xml = wxr("").replace("https://wordpress.org/?v=6.4", "Blogger");
        assert!(matches!(
            decode_foreign(xml.as_bytes(), &ForeignOptions::default()),
            Err(ExchangeError::InvalidDocument { .. })
        ));

        assert!(matches!(
            decode_foreign(b"", &ForeignOptions::default()),
            Err(ExchangeError::InvalidDocument { .. })
        ));

        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom"><generator>Folio</generator></feed>"#;
        assert!(matches!(
            decode_foreign(atom.as_bytes(), &ForeignOptions::default()),
            Err(ExchangeError::InvalidDocument { .. })
        ));
    }
}
