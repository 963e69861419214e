//! Text repair for WordPress exports before they reach the XML parser.
//!
//! WordPress emits raw HTML in a few elements and unescaped ampersands in
//! `wp:meta_value`, both of which break a conforming parser.

use regex::{Captures, Regex};

use crate::application::exchange::ExchangeError;

/// Upper bound on ampersand repair passes.
pub const MAX_REPAIR_PASSES: usize = 1000;

/// Elements whose content is raw HTML and must be CDATA-wrapped.
pub const RAW_HTML_FIELDS: [&str; 3] = ["wp:comment_content", "content:encoded", "excerpt:encoded"];

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub text: String,
    /// Ampersand passes that changed the text.
    pub passes: usize,
}

pub fn repair_foreign_xml(input: &str) -> Result<RepairOutcome, ExchangeError> {
    repair_with_limit(input, MAX_REPAIR_PASSES)
}

fn repair_with_limit(input: &str, max_passes: usize) -> Result<RepairOutcome, ExchangeError> {
    let wrapped = wrap_raw_fields(input);
    let repair = MetaValueRepair::new()?;

    let mut text = wrapped;
    let mut passes = 0;
    while let Some(next) = repair.escape_pass(&text) {
        if passes == max_passes {
            return Err(ExchangeError::MalformedFeed { passes });
        }
        text = next;
        passes += 1;
    }

    Ok(RepairOutcome { text, passes })
}

/// Wrap every raw-HTML field in CDATA, keeping already wrapped ones intact.
pub fn wrap_raw_fields(input: &str) -> String {
    let mut text = input.to_string();
    for field in RAW_HTML_FIELDS {
        let open = format!("<{field}>");
        let close = format!("</{field}>");
        text = text
            .replace(&open, &format!("{open}{CDATA_OPEN}"))
            .replace(&close, &format!("{CDATA_CLOSE}{close}"));
    }
    text.replace(&format!("{CDATA_OPEN}{CDATA_OPEN}"), CDATA_OPEN)
        .replace(&format!("{CDATA_CLOSE}{CDATA_CLOSE}"), CDATA_CLOSE)
}

struct MetaValueRepair {
    pattern: Regex,
}

impl MetaValueRepair {
    fn new() -> Result<Self, ExchangeError> {
        let pattern = Regex::new(r"(?s)<wp:meta_value>(.*?)</wp:meta_value>")
            .map_err(|err| ExchangeError::invalid(format!("repair pattern: {err}")))?;
        Ok(Self { pattern })
    }

    /// Escape the first bare `&` of every `wp:meta_value`; `None` when clean.
    fn escape_pass(&self, text: &str) -> Option<String> {
        let mut changed = false;
        let repaired = self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let value = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            match escape_first_bare_ampersand(value) {
                Some(fixed) => {
                    changed = true;
                    format!("<wp:meta_value>{fixed}</wp:meta_value>")
                }
                None => caps[0].to_string(),
            }
        });

        if changed {
            Some(repaired.into_owned())
        } else {
            None
        }
    }
}

fn escape_first_bare_ampersand(value: &str) -> Option<String> {
    if value.trim_start().starts_with(CDATA_OPEN) {
        return None;
    }

    let index = value
        .match_indices('&')
        .map(|(index, _)| index)
        .find(|&index| !starts_entity(&value[index + 1..]))?;

    let mut fixed = String::with_capacity(value.len() + 4);
    fixed.push_str(&value[..index]);
    fixed.push_str("&amp;");
    fixed.push_str(&value[index + 1..]);
    Some(fixed)
}

/// Entities every XML parser knows without a DTD.
const XML_PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Whether `rest`, the text after an `&`, begins a reference XML can resolve.
///
/// HTML names such as `nbsp` are not XML entities and count as bare `&`.
fn starts_entity(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let name = &rest[..end];

    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|ch| ch.is_ascii_hexdigit());
    }
    if let Some(digits) = name.strip_prefix('#') {
        return !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit());
    }

    XML_PREDEFINED_ENTITIES.contains(&name)
}
