//! Admin search mini-language.
//!
//! A raw query is a whitespace separated list of tokens. Tokens without a
//! colon form the free-text part; `field:value` tokens become equality
//! constraints. `author:<login>` is resolved to `user_id:<id>` through the
//! users repository, with [`NO_SUCH_USER`] standing in for unknown logins.

use std::fmt;

use thiserror::Error;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::{NO_SUCH_USER, PageRecord, PostRecord, UserRecord};
use crate::domain::types::parse_flag;

const AUTHOR_KEYWORD: &str = "author";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchScope {
    Posts,
    Pages,
    Users,
}

impl SearchScope {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchScope::Posts => "posts",
            SearchScope::Pages => "pages",
            SearchScope::Users => "users",
        }
    }

    pub fn allowed_fields(self) -> &'static [FilterField] {
        use FilterField::*;
        match self {
            SearchScope::Posts => &[Id, Feather, Clean, Url, Pinned, Status, UserId],
            SearchScope::Pages => &[Id, ParentId, ShowInList, ListOrder, Clean, Url, UserId],
            SearchScope::Users => &[Id, Login, GroupId],
        }
    }

    pub fn allows(self, field: FilterField) -> bool {
        self.allowed_fields().contains(&field)
    }

    /// Columns matched case-insensitively against the free text. For posts
    /// this is the `fields` object, searched value by value.
    pub fn text_columns(self) -> &'static [&'static str] {
        match self {
            SearchScope::Posts => &["fields"],
            SearchScope::Pages => &["title", "body"],
            SearchScope::Users => &["login", "full_name", "email", "website"],
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Id,
    Feather,
    Clean,
    Url,
    Pinned,
    Status,
    UserId,
    ParentId,
    ShowInList,
    ListOrder,
    Login,
    GroupId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Boolean,
    Text,
}

impl FilterField {
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "id" => FilterField::Id,
            "feather" => FilterField::Feather,
            "clean" => FilterField::Clean,
            "url" => FilterField::Url,
            "pinned" => FilterField::Pinned,
            "status" => FilterField::Status,
            "user_id" => FilterField::UserId,
            "parent_id" => FilterField::ParentId,
            "show_in_list" => FilterField::ShowInList,
            "list_order" => FilterField::ListOrder,
            "login" => FilterField::Login,
            "group_id" => FilterField::GroupId,
            _ => return None,
        };
        Some(field)
    }

    /// Column name, identical to the name accepted in queries.
    pub fn column(self) -> &'static str {
        match self {
            FilterField::Id => "id",
            FilterField::Feather => "feather",
            FilterField::Clean => "clean",
            FilterField::Url => "url",
            FilterField::Pinned => "pinned",
            FilterField::Status => "status",
            FilterField::UserId => "user_id",
            FilterField::ParentId => "parent_id",
            FilterField::ShowInList => "show_in_list",
            FilterField::ListOrder => "list_order",
            FilterField::Login => "login",
            FilterField::GroupId => "group_id",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            FilterField::Id
            | FilterField::UserId
            | FilterField::ParentId
            | FilterField::ListOrder
            | FilterField::GroupId => ColumnKind::Integer,
            FilterField::Pinned | FilterField::ShowInList => ColumnKind::Boolean,
            FilterField::Feather
            | FilterField::Clean
            | FilterField::Url
            | FilterField::Status
            | FilterField::Login => ColumnKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl FilterValue {
    fn parse(field: FilterField, token: &str, raw: &str) -> Result<Self, SearchError> {
        match field.kind() {
            ColumnKind::Integer => raw
                .parse()
                .map(FilterValue::Integer)
                .map_err(|_| SearchError::syntax(token, "expected an integer value")),
            ColumnKind::Boolean => parse_flag(raw)
                .map(FilterValue::Boolean)
                .map_err(|_| SearchError::syntax(token, "expected a boolean value")),
            ColumnKind::Text => Ok(FilterValue::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(value) => write!(f, "{value}"),
            FilterValue::Boolean(value) => f.write_str(if *value { "1" } else { "0" }),
            FilterValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConstraint {
    pub field: FilterField,
    pub value: FilterValue,
}

/// Validated search request: AND of all constraints plus a free-text match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub full_text: String,
    pub constraints: Vec<FilterConstraint>,
}

impl FilterQuery {
    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty() && self.constraints.is_empty()
    }

    /// In-memory evaluation with the same semantics as the SQL predicate.
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        let constraints_hold = self
            .constraints
            .iter()
            .all(|constraint| item.filter_value(constraint.field).as_ref() == Some(&constraint.value));
        if !constraints_hold {
            return false;
        }
        if self.full_text.is_empty() {
            return true;
        }

        let needle = self.full_text.to_lowercase();
        item.text_values()
            .iter()
            .any(|value| value.to_lowercase().contains(&needle))
    }
}

/// Entities a [`FilterQuery`] can be evaluated against without a database.
pub trait Searchable {
    fn filter_value(&self, field: FilterField) -> Option<FilterValue>;

    fn text_values(&self) -> Vec<&str>;
}

impl Searchable for PostRecord {
    fn filter_value(&self, field: FilterField) -> Option<FilterValue> {
        let value = match field {
            FilterField::Id => FilterValue::Integer(self.id),
            FilterField::Feather => FilterValue::Text(self.feather.clone()),
            FilterField::Clean => FilterValue::Text(self.clean.clone()),
            FilterField::Url => FilterValue::Text(self.url.clone()),
            FilterField::Pinned => FilterValue::Boolean(self.pinned),
            FilterField::Status => FilterValue::Text(self.status.as_str().to_string()),
            FilterField::UserId => FilterValue::Integer(self.user_id),
            _ => return None,
        };
        Some(value)
    }

    fn text_values(&self) -> Vec<&str> {
        self.fields.values().map(String::as_str).collect()
    }
}

impl Searchable for PageRecord {
    fn filter_value(&self, field: FilterField) -> Option<FilterValue> {
        let value = match field {
            FilterField::Id => FilterValue::Integer(self.id),
            FilterField::ParentId => FilterValue::Integer(self.parent_id.unwrap_or(0)),
            FilterField::ShowInList => FilterValue::Boolean(self.show_in_list),
            FilterField::ListOrder => FilterValue::Integer(i64::from(self.list_order)),
            FilterField::Clean => FilterValue::Text(self.clean.clone()),
            FilterField::Url => FilterValue::Text(self.url.clone()),
            FilterField::UserId => FilterValue::Integer(self.user_id),
            _ => return None,
        };
        Some(value)
    }

    fn text_values(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.body.as_str()]
    }
}

impl Searchable for UserRecord {
    fn filter_value(&self, field: FilterField) -> Option<FilterValue> {
        let value = match field {
            FilterField::Id => FilterValue::Integer(self.id),
            FilterField::Login => FilterValue::Text(self.login.clone()),
            FilterField::GroupId => FilterValue::Integer(self.group_id),
            _ => return None,
        };
        Some(value)
    }

    fn text_values(&self) -> Vec<&str> {
        let mut values = vec![self.login.as_str(), self.email.as_str()];
        values.extend(self.full_name.as_deref());
        values.extend(self.website.as_deref());
        values
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("`{field}` cannot be used to filter {scope}")]
    InvalidFilterField { field: String, scope: SearchScope },
    #[error("malformed filter `{token}`: {reason}")]
    InvalidFilterSyntax { token: String, reason: &'static str },
    #[error("failed to resolve author filter")]
    Lookup(#[source] RepoError),
}

impl SearchError {
    fn syntax(token: &str, reason: &'static str) -> Self {
        Self::InvalidFilterSyntax {
            token: token.to_string(),
            reason,
        }
    }
}

/// Tokenizer output before field validation and author resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFilter {
    pub full_text: String,
    pub terms: Vec<(String, String)>,
}

/// Split a raw query into free text and `field:value` terms.
///
/// Free-text tokens are concatenated without a separator. Terms split on the
/// first colon, so `url:a:b` filters on `a:b`.
pub fn tokenize(raw: &str) -> Result<RawFilter, SearchError> {
    let mut filter = RawFilter::default();

    for token in raw.split_whitespace() {
        match token.split_once(':') {
            None => filter.full_text.push_str(token),
            Some((field, value)) => {
                if field.is_empty() || value.is_empty() {
                    return Err(SearchError::syntax(token, "expected `field:value`"));
                }
                filter.terms.push((field.to_string(), value.to_string()));
            }
        }
    }

    Ok(filter)
}

pub struct FilterQueryParser<'a> {
    scope: SearchScope,
    users: &'a dyn UsersRepo,
}

impl<'a> FilterQueryParser<'a> {
    pub fn new(scope: SearchScope, users: &'a dyn UsersRepo) -> Self {
        Self { scope, users }
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub async fn parse(&self, raw: &str) -> Result<FilterQuery, SearchError> {
        let RawFilter { full_text, terms } = tokenize(raw)?;

        let mut constraints = Vec::with_capacity(terms.len());
        for (name, value) in terms {
            let token = format!("{name}:{value}");
            let constraint = if name == AUTHOR_KEYWORD {
                self.ensure_allowed(FilterField::UserId, &name)?;
                FilterConstraint {
                    field: FilterField::UserId,
                    value: FilterValue::Integer(self.resolve_author(&value).await?),
                }
            } else {
                let field = FilterField::from_name(&name)
                    .ok_or_else(|| self.unknown_field(&name))?;
                self.ensure_allowed(field, &name)?;
                FilterConstraint {
                    field,
                    value: FilterValue::parse(field, &token, &value)?,
                }
            };
            constraints.push(constraint);
        }

        Ok(FilterQuery {
            full_text,
            constraints,
        })
    }

    async fn resolve_author(&self, login: &str) -> Result<i64, SearchError> {
        let user = self
            .users
            .find_by_login(login)
            .await
            .map_err(SearchError::Lookup)?;
        Ok(user.map(|user| user.id).unwrap_or(NO_SUCH_USER))
    }

    fn ensure_allowed(&self, field: FilterField, name: &str) -> Result<(), SearchError> {
        if self.scope.allows(field) {
            Ok(())
        } else {
            Err(self.unknown_field(name))
        }
    }

    fn unknown_field(&self, name: &str) -> SearchError {
        SearchError::InvalidFilterField {
            field: name.to_string(),
            scope: self.scope,
        }
    }
}
