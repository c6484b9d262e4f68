//! Search, sort and paging for the user listing.

use crate::repository::User;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use utoipa::ToSchema;

/// `name:<pattern>` or `email:<pattern>`, matched case-insensitively.
#[derive(Clone, Debug)]
pub struct SearchFilter {
    field: SortField,
    pattern: Regex,
}

impl SearchFilter {
    /// Returns `None` when `search` is not of the form `name:..` / `email:..`.
    /// A pattern that is not a valid regex is matched literally.
    #[must_use]
    pub fn parse(search: &str) -> Option<Self> {
        let (field, value) = search.split_once(':')?;
        let field = match field {
            "name" => SortField::Name,
            "email" => SortField::Email,
            _ => return None,
        };

        let pattern = RegexBuilder::new(value)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(value))
                    .case_insensitive(true)
                    .build()
            })
            .ok()?;

        Some(Self { field, pattern })
    }

    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        match self.field {
            SortField::Name => self.pattern.is_match(&user.name),
            SortField::Email => self.pattern.is_match(&user.email),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Email,
    Name,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListQuery {
    /// `field:order`; `email` sorts by email, any other field by name, and
    /// only `desc` reverses. Without a sort the listing is by email ascending.
    #[must_use]
    pub fn sorting(&self) -> (SortField, SortOrder) {
        let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) else {
            return (SortField::Email, SortOrder::Asc);
        };

        let (field, order) = sort.split_once(':').unwrap_or((sort, ""));
        let field = if field == "email" {
            SortField::Email
        } else {
            SortField::Name
        };
        let order = if order == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };

        (field, order)
    }

    fn paging(&self) -> Option<(usize, usize)> {
        match (self.page_number, self.page_size) {
            (Some(number), Some(size)) if number > 0 && size > 0 => Some((number, size)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserPage {
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
    pub count: usize,
    pub total_pages: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<UserSummary>,
}

fn compare(a: &User, b: &User, field: SortField) -> Ordering {
    match field {
        SortField::Email => a.email.cmp(&b.email),
        SortField::Name => a.name.cmp(&b.name),
    }
}

/// Filter, sort and slice `users` according to `query`.
#[must_use]
pub fn paginate(mut users: Vec<User>, query: &ListQuery) -> UserPage {
    if let Some(filter) = query.search.as_deref().and_then(SearchFilter::parse) {
        users.retain(|user| filter.matches(user));
    }

    let (field, order) = query.sorting();
    users.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, field),
        SortOrder::Desc => compare(b, a, field),
    });

    let count = users.len();

    let (total_pages, data) = match query.paging() {
        Some((number, size)) => {
            let total_pages = count.div_ceil(size);
            let start = (number - 1).saturating_mul(size).min(count);
            let end = start.saturating_add(size).min(count);
            (total_pages, &users[start..end])
        }
        None => (1, &users[..]),
    };

    let page_number = query.page_number.unwrap_or(0);

    UserPage {
        page_number: query.page_number,
        page_size: query.page_size,
        count,
        total_pages,
        has_previous_page: page_number > 1,
        has_next_page: query.page_number.is_some() && page_number < total_pages,
        data: data.iter().map(UserSummary::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(name: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            last_login_attempt_time: None,
        }
    }

    fn users() -> Vec<User> {
        vec![
            user("Citra", "citra@x.com"),
            user("Ana", "zed@x.com"),
            user("Budi", "budi@x.com"),
            user("andi", "andi@x.com"),
        ]
    }

    fn emails(page: &UserPage) -> Vec<&str> {
        page.data.iter().map(|u| u.email.as_str()).collect()
    }

    #[test]
    fn default_sort_is_email_ascending() {
        let page = paginate(users(), &ListQuery::default());
        assert_eq!(
            emails(&page),
            ["andi@x.com", "budi@x.com", "citra@x.com", "zed@x.com"]
        );
        assert_eq!(page.count, 4);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[test]
    fn unknown_sort_field_sorts_by_name() {
        let query = ListQuery {
            sort: Some("age:desc".to_string()),
            ..ListQuery::default()
        };
        let page = paginate(users(), &query);
        let names: Vec<_> = page.data.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["andi", "Citra", "Budi", "Ana"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let query = ListQuery {
            search: Some("name:AN".to_string()),
            ..ListQuery::default()
        };
        let page = paginate(users(), &query);
        assert_eq!(emails(&page), ["andi@x.com", "zed@x.com"]);
        assert_eq!(page.count, 2);
    }

    #[test]
    fn search_without_field_is_ignored() {
        let query = ListQuery {
            search: Some("Ana".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(paginate(users(), &query).count, 4);
    }

    #[test]
    fn invalid_pattern_is_literal() {
        let query = ListQuery {
            search: Some("email:(".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(paginate(users(), &query).count, 0);
    }

    #[test]
    fn pages() {
        let query = ListQuery {
            page_number: Some(2),
            page_size: Some(3),
            ..ListQuery::default()
        };
        let page = paginate(users(), &query);
        assert_eq!(emails(&page), ["zed@x.com"]);
        assert_eq!(page.count, 4);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);

        let query = ListQuery {
            page_number: Some(1),
            ..query
        };
        let page = paginate(users(), &query);
        assert_eq!(page.data.len(), 3);
        assert!(page.has_next_page);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let query = ListQuery {
            page_number: Some(9),
            page_size: Some(3),
            ..ListQuery::default()
        };
        let page = paginate(users(), &query);
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 2);
    }
}
