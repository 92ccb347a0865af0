use crate::consts::consts::ContactId;
use crate::model::contact::Contact;

/// Explicit two-state filter toggle. The state lives in the matcher owned by
/// the session, never in a hidden global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Unfiltered,
    Filtered,
}

/// Per-contact visibility flag for the presentation layer. Search never
/// mutates the store itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactVisibility {
    pub id: ContactId,
    pub visible: bool,
}

pub struct SearchMatcher {
    state: SearchState,
}

impl SearchMatcher {
    pub fn new() -> Self {
        Self {
            state: SearchState::Unfiltered,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// A strict two-state toggle: any invocation while filtered clears the
    /// filter regardless of the query; an invocation with a non-empty query
    /// while unfiltered enters the filtered state. An empty query never
    /// filters.
    pub fn toggle<'a>(
        &mut self,
        query: &str,
        contacts: impl IntoIterator<Item = &'a Contact>,
    ) -> Vec<ContactVisibility> {
        match self.state {
            SearchState::Filtered => {
                self.state = SearchState::Unfiltered;

                contacts
                    .into_iter()
                    .map(|contact| ContactVisibility {
                        id: contact.id,
                        visible: true,
                    })
                    .collect()
            }
            SearchState::Unfiltered => {
                if query.trim().is_empty() {
                    return contacts
                        .into_iter()
                        .map(|contact| ContactVisibility {
                            id: contact.id,
                            visible: true,
                        })
                        .collect();
                }

                self.state = SearchState::Filtered;

                contacts
                    .into_iter()
                    .map(|contact| ContactVisibility {
                        id: contact.id,
                        visible: Self::matches(query, contact),
                    })
                    .collect()
            }
        }
    }

    /// A contact matches if any comma-separated term is a case-insensitive
    /// substring of any field, or if the space-split query matches as a
    /// name phrase (one token against the last name, two tokens against
    /// last and first names). The two paths are independent and OR-ed.
    pub fn matches(query: &str, contact: &Contact) -> bool {
        term_match(query, contact) || name_phrase_match(query, contact)
    }
}

impl Default for SearchMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn term_match(query: &str, contact: &Contact) -> bool {
    let identity_key = contact.identity_key();
    let birthday = contact.birthday_display();

    query
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .any(|term| {
            contains_ci(identity_key.as_str(), term)
                || contains_ci(&contact.last_name, term)
                || contains_ci(&contact.first_name, term)
                || contains_ci(&contact.patronymic_name, term)
                || contact.phones.iter().any(|phone| contains_ci(phone, term))
                || contains_ci(&contact.email, term)
                || contains_ci(&birthday, term)
        })
}

fn name_phrase_match(query: &str, contact: &Contact) -> bool {
    let tokens: Vec<&str> = query.split_whitespace().collect();

    match tokens.as_slice() {
        [last] => contains_ci(&contact.last_name, last),
        [last, first] => {
            contains_ci(&contact.last_name, last) && contains_ci(&contact.first_name, first)
        }
        _ => false,
    }
}
