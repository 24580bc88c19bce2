//! Client-side search, sort and pagination over an in-memory list.

use crate::domain::model::UserEvaluation;
use std::cmp::Ordering;

pub const ITEMS_PER_PAGE: usize = 10;

/// A row that can be searched and sorted by named column.
pub trait TableRow {
    fn id(&self) -> &str;
    /// String rendering of a column, `None` when the row has no value.
    fn column(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct TableState {
    search_key: Option<String>,
    search: String,
    sort: Option<(String, SortDirection)>,
    page: usize,
}

#[derive(Debug)]
pub struct TablePage<'a, T> {
    pub items: Vec<&'a T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl TableState {
    pub fn new(search_key: Option<&str>) -> Self {
        Self {
            search_key: search_key.map(str::to_string),
            search: String::new(),
            sort: None,
            page: 1,
        }
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.page = 1;
    }

    /// Cycles a column through ascending, descending and unsorted. Picking
    /// another column starts it at ascending. Always returns to page 1.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = match self.sort.take() {
            Some((current, SortDirection::Asc)) if current == key => {
                Some((current, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == key => None,
            _ => Some((key.to_string(), SortDirection::Asc)),
        };
        self.page = 1;
    }

    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        self.sort.as_ref().map(|(k, d)| (k.as_str(), *d))
    }

    /// Pages are 1-based; out-of-range values are clamped when applied.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn apply<'a, T: TableRow>(&self, rows: &'a [T]) -> TablePage<'a, T> {
        let needle = self.search.to_lowercase();
        let mut filtered: Vec<&T> = match &self.search_key {
            Some(key) if !needle.is_empty() => rows
                .iter()
                .filter(|row| {
                    row.column(key)
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&needle)
                })
                .collect(),
            _ => rows.iter().collect(),
        };

        if let Some((key, direction)) = &self.sort {
            filtered.sort_by(|a, b| compare_columns(a.column(key), b.column(key), *direction));
        }

        let total_items = filtered.len();
        let total_pages = total_items.div_ceil(ITEMS_PER_PAGE);
        let page = self.page.clamp(1, total_pages.max(1));
        let items = filtered
            .into_iter()
            .skip((page - 1) * ITEMS_PER_PAGE)
            .take(ITEMS_PER_PAGE)
            .collect();

        TablePage {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}

/// Missing values sort last in both directions.
fn compare_columns(a: Option<String>, b: Option<String>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.to_lowercase().cmp(&b.to_lowercase());
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

impl TableRow for UserEvaluation {
    fn id(&self) -> &str {
        &self.evaluation.id
    }

    fn column(&self, key: &str) -> Option<String> {
        match key {
            "id" => Some(self.evaluation.id.clone()),
            "name" => Some(self.evaluation.name.clone()),
            "type" => Some(self.evaluation.evaluation_type.to_string()),
            // zero-padded so string order matches numeric order
            "order" => Some(format!("{:010}", self.evaluation.order)),
            "completed" => Some(self.completed.to_string()),
            "doneAt" => self.done_at.map(|d| d.to_rfc3339()),
            _ => None,
        }
    }
}
