//! Generic list table view model
//!
//! `DataTable<T>` holds one resource list and the view state around it:
//! global filter, single-column tri-state sort, pagination and row selection.
//! Columns are declarative (`Column<T>`): a key, a header, an accessor that
//! produces a typed `CellValue`, and an optional renderer for display text.
//!
//! The table never talks to the network. Pages hand it data with `set_data`
//! after each refresh; selection survives sort, filter and page changes and
//! is pruned when the ids it names disappear from the data.

pub mod columns;

use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::constants::pagination::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use crate::format::{format_date, MISSING};
use crate::schemas::Record;

pub const EMPTY_MESSAGE: &str = "No results found.";

/// Typed value of one cell, used for sorting and default rendering
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    List(Vec<String>),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn optional_date(date: Option<DateTime<Utc>>) -> Self {
        date.map(CellValue::Date).unwrap_or(CellValue::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Ascending order; empty cells sort after everything else
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Greater,
            (_, CellValue::Empty) => Ordering::Less,
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => compare_text(a, b),
            (a, b) => compare_text(&a.to_string(), &b.to_string()),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("Yes"),
            CellValue::Bool(false) => f.write_str("No"),
            CellValue::Date(date) => f.write_str(&format_date(Some(*date))),
            CellValue::List(items) if items.is_empty() => f.write_str(MISSING),
            CellValue::List(items) => f.write_str(&items.join(", ")),
            CellValue::Empty => f.write_str(MISSING),
        }
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
type Renderer = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// Declarative column descriptor
pub struct Column<T> {
    pub key: &'static str,
    pub header: String,
    pub sortable: bool,
    pub hidden: bool,
    accessor: Accessor<T>,
    renderer: Option<Renderer>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            header: self.header.clone(),
            sortable: self.sortable,
            hidden: self.hidden,
            accessor: self.accessor.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<T> Column<T> {
    pub fn new<F>(key: &'static str, header: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            key,
            header: header.into(),
            sortable: true,
            hidden: false,
            accessor: Arc::new(accessor),
            renderer: None,
        }
    }

    /// Replace the default `CellValue` rendering
    pub fn render_with<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn render(&self, row: &T) -> String {
        let value = self.value(row);
        match &self.renderer {
            Some(renderer) => renderer(&value),
            None => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: &'static str,
    pub direction: SortDirection,
}

pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    rows: Vec<T>,
    row_id: Arc<dyn Fn(&T) -> String + Send + Sync>,
    global_filter: String,
    sort: Option<SortState>,
    page_index: usize,
    page_size: usize,
    selectable: bool,
    selected: BTreeSet<String>,
}

impl<T: Record> DataTable<T> {
    /// Table keyed by the record id
    pub fn for_records(columns: Vec<Column<T>>) -> Self {
        Self::new(columns, |record: &T| record.id().to_string())
    }
}

impl<T> DataTable<T> {
    pub fn new<F>(columns: Vec<Column<T>>, row_id: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            columns,
            rows: Vec::new(),
            row_id: Arc::new(row_id),
            global_filter: String::new(),
            sort: None,
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            selectable: false,
            selected: BTreeSet::new(),
        }
    }

    pub fn with_selection(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    /// Replace the rows, dropping selected ids that no longer exist
    pub fn set_data(&mut self, rows: Vec<T>) {
        let ids: BTreeSet<String> = rows.iter().map(|row| (self.row_id)(row)).collect();
        let before = self.selected.len();
        self.selected.retain(|id| ids.contains(id));
        if self.selected.len() != before {
            debug!("Pruned {} stale selected row(s)", before - self.selected.len());
        }
        self.rows = rows;
        self.clamp_page();
    }

    pub fn data(&self) -> &[T] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column<T>> {
        self.columns.iter().filter(|column| !column.hidden)
    }

    pub fn set_column_hidden(&mut self, key: &str, hidden: bool) -> bool {
        match self.columns.iter_mut().find(|column| column.key == key) {
            Some(column) => {
                column.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn global_filter(&self) -> &str {
        &self.global_filter
    }

    /// Changing the filter always returns to the first page
    pub fn set_global_filter(&mut self, filter: &str) {
        self.global_filter = filter.to_string();
        self.page_index = 0;
    }

    pub fn reset_filter(&mut self) {
        self.set_global_filter("");
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Header click: none → ascending → descending → none.
    /// A different column starts over at ascending.
    pub fn toggle_sort(&mut self, key: &str) -> Option<SortState> {
        let column = match self.columns.iter().find(|c| c.key == key && c.sortable) {
            Some(column) => column.key,
            None => return self.sort,
        };

        self.sort = match self.sort {
            Some(SortState {
                column: current,
                direction,
            }) if current == column => match direction {
                SortDirection::Ascending => Some(SortState {
                    column,
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortState {
                column,
                direction: SortDirection::Ascending,
            }),
        };
        self.sort
    }

    /// Rows after filtering and sorting, across all pages
    pub fn filtered_rows(&self) -> Vec<&T> {
        let needle = self.global_filter.trim().to_lowercase();
        let mut rows: Vec<&T> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || self.row_matches(row, &needle))
            .collect();

        if let Some(sort) = self.sort {
            if let Some(column) = self.columns.iter().find(|c| c.key == sort.column) {
                rows.sort_by(|a, b| {
                    let (left, right) = (column.value(a), column.value(b));
                    match (sort.direction, left.is_empty() || right.is_empty()) {
                        (SortDirection::Descending, false) => right.compare(&left),
                        _ => left.compare(&right),
                    }
                });
            }
        }
        rows
    }

    fn row_matches(&self, row: &T, needle: &str) -> bool {
        self.visible_columns()
            .any(|column| column.render(row).to_lowercase().contains(needle))
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_rows().len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Any positive size is accepted; zero is rejected and leaves the view as is
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if page_size == 0 {
            return false;
        }
        self.page_size = page_size;
        self.page_index = 0;
        true
    }

    /// Sizes offered by the page-size picker, with a custom current size merged in
    pub fn page_size_options(&self) -> Vec<usize> {
        let mut options = PAGE_SIZE_OPTIONS.to_vec();
        if !options.contains(&self.page_size) {
            options.push(self.page_size);
            options.sort_unstable();
        }
        options
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size).max(1)
    }

    pub fn set_page(&mut self, index: usize) {
        self.page_index = index.min(self.page_count() - 1);
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page_index + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page_index.saturating_sub(1));
    }

    fn clamp_page(&mut self) {
        let last = self.page_count() - 1;
        if self.page_index > last {
            self.page_index = last;
        }
    }

    /// Rows on the current page
    pub fn page_rows(&self) -> Vec<&T> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page_index * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Returns the new selection state of the row; unknown ids are ignored
    pub fn toggle_row(&mut self, id: &str) -> bool {
        let selected = !self.is_selected(id);
        self.select_row(id, selected);
        self.is_selected(id)
    }

    pub fn select_row(&mut self, id: &str, selected: bool) {
        if !self.selectable {
            return;
        }
        if selected {
            if self.rows.iter().any(|row| (self.row_id)(row) == id) {
                self.selected.insert(id.to_string());
            }
        } else {
            self.selected.remove(id);
        }
    }

    /// Header checkbox: select every row on the page, or clear them if all are selected
    pub fn toggle_page_selection(&mut self) {
        if !self.selectable {
            return;
        }
        let ids: Vec<String> = self
            .page_rows()
            .into_iter()
            .map(|row| (self.row_id)(row))
            .collect();
        let all_selected = !ids.is_empty() && ids.iter().all(|id| self.selected.contains(id));
        for id in ids {
            if all_selected {
                self.selected.remove(&id);
            } else {
                self.selected.insert(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn selected_rows(&self) -> Vec<&T> {
        self.rows
            .iter()
            .filter(|row| self.selected.contains(&(self.row_id)(row)))
            .collect()
    }

    /// Current page as an aligned text table with a pagination footer
    pub fn render_text(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);

        let mut header: Vec<String> = Vec::new();
        if self.selectable {
            header.push(String::new());
        }
        for column in self.visible_columns() {
            let marker = match self.sort {
                Some(sort) if sort.column == column.key => match sort.direction {
                    SortDirection::Ascending => " ↑",
                    SortDirection::Descending => " ↓",
                },
                _ => "",
            };
            header.push(format!("{}{}", column.header, marker));
        }
        table.set_header(header);

        let page = self.page_rows();
        if page.is_empty() {
            return format!("{}\n{}", table, EMPTY_MESSAGE);
        }

        for row in page {
            let mut cells: Vec<String> = Vec::new();
            if self.selectable {
                let marker = if self.is_selected(&(self.row_id)(row)) {
                    "[x]"
                } else {
                    "[ ]"
                };
                cells.push(marker.to_string());
            }
            cells.extend(self.visible_columns().map(|column| column.render(row)));
            table.add_row(cells);
        }

        let mut footer = format!(
            "Page {} of {} ({} row(s))",
            self.page_index + 1,
            self.page_count(),
            self.filtered_count()
        );
        if self.selectable {
            footer.push_str(&format!(
                "\n{} of {} row(s) selected.",
                self.selected.len(),
                self.filtered_count()
            ));
        }
        format!("{}\n{}", table, footer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Host {
        id: String,
        name: String,
        port: u16,
        online: bool,
    }

    fn host(id: usize, name: &str, port: u16) -> Host {
        Host {
            id: format!("h{}", id),
            name: name.to_string(),
            port,
            online: id % 2 == 0,
        }
    }

    fn table(rows: Vec<Host>) -> DataTable<Host> {
        let columns = vec![
            Column::new("name", "Name", |h: &Host| CellValue::text(&h.name)),
            Column::new("port", "Port", |h: &Host| CellValue::Number(h.port as f64)),
            Column::new("online", "Online", |h: &Host| CellValue::Bool(h.online)).unsortable(),
        ];
        let mut table = DataTable::new(columns, |h: &Host| h.id.clone()).with_selection();
        table.set_data(rows);
        table
    }

    fn names(rows: Vec<&Host>) -> Vec<String> {
        rows.into_iter().map(|h| h.name.clone()).collect()
    }

    #[test]
    fn test_sort_cycles_through_three_states() {
        let mut table = table(vec![host(1, "beta", 80), host(2, "Alpha", 443), host(3, "gamma", 22)]);

        let state = table.toggle_sort("name").unwrap();
        assert_eq!(state.direction, SortDirection::Ascending);
        assert_eq!(names(table.filtered_rows()), vec!["Alpha", "beta", "gamma"]);

        table.toggle_sort("name");
        assert_eq!(names(table.filtered_rows()), vec!["gamma", "beta", "Alpha"]);

        assert!(table.toggle_sort("name").is_none());
        assert_eq!(names(table.filtered_rows()), vec!["beta", "Alpha", "gamma"]);

        table.toggle_sort("port");
        table.toggle_sort("name");
        assert_eq!(
            table.sort_state(),
            Some(SortState {
                column: "name",
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn test_unsortable_column_is_ignored() {
        let mut table = table(vec![host(1, "a", 1)]);
        assert!(table.toggle_sort("online").is_none());
        assert!(table.toggle_sort("missing").is_none());
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let mut table = table(vec![host(1, "a", 8080), host(2, "b", 443), host(3, "c", 80)]);
        table.toggle_sort("port");
        assert_eq!(names(table.filtered_rows()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_filter_resets_page_and_matches_rendered_text() {
        let rows = (0..25).map(|i| host(i, &format!("node-{:02}", i), 8000)).collect();
        let mut table = table(rows);
        table.set_page(2);
        assert_eq!(table.page_index(), 2);

        table.set_global_filter("NODE-1");
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.filtered_count(), 10);

        table.set_global_filter("yes");
        assert_eq!(table.filtered_count(), 13);

        table.set_column_hidden("online", true);
        assert_eq!(table.filtered_count(), 0);
    }

    #[test]
    fn test_pagination_is_clamped() {
        let rows = (0..25).map(|i| host(i, &format!("n{}", i), 1)).collect();
        let mut table = table(rows);

        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page_rows().len(), 10);
        assert!(!table.can_previous_page());

        table.set_page(7);
        assert_eq!(table.page_index(), 2);
        assert_eq!(table.page_rows().len(), 5);
        assert!(!table.can_next_page());

        assert!(table.set_page_size(25));
        assert_eq!(table.page_count(), 1);
        assert!(!table.set_page_size(0));
        assert_eq!(table.page_size(), 25);

        table.set_data(Vec::new());
        assert_eq!(table.page_count(), 1);
        assert_eq!(table.page_index(), 0);
    }

    #[test]
    fn test_custom_page_size() {
        let rows = (0..25).map(|i| host(i, &format!("n{}", i), 1)).collect();
        let table = table(rows).with_page_size(20);

        assert_eq!(table.page_size(), 20);
        assert_eq!(table.page_count(), 2);
        assert_eq!(table.page_rows().len(), 20);
        assert_eq!(table.page_size_options(), vec![10, 20, 25, 50, 100]);

        let mut table = table.with_page_size(0);
        assert_eq!(table.page_size(), 20);
        table.set_page(1);
        assert_eq!(table.page_rows().len(), 5);
    }

    #[test]
    fn test_selection_survives_view_changes_and_is_pruned() {
        let rows: Vec<Host> = (0..15).map(|i| host(i, &format!("n{}", i), 1)).collect();
        let mut table = table(rows.clone());

        assert!(table.toggle_row("h1"));
        assert!(table.toggle_row("h12"));
        assert!(!table.toggle_row("missing"));

        table.toggle_sort("name");
        table.set_global_filter("n1");
        table.next_page();
        assert_eq!(table.selected_ids(), vec!["h1", "h12"]);

        table.set_data(rows.into_iter().filter(|h| h.id != "h12").collect());
        assert_eq!(table.selected_ids(), vec!["h1"]);
        assert_eq!(table.selected_rows().len(), 1);
    }

    #[test]
    fn test_toggle_page_selection() {
        let rows = (0..12).map(|i| host(i, &format!("n{}", i), 1)).collect();
        let mut table = table(rows);

        table.toggle_page_selection();
        assert_eq!(table.selected_ids().len(), 10);
        table.toggle_page_selection();
        assert!(table.selected_ids().is_empty());
    }

    #[test]
    fn test_render_text() {
        let mut table = table(vec![host(1, "edge-1", 8080)]);
        table.toggle_row("h1");
        let text = table.render_text();
        assert!(text.contains("Name"));
        assert!(text.contains("edge-1"));
        assert!(text.contains("[x]"));
        assert!(text.contains("Page 1 of 1"));
        assert!(text.contains("1 of 1 row(s) selected."));

        table.set_global_filter("nothing matches");
        assert!(table.render_text().ends_with(EMPTY_MESSAGE));
    }
}
