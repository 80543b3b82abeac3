//! Table extraction: turns a list page into servant records
//!
//! One extractor serves every table variant. What it reads is declared by a
//! [`RecordShape`] and where it reads it from by a [`ColumnLayout`]; the
//! per-cell heuristics live in [`super::rules`].

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::CrawlerConfig;
use super::error::{ParseError, RowError};
use super::planner::Listing;
use super::rules;
use crate::servant::ServantRecord;

/// Minimum cells a data row must have
pub const MIN_CELLS: usize = 3;

/// Fields produced for each record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordShape {
    /// id and name
    #[default]
    Minimal,
    /// id, name, class and rarity
    Full,
}

/// Where a row's identifier comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Parsed from the given column
    Column(usize),
    /// Numbered in document order, starting at the page's first id
    Sequential,
}

/// Column positions of the fields in a table row, and where those tables live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub id: IdSource,
    pub name: usize,
    pub class: usize,
    pub rarity: usize,

    /// Which wiki pages carry tables in this layout
    pub listing: Listing,

    /// Read every matching table on a page instead of only the first
    pub every_table: bool,

    /// Skip rows whose class cell is empty
    pub class_required: bool,
}

impl ColumnLayout {
    /// The `Servant_List_by_ID` pages
    pub const fn by_id() -> Self {
        Self {
            id: IdSource::Column(0),
            name: 1,
            class: 2,
            rarity: 3,
            listing: Listing::ById,
            every_table: false,
            class_required: false,
        }
    }

    /// The older single `Servant_List` page
    ///
    /// Rarity comes first and there is no id column. The page splits servants
    /// over several tables; numbering runs on across them and rows without a
    /// class are dropped.
    pub const fn servant_list() -> Self {
        Self {
            id: IdSource::Sequential,
            name: 1,
            class: 2,
            rarity: 0,
            listing: Listing::ServantList,
            every_table: true,
            class_required: true,
        }
    }

    /// Cells a row needs before it is considered at all
    ///
    /// Rarity stays optional, class too unless the layout requires it.
    fn required_cells(&self) -> usize {
        let id_cells = match self.id {
            IdSource::Column(column) => column + 1,
            IdSource::Sequential => 0,
        };
        let class_cells = if self.class_required { self.class + 1 } else { 0 };
        MIN_CELLS
            .max(id_cells)
            .max(self.name + 1)
            .max(class_cells)
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::by_id()
    }
}

/// Records read from one page plus the rows that were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRows {
    pub records: Vec<ServantRecord>,
    pub rejected: Vec<RowError>,
}

/// Reads servant tables according to a declared shape and layout
#[derive(Debug, Clone)]
pub struct TableExtractor {
    table_selector: Selector,
    table_selector_source: String,
    row_selector: Selector,
    shape: RecordShape,
    layout: ColumnLayout,
}

fn parse_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl TableExtractor {
    pub fn new(
        table_selector: &str,
        shape: RecordShape,
        layout: ColumnLayout,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            table_selector: parse_selector(table_selector)?,
            table_selector_source: table_selector.to_string(),
            row_selector: parse_selector("tr")?,
            shape,
            layout,
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ParseError> {
        Self::new(&config.table_selector, config.shape, config.layout)
    }

    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    /// Rows belonging to `table` itself, not to tables nested in its cells
    fn own_rows<'a>(
        &'a self,
        table: ElementRef<'a>,
    ) -> impl Iterator<Item = ElementRef<'a>> {
        table.select(&self.row_selector).filter(move |row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|element| element.value().name() == "table")
                .is_some_and(|owner| owner.id() == table.id())
        })
    }

    /// Records on the page with ids up to `expected_max_id`, in document order
    ///
    /// A page without a data table yields nothing; the cause is logged.
    pub fn extract(&self, markup: &str, expected_max_id: u32) -> Vec<ServantRecord> {
        match self.try_extract(markup, 1, expected_max_id) {
            Ok(rows) => rows.records,
            Err(e) => {
                warn!("Extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Structured extraction for a page whose window starts at `first_id`
    ///
    /// `first_id` only matters for layouts with sequential identifiers. Row
    /// numbers in rejections count from the header of their own table.
    pub fn try_extract(
        &self,
        markup: &str,
        first_id: u32,
        expected_max_id: u32,
    ) -> Result<PageRows, ParseError> {
        let document = Html::parse_document(markup);

        let limit = if self.layout.every_table { usize::MAX } else { 1 };
        let tables: Vec<ElementRef<'_>> = document
            .select(&self.table_selector)
            .take(limit)
            .collect();
        if tables.is_empty() {
            return Err(ParseError::MissingTable {
                selector: self.table_selector_source.clone(),
            });
        }

        let mut page = PageRows::default();
        let mut next_id = first_id;

        for table in tables {
            // first row is the header
            for (row_number, row) in self.own_rows(table).enumerate().skip(1) {
                let cells: Vec<ElementRef<'_>> = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .collect();

                match self.read_row(row_number, &cells, next_id, expected_max_id) {
                    Ok(record) => {
                        next_id = record.id.saturating_add(1);
                        page.records.push(record);
                    }
                    Err(e) => {
                        debug!("Skipping {}", e);
                        page.rejected.push(e);
                    }
                }
            }
        }

        debug!(
            "Extracted {} records, skipped {} rows",
            page.records.len(),
            page.rejected.len()
        );
        Ok(page)
    }

    fn read_row(
        &self,
        row: usize,
        cells: &[ElementRef<'_>],
        sequential_id: u32,
        expected_max_id: u32,
    ) -> Result<ServantRecord, RowError> {
        let required = self.layout.required_cells();
        if cells.len() < required {
            return Err(RowError::TooFewCells {
                row,
                found: cells.len(),
                required,
            });
        }

        let id = match self.layout.id {
            IdSource::Column(column) => rules::parse_id(cells[column])
                .map_err(|value| RowError::InvalidId { row, value })?,
            IdSource::Sequential => sequential_id,
        };

        if id > expected_max_id {
            return Err(RowError::BeyondRange {
                row,
                id,
                max_id: expected_max_id,
            });
        }

        let name = rules::link_or_cell_text(cells[self.layout.name])
            .ok_or(RowError::EmptyName { row })?;

        let class = cells
            .get(self.layout.class)
            .and_then(|cell| rules::link_or_cell_text(*cell));
        if self.layout.class_required && class.is_none() {
            return Err(RowError::EmptyClass { row });
        }

        let mut record = ServantRecord::new(id, name);
        if self.shape == RecordShape::Full {
            record.class = class;
            record.rarity = cells.get(self.layout.rarity).map(|cell| rules::rarity(*cell));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECTOR: &str = "table.wikitable.sortable";

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="navbox"><tr><td>nav</td></tr></table>
            <table class="wikitable sortable">
              <tr><th>ID</th><th>Name</th><th>Class</th><th>Rarity</th></tr>
              {}
            </table></body></html>"#,
            rows
        )
    }

    fn minimal() -> TableExtractor {
        TableExtractor::new(SELECTOR, RecordShape::Minimal, ColumnLayout::by_id()).unwrap()
    }

    fn full() -> TableExtractor {
        TableExtractor::new(SELECTOR, RecordShape::Full, ColumnLayout::by_id()).unwrap()
    }

    #[test]
    fn test_ids_in_document_order() {
        let markup = page(
            r#"<tr><td>3</td><td><a href="/wiki/C">Cu Chulainn</a></td><td>Lancer</td></tr>
               <tr><td>1</td><td><a href="/wiki/M">Mash</a></td><td>Shielder</td></tr>
               <tr><td>2</td><td>Altria</td><td>Saber</td></tr>"#,
        );
        let records = minimal().extract(&markup, 428);

        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(records[0].name, "Cu Chulainn");
        assert_eq!(records[2].name, "Altria");
        assert!(records.iter().all(|r| r.class.is_none() && r.rarity.is_none()));
    }

    #[test]
    fn test_full_shape_reads_class_and_rarity() {
        let markup = page(
            r#"<tr><td>2</td><td><a href="/wiki/A">Altria Pendragon</a></td>
               <td><a href="/wiki/Saber">Saber</a></td><td data-sort-value="5">★★★★★</td></tr>
               <tr><td>3</td><td>Altria (Alter)</td><td>Saber</td></tr>"#,
        );
        let records = full().extract(&markup, 428);

        assert_eq!(
            records[0],
            ServantRecord::new(2, "Altria Pendragon")
                .with_class("Saber")
                .with_rarity(5)
        );
        // missing rarity cell leaves the field unset
        assert_eq!(records[1].class.as_deref(), Some("Saber"));
        assert_eq!(records[1].rarity, None);
    }

    #[test]
    fn test_icon_rarity_with_id_from_context() {
        let markup = page(
            r#"<tr><td><img src="s.png"><img src="s.png"><img src="s.png"></td>
               <td><a href="/wiki/Artoria">Artoria</a></td>
               <td><a href="/wiki/Saber">Saber</a></td></tr>"#,
        );
        let extractor =
            TableExtractor::new(SELECTOR, RecordShape::Full, ColumnLayout::servant_list()).unwrap();
        let rows = extractor.try_extract(&markup, 101, 428).unwrap();

        assert_eq!(
            rows.records,
            vec![
                ServantRecord::new(101, "Artoria")
                    .with_class("Saber")
                    .with_rarity(3)
            ]
        );
    }

    #[test]
    fn test_two_cell_row_skipped() {
        let markup = page(
            r#"<tr><td>1</td><td>Mash</td></tr>
               <tr><td>2</td><td>Altria</td><td>Saber</td></tr>"#,
        );
        let rows = full().try_extract(&markup, 1, 428).unwrap();

        assert_eq!(rows.records.len(), 1);
        assert_eq!(rows.records[0].id, 2);
        assert_eq!(
            rows.rejected,
            vec![RowError::TooFewCells {
                row: 1,
                found: 2,
                required: 3
            }]
        );
    }

    #[test]
    fn test_non_integer_id_does_not_abort_page() {
        let markup = page(
            r#"<tr><td>abc</td><td>Junk</td><td>Saber</td></tr>
               <tr><td>7</td><td>Gilgamesh</td><td>Archer</td></tr>
               <tr><td>8</td><td>Robin Hood</td><td>Archer</td></tr>"#,
        );
        let rows = minimal().try_extract(&markup, 1, 428).unwrap();

        let ids: Vec<u32> = rows.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert!(matches!(
            rows.rejected[0],
            RowError::InvalidId { ref value, .. } if value == "abc"
        ));
    }

    #[test]
    fn test_rows_beyond_max_dropped() {
        let markup = page(
            r#"<tr><td>428</td><td>Last</td><td>Ruler</td></tr>
               <tr><td>429</td><td>Unreleased</td><td>Ruler</td></tr>"#,
        );
        let rows = minimal().try_extract(&markup, 401, 428).unwrap();

        assert_eq!(rows.records.len(), 1);
        assert!(matches!(
            rows.rejected[0],
            RowError::BeyondRange { id: 429, max_id: 428, .. }
        ));
    }

    #[test]
    fn test_empty_name_skipped() {
        let markup = page(r#"<tr><td>5</td><td> </td><td>Caster</td></tr>"#);
        let rows = minimal().try_extract(&markup, 1, 428).unwrap();

        assert!(rows.records.is_empty());
        assert_eq!(rows.rejected, vec![RowError::EmptyName { row: 1 }]);
    }

    #[test]
    fn test_missing_table_is_soft() {
        let markup = "<html><body><p>Rate limited</p></body></html>";
        assert!(minimal().extract(markup, 428).is_empty());
        assert!(matches!(
            minimal().try_extract(markup, 1, 428),
            Err(ParseError::MissingTable { .. })
        ));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = TableExtractor::new("table[", RecordShape::Minimal, ColumnLayout::by_id());
        assert!(matches!(result, Err(ParseError::Selector { .. })));
    }

    fn servant_list() -> TableExtractor {
        TableExtractor::new(SELECTOR, RecordShape::Full, ColumnLayout::servant_list()).unwrap()
    }

    #[test]
    fn test_servant_list_numbers_across_tables() {
        let markup = r#"<html><body>
            <h2>Saber</h2>
            <table class="wikitable sortable">
              <tr><th>Rarity</th><th>Name</th><th>Class</th></tr>
              <tr><td data-sort-value="5"></td><td><a href="/wiki/Altria">Altria</a></td><td>Saber</td></tr>
            </table>
            <h2>Archer</h2>
            <table class="wikitable sortable">
              <tr><th>Rarity</th><th>Name</th><th>Class</th></tr>
              <tr><td data-sort-value="4"></td><td><a href="/wiki/Emiya">Emiya</a></td><td>Archer</td></tr>
            </table></body></html>"#;
        let rows = servant_list().try_extract(markup, 1, 428).unwrap();

        assert_eq!(
            rows.records,
            vec![
                ServantRecord::new(1, "Altria").with_class("Saber").with_rarity(5),
                ServantRecord::new(2, "Emiya").with_class("Archer").with_rarity(4),
            ]
        );
        assert!(rows.rejected.is_empty());
    }

    #[test]
    fn test_by_id_reads_first_table_only() {
        let markup = format!(
            r#"{}<table class="wikitable sortable">
              <tr><th>ID</th><th>Name</th><th>Class</th></tr>
              <tr><td>9</td><td>Elsewhere</td><td>Rider</td></tr>
            </table>"#,
            page(r#"<tr><td>1</td><td>Mash</td><td>Shielder</td></tr>"#)
        );
        let ids: Vec<u32> = minimal().extract(&markup, 428).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_servant_list_requires_class() {
        let markup = page(
            r#"<tr><td data-sort-value="3"></td><td>Classless</td><td> </td></tr>
               <tr><td data-sort-value="3"></td><td>Short</td></tr>
               <tr><td data-sort-value="4"></td><td>Medea</td><td>Caster</td></tr>"#,
        );
        let rows = servant_list().try_extract(&markup, 1, 428).unwrap();

        // rejected rows do not consume an identifier
        assert_eq!(
            rows.records,
            vec![ServantRecord::new(1, "Medea").with_class("Caster").with_rarity(4)]
        );
        assert_eq!(
            rows.rejected,
            vec![
                RowError::EmptyClass { row: 1 },
                RowError::TooFewCells {
                    row: 2,
                    found: 2,
                    required: 3
                },
            ]
        );
    }

    #[test]
    fn test_nested_table_rows_ignored() {
        let markup = page(
            r#"<tr><td>1</td><td>Mash</td>
                 <td><table><tr><td>inner</td></tr><tr><td>a</td><td>b</td></tr></table></td></tr>
               <tr><td>2</td><td>Altria</td><td>Saber</td></tr>"#,
        );
        let rows = minimal().try_extract(&markup, 1, 428).unwrap();

        let ids: Vec<u32> = rows.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(rows.rejected.is_empty());
    }
}
