//! Page geometry for the order sheet.
//!
//! All coordinates are PDF points measured from the top-left corner of an A4
//! page. The renderer flips them into PDF space.

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

pub const ITEMS_PER_PAGE: usize = 12;

pub const HEADER_HEIGHT: f32 = 80.0;
pub const TABLE_HEAD_Y: f32 = 90.0;
pub const TABLE_HEAD_HEIGHT: f32 = 20.0;
pub const FIRST_ROW_Y: f32 = TABLE_HEAD_Y + TABLE_HEAD_HEIGHT;
pub const ROW_HEIGHT: f32 = 52.0;

pub const TABLE_X: f32 = 40.0;
pub const TABLE_WIDTH: f32 = 515.0;

/// Past this cursor position the summary box no longer fits.
pub const SUMMARY_BREAK_Y: f32 = 730.0;
pub const SUMMARY_GAP: f32 = 20.0;
pub const SUMMARY_X: f32 = 395.0;
pub const SUMMARY_WIDTH: f32 = 160.0;
pub const SUMMARY_HEIGHT: f32 = 45.0;

/// One table row placed on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlot {
    /// Index into the order's item list.
    pub item: usize,
    /// Top edge of the row.
    pub y: f32,
    pub shaded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub table_head: bool,
    pub rows: Vec<RowSlot>,
    /// Top edge of the grand-total box, on the page that carries it.
    pub summary_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Place `item_count` rows, twelve per page, followed by the summary box.
///
/// The summary follows the last row unless the cursor has passed
/// [`SUMMARY_BREAK_Y`], in which case it opens a fresh page that has a
/// header but no table head.
#[must_use]
pub fn plan(item_count: usize) -> DocumentLayout {
    let mut pages = Vec::with_capacity(item_count.div_ceil(ITEMS_PER_PAGE).max(1));
    let mut cursor = FIRST_ROW_Y;

    for start in (0..item_count).step_by(ITEMS_PER_PAGE) {
        let end = (start + ITEMS_PER_PAGE).min(item_count);
        cursor = FIRST_ROW_Y;
        let rows = (start..end)
            .map(|item| {
                let slot = RowSlot {
                    item,
                    y: cursor,
                    shaded: item % 2 == 1,
                };
                cursor += ROW_HEIGHT;
                slot
            })
            .collect();
        pages.push(PageLayout {
            table_head: true,
            rows,
            summary_y: None,
        });
    }

    match pages.last_mut() {
        Some(last) if cursor <= SUMMARY_BREAK_Y => last.summary_y = Some(cursor + SUMMARY_GAP),
        _ => pages.push(PageLayout {
            table_head: false,
            rows: Vec::new(),
            summary_y: Some(TABLE_HEAD_Y + SUMMARY_GAP),
        }),
    }

    DocumentLayout { pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_span_two_pages() {
        let layout = plan(13);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].rows.len(), 12);
        assert_eq!(layout.pages[1].rows.len(), 1);
        assert_eq!(layout.pages[1].rows[0].item, 12);
        assert_eq!(layout.pages[1].rows[0].y, FIRST_ROW_Y);
        assert_eq!(
            layout.pages[1].summary_y,
            Some(FIRST_ROW_Y + ROW_HEIGHT + SUMMARY_GAP)
        );
    }

    #[test]
    fn rows_are_spaced_and_zebra_shaded() {
        let layout = plan(3);
        let rows = &layout.pages[0].rows;
        assert_eq!(rows[0].y, 110.0);
        assert_eq!(rows[1].y, 162.0);
        assert_eq!(rows[2].y, 214.0);
        assert_eq!(
            rows.iter().map(|r| r.shaded).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn full_page_pushes_summary_to_its_own_page() {
        // 110 + 12 * 52 = 734, which is past the break line.
        let layout = plan(12);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].summary_y, None);
        let summary_page = &layout.pages[1];
        assert!(!summary_page.table_head);
        assert!(summary_page.rows.is_empty());
        assert_eq!(summary_page.summary_y, Some(TABLE_HEAD_Y + SUMMARY_GAP));
    }

    #[test]
    fn eleven_items_keep_summary_on_first_page() {
        let layout = plan(11);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(
            layout.pages[0].summary_y,
            Some(FIRST_ROW_Y + 11.0 * ROW_HEIGHT + SUMMARY_GAP)
        );
    }

    #[test]
    fn shading_follows_the_running_index_across_pages() {
        let layout = plan(14);
        assert!(!layout.pages[1].rows[0].shaded, "item 12 is even");
        assert!(layout.pages[1].rows[1].shaded, "item 13 is odd");
    }

    #[test]
    fn zero_items_still_yield_a_summary_page() {
        let layout = plan(0);
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].summary_y.is_some());
    }
}
