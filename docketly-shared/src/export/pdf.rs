/// A4 PDF documents
///
/// [`PdfDocument`] lays content out top to bottom with a cursor and starts a
/// new page whenever the next block would cross the bottom margin. Text uses
/// the standard Helvetica fonts, so anything outside printable ASCII is
/// substituted before it is written.
///
/// # Example
///
/// ```
/// use docketly_shared::export::pdf::{Align, Column, PdfDocument};
///
/// let mut doc = PdfDocument::new("Invoice BAZ-2026W42");
/// doc.heading("Tax Invoice");
/// doc.key_value("Contractor", "Barry Zucker");
/// doc.table(
///     &[Column::new("Date", 0.5), Column::new("Hours", 0.5).align(Align::Right)],
///     &[vec!["2026-10-12".to_string(), "8".to_string()]],
/// );
/// let bytes = doc.finish();
/// assert!(bytes.starts_with(b"%PDF-"));
/// ```

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;
const ROW_H: f32 = 18.0;
const FONT_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 16.0;
const TITLE_SIZE: f32 = 8.0;

// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.52;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// Horizontal alignment inside a table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Table column: title, share of the usable width, alignment
#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn new(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width,
            align: Align::Left,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Builder for a multi-page A4 document
pub struct PdfDocument {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    regular_font: Ref,
    bold_font: Ref,
    page_refs: Vec<Ref>,
    next_id: i32,
    current_content_id: Option<Ref>,
    content: Content,
    cursor_y: f32,
    title: String,
}

impl PdfDocument {
    /// Starts a document; `title` is printed small at the top of every page
    pub fn new(title: impl Into<String>) -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let regular_font = Ref::new(3);
        let bold_font = Ref::new(4);

        pdf.type1_font(regular_font).base_font(Name(b"Helvetica"));
        pdf.type1_font(bold_font).base_font(Name(b"Helvetica-Bold"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            regular_font,
            bold_font,
            page_refs: Vec::new(),
            next_id: 5,
            current_content_id: None,
            content: Content::new(),
            cursor_y: PAGE_H - MARGIN,
            title: sanitize(&title.into()),
        }
    }

    /// Number of pages started so far
    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    fn start_page(&mut self) {
        self.close_page();

        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
            .contents(content_id);
        {
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(REGULAR, self.regular_font);
            fonts.pair(BOLD, self.bold_font);
        }
        drop(page);

        let number = format!("Page {}", self.page_refs.len());
        draw_text(&mut self.content, REGULAR, TITLE_SIZE, MARGIN, PAGE_H - MARGIN + 20.0, &self.title);
        draw_text(
            &mut self.content,
            REGULAR,
            TITLE_SIZE,
            PAGE_W - MARGIN - text_width(&number, TITLE_SIZE),
            MARGIN - 25.0,
            &number,
        );

        self.current_content_id = Some(content_id);
        self.cursor_y = PAGE_H - MARGIN;
    }

    fn close_page(&mut self) {
        if let Some(id) = self.current_content_id.take() {
            let content = std::mem::replace(&mut self.content, Content::new());
            self.pdf.stream(id, &content.finish());
        }
    }

    /// Makes room for a block of `height` points, breaking the page if needed
    ///
    /// Returns the bottom edge of the reserved block.
    fn reserve(&mut self, height: f32) -> (f32, &mut Content) {
        if self.current_content_id.is_none() || self.cursor_y - height < MARGIN {
            self.start_page();
        }
        self.cursor_y -= height;

        (self.cursor_y, &mut self.content)
    }

    /// Large bold line
    pub fn heading(&mut self, text: &str) {
        let text = sanitize(text);
        let (y, content) = self.reserve(HEADING_SIZE + 8.0);
        draw_text(content, BOLD, HEADING_SIZE, MARGIN, y + 6.0, &text);
    }

    /// Plain line of text
    pub fn line(&mut self, text: &str) {
        self.styled_line(REGULAR, text);
    }

    /// Bold line of text
    pub fn bold_line(&mut self, text: &str) {
        self.styled_line(BOLD, text);
    }

    fn styled_line(&mut self, font: Name<'static>, text: &str) {
        let text = sanitize(text);
        let (y, content) = self.reserve(FONT_SIZE + 4.0);
        draw_text(content, font, FONT_SIZE, MARGIN, y + 3.0, &text);
    }

    /// `Label:` in bold followed by the value
    pub fn key_value(&mut self, label: &str, value: &str) {
        let label = format!("{}:", sanitize(label));
        let value = sanitize(value);
        let (y, content) = self.reserve(FONT_SIZE + 4.0);
        let y = y + 3.0;
        draw_text(content, BOLD, FONT_SIZE, MARGIN, y, &label);
        draw_text(content, REGULAR, FONT_SIZE, MARGIN + 120.0, y, &value);
    }

    /// Right-aligned `label  value` pair, used for invoice totals
    pub fn total_line(&mut self, label: &str, value: &str, bold: bool) {
        let label = sanitize(label);
        let value = sanitize(value);
        let font = if bold { BOLD } else { REGULAR };
        let (y, content) = self.reserve(FONT_SIZE + 6.0);
        let y = y + 4.0;
        let right = PAGE_W - MARGIN;
        draw_text(content, font, FONT_SIZE, right - 200.0, y, &label);
        draw_text(content, font, FONT_SIZE, right - 4.0 - text_width(&value, FONT_SIZE), y, &value);
    }

    /// Vertical gap
    pub fn spacer(&mut self, height: f32) {
        self.reserve(height);
    }

    /// Thin horizontal rule across the usable width
    pub fn rule(&mut self) {
        let (y, content) = self.reserve(6.0);
        let y = y + 3.0;
        content.save_state();
        content.set_stroke_rgb(0.6, 0.6, 0.6);
        content.move_to(MARGIN, y);
        content.line_to(PAGE_W - MARGIN, y);
        content.stroke();
        content.restore_state();
    }

    /// Ruled table; the header row repeats after a page break
    pub fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        let widths = column_widths(columns);
        let header: Vec<String> = columns.iter().map(|c| sanitize(&c.title)).collect();

        self.table_row(columns, &widths, &header, true, false);
        for (i, row) in rows.iter().enumerate() {
            if self.cursor_y - ROW_H < MARGIN {
                self.start_page();
                self.table_row(columns, &widths, &header, true, false);
            }
            let cells: Vec<String> = row.iter().map(|c| sanitize(c)).collect();
            self.table_row(columns, &widths, &cells, false, i % 2 == 1);
        }
    }

    fn table_row(
        &mut self,
        columns: &[Column],
        widths: &[f32],
        cells: &[String],
        header: bool,
        stripe: bool,
    ) {
        let (y, content) = self.reserve(ROW_H);
        let total: f32 = widths.iter().sum();

        if header || stripe {
            let shade = if header { 0.85 } else { 0.96 };
            content.save_state();
            content.set_fill_rgb(shade, shade, shade);
            content.rect(MARGIN, y, total, ROW_H);
            content.fill_nonzero();
            content.restore_state();
        }

        let font = if header { BOLD } else { REGULAR };
        let mut x = MARGIN;
        for (i, width) in widths.iter().enumerate() {
            let text = cells.get(i).map(String::as_str).unwrap_or("");
            let text = fit(text, *width - 8.0, FONT_SIZE);
            let tx = match columns.get(i).map(|c| c.align).unwrap_or_default() {
                Align::Left => x + 4.0,
                Align::Right => x + width - 4.0 - text_width(&text, FONT_SIZE),
            };
            draw_text(content, font, FONT_SIZE, tx, y + 5.0, &text);

            content.save_state();
            content.set_stroke_rgb(0.65, 0.65, 0.65);
            content.rect(x, y, *width, ROW_H);
            content.stroke();
            content.restore_state();

            x += width;
        }
    }

    /// Writes the page tree and catalog and returns the file bytes
    pub fn finish(mut self) -> Vec<u8> {
        if self.page_refs.is_empty() {
            self.start_page();
        }
        self.close_page();

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        let mut pages = self.pdf.pages(self.pages_id);
        pages.count(self.page_refs.len() as i32);
        pages.kids(self.page_refs.iter().copied());
        drop(pages);

        self.pdf.finish()
    }
}

fn draw_text(content: &mut Content, font: Name<'_>, size: f32, x: f32, y: f32, text: &str) {
    content.begin_text();
    content.set_font(font, size);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(text.as_bytes()));
    content.end_text();
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

/// Scales the relative column widths to the usable page width
fn column_widths(columns: &[Column]) -> Vec<f32> {
    let usable = PAGE_W - 2.0 * MARGIN;
    let sum: f32 = columns.iter().map(|c| c.width.max(0.0)).sum();

    if sum <= 0.0 {
        let even = usable / columns.len().max(1) as f32;
        return vec![even; columns.len()];
    }

    columns.iter().map(|c| c.width.max(0.0) / sum * usable).collect()
}

/// Truncates `text` with `...` so it fits in `max_width`
fn fit(text: &str, max_width: f32, size: f32) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }

    let max_chars = (max_width / (size * AVG_GLYPH_WIDTH)).floor() as usize;
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }

    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Maps text onto printable ASCII for the standard Type1 fonts
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\u{2022}' => '*',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\t' | '\n' | '\r' => ' ',
            _ => '?',
        })
        .collect()
}
