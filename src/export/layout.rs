//! Fixed-geometry page layout for the paginated report export.
//!
//! The engine turns a pruned [`ReportResponse`] into page-relative draw instructions for a
//! renderer collaborator. Coordinates are points, `x` grows rightwards from the page's left
//! edge and `y` grows downwards from its top edge; a text run's `y` is the top of its line.
//!
//! Column boxes never overlap and no description line is wider than its column: text is
//! wrapped to the column width and lines that still overflow (long unbreakable tokens) are
//! truncated with an ellipsis.

use serde::{Deserialize, Serialize};
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use super::format::MoneyFormat;
use crate::report::{GroupBody, Money, ReportGroup, ReportResponse, ReportRow, ReportTotals};

pub const ELLIPSIS: &str = "…";
const OVERFLOW_MARK: &str = "#";

/// Measures rendered text width in points
pub trait TextMeasure {
    fn width(&self, text: &str) -> f64;
}

/// Fixed-pitch measure: every terminal column is `advance` points wide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub advance: f64,
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str) -> f64 {
        UnicodeWidthStr::width(text) as f64 * self.advance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub font_size: f64,
    pub line_height: f64,
    /// Glyph advance as a fraction of the font size
    pub glyph_advance: f64,
    pub id_column_width: f64,
    /// Space between the identifier column and the description column
    pub description_gap: f64,
    /// Space reserved between the description column and the value columns
    pub value_zone_gap: f64,
    pub value_column_width: f64,
    pub value_column_gap: f64,
    /// Below this the description column is considered illegible
    pub min_description_width: f64,
    /// Horizontal indentation per tree level for group headers
    pub indent: f64,
    /// Vertical space above and below rule lines
    pub rule_padding: f64,
    pub footer_height: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4 portrait
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin_top: 40.0,
            margin_bottom: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,
            font_size: 9.0,
            line_height: 12.0,
            glyph_advance: 0.6,
            id_column_width: 60.0,
            description_gap: 8.0,
            value_zone_gap: 12.0,
            value_column_width: 85.0,
            value_column_gap: 10.0,
            min_description_width: 120.0,
            indent: 12.0,
            rule_padding: 4.0,
            footer_height: 20.0,
        }
    }
}

impl PageGeometry {
    pub fn measure(&self) -> MonospaceMeasure {
        MonospaceMeasure {
            advance: self.font_size * self.glyph_advance,
        }
    }

    /// Lowest `y` a body line may reach
    fn body_bottom(&self) -> f64 {
        self.page_height - self.margin_bottom - self.footer_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnBox {
    pub x_start: f64,
    pub x_end: f64,
}

impl ColumnBox {
    fn new(x_start: f64, x_end: f64) -> Self {
        Self { x_start, x_end }
    }

    pub fn width(&self) -> f64 {
        self.x_end - self.x_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnLayout {
    pub ticket: ColumnBox,
    pub description: ColumnBox,
    pub freight: ColumnBox,
    pub service: ColumnBox,
}

impl ColumnLayout {
    /// Derive column boxes from the page geometry. The description column takes what is
    /// left between the identifier column and the value zone, never less than zero.
    pub fn compute(geometry: &PageGeometry) -> (Self, Option<LayoutWarning>) {
        let ticket = ColumnBox::new(
            geometry.margin_left,
            geometry.margin_left + geometry.id_column_width,
        );
        let service_end = geometry.page_width - geometry.margin_right;
        let service = ColumnBox::new(service_end - geometry.value_column_width, service_end);
        let freight_end = service.x_start - geometry.value_column_gap;
        let freight = ColumnBox::new(freight_end - geometry.value_column_width, freight_end);

        let description_start = ticket.x_end + geometry.description_gap;
        let width = (freight.x_start - geometry.value_zone_gap - description_start).max(0.0);
        let description = ColumnBox::new(description_start, description_start + width);

        let warning = (width < geometry.min_description_width).then(|| {
            LayoutWarning::NarrowDescription {
                width,
                minimum: geometry.min_description_width,
            }
        });

        (
            Self {
                ticket,
                description,
                freight,
                service,
            },
            warning,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    NarrowDescription { width: f64, minimum: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        bold: bool,
    },
    Rule {
        x_start: f64,
        x_end: f64,
        y: f64,
    },
    PageBreak {
        page: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub page_count: usize,
    pub columns: ColumnLayout,
    pub pages: Vec<PageLayout>,
    pub warnings: Vec<LayoutWarning>,
}

impl DocumentLayout {
    /// All pages as one stream, with a page break before every page after the first
    pub fn instructions(&self) -> Vec<DrawOp> {
        let mut ops = Vec::new();
        for page in &self.pages {
            if page.number > 1 {
                ops.push(DrawOp::PageBreak { page: page.number });
            }
            ops.extend(page.ops.iter().cloned());
        }
        ops
    }
}

/// Lay out a report with the geometry's monospace measure
pub fn layout(
    report: &ReportResponse,
    geometry: &PageGeometry,
    format: &MoneyFormat,
) -> DocumentLayout {
    layout_with(report, geometry, format, &geometry.measure())
}

pub fn layout_with<M: TextMeasure + ?Sized>(
    report: &ReportResponse,
    geometry: &PageGeometry,
    format: &MoneyFormat,
    measure: &M,
) -> DocumentLayout {
    let (columns, warning) = ColumnLayout::compute(geometry);
    if let Some(LayoutWarning::NarrowDescription { width, minimum }) = &warning {
        warn!(
            width = *width,
            minimum = *minimum,
            "description column below legible width, layout degraded"
        );
    }

    let mut engine = Engine {
        geometry,
        format,
        measure,
        columns,
        pages: Vec::new(),
        ops: Vec::new(),
        cursor: geometry.margin_top,
        page: 1,
        fresh: false,
    };

    engine.title_block(report);
    engine.column_header();
    for group in &report.groups {
        engine.group(group, 0);
    }
    engine.grand_total(&report.total);

    let pages = engine.finish();
    DocumentLayout {
        page_count: pages.len(),
        columns,
        pages,
        warnings: warning.into_iter().collect(),
    }
}

/// Wrap `text` to `width`, truncating any line that still does not fit
pub fn wrap_text<M: TextMeasure + ?Sized>(text: &str, width: f64, measure: &M) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.width(&candidate) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .map(|line| fit_text(&line, width, measure))
        .collect()
}

/// Drop trailing characters and append an ellipsis until `text` fits in `width`
pub fn fit_text<M: TextMeasure + ?Sized>(text: &str, width: f64, measure: &M) -> String {
    if measure.width(text) <= width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let truncated = |kept: usize| {
        let prefix: String = chars[..kept].iter().collect();
        format!("{}{ELLIPSIS}", prefix.trim_end())
    };
    if chars.is_empty() || measure.width(&truncated(0)) > width {
        return String::new();
    }

    // longest prefix whose truncated form still fits; width grows with the prefix
    let (mut low, mut high) = (0, chars.len() - 1);
    while low < high {
        let mid = (low + high + 1) / 2;
        if measure.width(&truncated(mid)) <= width {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    truncated(low)
}

struct Engine<'a, M: TextMeasure + ?Sized> {
    geometry: &'a PageGeometry,
    format: &'a MoneyFormat,
    measure: &'a M,
    columns: ColumnLayout,
    pages: Vec<PageLayout>,
    ops: Vec<DrawOp>,
    cursor: f64,
    page: usize,
    /// Nothing drawn since the column header of a new page
    fresh: bool,
}

impl<M: TextMeasure + ?Sized> Engine<'_, M> {
    fn line_height(&self) -> f64 {
        self.geometry.line_height
    }

    fn text(&mut self, x: f64, y: f64, text: impl Into<String>, bold: bool) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text { x, y, text, bold });
    }

    fn right_text(&mut self, column: ColumnBox, y: f64, text: &str, bold: bool) {
        let x = column.x_end - self.measure.width(text);
        self.text(x, y, text, bold);
    }

    fn rule(&mut self, y: f64) {
        self.ops.push(DrawOp::Rule {
            x_start: self.columns.ticket.x_start,
            x_end: self.columns.service.x_end,
            y,
        });
    }

    /// Start a new page unless `height` still fits below the cursor
    fn ensure_space(&mut self, height: f64) {
        if self.cursor + height > self.geometry.body_bottom() && !self.fresh {
            self.new_page();
        }
        self.fresh = false;
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout {
            number: self.page,
            ops: std::mem::take(&mut self.ops),
        });
        self.page += 1;
        self.cursor = self.geometry.margin_top;
        self.column_header();
    }

    fn title_block(&mut self, report: &ReportResponse) {
        let x = self.columns.ticket.x_start;
        let width = self.columns.service.x_end - x;
        let lines = [
            (report.title.as_str(), true),
            (report.period_label.as_str(), false),
            (report.status_label.as_str(), false),
        ];
        for (line, bold) in lines {
            let fitted = fit_text(line, width, self.measure);
            let y = self.cursor;
            self.text(x, y, fitted, bold);
            self.cursor += self.line_height();
        }
        let generated = fit_text(
            &format!("Generated at {}", report.generated_at),
            width,
            self.measure,
        );
        let y = self.cursor;
        self.text(x, y, generated, false);
        self.cursor += self.line_height() + self.geometry.rule_padding;
    }

    fn column_header(&mut self) {
        let y = self.cursor;
        let columns = self.columns;
        let ticket = fit_text("Ticket", columns.ticket.width(), self.measure);
        let description = fit_text("Description", columns.description.width(), self.measure);
        self.text(columns.ticket.x_start, y, ticket, true);
        self.text(columns.description.x_start, y, description, true);
        self.right_text(columns.freight, y, "Freight", true);
        self.right_text(columns.service, y, "Service", true);
        self.cursor += self.line_height();
        let rule_y = self.cursor;
        self.rule(rule_y);
        self.cursor += self.geometry.rule_padding;
        self.fresh = true;
    }

    fn group(&mut self, group: &ReportGroup, depth: usize) {
        self.group_header(group, depth);
        match &group.body {
            GroupBody::Subgroups { groups } => {
                for child in groups {
                    self.group(child, depth + 1);
                }
                self.subtotal_line(&format!("Total {}", group.label), &group.subtotal);
            }
            GroupBody::Rows { rows } => {
                for row in rows {
                    self.row(row);
                }
                self.subtotal_line(&format!("Subtotal {}", group.label), &group.subtotal);
            }
            GroupBody::Summary { orders, items, .. } => {
                let description = format!("Orders: {orders} · Items: {items}");
                self.line("", &description, &group.subtotal.freight, &group.subtotal.service);
            }
        }
    }

    fn group_header(&mut self, group: &ReportGroup, depth: usize) {
        let padding = self.geometry.rule_padding;
        // keep the header together with at least one line below it
        self.ensure_space(2.0 * padding + 2.0 * self.line_height());

        let top = self.cursor;
        self.rule(top);
        self.cursor += padding;

        let x = self.columns.ticket.x_start + depth as f64 * self.geometry.indent;
        let label = fit_text(&group.label, self.columns.service.x_end - x, self.measure);
        let y = self.cursor;
        self.text(x, y, label, true);
        self.cursor += self.line_height();

        let bottom = self.cursor;
        self.rule(bottom);
        self.cursor += padding;
    }

    fn row(&mut self, row: &ReportRow) {
        self.line(&row.ticket, &row.description, &row.freight, &row.service);
    }

    /// Draw one table line: identifier, wrapped description, and both values
    fn line(&mut self, ticket: &str, description: &str, freight: &Money, service: &Money) {
        let columns = self.columns;
        let mut lines = wrap_text(description, columns.description.width(), self.measure);
        let max_lines = self.max_lines_per_page();
        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                *last = fit_text(
                    &format!("{}{ELLIPSIS}", last.trim_end()),
                    columns.description.width(),
                    self.measure,
                );
            }
        }

        let height = row_height(lines.len(), self.geometry);
        self.ensure_space(height);
        let y = self.cursor;

        let ticket = fit_text(ticket, columns.ticket.width(), self.measure);
        self.text(columns.ticket.x_start, y, ticket, false);
        for (index, line) in lines.into_iter().enumerate() {
            let line_y = y + index as f64 * self.line_height();
            self.text(columns.description.x_start, line_y, line, false);
        }
        let freight = self.fixed_pitch(freight);
        let service = self.fixed_pitch(service);
        self.right_text(columns.freight, y, &freight, false);
        self.right_text(columns.service, y, &service, false);

        self.cursor += height;
    }

    fn subtotal_line(&mut self, label: &str, totals: &ReportTotals) {
        self.ensure_space(self.line_height() + self.geometry.rule_padding);
        let columns = self.columns;
        let y = self.cursor;
        let span = columns.freight.x_start - self.geometry.value_zone_gap - columns.ticket.x_start;
        let label = fit_text(label, span.max(0.0), self.measure);
        self.text(columns.ticket.x_start, y, label, true);
        let freight = self.fixed_pitch(&totals.freight);
        let service = self.fixed_pitch(&totals.service);
        self.right_text(columns.freight, y, &freight, true);
        self.right_text(columns.service, y, &service, true);
        self.cursor += self.line_height() + self.geometry.rule_padding;
    }

    fn grand_total(&mut self, total: &ReportTotals) {
        let padding = self.geometry.rule_padding;
        self.ensure_space(3.0 * padding + 2.0 * self.line_height());

        let top = self.cursor;
        self.rule(top);
        self.cursor += padding;
        self.subtotal_line("GRAND TOTAL", total);

        let columns = self.columns;
        let y = self.cursor;
        let label = fit_text(
            "Freight + Service",
            columns.freight.x_start - columns.ticket.x_start,
            self.measure,
        );
        self.text(columns.ticket.x_start, y, label, true);
        let combined = self.fixed_pitch(&total.total());
        self.right_text(columns.service, y, &combined, true);
        self.cursor += self.line_height();

        let bottom = self.cursor;
        self.rule(bottom);
        self.cursor += padding;
    }

    /// Currency text left-padded to the column's character capacity so decimals align.
    /// Amounts wider than the column become a run of `#`.
    fn fixed_pitch(&self, value: &Money) -> String {
        let width = self.columns.freight.width();
        let text = self.format.format(*value);
        if self.measure.width(&text) > width {
            let mark = self.measure.width(OVERFLOW_MARK).max(f64::EPSILON);
            return OVERFLOW_MARK.repeat((width / mark).floor() as usize);
        }
        let pitch = self.measure.width("0").max(f64::EPSILON);
        let capacity = (width / pitch).floor() as usize;
        format!("{text:>capacity$}")
    }

    fn max_lines_per_page(&self) -> usize {
        let body_top = self.geometry.margin_top + self.line_height() + self.geometry.rule_padding;
        let usable = self.geometry.body_bottom() - body_top;
        ((usable / self.line_height()).floor() as usize).max(1)
    }

    /// Close the last page and annotate every page with its number
    fn finish(mut self) -> Vec<PageLayout> {
        self.pages.push(PageLayout {
            number: self.page,
            ops: std::mem::take(&mut self.ops),
        });
        let count = self.pages.len();
        let y = self.geometry.body_bottom() + self.geometry.rule_padding;
        let right = self.columns.service.x_end;
        for page in &mut self.pages {
            let label = format!("Page {} of {}", page.number, count);
            let x = right - self.measure.width(&label);
            page.ops.push(DrawOp::Text {
                x,
                y,
                text: label,
                bold: false,
            });
        }
        self.pages
    }
}

/// Height of a table line holding `lines` wrapped description lines
pub fn row_height(lines: usize, geometry: &PageGeometry) -> f64 {
    (lines as f64 * geometry.line_height).max(geometry.line_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        generate_report, MoneyInput, Order, OrderItem, ReportRequest, ReportType, SelectionSet,
    };

    const EPS: f64 = 1e-9;

    fn measure() -> MonospaceMeasure {
        MonospaceMeasure { advance: 5.0 }
    }

    fn report_with(descriptions: &[&str], report_type: ReportType) -> ReportResponse {
        let items = descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| OrderItem {
                description: Some(d.to_string()),
                designer: Some(if i % 2 == 0 { "Ana" } else { "Bruno" }.to_string()),
                production_type: Some("Banner".to_string()),
                subtotal: Some(MoneyInput::Number(10.0 + i as f64)),
                ..Default::default()
            })
            .collect();
        let orders = vec![Order {
            id: 1,
            number: Some("42".to_string()),
            client: Some("Acme".to_string()),
            freight: Some(MoneyInput::Number(25.0)),
            items,
            ..Default::default()
        }];
        generate_report(&orders, &ReportRequest::new(report_type)).unwrap()
    }

    /// One order designed by Ana, one item per service amount
    fn single_order(freight: f64, services: &[f64]) -> ReportResponse {
        let items = services
            .iter()
            .enumerate()
            .map(|(i, value)| OrderItem {
                description: Some(format!("item {i}")),
                designer: Some("Ana".to_string()),
                production_type: Some("Banner".to_string()),
                subtotal: Some(MoneyInput::Number(*value)),
                ..Default::default()
            })
            .collect();
        let orders = vec![Order {
            id: 1,
            number: Some("42".to_string()),
            client: Some("Acme".to_string()),
            freight: Some(MoneyInput::Number(freight)),
            items,
            ..Default::default()
        }];
        generate_report(
            &orders,
            &ReportRequest::new(ReportType::AnalyticDesignerProduction),
        )
        .unwrap()
    }

    fn group_labels(groups: &[ReportGroup], out: &mut Vec<String>) {
        for group in groups {
            out.push(group.label.clone());
            group_labels(group.subgroups(), out);
        }
    }

    fn texts(layout: &DocumentLayout) -> Vec<(f64, f64, String)> {
        layout
            .instructions()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, text, .. } => Some((x, y, text)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn wraps_on_words_and_truncates_long_tokens() {
        let m = measure();
        assert_eq!(
            wrap_text("print the big banner", 50.0, &m),
            vec!["print the".to_string(), "big banner".to_string()]
        );
        let lines = wrap_text("supercalifragilistic ok", 40.0, &m);
        assert_eq!(lines[0], format!("superca{ELLIPSIS}"));
        assert_eq!(lines[1], "ok");
        assert!(lines.iter().all(|l| m.width(l) <= 40.0));
        assert_eq!(wrap_text("", 40.0, &m), vec![String::new()]);
    }

    #[test]
    fn fit_text_gives_up_when_nothing_fits() {
        let m = measure();
        assert_eq!(fit_text("abc", 15.0, &m), "abc");
        assert_eq!(fit_text("abcd", 15.0, &m), format!("ab{ELLIPSIS}"));
        assert_eq!(fit_text("abcd", 2.0, &m), "");
    }

    #[test]
    fn fit_text_handles_long_tokens() {
        let m = measure();
        let long = "x".repeat(5000);
        let fitted = fit_text(&long, 100.0, &m);
        assert_eq!(fitted, format!("{}{ELLIPSIS}", "x".repeat(19)));
        assert!(m.width(&fitted) <= 100.0);
        assert_eq!(fit_text("ab  cd", 20.0, &m), format!("ab{ELLIPSIS}"));
    }

    #[test]
    fn default_columns_are_disjoint_and_legible() {
        let geometry = PageGeometry::default();
        let (columns, warning) = ColumnLayout::compute(&geometry);
        assert!(warning.is_none());
        assert!(columns.ticket.x_end <= columns.description.x_start);
        assert!(columns.description.x_end <= columns.freight.x_start - geometry.value_zone_gap + EPS);
        assert!(columns.freight.x_end <= columns.service.x_start);
        assert!((columns.service.x_end - (geometry.page_width - geometry.margin_right)).abs() < EPS);
    }

    #[test]
    fn narrow_page_degrades_with_warning() {
        let geometry = PageGeometry {
            page_width: 250.0,
            ..PageGeometry::default()
        };
        let report = report_with(&["a fairly long description"], ReportType::AnalyticClientDesigner);
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        assert_eq!(layout.columns.description.width(), 0.0);
        assert!(matches!(
            layout.warnings.as_slice(),
            [LayoutWarning::NarrowDescription { .. }]
        ));
        assert_eq!(layout.page_count, 1);
    }

    #[test]
    fn description_lines_never_exceed_column() {
        let long = "x".repeat(300);
        let words = "wrap these words across several lines of the description column please";
        let report = report_with(&[&long, words], ReportType::AnalyticDesignerProduction);
        let geometry = PageGeometry::default();
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        let m = geometry.measure();
        let column = layout.columns.description;

        let description_runs: Vec<_> = texts(&layout)
            .into_iter()
            .filter(|(x, _, _)| (*x - column.x_start).abs() < EPS)
            .collect();
        assert!(!description_runs.is_empty());
        for (_, _, text) in description_runs {
            assert!(m.width(&text) <= column.width() + EPS, "{text} overflows");
        }
    }

    #[test]
    fn wrapped_row_pushes_next_row_down() {
        let geometry = PageGeometry::default();
        let m = geometry.measure();
        let (columns, _) = ColumnLayout::compute(&geometry);
        let long = "word ".repeat(60);
        let expected_lines = wrap_text(&long, columns.description.width(), &m).len();
        assert!(expected_lines > 1);

        let report = report_with(&[&long, "short"], ReportType::AnalyticDesignerClient);
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        let ticket_rows: Vec<f64> = texts(&layout)
            .into_iter()
            .filter(|(x, _, t)| (*x - columns.ticket.x_start).abs() < EPS && t == "42")
            .map(|(_, y, _)| y)
            .collect();
        assert_eq!(ticket_rows.len(), 2);
        // rows sit in different groups: header and subtotal lines come in between
        assert!(ticket_rows[1] - ticket_rows[0] >= row_height(expected_lines, &geometry));
    }

    #[test]
    fn paginates_and_numbers_pages() {
        let descriptions: Vec<String> = (0..150).map(|i| format!("item {i}")).collect();
        let refs: Vec<&str> = descriptions.iter().map(String::as_str).collect();
        let report = report_with(&refs, ReportType::AnalyticDesignerProduction);
        let geometry = PageGeometry::default();
        let layout = layout(&report, &geometry, &MoneyFormat::default());

        assert!(layout.page_count > 1);
        assert_eq!(layout.pages.len(), layout.page_count);
        let breaks = layout
            .instructions()
            .iter()
            .filter(|op| matches!(op, DrawOp::PageBreak { .. }))
            .count();
        assert_eq!(breaks, layout.page_count - 1);

        for page in &layout.pages {
            let footer = format!("Page {} of {}", page.number, layout.page_count);
            assert!(page
                .ops
                .iter()
                .any(|op| matches!(op, DrawOp::Text { text, .. } if *text == footer)));
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if *text != footer {
                        assert!(*y + geometry.line_height <= geometry.body_bottom() + EPS);
                    }
                }
            }
            // every page repeats the column header
            assert!(page
                .ops
                .iter()
                .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "Description")));
        }
    }

    #[test]
    fn oversized_amounts_stay_inside_their_column() {
        let report = single_order(123_456_789_012.0, &[10.0]);
        let geometry = PageGeometry::default();
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        let m = geometry.measure();
        let columns = layout.columns;

        let mut overflowed = 0;
        for (x, _, text) in texts(&layout) {
            let right = x + m.width(&text);
            for column in [columns.freight, columns.service] {
                if (right - column.x_end).abs() < EPS {
                    assert!(x >= column.x_start - EPS, "{text:?} starts at {x}");
                }
            }
            if text.chars().all(|c| c == '#') {
                assert!(x >= columns.freight.x_start - EPS);
                overflowed += 1;
            }
        }
        // row, both subtotals, grand total freight and combined total
        assert!(overflowed >= 4);
        assert!(texts(&layout)
            .iter()
            .any(|(_, _, t)| t.trim_start() == "R$ 10,00"));
    }

    #[test]
    fn group_headers_sit_between_rules() {
        let descriptions: Vec<String> = (0..120).map(|i| format!("item {i}")).collect();
        let refs: Vec<&str> = descriptions.iter().map(String::as_str).collect();
        let report = report_with(&refs, ReportType::AnalyticDesignerProduction);
        let geometry = PageGeometry::default();
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        let mut labels = Vec::new();
        group_labels(&report.groups, &mut labels);

        let mut headers = 0;
        for page in &layout.pages {
            for (index, op) in page.ops.iter().enumerate() {
                let DrawOp::Text { y, text, bold: true, .. } = op else {
                    continue;
                };
                if !labels.contains(text) {
                    continue;
                }
                headers += 1;
                assert!(index > 0);
                assert!(
                    matches!(page.ops[index - 1], DrawOp::Rule { y: rule, .. }
                        if (rule - (y - geometry.rule_padding)).abs() < EPS),
                    "no rule above {text}"
                );
                assert!(
                    matches!(page.ops.get(index + 1), Some(DrawOp::Rule { y: rule, .. })
                        if (rule - (y + geometry.line_height)).abs() < EPS),
                    "no rule below {text}"
                );
            }
        }
        assert_eq!(headers, labels.len());
    }

    #[test]
    fn money_runs_share_their_column_edge() {
        let report = single_order(1.0, &[1.0, 12_345.67, 250.5]);
        let geometry = PageGeometry::default();
        let layout = layout(&report, &geometry, &MoneyFormat::default());
        let m = geometry.measure();
        let columns = layout.columns;

        let money: Vec<(f64, String)> = texts(&layout)
            .into_iter()
            .filter(|(_, _, t)| t.trim_start().starts_with("R$"))
            .map(|(x, _, t)| (x, t))
            .collect();
        for column in [columns.freight, columns.service] {
            let runs: Vec<&(f64, String)> = money
                .iter()
                .filter(|(x, _)| *x >= column.x_start - EPS && *x < column.x_end)
                .collect();
            assert!(runs.len() > 1);
            for (x, text) in &runs {
                assert!((x + m.width(text) - column.x_end).abs() < EPS, "{text:?}");
                assert!((x - runs[0].0).abs() < EPS, "{text:?} is not aligned");
            }
        }
        let values: Vec<&str> = money.iter().map(|(_, t)| t.trim_start()).collect();
        assert!(values.contains(&"R$ 1,00"));
        assert!(values.contains(&"R$ 12.345,67"));
    }

    #[test]
    fn totals_come_from_pruned_subtotals() {
        let report = report_with(&["first", "second"], ReportType::SyntheticDesigner);
        let mut selection = SelectionSet::all(&report.groups);
        selection.exclude(&crate::report::LeafId::row(1, 1));
        let pruned = report.select(&selection);
        let format = MoneyFormat::default();
        let layout = layout(&pruned, &PageGeometry::default(), &format);
        let all_text: Vec<String> = texts(&layout).into_iter().map(|(_, _, t)| t).collect();

        assert!(all_text.iter().any(|t| t == "Subtotal Designer: Ana"));
        assert!(!all_text.iter().any(|t| t.contains("Bruno")));
        // freight 25,00 + service 10,00
        assert!(all_text.iter().any(|t| t.trim_start() == format.format(pruned.total.total())));
        assert_eq!(format.format(pruned.total.total()), "R$ 35,00");
    }
}
