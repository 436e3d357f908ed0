use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::model::ReportRow;
use crate::error::ClosingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Ticket,
    Description,
    Freight,
    Service,
}

impl FromStr for SortField {
    type Err = ClosingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticket" => Ok(SortField::Ticket),
            "description" => Ok(SortField::Description),
            "freight" => Ok(SortField::Freight),
            "service" => Ok(SortField::Service),
            _ => Err(ClosingError::UnknownSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    None,
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortDirection::None => "none",
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        f.write_str(s)
    }
}

/// Column sort state of a leaf table: `none -> asc -> desc -> none` per column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    field: Option<SortField>,
    direction: SortDirection,
}

impl SortState {
    pub fn field(&self) -> Option<SortField> {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Register a click on a column header. A different column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field != Some(field) {
            self.field = Some(field);
            self.direction = SortDirection::Ascending;
            return;
        }
        self.direction = match self.direction {
            SortDirection::None => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
        };
        if self.direction == SortDirection::None {
            self.field = None;
        }
    }

    pub fn apply(&self, rows: &[ReportRow]) -> Vec<ReportRow> {
        match self.field {
            Some(field) => sort_rows(rows, field, self.direction),
            None => rows.to_vec(),
        }
    }
}

/// Stable sort into a new vector; `SortDirection::None` keeps input order
pub fn sort_rows(rows: &[ReportRow], field: SortField, direction: SortDirection) -> Vec<ReportRow> {
    let mut sorted = rows.to_vec();
    if direction == SortDirection::None {
        return sorted;
    }
    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match direction {
            SortDirection::Descending => ordering.reverse(),
            _ => ordering,
        }
    });
    sorted
}

fn compare(a: &ReportRow, b: &ReportRow, field: SortField) -> Ordering {
    match field {
        SortField::Ticket => compare_tickets(&a.ticket, &b.ticket),
        SortField::Description => locale_compare(&a.description, &b.description),
        SortField::Freight => a.freight.cmp(&b.freight),
        SortField::Service => a.service.cmp(&b.service),
    }
}

/// Integer tickets first in numeric order, then every other ticket locale-aware
pub fn compare_tickets(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| locale_compare(a, b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => locale_compare(a, b),
    }
}

/// Accent- and case-insensitive first, falling back to the raw text to break ties
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(text: &str) -> String {
    deunicode::deunicode(text).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{LeafId, Money};

    fn row(ticket: &str, description: &str, service: i64) -> ReportRow {
        ReportRow {
            id: LeafId::new(ticket),
            ticket: ticket.to_string(),
            description: description.to_string(),
            order_id: 1,
            freight: Money::ZERO,
            service: Money::from_cents(service),
        }
    }

    fn tickets(rows: &[ReportRow]) -> Vec<&str> {
        rows.iter().map(|r| r.ticket.as_str()).collect()
    }

    #[test]
    fn numeric_tickets_sort_as_numbers() {
        let rows = vec![row("10", "a", 1), row("9", "b", 2), row("100", "c", 3)];
        let sorted = sort_rows(&rows, SortField::Ticket, SortDirection::Ascending);
        assert_eq!(tickets(&sorted), vec!["9", "10", "100"]);
        assert_eq!(tickets(&rows), vec!["10", "9", "100"]);
    }

    #[test]
    fn mixed_tickets_fall_back_to_text() {
        assert_eq!(compare_tickets("PED-2", "PED-10"), Ordering::Greater);
        assert_eq!(compare_tickets("2", "10"), Ordering::Less);
        assert_eq!(compare_tickets("10", "1A"), Ordering::Less);
    }

    #[test]
    fn ticket_order_is_transitive_across_kinds() {
        let samples = ["9", "10", "1A", "PED-001", "007", "7", "b"];
        for a in samples {
            assert_eq!(compare_tickets(a, a), Ordering::Equal);
            for b in samples {
                assert_eq!(compare_tickets(a, b), compare_tickets(b, a).reverse());
                for c in samples {
                    if compare_tickets(a, b) == Ordering::Less
                        && compare_tickets(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_tickets(a, c), Ordering::Less, "{a} {b} {c}");
                    }
                }
            }
        }

        let rows: Vec<ReportRow> = ["1A", "10", "9", "PED-001"]
            .iter()
            .map(|t| row(t, "x", 0))
            .collect();
        let sorted = sort_rows(&rows, SortField::Ticket, SortDirection::Ascending);
        assert_eq!(tickets(&sorted), vec!["9", "10", "1A", "PED-001"]);
    }

    #[test]
    fn descriptions_ignore_accents_and_case() {
        let rows = vec![row("1", "Óculos", 0), row("2", "banner", 0), row("3", "Adesivo", 0)];
        let sorted = sort_rows(&rows, SortField::Description, SortDirection::Ascending);
        assert_eq!(tickets(&sorted), vec!["3", "2", "1"]);
    }

    #[test]
    fn descending_is_stable_for_ties() {
        let rows = vec![row("1", "x", 5), row("2", "y", 9), row("3", "z", 5)];
        let sorted = sort_rows(&rows, SortField::Service, SortDirection::Descending);
        assert_eq!(tickets(&sorted), vec!["2", "1", "3"]);
    }

    #[test]
    fn three_clicks_restore_original_order() {
        let rows = vec![row("3", "c", 1), row("1", "a", 2), row("2", "b", 3)];
        let mut state = SortState::default();

        state.toggle(SortField::Ticket);
        assert_eq!(state.direction(), SortDirection::Ascending);
        assert_eq!(tickets(&state.apply(&rows)), vec!["1", "2", "3"]);

        state.toggle(SortField::Ticket);
        assert_eq!(state.direction(), SortDirection::Descending);
        assert_eq!(tickets(&state.apply(&rows)), vec!["3", "2", "1"]);

        state.toggle(SortField::Ticket);
        assert_eq!(state.direction(), SortDirection::None);
        assert_eq!(tickets(&state.apply(&rows)), vec!["3", "1", "2"]);
    }

    #[test]
    fn switching_columns_starts_ascending() {
        let mut state = SortState::default();
        state.toggle(SortField::Ticket);
        state.toggle(SortField::Ticket);
        state.toggle(SortField::Service);
        assert_eq!(state.field(), Some(SortField::Service));
        assert_eq!(state.direction(), SortDirection::Ascending);
    }
}
