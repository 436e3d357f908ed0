//! Delimited-text export of a (pruned) report.

use std::io::Write;

use super::format::MoneyFormat;
use crate::error::Result;
use crate::report::{GroupBody, ReportGroup, ReportResponse, ReportShape, ReportTotals};

pub const GRAND_TOTAL_LABEL: &str = "GRAND TOTAL";

/// Write one line per surviving row (analytic reports) or per leaf group (synthetic
/// reports), followed by the grand total line.
pub fn write_csv<W: Write>(report: &ReportResponse, format: &MoneyFormat, writer: W) -> Result<()> {
    let (primary, secondary) = report.report_type.dimensions();
    let shape = report.shape();

    let mut header: Vec<String> = vec![primary.label().to_string()];
    if let Some(secondary) = secondary {
        header.push(secondary.label().to_string());
    }
    if shape == ReportShape::Analytic {
        header.push("Ticket".to_string());
        header.push("Description".to_string());
    }
    header.extend(["Freight", "Service", "Total"].map(String::from));

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;

    let mut records = Vec::new();
    for group in &report.groups {
        collect_records(group, &mut Vec::new(), shape, format, &mut records);
    }
    for record in &records {
        wtr.write_record(record)?;
    }

    let mut footer = vec![GRAND_TOTAL_LABEL.to_string()];
    footer.resize(header.len() - 3, String::new());
    footer.extend(money_cells(&report.total, format));
    wtr.write_record(&footer)?;

    wtr.flush()?;
    Ok(())
}

/// CSV bytes for a report
pub fn to_csv(report: &ReportResponse, format: &MoneyFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(report, format, &mut buffer)?;
    Ok(buffer)
}

fn collect_records(
    group: &ReportGroup,
    values: &mut Vec<String>,
    shape: ReportShape,
    format: &MoneyFormat,
    records: &mut Vec<Vec<String>>,
) {
    values.push(group.value.clone());
    match &group.body {
        GroupBody::Subgroups { groups } => {
            for child in groups {
                collect_records(child, values, shape, format, records);
            }
        }
        GroupBody::Rows { rows } if shape == ReportShape::Analytic => {
            for row in rows {
                let mut record = values.clone();
                record.push(row.ticket.clone());
                record.push(row.description.clone());
                record.extend(money_cells(
                    &ReportTotals::new(row.freight, row.service),
                    format,
                ));
                records.push(record);
            }
        }
        GroupBody::Rows { .. } | GroupBody::Summary { .. } => {
            let mut record = values.clone();
            record.extend(money_cells(&group.subtotal, format));
            records.push(record);
        }
    }
    values.pop();
}

fn money_cells(totals: &ReportTotals, format: &MoneyFormat) -> [String; 3] {
    [
        format.format(totals.freight),
        format.format(totals.service),
        format.format(totals.total()),
    ]
}
