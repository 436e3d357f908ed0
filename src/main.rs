use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use closings::config::{config_dir, load_config, resolve_output_path, Config, CONFIG_TEMPLATE};
use closings::error::{ClosingError, Result};
use closings::export::{layout, layout_json, to_csv, MoneyFormat, GRAND_TOTAL_LABEL};
use closings::report::{
    generate_report, load_orders, parse_request_date, sort_rows, GroupBody, LeafId,
    ReportGroup, ReportRequest, ReportResponse, ReportShape, ReportType, SelectionSet,
    SortDirection, SortField,
};

#[derive(Parser)]
#[command(name = "closings")]
#[command(version, about = "Production closings reports for print shop orders", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.closings or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// List available report types
    Types,

    /// Build a closings report from an orders file
    Report {
        #[command(flatten)]
        query: QueryArgs,

        /// Leaf id to leave out of the totals (can be repeated)
        #[arg(long, value_name = "ID")]
        exclude: Vec<String>,

        /// Only keep these leaf ids (can be repeated)
        #[arg(long, value_name = "ID")]
        only: Vec<String>,

        /// List the rows of every leaf group
        #[arg(long)]
        detail: bool,

        /// Sort detail rows by ticket, description, freight or service
        #[arg(long, value_name = "FIELD")]
        sort: Option<String>,

        /// Sort detail rows in descending order
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Write the selected report as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Write the paginated document layout as JSON
        #[arg(long, value_name = "PATH")]
        layout: Option<PathBuf>,
    },

    /// List the selectable leaf ids of a report
    Leaves {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// JSON file with the orders to report on
    #[arg(short, long)]
    orders: PathBuf,

    /// Report type (see 'closings types')
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    report_type: String,

    /// Period start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Period end, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Date used for the period: auto, entry or delivery (default from config)
    #[arg(long)]
    date_mode: Option<String>,

    /// Only orders with this status
    #[arg(long)]
    status: Option<String>,

    /// Client name contains
    #[arg(long)]
    client: Option<String>,

    /// Designer name contains
    #[arg(long)]
    designer: Option<String>,

    /// Seller name contains
    #[arg(long)]
    seller: Option<String>,

    /// Freight distribution: per-order or proportional (default from config)
    #[arg(long)]
    distribution: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Types => cmd_types(),
        Commands::Report {
            query,
            exclude,
            only,
            detail,
            sort,
            desc,
            csv,
            layout: layout_path,
        } => {
            let sort = sort
                .as_deref()
                .map(str::parse::<SortField>)
                .transpose()?
                .map(|field| {
                    let direction = if desc {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    };
                    (field, direction)
                });
            let exports = Exports {
                csv,
                layout: layout_path,
            };
            cmd_report(&cfg_dir, &query, &exclude, &only, detail, sort, &exports)
        }
        Commands::Leaves { query } => cmd_leaves(&cfg_dir, &query),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(ClosingError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized closings config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your shop details and currency:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Export the orders to close as a JSON array");
    println!();
    println!("Then build your first report:");
    println!("  closings report --orders <orders.json> --type synthetic-client");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "TYPE")]
    key: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "TITLE")]
    title: String,
}

#[derive(Tabled)]
struct GroupLine {
    #[tabled(rename = "GROUP")]
    label: String,
    #[tabled(rename = "CONTENT")]
    content: String,
    #[tabled(rename = "FREIGHT")]
    freight: String,
    #[tabled(rename = "SERVICE")]
    service: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

#[derive(Tabled)]
struct DetailLine {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "TICKET")]
    ticket: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "FREIGHT")]
    freight: String,
    #[tabled(rename = "SERVICE")]
    service: String,
}

#[derive(Tabled)]
struct LeafLine {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

/// List the report types
fn cmd_types() -> Result<()> {
    let rows: Vec<TypeRow> = ReportType::ALL
        .iter()
        .map(|t| TypeRow {
            key: t.key().to_string(),
            kind: match t.shape() {
                ReportShape::Analytic => "analytic".to_string(),
                ReportShape::Synthetic => "synthetic".to_string(),
            },
            title: t.title().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    Ok(())
}

struct Exports {
    csv: Option<PathBuf>,
    layout: Option<PathBuf>,
}

/// Build, select, print and export a report
fn cmd_report(
    cfg_dir: &Path,
    query: &QueryArgs,
    exclude: &[String],
    only: &[String],
    detail: bool,
    sort: Option<(SortField, SortDirection)>,
    exports: &Exports,
) -> Result<()> {
    let (config, report) = load_report(cfg_dir, query)?;

    let mut selection = if only.is_empty() {
        SelectionSet::all(&report.groups)
    } else {
        only.iter().map(|id| LeafId::new(id.as_str())).collect()
    };
    for id in exclude {
        selection.exclude(&LeafId::new(id.as_str()));
    }
    selection.retain_known(&report.groups);
    debug!(selected = selection.len(), "selection resolved");

    let selected = report.select(&selection);
    let format = config.money_format();

    println!("{} - {}", config.company.name, selected.title);
    println!("{} | {}", selected.period_label, selected.status_label);
    println!("Generated at {}", selected.generated_at);
    println!();

    if selected.groups.is_empty() {
        println!("No rows selected.");
    } else {
        let mut lines = Vec::new();
        for group in &selected.groups {
            collect_group_lines(group, 0, &format, &mut lines);
        }
        let total = &selected.total;
        let values = [
            format.format(total.freight),
            format.format(total.service),
            format.format(total.total()),
        ];
        lines.push(GroupLine {
            label: GRAND_TOTAL_LABEL.to_string(),
            content: String::new(),
            freight: values[0].clone(),
            service: values[1].clone(),
            total: values[2].clone(),
        });
        let mut table = Table::new(lines);
        table.with(Style::rounded());
        println!(
            "{}",
            add_total_footer(&table.to_string(), GRAND_TOTAL_LABEL, &values)
        );
    }

    if detail {
        for group in &selected.groups {
            print_detail(group, &mut Vec::new(), sort, &format);
        }
    }

    if let Some(path) = &exports.csv {
        let path = resolve_output_path(&config, path);
        ensure_parent(&path)?;
        fs::write(&path, to_csv(&selected, &format)?)?;
        println!("Wrote CSV to {}", path.display());
    }

    if let Some(path) = &exports.layout {
        let path = resolve_output_path(&config, path);
        ensure_parent(&path)?;
        let document = layout(&selected, &config.layout, &format);
        fs::write(&path, layout_json(&document)?)?;
        println!(
            "Wrote layout ({} page{}) to {}",
            document.page_count,
            if document.page_count == 1 { "" } else { "s" },
            path.display()
        );
    }

    Ok(())
}

/// List every selectable leaf id
fn cmd_leaves(cfg_dir: &Path, query: &QueryArgs) -> Result<()> {
    let (config, report) = load_report(cfg_dir, query)?;
    let format = config.money_format();

    let mut lines = Vec::new();
    for group in &report.groups {
        collect_leaf_lines(group, &mut Vec::new(), &format, &mut lines);
    }

    if lines.is_empty() {
        println!("No leaves in this report.");
        return Ok(());
    }

    let count = lines.len();
    let mut table = Table::new(lines);
    table.with(Style::rounded());
    println!("{table}");
    println!("{count} leaves");

    Ok(())
}

fn load_report(cfg_dir: &Path, query: &QueryArgs) -> Result<(Config, ReportResponse)> {
    let config = load_config(cfg_dir)?;
    let request = build_request(query, &config)?;
    let orders = load_orders(&query.orders)?;
    let report = generate_report(&orders, &request)?;
    Ok((config, report))
}

fn build_request(query: &QueryArgs, config: &Config) -> Result<ReportRequest> {
    let mut request = ReportRequest::new(query.report_type.parse()?);
    request.distribution = match &query.distribution {
        Some(mode) => mode.parse()?,
        None => config.report.distribution,
    };

    let filters = &mut request.filters;
    filters.start_date = query.from.as_deref().map(parse_request_date).transpose()?;
    filters.end_date = query.to.as_deref().map(parse_request_date).transpose()?;
    filters.date_mode = match &query.date_mode {
        Some(mode) => mode.parse()?,
        None => config.report.date_mode,
    };
    filters.status = query.status.as_deref().map(str::parse).transpose()?;
    filters.client = query.client.clone();
    filters.designer = query.designer.clone();
    filters.seller = query.seller.clone();

    Ok(request)
}

fn collect_group_lines(
    group: &ReportGroup,
    depth: usize,
    format: &MoneyFormat,
    lines: &mut Vec<GroupLine>,
) {
    let content = match &group.body {
        GroupBody::Subgroups { groups } => format!("{} groups", groups.len()),
        GroupBody::Rows { rows } => format!("{} rows", rows.len()),
        GroupBody::Summary { orders, items, .. } => format!("Orders: {orders} · Items: {items}"),
    };
    lines.push(GroupLine {
        label: format!("{}{}", "  ".repeat(depth), group.label),
        content,
        freight: format.format(group.subtotal.freight),
        service: format.format(group.subtotal.service),
        total: format.format(group.subtotal.total()),
    });
    for child in group.subgroups() {
        collect_group_lines(child, depth + 1, format, lines);
    }
}

fn print_detail(
    group: &ReportGroup,
    path: &mut Vec<String>,
    sort: Option<(SortField, SortDirection)>,
    format: &MoneyFormat,
) {
    path.push(group.label.clone());
    match &group.body {
        GroupBody::Subgroups { groups } => {
            for child in groups {
                print_detail(child, path, sort, format);
            }
        }
        GroupBody::Rows { rows } => {
            let rows = match sort {
                Some((field, direction)) => sort_rows(rows, field, direction),
                None => rows.clone(),
            };
            let lines: Vec<DetailLine> = rows
                .iter()
                .map(|row| DetailLine {
                    id: row.id.to_string(),
                    ticket: row.ticket.clone(),
                    description: row.description.clone(),
                    freight: format.format(row.freight),
                    service: format.format(row.service),
                })
                .collect();
            let mut table = Table::new(lines);
            table.with(Style::rounded());
            println!();
            println!("{}", path.join(" / "));
            println!("{table}");
        }
        GroupBody::Summary { .. } => {}
    }
    path.pop();
}

fn collect_leaf_lines(
    group: &ReportGroup,
    path: &mut Vec<String>,
    format: &MoneyFormat,
    lines: &mut Vec<LeafLine>,
) {
    path.push(group.label.clone());
    match &group.body {
        GroupBody::Subgroups { groups } => {
            for child in groups {
                collect_leaf_lines(child, path, format, lines);
            }
        }
        GroupBody::Rows { rows } => {
            for row in rows {
                lines.push(LeafLine {
                    id: row.id.to_string(),
                    group: path.join(" / "),
                    description: row.description.clone(),
                    value: format.format(row.freight + row.service),
                });
            }
        }
        GroupBody::Summary { id, orders, items } => lines.push(LeafLine {
            id: id.to_string(),
            group: path.join(" / "),
            description: format!("Orders: {orders} · Items: {items}"),
            value: format.format(group.subtotal.total()),
        }),
    }
    path.pop();
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Turn the last row of a rounded group table into a footer whose label spans the
/// GROUP and CONTENT columns. The row is rendered first so it sizes the columns.
fn add_total_footer(table: &str, label: &str, values: &[String; 3]) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 5 {
        return table.to_string();
    }

    // Parse the top border to discover column widths
    let top = lines[0];
    let Some(inner) = top.strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() != 5 {
        return table.to_string();
    }

    // Merge GROUP and CONTENT into one label cell
    let left_width = widths[0] + widths[1] + 1;
    let value_widths = &widths[2..];

    // Drop the plain total row and the bottom border
    let mut out = lines[..lines.len() - 2].join("\n");
    out.push('\n');

    out.push_str(&format!(
        "├{}┴{}┼{}┼{}┼{}┤\n",
        "─".repeat(widths[0]),
        "─".repeat(widths[1]),
        "─".repeat(value_widths[0]),
        "─".repeat(value_widths[1]),
        "─".repeat(value_widths[2]),
    ));

    out.push_str(&format!("│ {:>width$} │", label, width = left_width - 2));
    for (value, width) in values.iter().zip(value_widths) {
        out.push_str(&format!(" {:>width$} │", value, width = width - 2));
    }
    out.push('\n');

    out.push_str(&format!(
        "╰{}┴{}┴{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(value_widths[0]),
        "─".repeat(value_widths[1]),
        "─".repeat(value_widths[2]),
    ));

    out
}
