use closings::report::{
    aggregate, generate_report, leaf_ids, prune, recompute, sort_rows, DistributionMode,
    GroupBody, LeafId, Money, MoneyInput, Order, OrderItem, ReportGroup, ReportRequest,
    ReportRow, ReportTotals, ReportType, SelectionSet, SortDirection, SortField,
};

fn money(units: i64) -> Money {
    Money::from_cents(units * 100)
}

fn row(order_id: u64, ticket: &str, freight: i64, service: i64) -> ReportRow {
    ReportRow {
        id: LeafId::new(format!("{order_id}:{ticket}")),
        ticket: ticket.to_string(),
        description: format!("item {ticket}"),
        order_id,
        freight: money(freight),
        service: money(service),
    }
}

fn item(designer: &str, kind: &str, value: f64) -> OrderItem {
    OrderItem {
        description: Some(format!("{kind} by {designer}")),
        designer: Some(designer.to_string()),
        production_type: Some(kind.to_string()),
        subtotal: Some(MoneyInput::Number(value)),
        ..Default::default()
    }
}

fn orders() -> Vec<Order> {
    vec![
        Order {
            id: 1,
            number: Some("10".to_string()),
            client: Some("Acme".to_string()),
            entry_date: Some("2024-05-02".to_string()),
            freight: Some(MoneyInput::Number(50.0)),
            items: vec![item("Ana", "Banner", 120.0), item("Ana", "Flyer", 30.0)],
            ..Default::default()
        },
        Order {
            id: 2,
            number: Some("11".to_string()),
            client: Some("Zeta".to_string()),
            entry_date: Some("2024-05-03".to_string()),
            freight: Some(MoneyInput::Text("15,00".to_string())),
            items: vec![item("Bruno", "Banner", 80.0), item("Ana", "Banner", 20.0)],
            ..Default::default()
        },
        Order {
            id: 3,
            number: Some("12".to_string()),
            client: Some("Acme".to_string()),
            entry_date: Some("2024-05-04".to_string()),
            freight: Some(MoneyInput::Number(0.0)),
            total_value: Some(MoneyInput::Number(45.0)),
            ..Default::default()
        },
    ]
}

fn all_rows(groups: &[ReportGroup]) -> Vec<&ReportRow> {
    groups
        .iter()
        .flat_map(|group| match &group.body {
            GroupBody::Subgroups { groups } => all_rows(groups),
            GroupBody::Rows { rows } => rows.iter().collect(),
            GroupBody::Summary { .. } => Vec::new(),
        })
        .collect()
}

fn assert_no_empty_groups(groups: &[ReportGroup]) {
    for group in groups {
        match &group.body {
            GroupBody::Subgroups { groups } => {
                assert!(!groups.is_empty(), "{} has no subgroups", group.label);
                assert_no_empty_groups(groups);
            }
            GroupBody::Rows { rows } => assert!(!rows.is_empty(), "{} has no rows", group.label),
            GroupBody::Summary { .. } => {}
        }
    }
}

#[test]
fn per_order_freight_counts_each_order_once() {
    let rows = [row(1, "10", 20, 100), row(1, "11", 20, 50), row(2, "12", 15, 80)];
    assert_eq!(
        aggregate(&rows, DistributionMode::PerOrder),
        ReportTotals::new(money(35), money(230))
    );
}

#[test]
fn proportional_slices_give_the_same_total() {
    let rows = [row(1, "10", 10, 100), row(1, "11", 10, 50), row(2, "12", 15, 80)];
    assert_eq!(
        aggregate(&rows, DistributionMode::Proportional),
        ReportTotals::new(money(35), money(230))
    );
}

#[test]
fn grand_total_dedups_orders_across_groups() {
    for report_type in ReportType::ALL {
        let report = generate_report(&orders(), &ReportRequest::new(report_type)).unwrap();
        assert_eq!(
            report.total,
            ReportTotals::new(money(65), money(295)),
            "{report_type}"
        );
    }
}

#[test]
fn full_selection_reproduces_unfiltered_total() {
    for mode in [DistributionMode::PerOrder, DistributionMode::Proportional] {
        let mut request = ReportRequest::new(ReportType::AnalyticDesignerProduction);
        request.distribution = mode;
        let report = generate_report(&orders(), &request).unwrap();

        let recomputed = recompute(&report.groups, &SelectionSet::all(&report.groups), mode);
        assert_eq!(recomputed.total, report.total);
        assert_eq!(recomputed.total, aggregate(all_rows(&report.groups), mode));
    }
}

#[test]
fn empty_selection_totals_zero() {
    let report =
        generate_report(&orders(), &ReportRequest::new(ReportType::SyntheticClient)).unwrap();
    let recomputed = recompute(&report.groups, &SelectionSet::empty(), report.distribution);
    assert_eq!(recomputed.total, ReportTotals::ZERO);
}

#[test]
fn split_order_freight_is_not_doubled() {
    let report = generate_report(
        &orders(),
        &ReportRequest::new(ReportType::AnalyticDesignerProduction),
    )
    .unwrap();

    // Order 1 lands in Ana/Banner and Ana/Flyer
    let selection: SelectionSet = [LeafId::row(1, 0), LeafId::row(1, 1)].into_iter().collect();
    let pruned = prune(&report.groups, &selection, report.distribution);

    assert_eq!(pruned.total.freight, money(50));
    assert_eq!(pruned.total.service, money(150));

    let ana = &pruned.groups[0];
    let split: Money = ana.subgroups().iter().map(|g| g.subtotal.freight).sum();
    assert_eq!(split, money(100));
    assert_eq!(ana.subtotal.freight, money(50));
}

#[test]
fn prune_never_leaves_empty_groups() {
    for report_type in ReportType::ALL {
        let report = generate_report(&orders(), &ReportRequest::new(report_type)).unwrap();
        for id in leaf_ids(&report.groups) {
            let mut selection = SelectionSet::all(&report.groups);
            selection.exclude(&id);
            let pruned = prune(&report.groups, &selection, report.distribution);
            assert_no_empty_groups(&pruned.groups);
            assert!(!leaf_ids(&pruned.groups).contains(&id));
        }
    }
}

#[test]
fn summary_leaves_recompute_from_their_subtotal() {
    let report =
        generate_report(&orders(), &ReportRequest::new(ReportType::SyntheticClient)).unwrap();
    assert_eq!(
        leaf_ids(&report.groups),
        vec![LeafId::new("acme"), LeafId::new("zeta")]
    );

    let mut selection = SelectionSet::all(&report.groups);
    selection.exclude(&LeafId::new("zeta"));
    let pruned = report.select(&selection);

    assert_eq!(pruned.groups.len(), 1);
    assert_eq!(pruned.total, ReportTotals::new(money(50), money(195)));
    match &pruned.groups[0].body {
        GroupBody::Summary { orders, items, .. } => {
            assert_eq!(*orders, 2);
            assert_eq!(*items, 3);
        }
        other => panic!("expected a summary leaf, got {other:?}"),
    }
}

#[test]
fn stale_selection_ids_are_ignored_after_regeneration() {
    let by_client =
        generate_report(&orders(), &ReportRequest::new(ReportType::SyntheticClient)).unwrap();
    let mut selection = SelectionSet::all(&by_client.groups);

    let analytic = generate_report(
        &orders(),
        &ReportRequest::new(ReportType::AnalyticClientDesigner),
    )
    .unwrap();
    selection.retain_known(&analytic.groups);
    assert!(selection.is_empty());

    let recomputed = recompute(&analytic.groups, &selection, analytic.distribution);
    assert_eq!(recomputed.total, ReportTotals::ZERO);
}

#[test]
fn sorting_none_keeps_input_order() {
    let rows = vec![row(1, "3", 0, 5), row(1, "1", 0, 9), row(2, "2", 0, 1)];
    let sorted = sort_rows(&rows, SortField::Service, SortDirection::None);
    assert_eq!(sorted, rows);

    let ascending = sort_rows(&rows, SortField::Ticket, SortDirection::Ascending);
    let tickets: Vec<&str> = ascending.iter().map(|r| r.ticket.as_str()).collect();
    assert_eq!(tickets, vec!["1", "2", "3"]);
    assert_eq!(rows[0].ticket, "3");
}
