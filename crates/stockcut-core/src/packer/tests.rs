use super::*;

fn packer() -> BarPacker {
    BarPacker::new(StockSpec::new(6000, 300)).unwrap()
}

fn reference_requests() -> Vec<CutRequest> {
    vec![
        CutRequest::new(3000, 2),
        CutRequest::new(2500, 1),
        CutRequest::new(1200, 3),
    ]
}

#[test]
fn test_reference_cut_list() {
    let result = packer().pack(&reference_requests());

    assert_eq!(result.bars.len(), 3);
    assert_eq!(result.bars[0].cuts, vec![3000, 2500]);
    assert_eq!(result.bars[0].waste(300), 500);
    assert_eq!(result.bars[1].cuts, vec![3000, 1200, 1200]);
    assert_eq!(result.bars[1].waste(300), 600);
    assert_eq!(result.bars[2].cuts, vec![1200]);
    assert_eq!(result.bars[2].waste(300), 4800);

    assert_eq!(result.summary.total_bars, 3);
    assert_eq!(result.summary.total_waste, 5900);
    assert_eq!(result.summary.effective_length, 5700);
    assert_eq!(result.summary.total_cut_length, 12100);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_reference_pattern_table() {
    let result = packer().pack(&reference_requests());

    assert_eq!(result.patterns.len(), 3);
    let first = &result.patterns[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.occurrence_count, 1);
    assert_eq!(first.cuts, vec![3000, 2500]);
    assert_eq!(first.used_length, 5500);
    assert_eq!(first.remaining_length, 200);
    assert_eq!(first.waste, 500);
    assert_eq!(result.patterns[2].remaining_length, 4500);
}

#[test]
fn test_reserved_equal_to_stock_is_configuration_error() {
    let result = BarPacker::new(StockSpec::new(6000, 6000));
    assert!(matches!(result, Err(OptimizerError::Configuration(_))));

    let result = BarPacker::new(StockSpec::new(6000, 7000));
    assert!(matches!(result, Err(OptimizerError::Configuration(_))));
}

#[test]
fn test_empty_input_warns_without_bars() {
    let result = packer().pack(&[]);
    assert!(result.bars.is_empty());
    assert!(result.patterns.is_empty());
    assert_eq!(result.summary.total_bars, 0);
    assert_eq!(result.summary.total_waste, 0);
    assert_eq!(result.summary.utilization_percentage, 0.0);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::EmptyInput);
}

#[test]
fn test_entirely_invalid_input_warns_without_bars() {
    let result = packer().pack(&[CutRequest::new(0, 4), CutRequest::new(1000, 0)]);
    assert!(result.bars.is_empty());

    let kinds: Vec<_> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::InvalidRecord,
            DiagnosticKind::InvalidRecord,
            DiagnosticKind::EmptyInput
        ]
    );
    assert_eq!(result.diagnostics[1].scope, "request 2");
}

#[test]
fn test_oversized_piece_is_excluded() {
    let result = packer().pack(&[CutRequest::new(5800, 1), CutRequest::new(2000, 2)]);

    assert_eq!(result.bars.len(), 1);
    assert_eq!(result.bars[0].cuts, vec![2000, 2000]);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::OversizedPiece);
}

#[test]
fn test_piece_equal_to_effective_length_fills_a_bar() {
    let result = packer().pack(&[CutRequest::new(5700, 2)]);
    assert_eq!(result.bars.len(), 2);
    assert!(result.bars.iter().all(|bar| bar.remaining == 0));
    assert_eq!(result.patterns.len(), 1);
    assert_eq!(result.patterns[0].occurrence_count, 2);
    assert_eq!(result.patterns[0].waste, 300);
}

#[test]
fn test_bars_respect_capacity_and_keep_every_piece() {
    let requests = vec![
        CutRequest::new(1750, 7),
        CutRequest::new(820, 11),
        CutRequest::new(2310, 4),
        CutRequest::new(415, 13),
        CutRequest::new(3900, 2),
    ];
    let stock = StockSpec::new(6000, 250);
    let result = BarPacker::new(stock).unwrap().pack(&requests);

    let placed: usize = result.bars.iter().map(|bar| bar.cuts.len()).sum();
    let requested: u32 = requests.iter().map(|r| r.quantity).sum();
    assert_eq!(placed, requested as usize);

    for bar in &result.bars {
        assert!(bar.used_length() <= stock.effective_length());
        assert_eq!(
            bar.waste(stock.reserved_length),
            stock.effective_length() - bar.used_length() + stock.reserved_length
        );
    }

    let grouped: u32 = result.patterns.iter().map(|p| p.occurrence_count).sum();
    assert_eq!(grouped, result.summary.total_bars);

    let waste: u64 = result
        .bars
        .iter()
        .map(|bar| u64::from(bar.waste(stock.reserved_length)))
        .sum();
    assert_eq!(result.summary.total_waste, waste);
}

#[test]
fn test_new_bar_only_when_no_open_bar_fits() {
    let requests = vec![
        CutRequest::new(2900, 3),
        CutRequest::new(1400, 5),
        CutRequest::new(600, 6),
    ];
    let packer = packer();
    let mut pieces = BarPacker::expand_pieces(&requests);
    pieces.sort_by(|a, b| b.cmp(a));

    // Replay placements and check every opening against the bars before it
    let bars = packer.first_fit_decreasing(&pieces);
    let mut replay: Vec<u32> = Vec::new();
    for &piece in &pieces {
        if let Some(slot) = replay.iter_mut().find(|remaining| **remaining >= piece) {
            *slot -= piece;
        } else {
            assert!(replay.iter().all(|remaining| *remaining < piece));
            replay.push(5700 - piece);
        }
    }
    let remaining: Vec<u32> = bars.iter().map(|bar| bar.remaining).collect();
    assert_eq!(remaining, replay);
}

#[test]
fn test_input_order_does_not_change_the_plan() {
    let forward = packer().pack(&reference_requests());
    let mut reversed_requests = reference_requests();
    reversed_requests.reverse();
    let reversed = packer().pack(&reversed_requests);

    assert_eq!(forward.bars, reversed.bars);
    assert_eq!(forward.patterns, reversed.patterns);
}

#[test]
fn test_zero_reserved_length_wastes_only_remainder() {
    let packer = BarPacker::new(StockSpec::new(1000, 0)).unwrap();
    let result = packer.pack(&[CutRequest::new(600, 1), CutRequest::new(300, 1)]);
    assert_eq!(result.bars.len(), 1);
    assert_eq!(result.summary.total_waste, 100);
    assert!((result.summary.utilization_percentage - 90.0).abs() < 1e-9);
}
