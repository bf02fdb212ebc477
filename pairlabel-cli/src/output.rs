/// Output formatting: terminal table and JSON.
use std::collections::HashMap;
use std::io::Write;

use pairlabel_core::{ItemId, TrainingView};
use serde::Serialize;

#[derive(Serialize)]
struct JsonExposure<'a> {
    item: &'a str,
    pending_pairs: usize,
}

#[derive(Serialize)]
struct JsonStats<'a> {
    total: usize,
    pending: usize,
    ranked: usize,
    next_pending: Option<(&'a str, &'a str)>,
    last_ranked: Option<(&'a str, &'a str)>,
    most_exposed: Vec<JsonExposure<'a>>,
    least_exposed: Vec<JsonExposure<'a>>,
}

pub struct Stats<'a> {
    pub total: usize,
    pub pending: usize,
    pub ranked: usize,
    pub next_pending: Option<(&'a str, &'a str)>,
    pub last_ranked: Option<(&'a str, &'a str)>,
    pub exposure: HashMap<ItemId, usize>,
}

/// Items sorted by pending exposure (highest first, then by id).
fn ranked_exposure(exposure: &HashMap<ItemId, usize>) -> Vec<(&str, usize)> {
    let mut items: Vec<(&str, usize)> = exposure.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    items
}

/// Split sorted exposure into the `top` most exposed head and the least
/// exposed tail. The tail never overlaps the head.
fn exposure_ends<'s, 'a>(
    items: &'s [(&'a str, usize)],
    top: usize,
) -> (&'s [(&'a str, usize)], &'s [(&'a str, usize)]) {
    let head = items.len().min(top);
    let tail_start = items.len().saturating_sub(top).max(head);
    (&items[..head], &items[tail_start..])
}

fn json_exposure<'a>(ends: &[(&'a str, usize)]) -> Vec<JsonExposure<'a>> {
    ends.iter()
        .map(|&(item, pending_pairs)| JsonExposure { item, pending_pairs })
        .collect()
}

pub fn format_pair(pair: Option<(&str, &str)>) -> String {
    match pair {
        Some((a, b)) => format!("{a}\t{b}"),
        None => "none".to_string(),
    }
}

/// Print counts and the `top` most/least exposed items as a table.
pub fn print_stats_table(stats: &Stats, top: usize) {
    println!("Pairs:   {:>6}", stats.total);
    println!("Pending: {:>6}", stats.pending);
    println!("Ranked:  {:>6}", stats.ranked);
    println!("Next pending: {}", format_pair(stats.next_pending));
    println!("Last ranked:  {}", format_pair(stats.last_ranked));

    let items = ranked_exposure(&stats.exposure);
    if items.is_empty() {
        return;
    }

    let name_width = items.iter().map(|(id, _)| id.len()).max().unwrap_or(4).max(4);
    println!("\n {:<name_width$} | Pending pairs", "Item");
    println!("-{}-|--------------", "-".repeat(name_width));
    let (most, least) = exposure_ends(&items, top);
    for (id, count) in most {
        println!(" {:<name_width$} | {:>13}", id, count);
    }
    if most.len() + least.len() < items.len() {
        println!(" {:<name_width$} |", "...");
    }
    for (id, count) in least {
        println!(" {:<name_width$} | {:>13}", id, count);
    }
}

/// Print counts and the `top` most/least exposed items as JSON.
pub fn print_stats_json(stats: &Stats, top: usize) {
    let items = ranked_exposure(&stats.exposure);
    let (most, least) = exposure_ends(&items, top);

    let output = JsonStats {
        total: stats.total,
        pending: stats.pending,
        ranked: stats.ranked,
        next_pending: stats.next_pending,
        last_ranked: stats.last_ranked,
        most_exposed: json_exposure(most),
        least_exposed: json_exposure(least),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::bail(format!("Failed to encode stats: {e}")),
    }
}

/// Write each training triplet as one JSON line.
pub fn write_triplets_jsonl(view: &TrainingView, out: &mut impl Write) -> std::io::Result<()> {
    for triplet in view {
        let line = serde_json::to_string(triplet)?;
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pair() {
        assert_eq!(format_pair(Some(("a", "b"))), "a\tb");
        assert_eq!(format_pair(None), "none");
    }

    #[test]
    fn test_ranked_exposure_orders_by_count_then_id() {
        let exposure: HashMap<ItemId, usize> =
            [("b", 2), ("a", 2), ("c", 5), ("d", 1)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let ranked = ranked_exposure(&exposure);
        assert_eq!(ranked, vec![("c", 5), ("a", 2), ("b", 2), ("d", 1)]);
    }

    #[test]
    fn test_exposure_ends_split_head_and_tail() {
        let items = vec![("a", 5), ("b", 4), ("c", 3), ("d", 2), ("e", 1)];
        let (most, least) = exposure_ends(&items, 2);
        assert_eq!(most, &[("a", 5), ("b", 4)]);
        assert_eq!(least, &[("d", 2), ("e", 1)]);
    }

    #[test]
    fn test_exposure_ends_never_overlap() {
        let items = vec![("a", 3), ("b", 2), ("c", 1)];
        let (most, least) = exposure_ends(&items, 2);
        assert_eq!(most, &[("a", 3), ("b", 2)]);
        assert_eq!(least, &[("c", 1)]);

        let (most, least) = exposure_ends(&items, 5);
        assert_eq!(most.len(), 3);
        assert!(least.is_empty());
    }

    #[test]
    fn test_write_triplets_jsonl_empty_view() {
        let view = TrainingView::default();
        let mut buf = Vec::new();
        write_triplets_jsonl(&view, &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
