//! Criterion benchmarks for hand ordering.
//!
//! A client re-sorts its hand on every `gameStateUpdate`, so sorting a full
//! 13-card hand must stay far below a frame budget.
//!
//! Run with:
//! ```bash
//! cargo bench --package big2-core --bench card_bench
//! ```

use big2_core::domain::card::{sort_by_rank, sort_by_suit, Card};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Every fourth card of the deck, reversed, so sorting has work to do.
fn make_hand() -> Vec<Card> {
    let mut hand: Vec<Card> = Card::full_deck().into_iter().step_by(4).collect();
    hand.reverse();
    hand
}

fn make_reversed_deck() -> Vec<Card> {
    let mut deck = Card::full_deck();
    deck.reverse();
    deck
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_sorting(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    let fixtures = [("hand_13", make_hand()), ("deck_52", make_reversed_deck())];

    for (name, cards) in &fixtures {
        group.bench_with_input(BenchmarkId::new("by_rank", name), cards, |b, cards| {
            b.iter(|| {
                let mut cards = cards.clone();
                sort_by_rank(black_box(&mut cards));
                cards
            })
        });
        group.bench_with_input(BenchmarkId::new("by_suit", name), cards, |b, cards| {
            b.iter(|| {
                let mut cards = cards.clone();
                sort_by_suit(black_box(&mut cards));
                cards
            })
        });
    }
    group.finish();
}

fn bench_parse_card(c: &mut Criterion) {
    c.bench_function("parse_card_10h", |b| b.iter(|| black_box("10♥").parse::<Card>()));
}

criterion_group!(benches, bench_sorting, bench_parse_card);
criterion_main!(benches);
