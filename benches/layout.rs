//! Tokenizer and layout performance benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{Criterion, criterion_group, criterion_main};
use richtext::{
    Align, BuiltinEmoji, CellMetrics, DrawContext, LinkValidator, ParseContext, ParseOptions,
    RecordingSurface, RichText, TextStyle,
};
use std::hint::black_box;
use std::sync::Arc;

const SHORT: &str = "see http://example.com today";
const PARAGRAPH: &str = "The quick brown fox jumps over the lazy dog near \
    example.com, writes to a.b@example.org, and keeps going until the line \
    wraps a few times at any reasonable width. שלום עולם 😀 and back again.";

fn style() -> TextStyle {
    TextStyle::new(Arc::new(CellMetrics::default()))
}

fn long_message() -> String {
    let mut out = String::new();
    for _ in 0..50 {
        out.push_str(PARAGRAPH);
        out.push('\n');
    }
    out
}

fn parse(c: &mut Criterion) {
    let validator = LinkValidator::new();
    let ctx = ParseContext::new(&validator, &BuiltinEmoji);
    let options = ParseOptions::default();
    let long = long_message();

    c.bench_function("parse_short", |b| {
        b.iter(|| {
            let mut text = RichText::new(style());
            text.set_text(&ctx, black_box(SHORT), &options);
            text
        });
    });

    c.bench_function("parse_long", |b| {
        b.iter(|| {
            let mut text = RichText::new(style());
            text.set_text(&ctx, black_box(&long), &options);
            text
        });
    });
}

fn measure(c: &mut Criterion) {
    let validator = LinkValidator::new();
    let ctx = ParseContext::new(&validator, &BuiltinEmoji);
    let mut text = RichText::new(style());
    text.set_text(&ctx, &long_message(), &ParseOptions::default());

    c.bench_function("count_height_narrow", |b| {
        b.iter(|| black_box(&text).count_height(black_box(200)));
    });

    c.bench_function("count_height_wide", |b| {
        b.iter(|| black_box(&text).count_height(black_box(1200)));
    });
}

fn paint(c: &mut Criterion) {
    let validator = LinkValidator::new();
    let ctx = ParseContext::new(&validator, &BuiltinEmoji);
    let mut text = RichText::new(style());
    text.set_text(&ctx, &long_message(), &ParseOptions::default());
    let draw_ctx = DrawContext::new(0, 0, 400);

    c.bench_function("draw_full", |b| {
        b.iter(|| {
            let mut surface = RecordingSurface::new();
            text.draw(&mut surface, black_box(&draw_ctx));
            surface
        });
    });

    c.bench_function("draw_elided_three_lines", |b| {
        b.iter(|| {
            let mut surface = RecordingSurface::new();
            text.draw_elided(&mut surface, black_box(&draw_ctx), 3, 0);
            surface
        });
    });
}

fn hit_test(c: &mut Criterion) {
    let validator = LinkValidator::new();
    let ctx = ParseContext::new(&validator, &BuiltinEmoji);
    let mut text = RichText::new(style());
    text.set_text(&ctx, &long_message(), &ParseOptions::default());

    c.bench_function("symbol_at", |b| {
        b.iter(|| black_box(&text).symbol_at(black_box(123), black_box(77), 400, Align::Left));
    });

    c.bench_function("state_at", |b| {
        b.iter(|| black_box(&text).state_at(black_box(123), black_box(77), 400, Align::Left));
    });
}

criterion_group!(benches, parse, measure, paint, hit_test);
criterion_main!(benches);
