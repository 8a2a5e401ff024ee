use criterion::{criterion_group, criterion_main, Criterion};
use moduleflow::classify::classify;
use moduleflow::generators::html::HtmlPageGenerator;
use moduleflow::layout::LayoutOverrides;
use moduleflow::module::RawModule;
use moduleflow::render::Dispatcher;
use moduleflow::template::TemplateRenderer;
use moduleflow::{ModuleFlow, PipelineOptions};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

/// Builds a synthetic page cycling through placements and variants, with a
/// share of invalid and unknown modules mixed in.
fn build_page(count: usize) -> Vec<RawModule> {
    let placements = ["header", "main", "main", "sidebar", "footer", "other"];
    (0..count)
        .map(|i| {
            let placement = placements[i % placements.len()];
            let value = match i % 5 {
                0 => json!({ "id": i, "type": "hero", "placement": placement, "title": format!("Hero {i}") }),
                1 => json!({ "id": i, "type": "text", "placement": placement, "body": "Some *markdown* text." }),
                2 => json!({
                    "id": i, "type": "stats", "placement": placement,
                    "stats": [{ "value": i, "label": "Items" }, { "value": "99%", "label": "Uptime" }]
                }),
                3 => json!({ "id": i, "type": "testimonials", "placement": placement, "testimonials": [] }),
                _ => json!({ "id": i, "type": "unsupported-future-type", "placement": placement }),
            };
            RawModule::new(value)
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let page = build_page(200);
    c.bench_function("classify_200_modules", |b| {
        b.iter(|| {
            for module in &page {
                let _ = black_box(classify(black_box(module)));
            }
        })
    });
}

fn bench_render_document(c: &mut Criterion) {
    let page = build_page(200);
    let renderer = TemplateRenderer::new().expect("built-in templates compile");
    let flow = ModuleFlow::new(PipelineOptions::default(), Dispatcher::new(Arc::new(renderer)));
    let overrides = LayoutOverrides::new().with("sidebar", "1/4");
    let generator = HtmlPageGenerator::default();

    c.bench_function("render_document_200_modules", |b| {
        b.iter(|| {
            let html = flow
                .render_document(black_box(&page), &overrides, &generator)
                .expect("page renders");
            black_box(html.len())
        })
    });
}

criterion_group!(benches, bench_classify, bench_render_document);
criterion_main!(benches);
