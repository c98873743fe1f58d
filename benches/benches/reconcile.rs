// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dom::{Document, NodeId};
use understory_fiber::{Budget, Element, LoopStatus, Props, RenderCx, Runtime};

fn table(rows: usize, generation: usize) -> Element {
    Element::host("table")
        .children((0..rows).map(|i| {
            Element::host("tr")
                .prop("className", if i % 2 == 0 { "even" } else { "odd" })
                .child(Element::host("td").child(i.to_string()))
                .child(Element::host("td").child(format!("row {i} gen {generation}")))
                .build()
        }))
        .build()
}

fn mounted(element: Element) -> (Runtime<Document>, NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("main");
    let mut rt = Runtime::new(doc);
    rt.mount(element, root);
    rt.run_until_idle().unwrap();
    (rt, root)
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount");
    for &rows in &[100_usize, 1_000] {
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(format!("table_rows{rows}"), |b| {
            b.iter_batched(
                || table(rows, 0),
                |element| black_box(mounted(element)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerender");
    for &rows in &[100_usize, 1_000] {
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(format!("unchanged_rows{rows}"), |b| {
            b.iter_batched(
                || (mounted(table(rows, 0)).0, table(rows, 0)),
                |(mut rt, element)| {
                    rt.render(element).unwrap();
                    black_box(rt.run_until_idle().unwrap());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("all_text_changed_rows{rows}"), |b| {
            b.iter_batched(
                || (mounted(table(rows, 0)).0, table(rows, 1)),
                |(mut rt, element)| {
                    rt.render(element).unwrap();
                    black_box(rt.run_until_idle().unwrap());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("shrink_by_half_rows{rows}"), |b| {
            b.iter_batched(
                || (mounted(table(rows, 0)).0, table(rows / 2, 0)),
                |(mut rt, element)| {
                    rt.render(element).unwrap();
                    black_box(rt.run_until_idle().unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn counter(_: &Props, cx: &mut RenderCx<'_>) -> Element {
    let (count, set) = cx.use_state(0_u64);
    Element::host("button")
        .on("onClick", move || set.update(|c| c + 1))
        .child(count.to_string())
        .build()
}

fn bench_state_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_update");
    group.bench_function("counters100_click_one", |b| {
        b.iter_batched(
            || {
                mounted(
                    Element::host("div")
                        .children((0..100).map(|_| Element::component(counter)))
                        .build(),
                )
            },
            |(mut rt, root)| {
                let div = rt.host().children(root)[0];
                let button = rt.host().children(div)[50];
                rt.host().dispatch(button, "click").unwrap();
                black_box(rt.run_until_idle().unwrap());
            },
            BatchSize::SmallInput,
        );
    });
    // Slice the same pass into small budgets to measure resume overhead.
    group.bench_function("counters100_sliced_budget16", |b| {
        b.iter_batched(
            || {
                mounted(
                    Element::host("div")
                        .children((0..100).map(|_| Element::component(counter)))
                        .build(),
                )
            },
            |(mut rt, root)| {
                let div = rt.host().children(root)[0];
                let button = rt.host().children(div)[0];
                rt.host().dispatch(button, "click").unwrap();
                let mut slices = 0_u32;
                while let LoopStatus::Yielded = rt.work_loop(&Budget::new(16)).unwrap() {
                    slices += 1;
                }
                black_box(slices);
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_mount, bench_rerender, bench_state_update);
criterion_main!(benches);
