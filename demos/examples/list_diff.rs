// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional list diffing.
//!
//! Render a list, then re-render it with items appended, removed from the
//! middle, and replaced by a different kind, printing the commit report for
//! each pass. Children are matched by position, so removing an item from the
//! middle updates every following item and deletes the last one.
//!
//! Run:
//! - `cargo run -p understory_demos --example list_diff`

use tracing_subscriber::EnvFilter;
use understory_dom::Document;
use understory_fiber::{Element, Runtime};

fn list(items: &[&str]) -> Element {
    Element::host("ul")
        .children(items.iter().map(|item| Element::host("li").child(*item)))
        .build()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = Document::new();
    let root = doc.create_element("main");
    let mut rt = Runtime::new(doc);
    rt.mount(list(&["apple", "banana", "cherry"]), root);

    let steps: [(&str, Element); 4] = [
        ("append", list(&["apple", "banana", "cherry", "date"])),
        ("remove middle", list(&["apple", "cherry", "date"])),
        ("unchanged", list(&["apple", "cherry", "date"])),
        (
            "replace kind",
            Element::host("ol").child(Element::host("li").child("apple")).build(),
        ),
    ];

    let report = rt.run_until_idle().unwrap();
    println!("mount: {report:?}");
    println!("  {}", rt.host().to_markup(root));

    for (label, element) in steps {
        rt.render(element).unwrap();
        let report = rt.run_until_idle().unwrap();
        println!("{label}: {report:?}");
        println!("  {}", rt.host().to_markup(root));
        println!("  live host nodes: {}", rt.host().len());
    }
}
