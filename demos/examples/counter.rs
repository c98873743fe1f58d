// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter.
//!
//! Mount a counter component into an in-memory document, drive the work loop
//! in short wall-clock slices, and click its buttons.
//!
//! Run:
//! - `cargo run -p understory_demos --example counter`
//! - `RUST_LOG=understory_fiber=trace cargo run -p understory_demos --example counter`

use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use understory_dom::{Document, NodeId};
use understory_fiber::{Deadline, Element, LoopStatus, PropValue, Props, RenderCx, Runtime};

/// Deadline for one idle slice, measured on the wall clock.
struct Slice {
    end: Instant,
}

impl Slice {
    fn new(length: Duration) -> Self {
        Self {
            end: Instant::now() + length,
        }
    }
}

impl Deadline for Slice {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

fn counter(props: &Props, cx: &mut RenderCx<'_>) -> Element {
    let start = match props.get("start") {
        Some(PropValue::Int(n)) => *n,
        _ => 0,
    };
    let (count, set) = cx.use_state(start);
    let dec = set.clone();
    Element::host("div")
        .prop("className", "counter")
        .child(Element::host("h1").child("Counter"))
        .child(
            Element::host("button")
                .prop("id", "inc")
                .on("onClick", move || set.update(|c| c + 1))
                .child("+"),
        )
        .child(
            Element::host("button")
                .prop("id", "dec")
                .on("onClick", move || dec.update(|c| c - 1))
                .child("-"),
        )
        .child(
            Element::host("p")
                .child("The count is ")
                .child(count),
        )
        .build()
}

/// Run slices until the runtime settles, as an idle callback would.
fn drive(rt: &mut Runtime<Document>) {
    let mut slices = 0;
    loop {
        match rt.work_loop(&Slice::new(Duration::from_millis(2))) {
            Ok(LoopStatus::Idle) => break,
            Ok(LoopStatus::Yielded) => slices += 1,
            Ok(LoopStatus::Committed(report)) => {
                slices += 1;
                println!("  committed after {slices} slice(s): {report:?}");
            }
            Err(err) => {
                eprintln!("  pass failed: {err}");
                break;
            }
        }
    }
}

fn button(rt: &Runtime<Document>, root: NodeId, id: &str) -> NodeId {
    rt.host()
        .find_all(root, "button")
        .into_iter()
        .find(|b| rt.host().attribute(*b, "id") == Some(id))
        .unwrap()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = Document::new();
    let root = doc.create_element("main");
    let mut rt = Runtime::new(doc);

    rt.mount(Element::component(counter).prop("start", 0_i64).build(), root);
    drive(&mut rt);
    println!("{}", rt.host().to_markup(root));
    let created = rt.host().created_count();

    for id in ["inc", "inc", "dec"] {
        println!("click #{id}");
        let target = button(&rt, root, id);
        rt.host().dispatch(target, "click").unwrap();
        drive(&mut rt);
        println!("{}", rt.host().to_markup(root));
    }

    let p = rt.host().find_all(root, "p")[0];
    assert_eq!(rt.host().text_content(p), "The count is 1");
    assert_eq!(
        rt.host().created_count(),
        created,
        "updates should reuse every host node"
    );
}
