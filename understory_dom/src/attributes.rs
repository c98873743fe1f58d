// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Known attribute names and the renames applied before writing them.
//!
//! Reconcilers route a property key to `set_attribute` only when it names a
//! recognized attribute. Anything else is written onto the node object as a
//! property instead.

/// Attribute names recognized as host-visible attributes.
const KNOWN: &[&str] = &[
    "accept",
    "accessKey",
    "action",
    "alt",
    "autoComplete",
    "autoFocus",
    "checked",
    "className",
    "class",
    "colSpan",
    "cols",
    "content",
    "contentEditable",
    "dir",
    "disabled",
    "download",
    "draggable",
    "for",
    "form",
    "height",
    "hidden",
    "href",
    "htmlFor",
    "id",
    "lang",
    "list",
    "max",
    "maxLength",
    "method",
    "min",
    "minLength",
    "multiple",
    "name",
    "pattern",
    "placeholder",
    "readOnly",
    "rel",
    "required",
    "role",
    "rowSpan",
    "rows",
    "selected",
    "size",
    "span",
    "spellCheck",
    "src",
    "start",
    "step",
    "style",
    "tabIndex",
    "target",
    "title",
    "type",
    "value",
    "width",
    "wrap",
];

/// Returns true if `name` is a recognized attribute.
///
/// `data-*` and `aria-*` names are always recognized.
pub fn is_known_attribute(name: &str) -> bool {
    if name.starts_with("data-") || name.starts_with("aria-") {
        return true;
    }
    KNOWN.iter().any(|k| *k == name)
}

/// Host attribute name for a property key (`className` → `class`, `htmlFor` → `for`).
pub fn attribute_name(key: &str) -> &str {
    match key {
        "className" => "class",
        "htmlFor" => "for",
        _ => key,
    }
}
