// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable element descriptions: kinds, property values, and the builder.
//!
//! An [`Element`] is what client code produces and what the reconciler diffs
//! against the committed fiber tree. Elements are cheap to clone; their
//! properties and children are reference counted and never mutated.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::hooks::RenderCx;

/// Property key carrying the payload of a text element.
pub const NODE_VALUE: &str = "nodeValue";

/// Event handler attached through an `on<Event>` property.
///
/// Handlers compare by pointer identity: two handlers are equal only if they
/// share the same allocation. A component that builds a fresh closure on each
/// render therefore re-registers its listener on each commit.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn()>);

impl EventHandler {
    /// Wrap a callback.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.0)();
    }

    /// The shared callback, for hosts that store listeners themselves.
    pub fn callback(&self) -> &Rc<dyn Fn()> {
        &self.0
    }
}

impl From<Rc<dyn Fn()>> for EventHandler {
    fn from(f: Rc<dyn Fn()>) -> Self {
        Self(f)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventHandler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// A property value.
///
/// Equality is shallow: scalars compare by value and handlers by identity.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string.
    Str(String),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An event handler.
    Handler(EventHandler),
}

impl PropValue {
    /// Returns the string payload, if this is a [`PropValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the handler, if this is a [`PropValue::Handler`].
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for PropValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<EventHandler> for PropValue {
    fn from(h: EventHandler) -> Self {
        Self::Handler(h)
    }
}

/// Property mapping of an element. Key order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(BTreeMap<String, PropValue>);

impl Props {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.0.get(key)
    }

    /// Look up a string property.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_str)
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Signature of a component render function.
pub type RenderFn = dyn Fn(&Props, &mut RenderCx<'_>) -> Element;

/// A component: a render function plus the identity used to match it across renders.
///
/// Identity is the Rust type of the function or closure passed to
/// [`Component::new`]. Each `fn` item and each closure expression has its own
/// type, so elements built from the same function match and elements built from
/// different functions do not. Coercing to a `fn` pointer first erases that
/// distinction; pass the function item itself.
#[derive(Clone)]
pub struct Component {
    id: TypeId,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    /// Wrap a render function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Props, &mut RenderCx<'_>) -> Element + 'static,
    {
        Self {
            id: TypeId::of::<F>(),
            name: core::any::type_name::<F>(),
            render: Rc::new(f),
        }
    }

    /// Type name of the render function, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Props, cx: &mut RenderCx<'_>) -> Element {
        (self.render)(props, cx)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What an element describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    /// A host node with the given tag name.
    Host(String),
    /// A text node; its payload lives under [`NODE_VALUE`].
    Text,
    /// A component rendered by the runtime.
    Component(Component),
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        Self::Host(tag.to_string())
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        Self::Host(tag)
    }
}

impl From<Component> for ElementKind {
    fn from(c: Component) -> Self {
        Self::Component(c)
    }
}

/// Immutable description of one UI node and its children.
#[derive(Clone, Debug)]
pub struct Element {
    kind: ElementKind,
    props: Rc<Props>,
    children: Rc<[Element]>,
}

impl Element {
    /// Build a text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Text,
            props: Rc::new(Props::new().with(NODE_VALUE, text.into())),
            children: Rc::from([]),
        }
    }

    /// Start building a host element.
    pub fn host(tag: &str) -> ElementBuilder {
        ElementBuilder::new(tag)
    }

    /// Start building a component element.
    pub fn component<F>(f: F) -> ElementBuilder
    where
        F: Fn(&Props, &mut RenderCx<'_>) -> Element + 'static,
    {
        ElementBuilder::new(Component::new(f))
    }

    /// The element kind.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The element properties.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The element children, with bare text already normalized.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Text payload of a text element.
    pub fn text_value(&self) -> Option<&str> {
        match self.kind {
            ElementKind::Text => self.props.get_str(NODE_VALUE),
            _ => None,
        }
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        self.props.clone()
    }

    pub(crate) fn shared_children(&self) -> Rc<[Self]> {
        self.children.clone()
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<i64> for Element {
    fn from(i: i64) -> Self {
        Self::text(i.to_string())
    }
}

impl From<i32> for Element {
    fn from(i: i32) -> Self {
        Self::text(i.to_string())
    }
}

impl From<ElementBuilder> for Element {
    fn from(b: ElementBuilder) -> Self {
        b.build()
    }
}

/// Build an element from a kind, a property mapping, and ordered children.
///
/// Children convertible from text (`&str`, `String`, integers) become text elements.
pub fn create_element<C>(
    kind: impl Into<ElementKind>,
    props: Props,
    children: impl IntoIterator<Item = C>,
) -> Element
where
    C: Into<Element>,
{
    let kind = kind.into();
    let children: Vec<Element> = match kind {
        // Text elements carry a payload, never children.
        ElementKind::Text => Vec::new(),
        _ => children.into_iter().map(Into::into).collect(),
    };
    Element {
        kind,
        props: Rc::new(props),
        children: children.into(),
    }
}

/// Fluent builder for [`Element`].
#[derive(Debug)]
pub struct ElementBuilder {
    kind: ElementKind,
    props: Props,
    children: Vec<Element>,
}

impl ElementBuilder {
    /// Start a builder for the given kind.
    pub fn new(kind: impl Into<ElementKind>) -> Self {
        Self {
            kind: kind.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Set a property.
    #[must_use]
    pub fn prop(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Attach an event handler under an `on<Event>` key, e.g. `onClick`.
    #[must_use]
    pub fn on(self, key: &str, f: impl Fn() + 'static) -> Self {
        self.handler(key, EventHandler::new(f))
    }

    /// Attach an existing handler under an `on<Event>` key.
    #[must_use]
    pub fn handler(self, key: &str, handler: EventHandler) -> Self {
        self.prop(key, handler)
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children<C: Into<Element>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Finish the element.
    pub fn build(self) -> Element {
        create_element(self.kind, self.props, self.children)
    }
}
