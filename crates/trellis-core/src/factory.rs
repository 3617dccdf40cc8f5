//! Widget construction by name, for building trees from data.

use std::collections::HashMap;

use crate::{
    Result,
    error::Error,
    state::NodeName,
    widget::Widget,
};

/// A construction parameter passed to a widget factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A numeric parameter.
    Float(f32),
    /// A text parameter.
    Text(String),
    /// A boolean parameter.
    Flag(bool),
}

impl Param {
    /// The numeric value, or an invalid-input error.
    pub fn float(&self) -> Result<f32> {
        match self {
            Param::Float(v) => Ok(*v),
            other => Err(Error::Invalid(format!("expected a float, got {other:?}"))),
        }
    }

    /// The text value, or an invalid-input error.
    pub fn text(&self) -> Result<&str> {
        match self {
            Param::Text(v) => Ok(v),
            other => Err(Error::Invalid(format!("expected text, got {other:?}"))),
        }
    }

    /// The boolean value, or an invalid-input error.
    pub fn flag(&self) -> Result<bool> {
        match self {
            Param::Flag(v) => Ok(*v),
            other => Err(Error::Invalid(format!("expected a flag, got {other:?}"))),
        }
    }
}

/// Constructs widgets from parameters. Implemented automatically for
/// plain functions and closures of the right shape.
pub trait WidgetFactory {
    /// Build a widget instance. Parameter mismatches are reported as
    /// [`Error::Invalid`].
    fn build(&self, params: &[Param]) -> Result<Box<dyn Widget>>;
}

impl<F> WidgetFactory for F
where
    F: Fn(&[Param]) -> Result<Box<dyn Widget>>,
{
    fn build(&self, params: &[Param]) -> Result<Box<dyn Widget>> {
        self(params)
    }
}

/// A registry of widget factories keyed by node name.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<NodeName, Box<dyn WidgetFactory>>,
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. The name is munged into the standard node name
    /// format; registering the same name again replaces the old factory.
    pub fn register(&mut self, name: &str, factory: impl WidgetFactory + 'static) {
        self.factories
            .insert(NodeName::convert(name), Box::new(factory));
    }

    /// Is a factory registered under this name?
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&NodeName::convert(name))
    }

    /// Build a widget by registered name.
    pub fn build(&self, name: &str, params: &[Param]) -> Result<Box<dyn Widget>> {
        let name = NodeName::convert(name);
        let factory = self
            .factories
            .get(&name)
            .ok_or_else(|| Error::Invalid(format!("no factory registered for '{name}'")))?;
        factory.build(params)
    }
}
