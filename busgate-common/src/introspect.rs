use roxmltree::Document;

use crate::{Error, Result};

/// One node of the introspection tree. Child nodes usually arrive as
/// name-only stubs to be introspected separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub interfaces: Vec<Interface>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interface {
    pub name: String,
    pub methods: Vec<Method>,
    pub properties: Vec<Property>,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Method {
    pub name: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    pub name: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: String,
    pub signature: String,
    pub access: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: String,
    pub signature: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Parses a bus introspection document.
pub fn parse(xml: &str) -> Result<Node> {
    let document = Document::parse(xml).map_err(|e| Error::IntrospectionParse(e.to_string()))?;
    let root = document.root_element();

    if !root.has_tag_name("node") {
        return Err(Error::IntrospectionParse(format!(
            "expected a root <node>, got <{}>",
            root.tag_name().name()
        )));
    }

    Ok(parse_node(root))
}

fn parse_node(element: roxmltree::Node<'_, '_>) -> Node {
    let mut node = Node {
        name: attribute(element, "name"),
        ..Default::default()
    };

    for child in element.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "node" => node.children.push(parse_node(child)),
            "interface" => node.interfaces.push(parse_interface(child)),
            _ => (),
        }
    }

    node
}

fn parse_interface(element: roxmltree::Node<'_, '_>) -> Interface {
    let mut interface = Interface {
        name: attribute(element, "name"),
        ..Default::default()
    };

    for child in element.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "method" => interface.methods.push(Method {
                name: attribute(child, "name"),
                args: parse_args(child, Direction::In),
            }),
            "signal" => interface.signals.push(Signal {
                name: attribute(child, "name"),
                args: parse_args(child, Direction::Out),
            }),
            "property" => interface.properties.push(Property {
                name: attribute(child, "name"),
                signature: attribute(child, "type"),
                access: attribute(child, "access"),
            }),
            _ => (),
        }
    }

    interface
}

// Method args default to "in", signal args to "out", per the
// introspection DTD
fn parse_args(element: roxmltree::Node<'_, '_>, default_direction: Direction) -> Vec<Arg> {
    element
        .children()
        .filter(|child| child.is_element() && child.has_tag_name("arg"))
        .map(|arg| Arg {
            name: attribute(arg, "name"),
            signature: attribute(arg, "type"),
            direction: match arg.attribute("direction") {
                Some("in") => Direction::In,
                Some("out") => Direction::Out,
                _ => default_direction,
            },
        })
        .collect()
}

fn attribute(element: roxmltree::Node<'_, '_>, name: &str) -> String {
    element.attribute(name).unwrap_or_default().to_owned()
}

