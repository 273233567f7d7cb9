//! In-memory build descriptor tree.
//!
//! The tree keeps elements, attributes, text, comments and processing
//! instructions, with comments and instructions in document order relative to
//! sibling elements. Every mutation
//! used by the generator goes through [`ManifestNode::find_or_create_section`]
//! and [`ManifestNode::upsert_repeatable_entry`], so touching the same section
//! or coordinate twice never produces a duplicate element.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use crate::coordinate::Coordinate;
use crate::error::PomsmithError;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const INDENT_WIDTH: usize = 4;

/// Non-element markup. `DocType` only ever appears in the prolog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    Comment(String),
    Instruction(String),
    DocType(String),
}

impl Markup {
    fn write(&self, out: &mut String, pad: &str) {
        let _ = match self {
            Markup::Comment(comment) => writeln!(out, "{pad}<!-- {comment} -->"),
            Markup::Instruction(instruction) => writeln!(out, "{pad}<?{instruction}?>"),
            Markup::DocType(doctype) => writeln!(out, "{pad}<!DOCTYPE {doctype}>"),
        };
    }
}

/// Position of one piece of element content. `Element` indexes `children`.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot {
    Element(usize),
    Markup(Markup),
}

/// One element of the descriptor. Children are owned; there is no sharing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<ManifestNode>,
    layout: Vec<Slot>,
}

impl ManifestNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.markup().filter_map(|markup| match markup {
            Markup::Comment(comment) => Some(comment.as_str()),
            _ => None,
        })
    }

    pub fn instructions(&self) -> impl Iterator<Item = &str> {
        self.markup().filter_map(|markup| match markup {
            Markup::Instruction(instruction) => Some(instruction.as_str()),
            _ => None,
        })
    }

    fn markup(&self) -> impl Iterator<Item = &Markup> {
        self.layout.iter().filter_map(|slot| match slot {
            Slot::Markup(markup) => Some(markup),
            Slot::Element(_) => None,
        })
    }

    pub fn children(&self) -> &[ManifestNode] {
        &self.children
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Sets or replaces an attribute, keeping the original position on replace.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Appends a comment after the current children.
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into().trim().to_string();
        self.layout.push(Slot::Markup(Markup::Comment(comment)));
    }

    fn push_child(&mut self, node: ManifestNode) -> usize {
        let idx = self.children.len();
        self.children.push(node);
        self.layout.push(Slot::Element(idx));
        idx
    }

    pub fn find_child(&self, name: &str) -> Option<&ManifestNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut ManifestNode> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find_child(name).and_then(ManifestNode::text)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ManifestNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Appends a new child. Never checks for an existing child of that name.
    pub fn insert_child(&mut self, name: &str, text: Option<&str>) -> &mut ManifestNode {
        let node = match text {
            Some(text) => ManifestNode::with_text(name, text),
            None => ManifestNode::new(name),
        };
        let idx = self.push_child(node);
        &mut self.children[idx]
    }

    /// Returns the first child called `name`, appending an empty one if absent.
    pub fn find_or_create_section(&mut self, name: &str) -> &mut ManifestNode {
        match self.children.iter().position(|child| child.name == name) {
            Some(idx) => &mut self.children[idx],
            None => self.insert_child(name, None),
        }
    }

    /// Overwrites the text of the first child called `name`, creating it if needed.
    pub fn set_child_text(&mut self, name: &str, text: &str) -> &mut ManifestNode {
        let child = self.find_or_create_section(name);
        child.set_text(text);
        child
    }

    /// Runs `build` against the first `name` child accepted by `matches`, or
    /// against a freshly appended one. Builders that use [`Self::set_child_text`]
    /// make repeated upserts converge on one entry holding the latest values.
    pub fn upsert_repeatable_entry<P, B>(
        &mut self,
        name: &str,
        matches: P,
        build: B,
    ) -> &mut ManifestNode
    where
        P: Fn(&ManifestNode) -> bool,
        B: FnOnce(&mut ManifestNode),
    {
        let idx = match self
            .children
            .iter()
            .position(|child| child.name == name && matches(child))
        {
            Some(idx) => idx,
            None => self.push_child(ManifestNode::new(name)),
        };
        let entry = &mut self.children[idx];
        build(entry);
        entry
    }

    /// True when this entry carries exactly the given groupId and artifactId.
    pub fn is_entry_for(&self, coordinate: &Coordinate) -> bool {
        self.child_text("groupId") == Some(coordinate.group_id())
            && self.child_text("artifactId") == Some(coordinate.artifact_id())
    }

    fn has_element_content(&self) -> bool {
        !self.layout.is_empty()
    }
}

/// Predicate for [`ManifestNode::upsert_repeatable_entry`] keyed by coordinate.
pub fn entry_for(coordinate: &Coordinate) -> impl Fn(&ManifestNode) -> bool + '_ {
    move |node| node.is_entry_for(coordinate)
}

/// A descriptor document: an optional root plus the markup around it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestDocument {
    prolog: Vec<Markup>,
    root: Option<ManifestNode>,
    epilog: Vec<Markup>,
}

impl ManifestDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new empty root element, replacing any previous one.
    pub fn create_root(&mut self, name: &str) -> &mut ManifestNode {
        self.root.insert(ManifestNode::new(name))
    }

    pub fn root(&self) -> Option<&ManifestNode> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut ManifestNode> {
        self.root.as_mut()
    }

    /// Comments, instructions and the doctype preceding the root.
    pub fn prolog(&self) -> &[Markup] {
        &self.prolog
    }

    /// Comments and instructions following the root.
    pub fn epilog(&self) -> &[Markup] {
        &self.epilog
    }

    /// Parses well-formed XML. Whitespace-only text is dropped; text of elements
    /// that also contain elements, comments or instructions is trimmed. The XML
    /// declaration is not kept since [`Self::to_xml`] always writes its own.
    pub fn parse(input: &str) -> Result<Self, PomsmithError> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut document = ManifestDocument::new();

        loop {
            let event = reader.read_event().map_err(|err| {
                malformed(format!(
                    "{err} (at byte {})",
                    reader.buffer_position()
                ))
            })?;
            match event {
                Event::Start(start) => {
                    if document.root.is_some() && stack.is_empty() {
                        return Err(malformed("content after the root element"));
                    }
                    stack.push(OpenElement::new(open_node(&start)?));
                }
                Event::Empty(start) => {
                    let node = open_node(&start)?;
                    document.attach(&mut stack, node)?;
                }
                Event::End(end) => {
                    let end_name = end.name();
                    let name = decode(end_name.as_ref())?;
                    let open = stack
                        .pop()
                        .ok_or_else(|| malformed(format!("unexpected closing tag </{name}>")))?;
                    if open.node.name != name {
                        return Err(malformed(format!(
                            "closing tag </{name}> does not match <{}>",
                            open.node.name
                        )));
                    }
                    document.attach(&mut stack, open.finish())?;
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|err| malformed(format!("invalid text content: {err}")))?;
                    push_text(&mut stack, &value)?;
                }
                Event::CData(data) => {
                    let value = decode(&data)?;
                    push_text(&mut stack, value)?;
                }
                Event::Comment(comment) => {
                    let value = decode(&comment)?.trim().to_string();
                    document.place(&mut stack, Markup::Comment(value));
                }
                Event::PI(instruction) => {
                    let value = decode(&instruction)?.trim().to_string();
                    document.place(&mut stack, Markup::Instruction(value));
                }
                Event::DocType(doctype) => {
                    if document.root.is_some() || !stack.is_empty() {
                        return Err(malformed("DOCTYPE after the start of the root element"));
                    }
                    let value = decode(&doctype)?.trim().to_string();
                    document.prolog.push(Markup::DocType(value));
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("element <{}> is never closed", open.node.name)));
        }
        if document.root.is_none() {
            return Err(malformed("document has no root element"));
        }
        Ok(document)
    }

    /// Serializes with an XML declaration and [`INDENT_WIDTH`] spaces per level.
    pub fn to_xml(&self) -> Result<String, PomsmithError> {
        let root = self.root.as_ref().ok_or_else(|| {
            PomsmithError::MalformedManifest(
                "cannot serialize a document without a root element".to_string(),
            )
        })?;

        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        for markup in &self.prolog {
            markup.write(&mut out, "");
        }
        write_node(&mut out, root, 0);
        for markup in &self.epilog {
            markup.write(&mut out, "");
        }
        Ok(out)
    }

    fn place(&mut self, stack: &mut [OpenElement], markup: Markup) {
        match stack.last_mut() {
            Some(open) => open.node.layout.push(Slot::Markup(markup)),
            None if self.root.is_none() => self.prolog.push(markup),
            None => self.epilog.push(markup),
        }
    }

    fn attach(
        &mut self,
        stack: &mut [OpenElement],
        node: ManifestNode,
    ) -> Result<(), PomsmithError> {
        if let Some(parent) = stack.last_mut() {
            parent.node.push_child(node);
            return Ok(());
        }
        if self.root.is_some() {
            return Err(malformed("document has more than one root element"));
        }
        self.root = Some(node);
        Ok(())
    }
}

struct OpenElement {
    node: ManifestNode,
    text: Vec<String>,
}

impl OpenElement {
    fn new(node: ManifestNode) -> Self {
        Self {
            node,
            text: Vec::new(),
        }
    }

    fn finish(mut self) -> ManifestNode {
        if self.text.is_empty() {
            return self.node;
        }
        let text = if self.node.has_element_content() {
            self.text
                .iter()
                .map(|segment| segment.trim())
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            self.text.concat()
        };
        if !text.is_empty() {
            self.node.text = Some(text);
        }
        self.node
    }
}

fn push_text(stack: &mut [OpenElement], value: &str) -> Result<(), PomsmithError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(open) => {
            open.text.push(value.to_string());
            Ok(())
        }
        None => Err(malformed("text outside of the root element")),
    }
}

fn open_node(start: &BytesStart<'_>) -> Result<ManifestNode, PomsmithError> {
    let mut node = ManifestNode::new(decode(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|err| malformed(format!("invalid attribute: {err}")))?;
        let key = decode(attribute.key.as_ref())?.to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| malformed(format!("invalid attribute value: {err}")))?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn decode(bytes: &[u8]) -> Result<&str, PomsmithError> {
    std::str::from_utf8(bytes).map_err(|err| malformed(format!("invalid UTF-8: {err}")))
}

fn malformed(message: impl Into<String>) -> PomsmithError {
    PomsmithError::MalformedManifest(message.into())
}

fn write_node(out: &mut String, node: &ManifestNode, depth: usize) {
    let pad = " ".repeat(depth * INDENT_WIDTH);
    let inner = " ".repeat((depth + 1) * INDENT_WIDTH);

    out.push_str(&pad);
    out.push('<');
    out.push_str(&node.name);
    for (key, value) in &node.attributes {
        let _ = write!(out, " {key}=\"{}\"", escape(value.as_str()));
    }

    if !node.has_element_content() {
        match &node.text {
            Some(text) => {
                let _ = writeln!(out, ">{}</{}>", partial_escape(text.as_str()), node.name);
            }
            None => out.push_str("/>\n"),
        }
        return;
    }

    out.push_str(">\n");
    if let Some(text) = &node.text {
        let _ = writeln!(out, "{inner}{}", partial_escape(text.trim()));
    }
    for slot in &node.layout {
        match slot {
            Slot::Element(idx) => write_node(out, &node.children[*idx], depth + 1),
            Slot::Markup(markup) => markup.write(out, &inner),
        }
    }
    let _ = writeln!(out, "{pad}</{}>", node.name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin_builder(version: &'static str) -> impl FnOnce(&mut ManifestNode) {
        move |plugin| {
            plugin.set_child_text("groupId", "org.jacoco");
            plugin.set_child_text("artifactId", "jacoco-maven-plugin");
            plugin.set_child_text("version", version);
        }
    }

    #[test]
    fn insert_child_always_appends() {
        let mut root = ManifestNode::new("project");
        root.insert_child("dependencies", None);
        root.insert_child("dependencies", None);
        assert_eq!(root.children_named("dependencies").count(), 2);
    }

    #[test]
    fn find_or_create_section_is_idempotent() {
        let mut root = ManifestNode::new("project");
        root.insert_child("modelVersion", Some("4.0.0"));
        root.find_or_create_section("build")
            .find_or_create_section("plugins");
        root.find_or_create_section("build")
            .find_or_create_section("plugins");

        assert_eq!(root.children().len(), 2);
        let build = root.find_child("build").unwrap();
        assert_eq!(build.children_named("plugins").count(), 1);
    }

    #[test]
    fn upsert_same_coordinate_twice_keeps_one_entry_with_latest_values() {
        let coordinate = Coordinate::new("org.jacoco", "jacoco-maven-plugin");
        let mut plugins = ManifestNode::new("plugins");
        plugins.upsert_repeatable_entry("plugin", entry_for(&coordinate), plugin_builder("0.8.11"));
        plugins
            .upsert_repeatable_entry("plugin", entry_for(&coordinate), |plugin| {
                plugin
                    .find_or_create_section("executions")
                    .insert_child("execution", None);
            });
        plugins.upsert_repeatable_entry("plugin", entry_for(&coordinate), plugin_builder("0.8.12"));

        let mut document = ManifestDocument::new();
        document.create_root("project").push_child(plugins);
        let xml = document.to_xml().unwrap();

        assert_eq!(xml.matches("<plugin>").count(), 1, "{xml}");
        assert!(xml.contains("<version>0.8.12</version>"), "{xml}");
        assert!(!xml.contains("0.8.11"), "{xml}");
        let plugin = document.root().unwrap().children()[0].find_child("plugin").unwrap();
        let names: Vec<_> = plugin.children().iter().map(ManifestNode::name).collect();
        assert_eq!(names, ["groupId", "artifactId", "version", "executions"]);
    }

    #[test]
    fn upsert_distinct_coordinates_appends_in_call_order() {
        let mut dependencies = ManifestNode::new("dependencies");
        for artifact in ["b", "a"] {
            let coordinate = Coordinate::new("g", artifact);
            dependencies.upsert_repeatable_entry("dependency", entry_for(&coordinate), |dep| {
                dep.set_child_text("groupId", coordinate.group_id());
                dep.set_child_text("artifactId", coordinate.artifact_id());
            });
        }
        let artifacts: Vec<_> = dependencies
            .children_named("dependency")
            .filter_map(|dep| dep.child_text("artifactId"))
            .collect();
        assert_eq!(artifacts, ["b", "a"]);
    }

    #[test]
    fn serializes_with_four_space_indent_comments_and_escaping() {
        let mut document = ManifestDocument::new();
        let root = document.create_root("project");
        root.set_attribute("xmlns", "http://maven.apache.org/POM/4.0.0");
        root.insert_child("description", Some("Tom & Jerry's <demo>"));
        let configuration = root.insert_child("configuration", None);
        configuration.add_comment("  TODO: Please add a configuration ");
        root.insert_child("empty", None);

        let xml = document.to_xml().unwrap();
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n",
            "    <description>Tom &amp; Jerry's &lt;demo&gt;</description>\n",
            "    <configuration>\n",
            "        <!-- TODO: Please add a configuration -->\n",
            "    </configuration>\n",
            "    <empty/>\n",
            "</project>\n",
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn reparsing_serialized_output_yields_the_same_tree() {
        let input = r#"<?xml version="1.0"?>
<!-- generated -->
<project a="1"><name>  spaced  </name><build><plugins><plugin><configuration><!-- note --></configuration></plugin></plugins></build><mixed>head<child/>tail</mixed></project>"#;
        let first = ManifestDocument::parse(input).unwrap();
        let second = ManifestDocument::parse(&first.to_xml().unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.prolog(), [Markup::Comment("generated".to_string())]);
        let root = first.root().unwrap();
        assert_eq!(root.child_text("name"), Some("  spaced  "));
        assert_eq!(root.child_text("mixed"), Some("head tail"));
    }

    #[test]
    fn keeps_instructions_doctype_and_trailing_comments_in_place() {
        let input = concat!(
            "<?xml version=\"1.0\"?>",
            "<!DOCTYPE project>",
            "<?xml-stylesheet href=\"pom.xsl\"?>",
            "<project><build><plugins><plugin>",
            "<?m2e execute onConfiguration?>",
            "<artifactId>x</artifactId>",
            "<!-- after artifact -->",
            "<version>1</version>",
            "</plugin></plugins></build></project>",
            "<!-- trailing -->",
            "<?m2e ignore?>",
        );
        let document = ManifestDocument::parse(input).unwrap();
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE project>\n",
            "<?xml-stylesheet href=\"pom.xsl\"?>\n",
            "<project>\n",
            "    <build>\n",
            "        <plugins>\n",
            "            <plugin>\n",
            "                <?m2e execute onConfiguration?>\n",
            "                <artifactId>x</artifactId>\n",
            "                <!-- after artifact -->\n",
            "                <version>1</version>\n",
            "            </plugin>\n",
            "        </plugins>\n",
            "    </build>\n",
            "</project>\n",
            "<!-- trailing -->\n",
            "<?m2e ignore?>\n",
        );
        let xml = document.to_xml().unwrap();
        assert_eq!(xml, expected);
        assert_eq!(ManifestDocument::parse(&xml).unwrap(), document);

        let plugin = document.root().unwrap().children()[0].children()[0].children()[0].clone();
        assert_eq!(plugin.instructions().collect::<Vec<_>>(), ["m2e execute onConfiguration"]);
        assert_eq!(plugin.comments().collect::<Vec<_>>(), ["after artifact"]);
        assert_eq!(
            document.epilog(),
            [
                Markup::Comment("trailing".to_string()),
                Markup::Instruction("m2e ignore".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_documents_that_are_not_well_formed() {
        let cases = [
            "<project><modelVersion>4.0.0</modelVersion><groupId>test</groupId></project",
            "<project><a></b></project>",
            "<project/><project/>",
            "stray<project/>",
            "<project><open></project>",
            "<!-- only a comment -->",
            "<project/><!DOCTYPE project>",
        ];
        for case in cases {
            let err = ManifestDocument::parse(case).unwrap_err();
            assert!(
                matches!(err, PomsmithError::MalformedManifest(_)),
                "{case} -> {err:?}"
            );
        }
    }

    #[test]
    fn serializing_without_root_is_an_error() {
        let err = ManifestDocument::new().to_xml().unwrap_err();
        assert!(matches!(err, PomsmithError::MalformedManifest(_)));
    }
}
