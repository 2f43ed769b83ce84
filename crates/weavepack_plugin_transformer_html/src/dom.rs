use std::cell::RefCell;
use std::rc::Rc;

use html5ever::namespace_url;
use markup5ever::{local_name, ns, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData};

use crate::attrs::Attrs;
use crate::dom_visitor::{walk, DomTraversalOperation, DomVisitor};

struct FindElementVisitor {
  name: LocalName,
  found: Option<Handle>,
}

impl DomVisitor for FindElementVisitor {
  fn visit_node(&mut self, node: Handle) -> DomTraversalOperation {
    match &node.data {
      NodeData::Element { name, .. } if name.local == self.name => {
        self.found = Some(node.clone());
        DomTraversalOperation::Stop
      }
      _ => DomTraversalOperation::Continue,
    }
  }
}

/// The first element with the given local name, in document order
pub fn find_element(root: &Handle, name: LocalName) -> Option<Handle> {
  let mut visitor = FindElementVisitor { name, found: None };
  walk(root.clone(), &mut visitor);
  visitor.found
}

pub fn create_element(name: LocalName, attributes: &[(LocalName, &str)]) -> Handle {
  let mut attrs = Vec::new();
  {
    let mut attrs = Attrs::new(&mut attrs);
    for (attribute, value) in attributes {
      attrs.set(
        markup5ever::ExpandedName {
          ns: &ns!(),
          local: attribute,
        },
        value,
      );
    }
  }

  Node::new(NodeData::Element {
    name: QualName::new(None, ns!(html), name),
    attrs: RefCell::new(attrs),
    template_contents: RefCell::new(None),
    mathml_annotation_xml_integration_point: false,
  })
}

pub fn append_child(parent: &Handle, child: Handle) {
  child.parent.set(Some(Rc::downgrade(parent)));
  parent.children.borrow_mut().push(child);
}

fn prepend_child(parent: &Handle, child: Handle) {
  child.parent.set(Some(Rc::downgrade(parent)));
  parent.children.borrow_mut().insert(0, child);
}

/// The document head, created as the first child of `<html>` when the document has none
pub fn find_or_create_head(document: &Handle) -> Handle {
  if let Some(head) = find_element(document, local_name!("head")) {
    return head;
  }

  let head = create_element(local_name!("head"), &[]);
  match find_element(document, local_name!("html")) {
    Some(html) => prepend_child(&html, head.clone()),
    None => prepend_child(document, head.clone()),
  }

  head
}

/// Detaches a node from its parent
pub fn remove_node(node: &Handle) {
  let Some(parent) = node.parent.take().and_then(|parent| parent.upgrade()) else {
    return;
  };

  parent
    .children
    .borrow_mut()
    .retain(|child| !Rc::ptr_eq(child, node));
}

#[cfg(test)]
mod test {
  use crate::{parse_html, serialize_html};

  use super::*;

  #[test]
  fn appends_to_the_existing_head() {
    let dom = parse_html(b"<html><head><title>t</title></head><body></body></html>").unwrap();

    let head = find_or_create_head(&dom.document);
    append_child(
      &head,
      create_element(
        local_name!("link"),
        &[
          (local_name!("rel"), "stylesheet"),
          (local_name!("href"), "/dist/a.css"),
        ],
      ),
    );

    let html = String::from_utf8(serialize_html(dom).unwrap()).unwrap();
    assert!(html
      .contains(r#"<head><title>t</title><link rel="stylesheet" href="/dist/a.css"></head>"#));
  }

  #[test]
  fn removes_nodes_from_their_parent() {
    let dom = parse_html(b"<html><body><p>a</p><p>b</p></body></html>").unwrap();

    let paragraph = find_element(&dom.document, local_name!("p")).unwrap();
    remove_node(&paragraph);

    let html = String::from_utf8(serialize_html(dom).unwrap()).unwrap();
    assert!(html.contains("<body><p>b</p></body>"));
  }
}
