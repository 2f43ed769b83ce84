use markup5ever_rcdom::{Handle, NodeData};

use crate::dom_visitor::{walk, DomTraversalOperation, DomVisitor};

/// Attributes that point at other files, and the elements they do so on
const REFERENCE_ATTRIBUTES: &[(&str, &[&str])] = &[
  (
    "src",
    &[
      "script", "img", "audio", "video", "source", "track", "iframe", "embed",
    ],
  ),
  ("href", &["link", "a", "use"]),
  ("srcset", &["img", "source"]),
  ("poster", &["video"]),
  ("data", &["object"]),
];

/// `<meta>` tags whose `content` points at a file, keyed by the attribute naming the tag
const ASSET_METAS: &[(&str, &[&str])] = &[
  (
    "property",
    &[
      "og:image",
      "og:image:url",
      "og:image:secure_url",
      "og:audio",
      "og:audio:secure_url",
      "og:video",
      "og:video:secure_url",
    ],
  ),
  (
    "name",
    &[
      "twitter:image",
      "msapplication-square150x150logo",
      "msapplication-square310x310logo",
      "msapplication-square70x70logo",
      "msapplication-wide310x150logo",
      "msapplication-TileImage",
      "msapplication-config",
    ],
  ),
  (
    "itemprop",
    &[
      "image",
      "logo",
      "screenshot",
      "thumbnailUrl",
      "contentUrl",
      "downloadUrl",
    ],
  ),
];

/// A single location in a document that references another file
#[derive(Debug, PartialEq)]
pub struct HtmlReference<'a> {
  pub element: &'a str,
  pub attribute: &'a str,
  pub value: &'a str,
}

fn is_reference_attribute(element: &str, attribute: &str) -> bool {
  REFERENCE_ATTRIBUTES
    .iter()
    .any(|(name, elements)| *name == attribute && elements.contains(&element))
}

struct RewriteReferencesVisitor<F> {
  rewrite: F,
}

impl<F> DomVisitor for RewriteReferencesVisitor<F>
where
  F: FnMut(&HtmlReference<'_>) -> Option<String>,
{
  fn visit_node(&mut self, node: Handle) -> DomTraversalOperation {
    let NodeData::Element { name, attrs, .. } = &node.data else {
      return DomTraversalOperation::Continue;
    };

    let element: &str = &name.local;
    let mut attrs = attrs.borrow_mut();
    let is_asset_meta = element == "meta"
      && attrs.iter().any(|attribute| {
        ASSET_METAS.iter().any(|(key, values)| {
          &*attribute.name.local == *key && values.contains(&&*attribute.value)
        })
      });

    for attribute in attrs.iter_mut() {
      let attribute_name: &str = &attribute.name.local;
      let is_reference = if is_asset_meta {
        attribute_name == "content"
      } else {
        is_reference_attribute(element, attribute_name)
      };
      if !is_reference {
        continue;
      }

      let value = attribute.value.to_string();
      let rewritten = if attribute_name == "srcset" {
        rewrite_srcset(&value, |url| {
          (self.rewrite)(&HtmlReference {
            element,
            attribute: attribute_name,
            value: url,
          })
        })
      } else if value.trim().is_empty() {
        None
      } else {
        (self.rewrite)(&HtmlReference {
          element,
          attribute: attribute_name,
          value: &value,
        })
      };

      if let Some(rewritten) = rewritten {
        attribute.value = rewritten.into();
      }
    }

    DomTraversalOperation::Continue
  }
}

/// Rewrites the URL of every `srcset` candidate
///
/// Only the URLs change. Descriptors, separators and the whitespace around them are kept as
/// written.
fn rewrite_srcset(
  srcset: &str,
  mut rewrite: impl FnMut(&str) -> Option<String>,
) -> Option<String> {
  let mut changed = false;
  let mut output = String::with_capacity(srcset.len());

  for (index, candidate) in srcset.split(',').enumerate() {
    if index > 0 {
      output.push(',');
    }

    let url_start = candidate.len() - candidate.trim_start().len();
    let url_end = candidate[url_start..]
      .find(char::is_whitespace)
      .map_or(candidate.len(), |length| url_start + length);
    let url = &candidate[url_start..url_end];

    output.push_str(&candidate[..url_start]);
    match (!url.is_empty()).then(|| rewrite(url)).flatten() {
      Some(rewritten) => {
        changed = true;
        output.push_str(&rewritten);
      }
      None => output.push_str(url),
    }
    output.push_str(&candidate[url_end..]);
  }

  changed.then_some(output)
}

/// Visits every file reference in the document, in document order
///
/// Returning `Some` from `rewrite` replaces the referenced value in place.
pub fn rewrite_references<F>(document: Handle, rewrite: F)
where
  F: FnMut(&HtmlReference<'_>) -> Option<String>,
{
  let mut visitor = RewriteReferencesVisitor { rewrite };
  walk(document, &mut visitor);
}
