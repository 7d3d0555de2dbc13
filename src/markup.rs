//! Redaction of markup (HTML) documents.
//!
//! Markup assets are not parts of a container, so there is no selective
//! removal: every image goes.

use std::sync::LazyLock;

use regex::Regex;

use crate::classify::{NodeClass, classify};
use crate::dom::{Dom, NodeId, parse_html, write_html};
use crate::error::{NodeError, NodeWarning};
use crate::redact::{Counters, RedactionOptions};
use crate::rules::RuleSet;

/// Part name reported in warnings for single-part documents.
pub const DOCUMENT_PART: &str = "<document>";

/// `background-image` declarations, with their terminating semicolon.
static BACKGROUND_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)background-image\s*:[^;]*;?").unwrap());

/// Elements whose text is code, not prose.
const CODE_ELEMENTS: &[&str] = &["script", "style", "template"];

/// A redacted markup document.
#[derive(Debug, Clone)]
pub struct MarkupRedaction {
    pub html: String,
    pub counters: Counters,
    pub warnings: Vec<NodeWarning>,
}

/// Redact a markup document.
pub fn redact_markup(source: &str, rules: &RuleSet, options: &RedactionOptions) -> MarkupRedaction {
    let mut dom = parse_html(source);
    let mut pass = MarkupPass {
        dom: &mut dom,
        counters: Counters::default(),
        warnings: Vec::new(),
    };

    if options.strip_images {
        pass.remove_images();
        pass.strip_background_images();
    }
    if options.strip_hyperlinks {
        pass.unwrap_links();
    }
    pass.substitute_text(rules);

    let MarkupPass {
        counters, warnings, ..
    } = pass;
    MarkupRedaction {
        html: write_html(&dom),
        counters,
        warnings,
    }
}

struct MarkupPass<'a> {
    dom: &'a mut Dom,
    counters: Counters,
    warnings: Vec<NodeWarning>,
}

impl MarkupPass<'_> {
    fn guard<T>(&mut self, step: &'static str, result: Result<T, NodeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(step, error = %e, "skipped node");
                self.warnings
                    .push(NodeWarning::new(DOCUMENT_PART, step, e.to_string()));
                None
            }
        }
    }

    fn remove_images(&mut self) {
        let images = self.dom.find_all(self.dom.document(), |dom, id| {
            classify(dom, id) == NodeClass::Image
                && !dom.ancestors(id).any(|a| classify(dom, a) == NodeClass::Image)
        });
        for image in images {
            let result = self.dom.detach(image);
            if self.guard("remove_images", result).is_some() {
                self.counters.images_removed += 1;
            }
        }
    }

    fn strip_background_images(&mut self) {
        let styled = self
            .dom
            .find_all(self.dom.document(), |dom, id| dom.attr(id, "style").is_some());
        for node in styled {
            let Some(style) = self.dom.attr(node, "style") else {
                continue;
            };
            if let Some(cleaned) = strip_background_image(style) {
                let result = self.dom.set_attr(node, "style", &cleaned);
                if self.guard("remove_images", result).is_some() {
                    self.counters.images_removed += 1;
                }
            }
        }

        let sheets = self.dom.find_local(self.dom.document(), "style");
        for sheet in sheets {
            let texts: Vec<_> = self
                .dom
                .children(sheet)
                .filter(|&c| self.dom.is_text(c))
                .collect();
            for text in texts {
                let Some(cleaned) = self.dom.text(text).and_then(strip_background_image) else {
                    continue;
                };
                let result = self.dom.set_text(text, &cleaned);
                if self.guard("remove_images", result).is_some() {
                    self.counters.images_removed += 1;
                }
            }
        }
    }

    fn unwrap_links(&mut self) {
        let links = self.dom.find_all(self.dom.document(), |dom, id| {
            classify(dom, id) == NodeClass::Hyperlink
        });
        for link in links {
            let result = self.dom.unwrap(link);
            if self.guard("unwrap_hyperlinks", result).is_some() {
                self.counters.hyperlinks_removed += 1;
            }
        }
    }

    fn substitute_text(&mut self, rules: &RuleSet) {
        if rules.is_empty() {
            return;
        }
        let texts = self.dom.find_all(self.dom.document(), |dom, id| {
            dom.is_text(id) && !in_code(dom, id)
        });
        for text in texts {
            let Some(original) = self.dom.text(text) else {
                continue;
            };
            let substitution = rules.apply(original);
            if substitution.count == 0 {
                continue;
            }
            let result = self.dom.set_text(text, &substitution.text);
            if self.guard("substitute_text", result).is_some() {
                self.counters.text_replacements += substitution.count;
            }
        }
    }
}

fn in_code(dom: &Dom, id: NodeId) -> bool {
    dom.ancestors(id).any(|a| {
        dom.local_name(a)
            .is_some_and(|l| CODE_ELEMENTS.contains(&l.to_ascii_lowercase().as_str()))
    })
}

/// Remove `background-image` declarations; `None` when there are none.
fn strip_background_image(css: &str) -> Option<String> {
    BACKGROUND_IMAGE_RE
        .is_match(css)
        .then(|| BACKGROUND_IMAGE_RE.replace_all(css, "").into_owned())
}
