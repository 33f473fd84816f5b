//! HighlightPass: applies a matcher to a fixed list of text nodes, one batch
//! per animation frame
//!
//! Nodes are re-checked right before mutation since the page may have moved
//! or hidden them since the scan. Within a node the matches are wrapped from
//! the last to the first so earlier offsets stay valid.

use std::rc::Rc;

use log::{debug, warn};

use crate::config::{AnnotatorConfig, Endpoints};
use crate::dom::{Dom, LinkId, LinkSpec, TextScanner};
use crate::highlight::matcher::TermMatcher;

/// Shared attributes for every generated link
#[derive(Debug, Clone)]
pub struct LinkTemplate {
    endpoints: Endpoints,
    class: String,
    processed_attribute: String,
}

impl LinkTemplate {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            endpoints: config.endpoints(),
            class: config.link_class.clone(),
            processed_attribute: config.processed_attribute.clone(),
        }
    }

    pub fn spec(&self, id: LinkId, term: &str) -> LinkSpec<'_> {
        LinkSpec {
            id,
            href: self.endpoints.article_url(term),
            class: &self.class,
            processed_attribute: &self.processed_attribute,
        }
    }
}

/// Monotonic link id source for one page
#[derive(Debug, Default)]
pub struct LinkIds {
    next: u32,
}

impl LinkIds {
    pub fn allocate(&mut self) -> LinkId {
        self.next += 1;
        LinkId(self.next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedLink<N> {
    pub id: LinkId,
    pub node: N,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<N> {
    pub links: Vec<HighlightedLink<N>>,
    pub nodes_visited: usize,
    pub done: bool,
}

pub struct HighlightPass<N> {
    generation: u64,
    matcher: Rc<TermMatcher>,
    nodes: Vec<N>,
    cursor: usize,
}

impl<N: Clone + PartialEq + std::fmt::Debug> HighlightPass<N> {
    pub fn new(generation: u64, matcher: Rc<TermMatcher>, nodes: Vec<N>) -> Self {
        Self {
            generation,
            matcher,
            nodes,
            cursor: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remaining(&self) -> usize {
        self.nodes.len() - self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    /// Process the next `batch_size` nodes
    pub fn run_batch<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        scanner: &TextScanner,
        template: &LinkTemplate,
        ids: &mut LinkIds,
        batch_size: usize,
    ) -> BatchReport<N> {
        let end = (self.cursor + batch_size.max(1)).min(self.nodes.len());
        let mut links = Vec::new();

        for node in &self.nodes[self.cursor..end] {
            if !scanner.accepts(&*dom, node) {
                continue;
            }
            let Some(text) = dom.text(node) else {
                continue;
            };
            let matches = self.matcher.find_all(&text);
            if matches.is_empty() {
                continue;
            }

            // Ids follow reading order even though wrapping runs backwards
            let planned: Vec<_> = matches.into_iter().map(|m| (ids.allocate(), m)).collect();
            let mut wrapped = Vec::with_capacity(planned.len());
            for (id, m) in planned.into_iter().rev() {
                match dom.wrap_text(node, m.start..m.end, &template.spec(id, &m.term)) {
                    Ok(link) => wrapped.push(HighlightedLink {
                        id,
                        node: link,
                        term: m.term,
                    }),
                    Err(e) => {
                        warn!("[HighlightPass] could not wrap '{}' in {:?}: {}", m.term, node, e);
                        break;
                    }
                }
            }
            wrapped.reverse();
            links.extend(wrapped);
        }

        let visited = end - self.cursor;
        self.cursor = end;
        debug!(
            "[HighlightPass] generation {}: {} nodes, {} links, {} remaining",
            self.generation,
            visited,
            links.len(),
            self.remaining()
        );

        BatchReport {
            links,
            nodes_visited: visited,
            done: self.is_done(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
