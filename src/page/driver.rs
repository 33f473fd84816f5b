use std::cell::RefCell;

use crate::dom::Dom;
use crate::page::annotator::{Followup, PageAnnotator};
use crate::page::host::Host;

/// Resolve one [`Followup`] and feed the result back into the controller.
/// The controller is borrowed only around the synchronous steps, never
/// across an await.
pub async fn run_followup<D: Dom, H: Host>(page: &RefCell<PageAnnotator<D, H>>, followup: Followup) {
    match followup {
        Followup::LoadTerms(ticket) => {
            let loader = page.borrow().loader();
            let terms = loader.load().await;
            page.borrow_mut().begin_pass(ticket, &terms);
        }
        Followup::FetchDefinition(request) => {
            let cache = page.borrow().definitions();
            let definition = cache.fetch(&request.term).await;
            page.borrow_mut().definition_ready(request, definition);
        }
    }
}
