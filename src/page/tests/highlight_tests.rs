use super::support::Harness;
use crate::page::CoordinatorState;
use crate::terms::TermSet;

// ============================================================================
// Whole-word highlighting
// ============================================================================

#[test]
fn test_only_whole_word_is_highlighted() {
    let h = Harness::new(&["Diabetes is common. Diabetics need care."], &["diabetes"]);
    h.activate();

    assert_eq!(h.link_texts(), vec!["Diabetes"]);
    assert_eq!(h.body_text(), "Diabetes is common. Diabetics need care.");
}

#[test]
fn test_no_match_inside_longer_word() {
    let h = Harness::new(&["Electrocardiology is a field."], &["cardiology"]);
    h.activate();

    assert!(h.link_texts().is_empty());
}

#[test]
fn test_one_link_per_occurrence_across_nodes() {
    let h = Harness::new(
        &["Gout and asthma.", "More gout here, then asthma and gout."],
        &["gout", "asthma"],
    );
    h.activate();

    assert_eq!(h.link_texts(), vec!["Gout", "asthma", "gout", "asthma", "gout"]);
    assert_eq!(h.with(|p| p.link_count()), 5);
}

#[test]
fn test_links_point_at_articles() {
    let h = Harness::new(&["Heart failure is serious."], &["heart failure"]);
    h.activate();

    let href = h.with(|p| {
        let dom = p.dom();
        dom.attribute(dom.links()[0], "href").map(str::to_string)
    });
    assert_eq!(href.as_deref(), Some("https://mdwiki.org/wiki/heart%20failure"));
}

// ============================================================================
// Rescan behavior
// ============================================================================

#[test]
fn test_rescan_is_idempotent() {
    let h = Harness::new(&["Gout and asthma.", "Nothing here."], &["gout", "asthma"]);
    h.activate();

    let links = h.link_texts();
    let mutations = h.with(|p| p.dom().mutation_count());
    let text = h.body_text();

    h.rescan();
    h.rescan();

    assert_eq!(h.link_texts(), links);
    assert_eq!(h.with(|p| p.dom().mutation_count()), mutations);
    assert_eq!(h.body_text(), text);
    assert_eq!(h.with(|p| p.stats().passes_completed), 3);
}

#[test]
fn test_hidden_and_script_text_untouched() {
    let h = Harness::new(&["gout"], &["gout"]);
    h.with(|p| {
        let dom = p.dom_mut();
        let body = dom.body_id();
        let hidden = dom.append_element(body, "div");
        dom.set_hidden(hidden, true);
        dom.append_text(hidden, "hidden gout");
        let script = dom.append_element(body, "script");
        dom.append_text(script, "var gout = 1;");
    });
    h.activate();

    assert_eq!(h.link_texts(), vec!["gout"]);
}

#[test]
fn test_empty_dictionary_is_noop() {
    let h = Harness::new(&["Gout and asthma."], &[]);
    h.activate();

    assert!(h.link_texts().is_empty());
    assert_eq!(h.with(|p| p.dom().mutation_count()), 0);
    assert!(h.with(|p| p.host().observing));
}

#[test]
fn test_unreadable_dictionary_degrades_to_noop() {
    let h = Harness::with_dictionary(&["Gout and asthma."], "not json at all");
    h.activate();

    assert!(h.link_texts().is_empty());
    assert_eq!(
        h.with(|p| p.coordinator_state()),
        CoordinatorState::Observing { debounce: None }
    );
}

// ============================================================================
// Pass tickets
// ============================================================================

#[test]
fn test_stale_pass_is_discarded() {
    let h = Harness::new(&["gout"], &["gout"]);

    let first = h.with(|p| p.activate());
    let second = h.with(|p| p.rescan_now());
    h.resolve(first);
    assert!(!h.with(|p| p.is_pass_running()), "older ticket must not start");

    h.resolve(second);
    h.run_frames();

    assert_eq!(h.link_texts(), vec!["gout"]);
    let stats = h.with(|p| p.stats());
    assert_eq!(stats.passes_discarded, 1);
    assert_eq!(stats.passes_completed, 1);
}

#[test]
fn test_newer_pass_replaces_in_flight_pass() {
    let paragraphs: Vec<String> = (0..50).map(|i| format!("gout case {}", i)).collect();
    let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    let h = Harness::new(&refs, &["gout"]);

    let followup = h.with(|p| p.activate());
    h.resolve(followup);
    h.dispatch(crate::page::PageEvent::Frame);
    assert_eq!(h.link_texts().len(), 20);
    assert!(h.with(|p| p.is_pass_running()));

    h.rescan();

    assert_eq!(h.link_texts().len(), 50);
    assert_eq!(h.with(|p| p.stats().passes_discarded), 1);
    assert!(h.with(|p| p.host().observing));
}

#[test]
fn test_pass_after_dispose_is_ignored() {
    let h = Harness::new(&["gout"], &["gout"]);
    let followup = h.with(|p| p.activate());
    h.with(|p| p.dispose());
    h.resolve(followup);
    h.run_frames();

    assert!(h.link_texts().is_empty());
    assert_eq!(h.with(|p| p.coordinator_state()), CoordinatorState::Detached);
}

#[test]
fn test_begin_pass_reuses_matcher_for_same_terms() {
    let h = Harness::new(&["gout"], &["gout"]);
    h.activate();

    let terms: TermSet = ["gout"].iter().collect();
    let followup = h.with(|p| p.rescan_now());
    if let Some(crate::page::Followup::LoadTerms(ticket)) = followup {
        h.with(|p| p.begin_pass(ticket, &terms));
    } else {
        panic!("rescan should ask for terms");
    }
    h.run_frames();

    assert_eq!(h.link_texts(), vec!["gout"]);
}

#[test]
fn test_links_removed_by_page_are_forgotten() {
    let h = Harness::new(&["gout"], &["gout"]);
    h.activate();

    for round in 0..5 {
        h.with(|p| {
            let dom = p.dom_mut();
            let body = dom.body_id();
            for child in dom.children_of(body).to_vec() {
                dom.detach(child);
            }
            let para = dom.append_element(body, "p");
            dom.append_text(para, &format!("Round {} of gout.", round));
        });
        h.rescan();
    }

    assert_eq!(h.link_texts(), vec!["gout"]);
    assert_eq!(h.with(|p| p.link_count()), 1);
    assert_eq!(h.with(|p| p.stats().links), 1);
}
