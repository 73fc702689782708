//! Golden tests for the knowledge matcher and qualification extractor.

use realbot_shared::knowledge::{find_match, find_relevant_answer, keywords, KnowledgeEntry, KnowledgeId};
use realbot_shared::qualification::{PatternExtractor, QualificationExtractor};
use realbot_shared::session::UserData;

fn corpus() -> Vec<KnowledgeEntry> {
    let rows = [
        (1, "buying", "How much do I need for a down payment?", "Usually 3-20% of the price."),
        (2, "buying", "What are closing costs?", "Fees paid at closing, roughly 2-5%."),
        (3, "agency", "What are your office hours", "9 to 5"),
        (4, "agency", "Do you work with first-time buyers?", "Yes, all the time."),
    ];
    rows.iter()
        .map(|(id, category, question, answer)| KnowledgeEntry {
            id: KnowledgeId::number(*id),
            category: Some(category.to_string()),
            question: question.to_string(),
            answer: answer.to_string(),
        })
        .collect()
}

#[test]
fn test_every_keyword_present_matches_entry() {
    let corpus = corpus();
    for entry in &corpus {
        let question = keywords(&entry.question).join(" ");
        let m = find_match(&question, &corpus).expect("entry should match its own keywords");
        // Must be this entry or an earlier one in corpus order
        let own_index = corpus.iter().position(|e| e == entry).unwrap();
        assert!(m.index <= own_index);
    }
}

#[test]
fn test_office_hours_scenario() {
    let corpus = corpus();
    assert_eq!(
        find_relevant_answer("what are your office hours please", &corpus),
        Some("9 to 5")
    );
}

#[test]
fn test_unrelated_question_misses() {
    let corpus = corpus();
    assert_eq!(find_relevant_answer("Are pets allowed in rentals?", &corpus), None);
}

#[test]
fn test_loose_overlap_still_matches() {
    // "what" and "your" are 2 of 4 office-hours keywords, which clears 0.4
    let corpus = corpus();
    assert_eq!(
        find_relevant_answer("What is your return policy?", &corpus),
        Some("9 to 5")
    );
}

#[test]
fn test_ratio_reported() {
    let corpus = corpus();
    let m = find_match("closing costs?", &corpus).unwrap();
    // "what", "closing", "costs" -> 2 of 3
    assert_eq!(m.entry.id, KnowledgeId::number(2));
    assert!((m.ratio - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(m.matched_keywords, vec!["closing", "costs"]);
}

#[test]
fn test_corpus_order_is_semantic() {
    let mut corpus = corpus();
    corpus.reverse();
    let m = find_match("first-time buyers office hours work", &corpus).unwrap();
    assert_eq!(m.entry.id, KnowledgeId::number(4));
}

#[test]
fn test_extraction_accumulates_across_replies() {
    let extractor = PatternExtractor::new();
    let mut data = UserData::default();

    data = extractor.extract("Thanks! A budget of 500k opens up a lot.", &data);
    data = extractor.extract("And your budget of $900,000 - which location do you prefer?", &data);
    data = extractor.extract("A timeline of 3 months is doable.", &data);
    data = extractor.extract("Happy to help with anything else.", &data);

    assert_eq!(data.budget.as_deref(), Some("500k"));
    assert_eq!(data.timeline.as_deref(), Some("3 months"));
    assert!(data.preferred_location.is_some());
    assert!(!data.ready_to_contact);

    data = extractor.extract("Shall we set up a viewing this weekend?", &data);
    assert!(data.ready_to_contact);
    data = extractor.extract("Mortgage rates change daily.", &data);
    assert!(data.ready_to_contact);
}
