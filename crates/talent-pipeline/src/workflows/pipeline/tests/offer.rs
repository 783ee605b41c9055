use super::common::*;
use crate::workflows::pipeline::domain::{
    InvalidStateError, OfferDraft, OfferState, OfferStatus, Stage, ValidationError,
};
use crate::workflows::pipeline::PipelineError;

#[test]
fn draft_validation_requires_every_field() {
    let cases = [
        (OfferDraft::new("", "$80,000", "2025-01-01"), "position"),
        (OfferDraft::new("Engineer", "  ", "2025-01-01"), "salary"),
        (OfferDraft::new("Engineer", "$80,000", ""), "start_date"),
    ];

    for (draft, field) in cases {
        assert_eq!(draft.validate(), Err(ValidationError::Blank { field }));
    }
}

#[test]
fn draft_validation_rejects_malformed_start_date() {
    let draft = OfferDraft::new("Engineer", "$80,000", "01/02/2025");

    assert_eq!(
        draft.validate(),
        Err(ValidationError::InvalidStartDate("01/02/2025".to_string()))
    );
}

#[test]
fn draft_validation_rejects_unpadded_start_date() {
    for raw in ["2025-1-1", "2025-01-1", "2025-1-01"] {
        let draft = OfferDraft::new("Engineer", "$80,000", raw);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::InvalidStartDate(raw.to_string()))
        );
    }
}

#[test]
fn offer_letter_echoes_the_supplied_start_date() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;

    let unpadded = engine.send_offer(&id, &OfferDraft::new("Dev", "$1", "2025-1-1"));
    assert!(matches!(unpadded, Err(PipelineError::Validation(_))));
    assert!(engine.get(&id).expect("present").offer.is_none());

    engine
        .send_offer(&id, &OfferDraft::new("Dev", "$1", "2025-03-09"))
        .expect("offer sent");
    let letter = engine.render_offer_letter(&id).expect("letter renders");
    assert!(letter.contains("your start date will be 2025-03-09."));
}

#[test]
fn incomplete_offer_leaves_candidate_without_offer() {
    let (mut engine, snapshots) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    let saves_before = snapshots.save_count();

    let result = engine.send_offer(&id, &OfferDraft::new("Frontend Developer", "", "2025-01-01"));

    assert!(matches!(result, Err(PipelineError::Validation(_))));
    let candidate = engine.get(&id).expect("present");
    assert!(candidate.offer.is_none());
    assert_eq!(candidate.offer_status(), OfferStatus::None);
    assert_eq!(snapshots.save_count(), saves_before);
}

#[test]
fn accept_and_decline_require_an_offer() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;

    for result in [engine.mark_accepted(&id), engine.mark_declined(&id)] {
        match result {
            Err(PipelineError::InvalidState(InvalidStateError::NoOffer(missing))) => {
                assert_eq!(missing, id)
            }
            other => panic!("expected missing offer, got {other:?}"),
        }
    }
}

#[test]
fn accept_resolves_sent_offer_exactly_once() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    engine.send_offer(&id, &jane_offer()).expect("offer sent");

    let accepted = engine.mark_accepted(&id).expect("sent offer accepts");
    assert_eq!(accepted.value.status, OfferState::Accepted);

    for result in [engine.mark_accepted(&id), engine.mark_declined(&id)] {
        match result {
            Err(PipelineError::InvalidState(InvalidStateError::OfferClosed { status, .. })) => {
                assert_eq!(status, OfferState::Accepted)
            }
            other => panic!("expected closed offer, got {other:?}"),
        }
    }
}

#[test]
fn decline_resolves_sent_offer_exactly_once() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    engine.send_offer(&id, &jane_offer()).expect("offer sent");

    let declined = engine.mark_declined(&id).expect("sent offer declines");
    assert_eq!(declined.value.status, OfferState::Declined);
    assert_eq!(
        engine.get(&id).expect("present").offer_status(),
        OfferStatus::Declined
    );

    assert!(matches!(
        engine.mark_accepted(&id),
        Err(PipelineError::InvalidState(InvalidStateError::OfferClosed { .. }))
    ));
}

#[test]
fn send_offer_is_only_available_without_an_offer() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    engine.send_offer(&id, &jane_offer()).expect("offer sent");
    engine.mark_declined(&id).expect("declined");

    match engine.send_offer(&id, &jane_offer()) {
        Err(PipelineError::InvalidState(InvalidStateError::OfferExists { status, .. })) => {
            assert_eq!(status, OfferState::Declined)
        }
        other => panic!("expected existing offer error, got {other:?}"),
    }
}

#[test]
fn offer_letter_carries_exact_terms() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    engine.send_offer(&id, &jane_offer()).expect("offer sent");

    let letter = engine.render_offer_letter(&id).expect("letter renders");

    assert!(letter.starts_with("Dear Jane Doe,"));
    assert!(letter.contains("Frontend Developer"));
    assert!(letter.contains("$80,000"));
    assert!(letter.contains("2025-01-01"));
    assert_eq!(letter, engine.render_offer_letter(&id).expect("deterministic"));
}

#[test]
fn offer_letter_requires_an_offer() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;

    assert!(matches!(
        engine.render_offer_letter(&id),
        Err(PipelineError::InvalidState(InvalidStateError::NoOffer(_)))
    ));
}

#[test]
fn offer_letter_export_names_file_after_candidate() {
    use crate::workflows::pipeline::LetterFormat;

    let (mut engine, _) = build_engine();
    let id = engine
        .add_candidate(crate::workflows::pipeline::NewCandidate::new(
            "Mary Jane  Watson",
            "Photographer",
        ))
        .expect("valid")
        .into_value()
        .id;
    engine
        .send_offer(&id, &OfferDraft::new("Photographer", "<$90k & perks>", "2025-06-01"))
        .expect("offer sent");

    let html = engine
        .export_offer_letter(&id, LetterFormat::Html)
        .expect("html export");
    assert_eq!(html.filename, "Offer_Letter_Mary_Jane_Watson.html");
    assert_eq!(html.content_type, mime::TEXT_HTML_UTF_8);
    let body = String::from_utf8(html.body).expect("utf-8 letter");
    assert!(body.contains("&lt;$90k &amp; perks&gt;"));

    let text = engine
        .export_offer_letter(&id, LetterFormat::Text)
        .expect("text export");
    assert_eq!(text.filename, "Offer_Letter_Mary_Jane_Watson.txt");
    assert!(String::from_utf8(text.body)
        .expect("utf-8 letter")
        .contains("<$90k & perks>"));
}

#[test]
fn hiring_does_not_reconcile_a_pending_offer() {
    let (mut engine, _) = build_engine();
    let id = engine.add_candidate(jane_doe()).expect("valid").into_value().id;
    engine.send_offer(&id, &jane_offer()).expect("offer sent");

    engine.move_stage(&id, Stage::Hired).expect("move");

    let candidate = engine.get(&id).expect("present");
    assert_eq!(candidate.stage, Stage::Hired);
    assert_eq!(candidate.offer_status(), OfferStatus::Sent);
}

#[test]
fn letter_filename_drops_header_breaking_characters() {
    use crate::workflows::pipeline::letter::letter_filename;
    use crate::workflows::pipeline::LetterFormat;

    assert_eq!(
        letter_filename("Jane \"JD\"\u{7} Doe", LetterFormat::Text),
        "Offer_Letter_Jane_JD_Doe.txt"
    );
    assert_eq!(
        letter_filename("Zoë O'Brien-Smith\r\n", LetterFormat::Html),
        "Offer_Letter_Zoë_OBrien-Smith.html"
    );
    assert_eq!(
        letter_filename("\"\" ;", LetterFormat::Text),
        "Offer_Letter_Candidate.txt"
    );
}
