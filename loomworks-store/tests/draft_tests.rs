use loomworks_store::{DraftStore, OfflineStore};
use loomworks_types::DraftKind;
use serde_json::json;

fn drafts() -> DraftStore {
    DraftStore::new(OfflineStore::open_in_memory().expect("in-memory store"))
}

#[test]
fn draft_round_trips_with_a_save_timestamp() {
    let drafts = drafts();
    let data = json!({ "po_number": "PO-104", "mill": "Arun" });

    drafts
        .save_draft(DraftKind::CreatePurchaseOrder, data.clone())
        .unwrap();
    let draft = drafts
        .get_draft(DraftKind::CreatePurchaseOrder)
        .unwrap()
        .expect("draft saved");

    assert_eq!(draft.data, data);
}

#[test]
fn saving_again_overwrites_the_previous_buffer() {
    let drafts = drafts();
    drafts
        .save_draft(DraftKind::CreateQualityRecord, json!({ "grade": "A" }))
        .unwrap();
    drafts
        .save_draft(DraftKind::CreateQualityRecord, json!({ "grade": "B" }))
        .unwrap();

    let draft = drafts
        .get_draft(DraftKind::CreateQualityRecord)
        .unwrap()
        .unwrap();
    assert_eq!(draft.data, json!({ "grade": "B" }));
}

#[test]
fn draft_kinds_do_not_collide() {
    let drafts = drafts();
    drafts
        .save_draft(DraftKind::CreatePurchaseOrder, json!({ "po_number": "1" }))
        .unwrap();

    assert!(drafts
        .get_draft(DraftKind::CreateQualityRecord)
        .unwrap()
        .is_none());
}

#[test]
fn clearing_a_draft_removes_it() {
    let drafts = drafts();
    drafts
        .save_draft(DraftKind::CreatePurchaseOrder, json!({ "po_number": "1" }))
        .unwrap();
    drafts.clear_draft(DraftKind::CreatePurchaseOrder).unwrap();

    assert!(drafts
        .get_draft(DraftKind::CreatePurchaseOrder)
        .unwrap()
        .is_none());
}

#[test]
fn clearing_an_absent_draft_is_not_an_error() {
    drafts().clear_draft(DraftKind::CreatePurchaseOrder).unwrap();
}
