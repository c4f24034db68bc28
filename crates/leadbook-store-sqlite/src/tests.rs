//! Integration tests for `SqliteStore` against an in-memory database.

use leadbook_core::{
  Error,
  history::{FieldValue, HistoryPayload},
  lead::{
    Bhk, City, Lead, LeadFields, NewLead, PropertyType, Purpose, Source,
    Status, Timeline,
  },
  store::{LeadQuery, LeadStore, SortKey, SortOrder},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn fields(name: &str, phone: &str) -> LeadFields {
  LeadFields {
    full_name:     name.into(),
    email:         None,
    phone:         phone.into(),
    city:          City::Mohali,
    property_type: PropertyType::Apartment,
    bhk:           Some(Bhk::Two),
    purpose:       Purpose::Buy,
    budget_min:    Some(4_000_000),
    budget_max:    Some(6_000_000),
    timeline:      Timeline::ZeroToThree,
    source:        Source::Website,
    status:        Status::New,
    notes:         None,
    tags:          vec![],
  }
}

async fn seed(s: &SqliteStore, name: &str, owner: &str) -> Lead {
  s.create_lead(NewLead {
    fields:   fields(name, "9876543210"),
    owner_id: owner.into(),
  })
  .await
  .unwrap()
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_lead() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  assert_eq!(lead.version, 1);
  assert_eq!(lead.fields.status, Status::New);

  let fetched = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, lead.id);
  assert_eq!(fetched.fields, lead.fields);
  assert_eq!(fetched.owner_id, "agent-1");
  assert_eq!(fetched.version, 1);
}

#[tokio::test]
async fn get_missing_lead_returns_none() {
  let s = store().await;
  assert!(s.get_lead(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_writes_a_created_history_entry() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let history = s.history(lead.id, 5).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].lead_id, lead.id);
  assert_eq!(history[0].changed_by, "agent-1");
  assert_eq!(history[0].payload, HistoryPayload::Created);
}

#[tokio::test]
async fn optional_fields_round_trip() {
  let s = store().await;
  let mut f = fields("Ravi Kumar", "9812345678");
  f.email = Some("ravi@example.com".into());
  f.notes = Some("call after 6pm".into());
  f.tags = vec!["nri".into(), "urgent".into()];

  let lead = s
    .create_lead(NewLead { fields: f.clone(), owner_id: "agent-1".into() })
    .await
    .unwrap();

  let fetched = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(fetched.fields.email.as_deref(), Some("ravi@example.com"));
  assert_eq!(fetched.fields.notes.as_deref(), Some("call after 6pm"));
  assert_eq!(fetched.fields.tags, ["nri", "urgent"]);
}

// ─── Update protocol ─────────────────────────────────────────────────────────

#[tokio::test]
async fn update_bumps_version_and_records_diff() {
  // Status New → Qualified with the current token.
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut new_fields = lead.fields.clone();
  new_fields.status = Status::Qualified;

  let updated = s
    .update_lead(lead.id, lead.version, new_fields, "agent-1")
    .await
    .unwrap();

  assert_eq!(updated.version, lead.version + 1);
  assert!(updated.updated_at > lead.updated_at);
  assert_eq!(updated.fields.status, Status::Qualified);

  let history = s.history(lead.id, 5).await.unwrap();
  assert_eq!(history.len(), 2);
  // Most recent first.
  let HistoryPayload::Updated { diff } = &history[0].payload else {
    panic!("expected an updated entry, got {:?}", history[0].payload);
  };
  assert_eq!(diff.len(), 1);
  assert_eq!(diff["status"].old, FieldValue::Status(Status::New));
  assert_eq!(diff["status"].new, FieldValue::Status(Status::Qualified));
  assert_eq!(history[1].payload, HistoryPayload::Created);
}

#[tokio::test]
async fn stale_version_is_rejected() {
  // Two writers read version 1; the first commits, the second must conflict.
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut first = lead.fields.clone();
  first.status = Status::Contacted;
  let committed = s
    .update_lead(lead.id, lead.version, first, "agent-1")
    .await
    .unwrap();

  let mut second = lead.fields.clone();
  second.status = Status::Dropped;
  let err = s
    .update_lead(lead.id, lead.version, second, "agent-1")
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::VersionConflict { stored, claimed, .. }
      if stored == committed.version && claimed == lead.version
  ));

  // Only the first write took effect.
  let current = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(current.fields.status, Status::Contacted);
  assert_eq!(s.history(lead.id, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_submission_succeeds_at_most_once() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut new_fields = lead.fields.clone();
  new_fields.status = Status::Visited;

  s.update_lead(lead.id, lead.version, new_fields.clone(), "agent-1")
    .await
    .unwrap();
  let err = s
    .update_lead(lead.id, lead.version, new_fields, "agent-1")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VersionConflict { .. }));
}

#[tokio::test]
async fn non_owner_cannot_update() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut new_fields = lead.fields.clone();
  new_fields.status = Status::Dropped;

  let err = s
    .update_lead(lead.id, lead.version, new_fields, "agent-2")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotOwner { .. }));

  // No state change, no audit entry.
  let current = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(current.fields.status, Status::New);
  assert_eq!(current.version, 1);
  assert_eq!(s.history(lead.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_of_missing_lead_errors() {
  let s = store().await;
  let err = s
    .update_lead(Uuid::new_v4(), 1, fields("Ghost", "9876543210"), "agent-1")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::LeadNotFound(_)));
}

#[tokio::test]
async fn noop_update_keeps_version_and_history() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let same = s
    .update_lead(lead.id, lead.version, lead.fields.clone(), "agent-1")
    .await
    .unwrap();

  assert_eq!(same.version, lead.version);
  assert_eq!(s.history(lead.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn diff_covers_every_changed_field() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut new_fields = lead.fields.clone();
  new_fields.full_name = "Asha K. Verma".into();
  new_fields.email = Some("asha@example.com".into());
  new_fields.budget_max = Some(8_000_000);
  new_fields.tags = vec!["hot".into()];

  s.update_lead(lead.id, lead.version, new_fields, "agent-1")
    .await
    .unwrap();

  let history = s.history(lead.id, 1).await.unwrap();
  let HistoryPayload::Updated { diff } = &history[0].payload else {
    panic!("expected updated entry");
  };
  let mut keys: Vec<&str> = diff.keys().map(String::as_str).collect();
  keys.sort_unstable();
  assert_eq!(keys, ["budgetMax", "email", "fullName", "tags"]);
}

// ─── Delete / cascade ────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_cascades_history() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let mut new_fields = lead.fields.clone();
  new_fields.status = Status::Qualified;
  s.update_lead(lead.id, lead.version, new_fields, "agent-1")
    .await
    .unwrap();
  assert_eq!(s.history(lead.id, 10).await.unwrap().len(), 2);

  s.delete_lead(lead.id, "agent-1").await.unwrap();

  assert!(s.get_lead(lead.id).await.unwrap().is_none());
  assert!(s.history(lead.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_owner_cannot_delete() {
  let s = store().await;
  let lead = seed(&s, "Asha Verma", "agent-1").await;

  let err = s.delete_lead(lead.id, "agent-2").await.unwrap_err();
  assert!(matches!(err, Error::NotOwner { .. }));
  assert!(s.get_lead(lead.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_missing_lead_errors() {
  let s = store().await;
  let err = s.delete_lead(Uuid::new_v4(), "agent-1").await.unwrap_err();
  assert!(matches!(err, Error::LeadNotFound(_)));
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_city_and_status() {
  let s = store().await;

  let mut f = fields("Asha Verma", "9876543210");
  f.city = City::Chandigarh;
  s.create_lead(NewLead { fields: f, owner_id: "agent-1".into() })
    .await
    .unwrap();
  seed(&s, "Ravi Kumar", "agent-1").await;
  seed(&s, "Meena Joshi", "agent-2").await;

  let q = LeadQuery { city: Some(City::Mohali), ..Default::default() };
  let page = s.list_leads(&q).await.unwrap();
  assert_eq!(page.total, 2);
  assert!(page.items.iter().all(|l| l.fields.city == City::Mohali));

  let q = LeadQuery {
    status: Some(Status::Qualified),
    ..Default::default()
  };
  assert_eq!(s.list_leads(&q).await.unwrap().total, 0);
}

#[tokio::test]
async fn search_matches_name_phone_and_email() {
  let s = store().await;

  let mut f = fields("Asha Verma", "9876543210");
  f.email = Some("asha@example.com".into());
  s.create_lead(NewLead { fields: f, owner_id: "agent-1".into() })
    .await
    .unwrap();
  s.create_lead(NewLead {
    fields:   fields("Ravi Kumar", "9812345678"),
    owner_id: "agent-1".into(),
  })
  .await
  .unwrap();

  for term in ["asha", "VERMA", "98123", "asha@example"] {
    let q = LeadQuery { search: Some(term.into()), ..Default::default() };
    let page = s.list_leads(&q).await.unwrap();
    assert_eq!(page.total, 1, "search {term:?}");
  }
}

#[tokio::test]
async fn pagination_is_stable() {
  let s = store().await;
  for i in 0..25 {
    s.create_lead(NewLead {
      fields:   fields(&format!("Lead {i:02}"), "9876543210"),
      owner_id: "agent-1".into(),
    })
    .await
    .unwrap();
  }

  let q = LeadQuery {
    sort: SortKey::FullName,
    order: SortOrder::Asc,
    page: 1,
    per_page: Some(10),
    ..Default::default()
  };
  let first = s.list_leads(&q).await.unwrap();
  assert_eq!(first.total, 25);
  assert_eq!(first.items.len(), 10);
  assert_eq!(first.items[0].fields.full_name, "Lead 00");

  let q3 = LeadQuery { page: 3, ..q.clone() };
  let third = s.list_leads(&q3).await.unwrap();
  assert_eq!(third.items.len(), 5);
  assert_eq!(third.items[0].fields.full_name, "Lead 20");
}

#[tokio::test]
async fn unpaginated_query_returns_all_rows() {
  let s = store().await;
  for i in 0..150 {
    s.create_lead(NewLead {
      fields:   fields(&format!("Lead {i}"), "9876543210"),
      owner_id: "agent-1".into(),
    })
    .await
    .unwrap();
  }

  let q = LeadQuery { per_page: None, ..Default::default() };
  let page = s.list_leads(&q).await.unwrap();
  assert_eq!(page.items.len(), 150);
  assert_eq!(page.total, 150);
}

#[tokio::test]
async fn per_page_is_clamped_to_100() {
  let s = store().await;
  seed(&s, "Asha Verma", "agent-1").await;

  let q = LeadQuery { per_page: Some(5000), ..Default::default() };
  let page = s.list_leads(&q).await.unwrap();
  assert_eq!(page.per_page, 100);
}

// ─── History listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn history_is_most_recent_first_and_limited() {
  let s = store().await;
  let mut lead = seed(&s, "Asha Verma", "agent-1").await;

  for status in [
    Status::Contacted,
    Status::Qualified,
    Status::Visited,
    Status::Negotiation,
    Status::Converted,
  ] {
    let mut f = lead.fields.clone();
    f.status = status;
    lead = s
      .update_lead(lead.id, lead.version, f, "agent-1")
      .await
      .unwrap();
  }

  // Six entries exist (creation + five updates); the default page is five.
  let recent = s.history(lead.id, 5).await.unwrap();
  assert_eq!(recent.len(), 5);

  let HistoryPayload::Updated { diff } = &recent[0].payload else {
    panic!("expected updated entry");
  };
  assert_eq!(diff["status"].new, FieldValue::Status(Status::Converted));

  for pair in recent.windows(2) {
    assert!(pair[0].changed_at >= pair[1].changed_at);
  }
}
