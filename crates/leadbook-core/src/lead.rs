//! Lead — the buyer record tracked through the sales pipeline.
//!
//! A lead is a single mutable row. All edits go through the update engine,
//! which bumps the `version` concurrency token and appends a
//! [`HistoryEntry`](crate::history::HistoryEntry) per successful change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────
//
// All seven enumerations are closed: unknown wire values are rejected by the
// validator, never coerced. The wire strings are what the intake forms and
// the CSV template use, so `as_str`/`parse` must stay in lockstep with the
// serde renames.

macro_rules! closed_enum {
  (
    $(#[$meta:meta])*
    $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum $name {
      $(#[serde(rename = $wire)] $variant,)+
    }

    impl $name {
      /// Every member, in declaration order. Used for "valid values" hints
      /// in validation messages.
      pub const ALL: &'static [$name] = &[$($name::$variant,)+];

      /// The wire string stored in the database and accepted on input.
      pub fn as_str(&self) -> &'static str {
        match self {
          $($name::$variant => $wire,)+
        }
      }

      /// Parse a wire string; `None` for anything outside the enumeration.
      pub fn parse(s: &str) -> Option<Self> {
        match s {
          $($wire => Some($name::$variant),)+
          _ => None,
        }
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
      }
    }
  };
}

closed_enum! {
  /// Catchment cities for the intake form.
  City {
    Chandigarh => "Chandigarh",
    Mohali     => "Mohali",
    Zirakpur   => "Zirakpur",
    Panchkula  => "Panchkula",
    Other      => "Other",
  }
}

closed_enum! {
  PropertyType {
    Apartment => "Apartment",
    Villa     => "Villa",
    Plot      => "Plot",
    Office    => "Office",
    Retail    => "Retail",
  }
}

impl PropertyType {
  /// Residential types carry a bedroom-count tag; the rest do not.
  pub fn requires_bhk(&self) -> bool {
    matches!(self, PropertyType::Apartment | PropertyType::Villa)
  }
}

closed_enum! {
  /// Bedroom-count tag. Only meaningful for residential property types.
  Bhk {
    One    => "1",
    Two    => "2",
    Three  => "3",
    Four   => "4",
    Studio => "Studio",
  }
}

closed_enum! {
  Purpose {
    Buy  => "Buy",
    Rent => "Rent",
  }
}

closed_enum! {
  /// How soon the buyer intends to move.
  Timeline {
    ZeroToThree  => "0-3m",
    ThreeToSix   => "3-6m",
    MoreThanSix  => ">6m",
    Exploring    => "Exploring",
  }
}

closed_enum! {
  Source {
    Website  => "Website",
    Referral => "Referral",
    WalkIn   => "Walk-in",
    Call     => "Call",
    Other    => "Other",
  }
}

closed_enum! {
  /// Pipeline status. Transitions are a free graph: any status may move to
  /// any other status through the normal update path.
  Status {
    New         => "New",
    Qualified   => "Qualified",
    Contacted   => "Contacted",
    Visited     => "Visited",
    Negotiation => "Negotiation",
    Converted   => "Converted",
    Dropped     => "Dropped",
  }
}

impl Default for Status {
  fn default() -> Self { Status::New }
}

/// Render the member list of an enumeration for validation messages,
/// e.g. `"Chandigarh, Mohali, Zirakpur, Panchkula, Other"`.
pub fn valid_values<T: Copy + std::fmt::Display>(all: &[T]) -> String {
  all
    .iter()
    .map(|v| v.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Field set ───────────────────────────────────────────────────────────────

/// The mutable fields of a lead — everything except identity, ownership, and
/// the concurrency token. This is what the validator produces, what the diff
/// computer compares, and what the record writer persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFields {
  pub full_name:     String,
  pub email:         Option<String>,
  pub phone:         String,
  pub city:          City,
  pub property_type: PropertyType,
  pub bhk:           Option<Bhk>,
  pub purpose:       Purpose,
  /// Budget bounds in whole rupees. `budget_max >= budget_min` when both
  /// are set (enforced by the validator).
  pub budget_min:    Option<i64>,
  pub budget_max:    Option<i64>,
  pub timeline:      Timeline,
  pub source:        Source,
  pub status:        Status,
  pub notes:         Option<String>,
  /// Free-form labels, order-sensitive (presented as an ordered list).
  pub tags:          Vec<String>,
}

// ─── Lead ────────────────────────────────────────────────────────────────────

/// A buyer record. `version` is the optimistic-concurrency token: clients
/// echo the version they last read, and the engine rejects the write with
/// `VersionConflict` if another writer committed in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
  pub id:         Uuid,
  #[serde(flatten)]
  pub fields:     LeadFields,
  pub owner_id:   String,
  pub version:    i64,
  /// Stamped on creation and on every successful mutation. For display and
  /// sorting; `version` is the token that guards writes.
  pub updated_at: DateTime<Utc>,
}

// ─── NewLead ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LeadStore::create_lead`]. Identity, version, and
/// timestamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewLead {
  pub fields:   LeadFields,
  pub owner_id: String,
}
