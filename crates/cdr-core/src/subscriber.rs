//! A member of the fixed population calls are generated for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subscriber, identified throughout the system by its MSISDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
  pub subscriber_id: Uuid,
  pub msisdn:        String,
}

impl Subscriber {
  /// A fresh subscriber with a newly allocated id.
  pub fn new(msisdn: impl Into<String>) -> Self {
    Self { subscriber_id: Uuid::new_v4(), msisdn: msisdn.into() }
  }
}
