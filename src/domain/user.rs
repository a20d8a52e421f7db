use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role determines write access to the content hierarchy. Viewers can browse
/// but have no admin surface; everything else treats them like users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
  User,
  Admin,
  Viewer,
}

impl UserRole {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "user" => Some(Self::User),
      "admin" => Some(Self::Admin),
      "viewer" => Some(Self::Viewer),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Admin => "admin",
      Self::Viewer => "viewer",
    }
  }

  pub fn is_admin(&self) -> bool {
    matches!(self, Self::Admin)
  }
}

/// Access tier gating question counts and exam-type visibility.
/// Guest covers both anonymous sign-ins and no session at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlanTier {
  #[default]
  Guest,
  Basic,
  Pro,
}

impl PlanTier {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "guest" => Some(Self::Guest),
      "basic" => Some(Self::Basic),
      "pro" => Some(Self::Pro),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Guest => "guest",
      Self::Basic => "basic",
      Self::Pro => "pro",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Guest => "Guest",
      Self::Basic => "Basic",
      Self::Pro => "Pro",
    }
  }
}

/// Aggregate study counters kept on the profile row. Updated with a
/// read-modify-write merge; last write wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyProgress {
  pub total_questions: i64,
  pub correct_answers: i64,
  pub study_time_seconds: i64,
  pub last_study_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: i64,
  pub email: String,
  pub display_name: String,
  pub role: UserRole,
  pub plan: PlanTier,
  pub is_anonymous: bool,
  pub created_at: DateTime<Utc>,
  pub last_login: Option<DateTime<Utc>>,
  pub progress: StudyProgress,
}

impl UserProfile {
  /// Effective access tier: anonymous accounts study as guests no matter
  /// what the plan column says.
  pub fn tier(&self) -> PlanTier {
    if self.is_anonymous { PlanTier::Guest } else { self.plan }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_role_roundtrip() {
    for role in [UserRole::User, UserRole::Admin, UserRole::Viewer] {
      assert_eq!(UserRole::from_str(role.as_str()), Some(role));
    }
  }

  #[test]
  fn test_role_from_str_invalid() {
    assert_eq!(UserRole::from_str("Admin"), None);
    assert_eq!(UserRole::from_str(""), None);
  }

  #[test]
  fn test_is_admin() {
    assert!(UserRole::Admin.is_admin());
    assert!(!UserRole::User.is_admin());
    assert!(!UserRole::Viewer.is_admin());
  }

  #[test]
  fn test_plan_roundtrip() {
    for plan in [PlanTier::Guest, PlanTier::Basic, PlanTier::Pro] {
      assert_eq!(PlanTier::from_str(plan.as_str()), Some(plan));
    }
  }

  #[test]
  fn test_plan_default_is_guest() {
    assert_eq!(PlanTier::default(), PlanTier::Guest);
  }

  fn profile(plan: PlanTier, is_anonymous: bool) -> UserProfile {
    UserProfile {
      id: 1,
      email: "student@example.com".to_string(),
      display_name: "Student".to_string(),
      role: UserRole::User,
      plan,
      is_anonymous,
      created_at: Utc::now(),
      last_login: None,
      progress: StudyProgress::default(),
    }
  }

  #[test]
  fn test_tier_uses_plan_column() {
    assert_eq!(profile(PlanTier::Pro, false).tier(), PlanTier::Pro);
    assert_eq!(profile(PlanTier::Basic, false).tier(), PlanTier::Basic);
  }

  #[test]
  fn test_anonymous_is_always_guest() {
    assert_eq!(profile(PlanTier::Pro, true).tier(), PlanTier::Guest);
  }
}
