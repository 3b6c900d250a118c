use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for leads tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source options offered during intake. Stored as free text so imports from
/// older systems survive, but new leads are expected to pick from this set.
pub const LEAD_SOURCES: &[&str] = &[
    "Website",
    "Property Portal",
    "Referral",
    "Social Media",
    "Walk-in",
    "Cold Call",
    "Exhibition",
    "Advertisement",
];

/// Purchase urgency declared by the lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Immediate,
    Within1Month,
    Within3Months,
    Within6Months,
    Within1Year,
    Exploring,
}

impl Timeline {
    pub const fn label(self) -> &'static str {
        match self {
            Timeline::Immediate => "immediate",
            Timeline::Within1Month => "within_1_month",
            Timeline::Within3Months => "within_3_months",
            Timeline::Within6Months => "within_6_months",
            Timeline::Within1Year => "within_1_year",
            Timeline::Exploring => "exploring",
        }
    }
}

/// Broad buyer profile used by the scoring rubric.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BuyerType {
    FirstTimeBuyer,
    Investor,
    Upgrade,
    Downsize,
    Relocation,
    Commercial,
}

impl BuyerType {
    pub const fn label(self) -> &'static str {
        match self {
            BuyerType::FirstTimeBuyer => "first_time_buyer",
            BuyerType::Investor => "investor",
            BuyerType::Upgrade => "upgrade",
            BuyerType::Downsize => "downsize",
            BuyerType::Relocation => "relocation",
            BuyerType::Commercial => "commercial",
        }
    }
}

/// Pipeline position of a lead. Declaration order is pipeline order; the two
/// trailing variants are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    Converted,
    Lost,
}

/// Active statuses in fixed display order for the pipeline board.
pub const ACTIVE_STATUSES: [LeadStatus; 5] = [
    LeadStatus::New,
    LeadStatus::Contacted,
    LeadStatus::Qualified,
    LeadStatus::Proposal,
    LeadStatus::Negotiation,
];

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Proposal => "Proposal",
            LeadStatus::Negotiation => "Negotiation",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        }
    }

    /// Board color used by dashboard clients.
    pub const fn color(self) -> &'static str {
        match self {
            LeadStatus::New => "#64748b",
            LeadStatus::Contacted => "#3b82f6",
            LeadStatus::Qualified => "#8b5cf6",
            LeadStatus::Proposal => "#f59e0b",
            LeadStatus::Negotiation => "#f97316",
            LeadStatus::Converted => "#22c55e",
            LeadStatus::Lost => "#ef4444",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Converted | LeadStatus::Lost)
    }

    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Position among the active statuses. Terminal statuses have no rank.
    pub const fn rank(self) -> Option<u8> {
        match self {
            LeadStatus::New => Some(0),
            LeadStatus::Contacted => Some(1),
            LeadStatus::Qualified => Some(2),
            LeadStatus::Proposal => Some(3),
            LeadStatus::Negotiation => Some(4),
            LeadStatus::Converted | LeadStatus::Lost => None,
        }
    }
}

/// Qualitative bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadRating {
    Low,
    Medium,
    High,
}

impl LeadRating {
    pub const fn label(self) -> &'static str {
        match self {
            LeadRating::Low => "Cold",
            LeadRating::Medium => "Warm",
            LeadRating::High => "Hot",
        }
    }
}

/// Entry in a lead's append-only activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadActivity {
    pub kind: ActivityKind,
    pub actor: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    StatusChanged { from: LeadStatus, to: LeadStatus },
    Converted,
    Assigned { assignee: String },
    FieldsUpdated,
}

/// Prospective buyer tracked from intake through conversion or loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub timeline: Timeline,
    pub buyer_type: BuyerType,
    pub source: String,
    pub status: LeadStatus,
    pub score: u8,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub next_follow_up_date: Option<DateTime<Utc>>,
    pub conversion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency stamp. The store bumps it on every accepted
    /// update and rejects writes carrying a stale value.
    #[serde(default)]
    pub version: u64,
    pub activities: Vec<LeadActivity>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Reporting value of the lead: the larger declared budget bound, zero
    /// when no budget was captured.
    pub fn pipeline_value(&self) -> u64 {
        self.budget_max
            .unwrap_or(0)
            .max(self.budget_min.unwrap_or(0))
    }
}

/// Conversion request payload supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionDetails {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub risk_override: Option<RiskLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Standard,
    Elevated,
}

impl RiskLevel {
    /// Default risk bucket for a freshly converted lead: strong scores carry
    /// the least onboarding risk.
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            RiskLevel::Low
        } else if score >= 60 {
            RiskLevel::Standard
        } else {
            RiskLevel::Elevated
        }
    }
}

/// Stub handed to the external customer collaborator after conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub lead_id: LeadId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    pub risk_level: RiskLevel,
}

/// Derived board column: the leads currently sitting in one active status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStage {
    pub status: LeadStatus,
    pub title: &'static str,
    pub color: &'static str,
    pub leads: Vec<Lead>,
    pub count: usize,
    pub total_value: u64,
}
