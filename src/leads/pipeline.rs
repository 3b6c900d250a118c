use chrono::{DateTime, Utc};

use super::domain::{
    ActivityKind, ConversionDetails, CustomerRecord, Lead, LeadActivity, LeadStatus, RiskLevel,
};

/// Violations of the pipeline state machine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("lead is terminal ({})", .0.label())]
    Terminal(LeadStatus),
    #[error("cannot regress pipeline ({} -> {})", from.label(), to.label())]
    Regression { from: LeadStatus, to: LeadStatus },
    #[error("conversion must go through the convert operation")]
    ConvertRequired,
    #[error("lead already converted")]
    AlreadyConverted,
}

/// Apply a status transition in place, appending the activity record.
///
/// Active statuses may only move forward (skips allowed) or drop to Lost;
/// terminal statuses reject every transition. Conversion is a distinct
/// operation handled by [`convert`].
pub fn transition(
    lead: &mut Lead,
    new_status: LeadStatus,
    actor: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if lead.status.is_terminal() {
        return Err(TransitionError::Terminal(lead.status));
    }
    if new_status == LeadStatus::Converted {
        return Err(TransitionError::ConvertRequired);
    }

    if new_status != LeadStatus::Lost {
        let from_rank = lead.status.rank().unwrap_or(0);
        // Terminal targets other than Lost were rejected above.
        let to_rank = new_status.rank().unwrap_or(0);
        if to_rank <= from_rank {
            return Err(TransitionError::Regression {
                from: lead.status,
                to: new_status,
            });
        }
    }

    let from = lead.status;
    lead.status = new_status;
    lead.updated_at = now;
    lead.activities.push(LeadActivity {
        kind: ActivityKind::StatusChanged {
            from,
            to: new_status,
        },
        actor: actor.to_string(),
        at: now,
        notes,
    });

    Ok(())
}

/// Convert an active lead into a customer, stamping the conversion date and
/// returning the record stub for the external customer collaborator.
pub fn convert(
    lead: &mut Lead,
    details: ConversionDetails,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<CustomerRecord, TransitionError> {
    match lead.status {
        LeadStatus::Converted => return Err(TransitionError::AlreadyConverted),
        LeadStatus::Lost => return Err(TransitionError::Terminal(LeadStatus::Lost)),
        _ => {}
    }

    lead.status = LeadStatus::Converted;
    lead.conversion_date = Some(now);
    lead.updated_at = now;
    lead.activities.push(LeadActivity {
        kind: ActivityKind::Converted,
        actor: actor.to_string(),
        at: now,
        notes: None,
    });

    let risk_level = details
        .risk_override
        .unwrap_or_else(|| RiskLevel::from_score(lead.score));

    Ok(CustomerRecord {
        lead_id: lead.id.clone(),
        name: lead.full_name(),
        email: lead.email.clone(),
        company: details.company.or_else(|| lead.company.clone()),
        requirements: details.requirements,
        risk_level,
    })
}
