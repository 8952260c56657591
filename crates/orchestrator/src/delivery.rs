//! Log-only delivery channels
//!
//! Used when no webhook is configured and in tests.

use async_trait::async_trait;
use lead_agent_core::{LeadNotification, Notifier, NurtureScheduler, Result};

/// Writes qualified leads to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, lead: &LeadNotification) -> Result<String> {
        let qualification = lead.qualification.as_ref();
        tracing::info!(
            session_id = %lead.session_id,
            name = lead.customer_info.name.as_deref().unwrap_or("unknown"),
            company = lead.customer_info.company.as_deref().unwrap_or("unknown"),
            email = lead.customer_info.email.as_deref().unwrap_or(""),
            score = qualification.map(|q| q.total_score).unwrap_or(0),
            tier = qualification.map(|q| q.tier.as_str()).unwrap_or("unscored"),
            "New qualified lead"
        );
        Ok(format!("log:{}", lead.session_id))
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Records nurture enrolments in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNurtureScheduler;

#[async_trait]
impl NurtureScheduler for LogNurtureScheduler {
    async fn enroll(&self, lead: &LeadNotification) -> Result<String> {
        tracing::info!(
            session_id = %lead.session_id,
            email = lead.customer_info.email.as_deref().unwrap_or(""),
            missing = ?lead.customer_info.missing_fields(),
            "Lead enrolled in nurture sequence"
        );
        Ok(format!("nurture:{}", lead.session_id))
    }

    fn name(&self) -> &str {
        "log"
    }
}
