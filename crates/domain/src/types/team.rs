//! Ownership teams
//!
//! Place a team in `extra.team` when capturing so the backend routes the
//! report to that team.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[serde(rename = "app_inf")]
    ApplicationInfrastructure,
    Channels,
    CoreMessaging,
    Currents,
    #[serde(rename = "dashboard_inf")]
    DashboardInfrastructure,
    DataLake,
    Devops,
    EmailComposition,
    EmailInfrastructure,
    Iam,
    InMemoryDb,
    Ingestion,
    Intelligence,
    InternalTools,
    #[serde(rename = "messaging_automation")]
    MessagingAndAutomation,
    Partnerships,
    Reporting,
    Security,
    Sms,
}

impl_domain_status_conversions!(Team {
    ApplicationInfrastructure => "app_inf",
    Channels => "channels",
    CoreMessaging => "core_messaging",
    Currents => "currents",
    DashboardInfrastructure => "dashboard_inf",
    DataLake => "data_lake",
    Devops => "devops",
    EmailComposition => "email_composition",
    EmailInfrastructure => "email_infrastructure",
    Iam => "iam",
    InMemoryDb => "in_memory_db",
    Ingestion => "ingestion",
    Intelligence => "intelligence",
    InternalTools => "internal_tools",
    MessagingAndAutomation => "messaging_automation",
    Partnerships => "partnerships",
    Reporting => "reporting",
    Security => "security",
    Sms => "sms",
});

impl From<Team> for serde_json::Value {
    fn from(team: Team) -> Self {
        Self::String(team.as_str().to_string())
    }
}
