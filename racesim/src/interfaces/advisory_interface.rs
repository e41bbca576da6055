use crate::core::agent::StatusKind;
use crate::core::race::Race;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Tyre life at or below which the heuristic advisor recommends a pit stop on the next lap.
const HEURISTIC_PIT_TIRE_LAPS: u32 = 3;

/// AdvisorySnapshot is the read-only view of the agent store handed to a strategy advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorySnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_laps: u32,
    pub is_raining: bool,
    pub agents: Vec<AgentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    pub id: u32,
    pub name: String,
    pub lap: u32,
    pub distance: f64,
    pub status: StatusKind,
    pub speed_factor: f64,
    pub wear_factor: f64,
    pub tire_laps: u32,
}

/// AdvisoryRequest wraps the operator's question together with the race snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub message: String,
    pub context: AdvisorySnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitRecommendation {
    pub agent_id: u32,
    #[serde(default)]
    pub suggested_pit_lap: Option<u32>,
    #[serde(default)]
    pub tyre: Option<String>,
    pub priority: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    #[serde(default)]
    pub pit_recommendations: Vec<PitRecommendation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub advice: Option<Advice>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server returned status {0}: {1}")]
    Status(u16, String),

    #[error("Malformed advisory payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for AdvisoryError {
    fn from(e: serde_json::Error) -> Self {
        AdvisoryError::Malformed(e.to_string())
    }
}

/// StrategyAdvisor is an external strategy service. Its answers are advisory only, nothing it
/// returns is applied to the race automatically.
pub trait StrategyAdvisor {
    fn advise(&self, request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError>;
}

/// HeuristicAdvisor answers offline from the tyre life in the snapshot: every racing agent at
/// or below the pit threshold is told to pit on the next lap.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAdvisor;

impl StrategyAdvisor for HeuristicAdvisor {
    fn advise(&self, request: &AdvisoryRequest) -> Result<AdvisoryResponse, AdvisoryError> {
        let pit_recommendations = request
            .context
            .agents
            .iter()
            .map(|agent| {
                if agent.status == StatusKind::Racing && agent.tire_laps <= HEURISTIC_PIT_TIRE_LAPS
                {
                    PitRecommendation {
                        agent_id: agent.id,
                        suggested_pit_lap: Some((agent.lap + 1).max(1)),
                        tyre: Some(String::from("hard")),
                        priority: String::from("high"),
                        reason: format!("Low tyre life ({} laps left).", agent.tire_laps),
                    }
                } else {
                    PitRecommendation {
                        agent_id: agent.id,
                        suggested_pit_lap: None,
                        tyre: None,
                        priority: String::from("low"),
                        reason: String::from("No urgent pit recommended by tyre-laps heuristic."),
                    }
                }
            })
            .collect();

        Ok(AdvisoryResponse {
            reply: None,
            advice: Some(Advice {
                pit_recommendations,
            }),
            error: None,
        })
    }
}

/// parse_response reads a raw response body of an advisory service.
pub fn parse_response(body: &str) -> Result<AdvisoryResponse, AdvisoryError> {
    Ok(serde_json::from_str(body)?)
}

/// format_response turns an advisory response into the lines shown to the operator.
pub fn format_response(response: &AdvisoryResponse) -> Vec<String> {
    let mut lines = Vec::new();

    let reply = response
        .reply
        .as_deref()
        .map(str::trim)
        .filter(|reply| !reply.is_empty());

    if let Some(reply) = reply {
        lines.push(reply.to_owned());
    }

    let recommendations = response
        .advice
        .as_ref()
        .map(|advice| advice.pit_recommendations.as_slice())
        .unwrap_or(&[]);

    for rec in recommendations.iter() {
        if let Some(pit_lap) = rec.suggested_pit_lap {
            lines.push(format!(
                "RECOMMENDATION: Agent {} → Pit on lap {} for {} (Priority: {}). Reason: {}",
                rec.agent_id,
                pit_lap,
                rec.tyre.as_deref().unwrap_or("unspecified"),
                rec.priority,
                rec.reason
            ));
        }
    }

    if reply.is_none() && recommendations.is_empty() {
        lines.push(match &response.error {
            Some(e) => format!("Error: {}", e),
            None => String::from("No advice returned."),
        });
    }

    lines
}

/// consult asks the advisor about the current race and returns the lines to show. Advisor
/// failures are turned into a message, the race is only read.
pub fn consult(
    advisor: &dyn StrategyAdvisor,
    race: &Race,
    question: &str,
    timestamp: DateTime<Utc>,
) -> Vec<String> {
    let request = AdvisoryRequest {
        message: question.to_owned(),
        context: race.get_advisory_snapshot(timestamp),
    };

    match advisor.advise(&request) {
        Ok(response) => format_response(&response),
        Err(e) => {
            warn!("Strategy advisor failed: {}", e);
            vec![format!("Network / Server error: {}", e)]
        }
    }
}
