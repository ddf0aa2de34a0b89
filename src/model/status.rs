use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status shared by projects and tasks.
///
/// Any status may move to any other by explicit user action; this is a
/// label, not a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Planejado,
    EmExecucao,
    Abortado,
    Finalizado,
}

impl Status {
    /// Board column order.
    pub const ALL: [Status; 4] = [
        Status::Planejado,
        Status::EmExecucao,
        Status::Abortado,
        Status::Finalizado,
    ];

    /// Wire code sent to and received from the API.
    pub fn code(self) -> &'static str {
        match self {
            Status::Planejado => "PLANEJADO",
            Status::EmExecucao => "EM_EXECUCAO",
            Status::Abortado => "ABORTADO",
            Status::Finalizado => "FINALIZADO",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Planejado => "Planejado",
            Status::EmExecucao => "Em Execução",
            Status::Abortado => "Abortado",
            Status::Finalizado => "Finalizado",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status code: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Team responsible for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    #[default]
    #[serde(rename = "ADMFIN")]
    AdmFin,
    #[serde(rename = "ADMPLN")]
    AdmPln,
    #[serde(rename = "ADMAPO")]
    AdmApo,
}

impl Team {
    pub const ALL: [Team; 3] = [Team::AdmFin, Team::AdmPln, Team::AdmApo];

    pub fn code(self) -> &'static str {
        match self {
            Team::AdmFin => "ADMFIN",
            Team::AdmPln => "ADMPLN",
            Team::AdmApo => "ADMAPO",
        }
    }
}

/// Person responsible for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Responsible {
    #[default]
    Plo,
    Gfu,
    Ctb,
    Gbp,
}

impl Responsible {
    pub const ALL: [Responsible; 4] = [
        Responsible::Plo,
        Responsible::Gfu,
        Responsible::Ctb,
        Responsible::Gbp,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Responsible::Plo => "PLO",
            Responsible::Gfu => "GFU",
            Responsible::Ctb => "CTB",
            Responsible::Gbp => "GBP",
        }
    }
}
