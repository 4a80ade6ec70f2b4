//! Catalogue of REST commands understood by the backend.

use serde_json::Value;

use crate::models::RegistrationRequest;

/// Request body of a command. Commands without a body are sent as GET.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    None,
    /// Raw value, sent as `text/plain`.
    Text(String),
    /// JSON document.
    Json(Value),
}

/// A REST command, addressed relative to the backend base URL.
#[derive(Debug, Clone, PartialEq)]
pub enum RestCommand {
    VariableRead(String),
    VariableReadMany(Vec<String>),
    VariableWrite { name: String, value: String },
    VariableReadGroupArray(String),
    VariableReadGroupArrayMany(Vec<String>),
    VariableReadInterventionArray(String),
    VariableReadInterventionArrayMany(Vec<String>),
    CalculateGroupAverage(String),
    CalculateInterventionAverage(String),
    Votings(String),
    VotingsGroupArray(String),
    VotingsInterventionArray(String),
    Vote { voting: String, receiver: String },
    Unvote { voting: String, receiver: String },
    StoreCredit { kind: String, id: String },
    Register(RegistrationRequest),
}

impl RestCommand {
    /// Command path, e.g. `variable/read/score`. Segments are percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Self::VariableRead(name) => format!("variable/read/{}", enc(name)),
            Self::VariableReadMany(names) => format!("variable/readMany/{}", enc_list(names)),
            Self::VariableWrite { name, .. } => format!("variable/write/{}", enc(name)),
            Self::VariableReadGroupArray(name) => {
                format!("variable/readGroupArray/{}", enc(name))
            }
            Self::VariableReadGroupArrayMany(names) => {
                format!("variable/readGroupArrayMany/{}", enc_list(names))
            }
            Self::VariableReadInterventionArray(name) => {
                format!("variable/readInterventionArray/{}", enc(name))
            }
            Self::VariableReadInterventionArrayMany(names) => {
                format!("variable/readInterventionArrayMany/{}", enc_list(names))
            }
            Self::CalculateGroupAverage(name) => {
                format!("variable/calculateGroupAverage/{}", enc(name))
            }
            Self::CalculateInterventionAverage(name) => {
                format!("variable/calculateInterventionAverage/{}", enc(name))
            }
            Self::Votings(name) => format!("voting/votings/{}", enc(name)),
            Self::VotingsGroupArray(name) => format!("voting/votingsGroupArray/{}", enc(name)),
            Self::VotingsInterventionArray(name) => {
                format!("voting/votingsInterventionArray/{}", enc(name))
            }
            Self::Vote { voting, receiver } => {
                format!("voting/vote/{}/{}", enc(voting), enc(receiver))
            }
            Self::Unvote { voting, receiver } => {
                format!("voting/unvote/{}/{}", enc(voting), enc(receiver))
            }
            Self::StoreCredit { kind, id } => {
                format!("credits/storeCredit/{}/{}", enc(kind), enc(id))
            }
            Self::Register(_) => "deepstream/register".to_string(),
        }
    }

    pub fn body(&self) -> RequestBody {
        match self {
            Self::VariableWrite { value, .. } => RequestBody::Text(value.clone()),
            Self::Register(request) => {
                // RegistrationRequest has only string fields; serialization cannot fail.
                RequestBody::Json(serde_json::to_value(request).unwrap_or(Value::Null))
            }
            _ => RequestBody::None,
        }
    }
}

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn enc_list(names: &[String]) -> String {
    names.iter().map(|n| enc(n)).collect::<Vec<_>>().join(",")
}
