use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use crate::{
    error::Result,
    resources::{model::Name as ModelName, trailing_id},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: Name,
    #[serde(default)]
    pub display_name: String,
}

/// Resource name of an endpoint, `projects/{p}/locations/{l}/endpoints/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    /// The endpoint id, i.e. the trailing segment of the resource name.
    pub fn id(&self) -> Result<Id> {
        trailing_id(&self.0, "endpoints").map(|id| Id(id.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

impl Display for Id {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEndpoint<'request> {
    pub display_name: &'request str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedModel<'request> {
    pub model: &'request ModelName,
    pub display_name: &'request str,
    pub dedicated_resources: DedicatedResources<'request>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedicatedResources<'request> {
    pub machine_spec: MachineSpec<'request>,
    pub min_replica_count: u32,
    pub max_replica_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec<'request> {
    pub machine_type: &'request str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequest<'request> {
    pub deployed_model: DeployedModel<'request>,
    pub traffic_split: BTreeMap<String, u32>,
}

// Key "0" refers to the model being deployed by the same request.
pub(crate) static DEFAULT_TRAFFIC_SPLIT: Lazy<BTreeMap<String, u32>> =
    Lazy::new(|| BTreeMap::from([("0".to_owned(), 100)]));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployModelResponse {
    pub deployed_model: DeployedModelRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployedModelRef {
    pub id: String,
}
