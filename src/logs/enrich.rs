// src/logs/enrich.rs

//! Plan and state objects handed to the renderer.
//!
//! Plan and state records only carry their own payload; rendering them
//! also needs the provider schemas, which only the local configuration
//! knows about. The enriched objects combine both.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::logs::record::{TestPlan, TestState};

/// Format version of the provider schema snapshot given to the renderer.
pub const PROVIDER_FORMAT_VERSION: &str = "1.0";

/// Provider schemas, keyed by provider address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchemas {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub provider_schemas: BTreeMap<String, Value>,
}

impl ProviderSchemas {
    pub fn empty() -> Self {
        Self {
            format_version: PROVIDER_FORMAT_VERSION.to_string(),
            provider_schemas: BTreeMap::new(),
        }
    }

    /// Load the JSON document printed by `terraform providers schema -json`.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn len(&self) -> usize {
        self.provider_schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provider_schemas.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub plan_format_version: String,
    pub output_changes: Map<String, Value>,
    pub resource_changes: Vec<Value>,
    pub resource_drift: Vec<Value>,
    pub relevant_attributes: Vec<Value>,
    pub provider_format_version: String,
    pub provider_schemas: Arc<ProviderSchemas>,
}

impl Plan {
    pub fn enrich(plan: TestPlan, schemas: &Arc<ProviderSchemas>) -> Self {
        Self {
            plan_format_version: plan.format_version,
            output_changes: plan.output_changes,
            resource_changes: plan.resource_changes,
            resource_drift: plan.resource_drift,
            relevant_attributes: plan.relevant_attributes,
            provider_format_version: PROVIDER_FORMAT_VERSION.to_string(),
            provider_schemas: Arc::clone(schemas),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub state_format_version: String,
    pub root_module: Value,
    pub root_module_outputs: Map<String, Value>,
    pub provider_format_version: String,
    pub provider_schemas: Arc<ProviderSchemas>,
}

impl State {
    pub fn enrich(state: TestState, schemas: &Arc<ProviderSchemas>) -> Self {
        let values = state.values.unwrap_or_default();
        Self {
            state_format_version: state.format_version,
            root_module: values.root_module,
            root_module_outputs: values.outputs,
            provider_format_version: PROVIDER_FORMAT_VERSION.to_string(),
            provider_schemas: Arc::clone(schemas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_carries_schemas_and_provider_version() {
        let schemas = Arc::new(ProviderSchemas::from_reader(
            json!({
                "format_version": "1.0",
                "provider_schemas": {"registry.terraform.io/hashicorp/aws": {"provider": {}}}
            })
            .to_string()
            .as_bytes(),
        ).unwrap());

        let plan = Plan::enrich(
            TestPlan {
                format_version: "1.2".into(),
                ..TestPlan::default()
            },
            &schemas,
        );
        assert_eq!(plan.plan_format_version, "1.2");
        assert_eq!(plan.provider_format_version, PROVIDER_FORMAT_VERSION);
        assert_eq!(plan.provider_schemas.len(), 1);
    }

    #[test]
    fn state_without_values_is_empty() {
        let state = State::enrich(TestState::default(), &Arc::new(ProviderSchemas::empty()));
        assert!(state.root_module.is_null());
        assert!(state.root_module_outputs.is_empty());
    }
}
