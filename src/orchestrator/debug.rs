//! Debug variables.
//!
//! Static variables record what the process started with; the mutable set is
//! seeded from them and may be changed at runtime through `/_debug/varz`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::config::AndroidBuild;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StaticVariables {
    pub initial_cvd_bin_android_build_id: String,
    pub initial_cvd_bin_android_build_target: String,
}

impl From<&AndroidBuild> for StaticVariables {
    fn from(build: &AndroidBuild) -> Self {
        Self {
            initial_cvd_bin_android_build_id: build.id.clone(),
            initial_cvd_bin_android_build_target: build.target.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variables {
    pub cvd_bin_android_build_id: String,
    pub cvd_bin_android_build_target: String,
}

/// Static and current variables together, as served by `/_debug/varz`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Varz {
    #[serde(flatten)]
    pub statics: StaticVariables,
    #[serde(flatten)]
    pub variables: Variables,
}

#[derive(Debug)]
pub struct DebugVariablesManager {
    statics: StaticVariables,
    variables: ArcSwap<Variables>,
}

impl DebugVariablesManager {
    pub fn new(statics: StaticVariables) -> Self {
        let variables = Variables {
            cvd_bin_android_build_id: statics.initial_cvd_bin_android_build_id.clone(),
            cvd_bin_android_build_target: statics.initial_cvd_bin_android_build_target.clone(),
        };
        Self {
            statics,
            variables: ArcSwap::from_pointee(variables),
        }
    }

    pub fn statics(&self) -> &StaticVariables {
        &self.statics
    }

    pub fn variables(&self) -> Arc<Variables> {
        self.variables.load_full()
    }

    pub fn update(&self, variables: Variables) {
        tracing::info!(
            build_id = %variables.cvd_bin_android_build_id,
            build_target = %variables.cvd_bin_android_build_target,
            "Debug variables updated"
        );
        self.variables.store(Arc::new(variables));
    }

    pub fn varz(&self) -> Varz {
        Varz {
            statics: self.statics.clone(),
            variables: self.variables().as_ref().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> DebugVariablesManager {
        DebugVariablesManager::new(StaticVariables::from(&AndroidBuild {
            id: "10796991".into(),
            target: "aosp_cf_x86_64_phone-trunk_staging-userdebug".into(),
        }))
    }

    #[test]
    fn seeded_from_static_build() {
        let dvm = manager();
        let vars = dvm.variables();
        assert_eq!(vars.cvd_bin_android_build_id, "10796991");
        assert_eq!(vars.cvd_bin_android_build_target, dvm.statics().initial_cvd_bin_android_build_target);
    }

    #[test]
    fn update_leaves_statics_alone() {
        let dvm = manager();
        dvm.update(Variables {
            cvd_bin_android_build_id: "1".into(),
            cvd_bin_android_build_target: "t".into(),
        });

        let varz = dvm.varz();
        assert_eq!(varz.variables.cvd_bin_android_build_id, "1");
        assert_eq!(varz.statics.initial_cvd_bin_android_build_id, "10796991");

        let json = serde_json::to_value(&varz).unwrap();
        assert_eq!(json["cvd_bin_android_build_id"], "1");
        assert_eq!(json["initial_cvd_bin_android_build_id"], "10796991");
    }
}
