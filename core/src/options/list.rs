use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::merge::overlay_fields;

/// `POST /container/list` body. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOptionsJson {
    pub all: Option<bool>,
    pub external: Option<bool>,
    pub filters: Option<BTreeMap<String, Vec<String>>>,
    /// Wider than the target so out-of-range values surface as a mismatch
    /// instead of a decode error.
    pub last: Option<i64>,
    pub namespace: Option<bool>,
    pub size: Option<bool>,
    pub sync: Option<bool>,
}

/// Container listing options as the runtime understands them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    pub all: bool,
    pub external: bool,
    pub filters: BTreeMap<String, Vec<String>>,
    /// Only the `last` most recently created containers; 0 means no limit.
    pub last: i32,
    pub namespace: bool,
    pub size: bool,
    pub sync: bool,
}

overlay_fields!(ListOptionsJson => ListOptions {
    all,
    external,
    filters,
    last,
    namespace,
    size,
    sync,
});
