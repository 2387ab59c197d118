//! Host records derived from inventory variables.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::types::{HostId, ProbeFailure, ProbeResult};

/// Inventory variables for one host.
pub type HostVars = serde_json::Map<String, Value>;

/// Variable holding the address to connect to.
pub const ADDRESS_VAR: &str = "ansible_host";

/// Variable that opts a host out of patching when falsy.
pub const ELIGIBILITY_VAR: &str = "autopatch";

/// Variable that selects the alternate credential pair when truthy.
pub const ALTERNATE_AUTH_VAR: &str = "freeipa_managed";

const FALSY_WORDS: [&str; 3] = ["false", "no", "0"];

/// A user/secret pair. The secret never appears in `Debug` or serialized output.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Credentials {
    user: String,
    #[serde(skip_serializing)]
    secret: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The two credential pairs a run can hand out.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub default: Credentials,
    pub alternate: Credentials,
}

impl CredentialSet {
    pub fn select(&self, alternate_auth: bool) -> &Credentials {
        if alternate_auth {
            &self.alternate
        } else {
            &self.default
        }
    }
}

/// Identity, address, credentials and eligibility of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    pub id: HostId,
    pub address: String,
    pub credentials: Credentials,
    pub eligible: bool,
    pub alternate_auth: bool,
}

impl HostRecord {
    /// Build a record from the host's inventory variables.
    pub fn from_vars(id: &str, vars: &HostVars, credentials: &CredentialSet) -> Self {
        let address = match vars.get(ADDRESS_VAR) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => id.to_string(),
        };
        let alternate_auth = vars.get(ALTERNATE_AUTH_VAR).is_some_and(is_truthy);

        Self {
            id: id.to_string(),
            address,
            credentials: credentials.select(alternate_auth).clone(),
            eligible: is_eligible(vars),
            alternate_auth,
        }
    }
}

/// A host record with its probe result attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbedHost {
    pub record: HostRecord,
    pub probe: ProbeResult,
}

impl ProbedHost {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn user(&self) -> &str {
        self.record.credentials.user()
    }

    pub fn probe_failure(&self) -> Option<ProbeFailure> {
        self.probe.failure()
    }
}

/// Hosts are eligible unless the eligibility variable is explicitly falsy.
fn is_eligible(vars: &HostVars) -> bool {
    match vars.get(ELIGIBILITY_VAR) {
        None => true,
        Some(value) => !FALSY_WORDS.contains(&stringify(value).as_str()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            !s.is_empty() && !FALSY_WORDS.contains(&s.as_str())
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn stringify(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    raw.trim().to_lowercase()
}
