use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use dcr_gateway::{CreateFailure, DiscountGateway, UserError};

use crate::discount_gid;

/// First identifier handed out for created discounts.
const FIRST_CREATED_ID: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Find(String),
    Create { code: String, title: String },
}

/// How a scripted `create` behaves for one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateScript {
    /// Created with a fresh identifier, which later lookups also see.
    Created,
    /// Created, but the response carries no identifier. The single recovery
    /// lookup is recorded; it finds the discount only when `visible`.
    CreatedWithoutId { visible: bool },
    /// The request failed in transport; nothing was created.
    Unconfirmed,
    Rejected(Vec<UserError>),
    Unclassified(String),
}

#[derive(Debug)]
struct Script {
    registry: BTreeMap<String, String>,
    create_scripts: BTreeMap<String, CreateScript>,
    panic_on: BTreeSet<String>,
    lookup_outage: bool,
    calls: Vec<GatewayCall>,
    next_id: u64,
}

/// Scripted stand-in for the remote platform.
#[derive(Debug)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                registry: BTreeMap::new(),
                create_scripts: BTreeMap::new(),
                panic_on: BTreeSet::new(),
                lookup_outage: false,
                calls: Vec::new(),
                next_id: FIRST_CREATED_ID,
            }),
        }
    }

    /// Register an existing discount.
    pub fn with_existing(self, code: &str, id: &str) -> Self {
        self.lock().registry.insert(code.to_string(), id.to_string());
        self
    }

    /// Script `create` for `code`. Unscripted codes behave as [`CreateScript::Created`].
    pub fn on_create(self, code: &str, script: CreateScript) -> Self {
        self.lock().create_scripts.insert(code.to_string(), script);
        self
    }

    /// Any call for `code` panics.
    pub fn panic_on(self, code: &str) -> Self {
        self.lock().panic_on.insert(code.to_string());
        self
    }

    /// Every lookup fails (reported as absence, like a transport error).
    pub fn set_lookup_outage(&self, down: bool) {
        self.lock().lookup_outage = down;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn find_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::Find(_)))
            .count()
    }

    pub fn create_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::Create { .. }))
            .count()
    }

    /// Calls that mention `code`.
    pub fn calls_for(&self, code: &str) -> Vec<GatewayCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| match c {
                GatewayCall::Find(c) => c == code,
                GatewayCall::Create { code: c, .. } => c == code,
            })
            .cloned()
            .collect()
    }

    /// Identifier currently registered for `code`.
    pub fn registered(&self, code: &str) -> Option<String> {
        self.lock().registry.get(code).cloned()
    }

    // A panic raised while the lock is held poisons it; later calls still
    // need the recorded state.
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_panic(&self, code: &str) {
        let should_panic = self.lock().panic_on.contains(code);
        if should_panic {
            panic!("scripted gateway panic for code {code}");
        }
    }

    fn lookup(&self, code: &str) -> Option<String> {
        let mut s = self.lock();
        s.calls.push(GatewayCall::Find(code.to_string()));
        if s.lookup_outage {
            return None;
        }
        s.registry.get(code).cloned()
    }

    fn register_new(&self, code: &str) -> String {
        let mut s = self.lock();
        let id = discount_gid(s.next_id);
        s.next_id += 1;
        s.registry.insert(code.to_string(), id.clone());
        id
    }
}

#[async_trait::async_trait]
impl DiscountGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn find(&self, code: &str) -> Option<String> {
        self.check_panic(code);
        self.lookup(code)
    }

    async fn create(&self, code: &str, title: &str) -> Result<Option<String>, CreateFailure> {
        self.check_panic(code);
        let script = {
            let mut s = self.lock();
            s.calls.push(GatewayCall::Create {
                code: code.to_string(),
                title: title.to_string(),
            });
            s.create_scripts
                .get(code)
                .cloned()
                .unwrap_or(CreateScript::Created)
        };

        match script {
            CreateScript::Created => Ok(Some(self.register_new(code))),
            CreateScript::CreatedWithoutId { visible } => {
                if visible {
                    self.register_new(code);
                }
                Ok(self.lookup(code))
            }
            CreateScript::Unconfirmed => Ok(None),
            CreateScript::Rejected(errors) => Err(CreateFailure::Rejected(errors)),
            CreateScript::Unclassified(msg) => Err(CreateFailure::Unclassified(msg)),
        }
    }
}
