//! Actor registry.
//!
//! Owns every actor in priority order.  The built-in actors always occupy
//! the first slots:
//!
//! ```text
//!   index   0          1       2          3           4..
//!           settings   clock   propsync   clocksync   project actors
//! ```
//!
//! The registry also carries the device [`Mode`]; switching it is the only
//! way the rest of the system changes behaviour.

use core::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::actor::{Actor, Clock, PropClass, PropValue, Settings, SyncActor};
use crate::error::{Error, PropError, RegistryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unattended: catch-up cycles and sleep.
    Run,
    /// Interactive: operator commands, short sleeps.
    Configure,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "run" => Some(Self::Run),
            "conf" | "configure" => Some(Self::Configure),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Configure => write!(f, "conf"),
        }
    }
}

const BUILTIN_TYPED: usize = 2;

pub struct Registry {
    settings: Settings,
    clock: Clock,
    actors: Vec<Box<dyn Actor>>,
    mode: Mode,
}

impl Registry {
    /// Registry holding the built-in actors only.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            clock: Clock::new(),
            actors: vec![
                Box::new(SyncActor::prop_sync()),
                Box::new(SyncActor::clock_sync()),
            ],
            mode: Mode::Run,
        }
    }

    /// Append a project actor at the lowest priority.
    pub fn add_actor(&mut self, actor: Box<dyn Actor>) -> Result<()> {
        if self.index_of(actor.name()).is_some() {
            return Err(RegistryError::DuplicateActor.into());
        }
        debug!("Registry: added '{}' at {}", actor.name(), self.len());
        self.actors.push(actor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        BUILTIN_TYPED + self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn actor(&self, index: usize) -> Option<&(dyn Actor + 'static)> {
        match index {
            0 => Some(&self.settings),
            1 => Some(&self.clock),
            n => self.actors.get(n - BUILTIN_TYPED).map(|a| &**a),
        }
    }

    pub fn actor_mut(&mut self, index: usize) -> Option<&mut (dyn Actor + 'static)> {
        match index {
            0 => Some(&mut self.settings),
            1 => Some(&mut self.clock),
            n => self.actors.get_mut(n - BUILTIN_TYPED).map(|a| &mut **a),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.actor(i).is_some_and(|a| a.name() == name))
    }

    pub fn names(&self) -> Vec<String> {
        (0..self.len())
            .filter_map(|i| self.actor(i).map(|a| a.name().to_owned()))
            .collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Current time as kept by the clock actor.
    pub fn now(&self) -> i64 {
        self.clock.time()
    }

    // ── Bulk metadata operations ──────────────────────────────

    /// Re-anchor every actor's schedule bookkeeping to `t`.
    pub fn set_actors_time(&mut self, t: i64) {
        for i in 0..self.len() {
            if let Some(actor) = self.actor_mut(i) {
                actor.metadata_mut().timing_mut().set_current_time(t);
            }
        }
    }

    /// Mark every actor changed so the next push sends everything.
    pub fn touch_all(&mut self) {
        for i in 0..self.len() {
            if let Some(actor) = self.actor_mut(i) {
                actor.metadata_mut().changed();
            }
        }
    }

    pub fn clear_all_changed(&mut self) {
        for i in 0..self.len() {
            if let Some(actor) = self.actor_mut(i) {
                actor.metadata_mut().clear_changed();
            }
        }
    }

    pub fn any_dirty(&self) -> bool {
        (0..self.len()).any(|i| self.actor(i).is_some_and(|a| a.metadata().is_dirty()))
    }

    // ── Property access by name ───────────────────────────────

    /// Parse and store `raw` into `actor.prop`, marking the actor changed.
    pub fn set_prop(&mut self, actor: &str, prop: &str, raw: &str) -> Result<()> {
        let index = self.index_of(actor).ok_or(RegistryError::UnknownActor)?;
        let target = self.actor_mut(index).ok_or(RegistryError::UnknownActor)?;
        target.write_prop(prop, raw)?;
        Ok(())
    }

    pub fn prop_value(&self, actor: &str, prop: &str) -> Result<PropValue> {
        let target = self
            .index_of(actor)
            .and_then(|i| self.actor(i))
            .ok_or(RegistryError::UnknownActor)?;
        let index = target.prop_index(prop).ok_or(PropError::Unknown)?;
        Ok(target.get_prop(index).ok_or(PropError::Unknown)?)
    }

    pub fn is_sensitive(&self, actor: &str, prop: &str) -> bool {
        self.index_of(actor)
            .and_then(|i| self.actor(i))
            .and_then(|a| a.props().iter().find(|d| d.name == prop))
            .is_some_and(|d| d.class == PropClass::Sensitive)
    }

    /// Human-readable property listing, sensitive values omitted.
    pub fn describe(&self, actor: Option<&str>) -> Result<String> {
        let indices: Vec<usize> = match actor {
            Some(name) => vec![self.index_of(name).ok_or(RegistryError::UnknownActor)?],
            None => (0..self.len()).collect(),
        };
        let mut out = String::new();
        for i in indices {
            let Some(a) = self.actor(i) else { continue };
            for (j, desc) in a.props().iter().enumerate() {
                if desc.class == PropClass::Sensitive {
                    continue;
                }
                if let Some(value) = a.get_prop(j) {
                    out.push_str(&format!("{}.{}: {}\n", a.name(), desc.name, value));
                }
            }
        }
        Ok(out)
    }

    // ── Whole-set documents ───────────────────────────────────

    /// `{ actor: { prop: "value" } }` for every actor.
    pub fn props_document(&self, include_sensitive: bool) -> Value {
        self.document(include_sensitive, false)
    }

    pub fn props_json(&self, include_sensitive: bool) -> String {
        self.props_document(include_sensitive).to_string()
    }

    /// Document written to the local file store: sensitive values included,
    /// actors that opted out of persistence left out.
    pub fn stored_props_json(&self) -> String {
        self.document(true, true).to_string()
    }

    fn document(&self, include_sensitive: bool, persisted_only: bool) -> Value {
        let mut doc = Map::new();
        for i in 0..self.len() {
            let Some(actor) = self.actor(i) else { continue };
            if persisted_only && !actor.metadata().persist() {
                continue;
            }
            let mut props = Map::new();
            for (j, desc) in actor.props().iter().enumerate() {
                if desc.class == PropClass::Sensitive && !include_sensitive {
                    continue;
                }
                if let Some(value) = actor.get_prop(j) {
                    props.insert(desc.name.to_owned(), Value::String(value.to_string()));
                }
            }
            doc.insert(actor.name().to_owned(), Value::Object(props));
        }
        Value::Object(doc)
    }

    /// Apply a document produced by [`props_json`](Self::props_json).
    ///
    /// Unknown actors or properties and unparsable values are skipped.  The
    /// dirty flags are left alone.  Returns the number of values applied.
    pub fn apply_props_json(&mut self, json: &str) -> Result<usize> {
        let doc: Value =
            serde_json::from_str(json).map_err(|_| Error::Document("malformed JSON"))?;
        let Value::Object(actors) = doc else {
            return Err(Error::Document("expected an object"));
        };

        let mut applied = 0;
        for (name, props) in actors {
            let Some(actor) = self.index_of(&name).and_then(|i| self.actor_mut(i)) else {
                warn!("Registry: ignoring unknown actor '{}'", name);
                continue;
            };
            let Value::Object(props) = props else {
                warn!("Registry: '{}' is not an object", name);
                continue;
            };
            for (prop, raw) in props {
                let Some(index) = actor.prop_index(&prop) else {
                    warn!("Registry: ignoring unknown property '{}.{}'", name, prop);
                    continue;
                };
                let raw = match raw {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let kind = actor.props()[index].kind;
                match PropValue::parse(kind, &raw).and_then(|v| actor.set_prop(index, v)) {
                    Ok(()) => applied += 1,
                    Err(e) => warn!("Registry: '{}.{}' = '{}' rejected: {}", name, prop, raw, e),
                }
            }
        }
        Ok(applied)
    }
}
