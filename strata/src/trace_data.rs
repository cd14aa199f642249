//! Trace store for replay
//!
//! This module holds the immutable, already-materialized trace the folding
//! passes read from, plus the collaborator queries they rely on: resolving
//! open ends against the last known time, looking up child levels by handle
//! and reading the capture's delay/resolution constants.
//!
//! A trace is loaded once from a JSON replay document, validated, and then
//! only ever borrowed immutably. Draw records produced each frame borrow
//! straight into it.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use strata_common::{ChildHandle, ContextSwitchRegion, GhostZone, SampleData, ZoneEvent, ZoneId};

use crate::domain::{ThreadId, TraceError};

// =============================================================================
// ZONE LEVELS
// =============================================================================

/// One level of a call hierarchy, in either of its two storage shapes.
///
/// Short-lived levels are stored inline; levels that were built while the
/// capture was still running keep ids into the trace's zone arena instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ZoneLevel {
    Direct(Vec<ZoneEvent>),
    Indirect(Vec<ZoneId>),
}

impl Default for ZoneLevel {
    fn default() -> Self {
        ZoneLevel::Direct(Vec::new())
    }
}

impl ZoneLevel {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ZoneLevel::Direct(zones) => zones.len(),
            ZoneLevel::Indirect(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zone at `index`, resolving indirect ids through `arena`.
    ///
    /// # Panics
    /// Panics if `index` is out of range or an id dangles; validated traces
    /// never contain dangling ids.
    #[must_use]
    pub fn get<'a>(&'a self, index: usize, arena: &'a [ZoneEvent]) -> &'a ZoneEvent {
        match self {
            ZoneLevel::Direct(zones) => &zones[index],
            ZoneLevel::Indirect(ids) => &arena[ids[index].index()],
        }
    }

    #[must_use]
    pub fn first<'a>(&'a self, arena: &'a [ZoneEvent]) -> Option<&'a ZoneEvent> {
        (!self.is_empty()).then(|| self.get(0, arena))
    }

    #[must_use]
    pub fn last<'a>(&'a self, arena: &'a [ZoneEvent]) -> Option<&'a ZoneEvent> {
        self.len().checked_sub(1).map(|i| self.get(i, arena))
    }
}

// =============================================================================
// PER-THREAD DATA
// =============================================================================

/// Running regions of one thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSwitch {
    pub regions: Vec<ContextSwitchRegion>,
    /// Sum of closed region durations, computed on load.
    #[serde(skip)]
    pub running_time: i64,
}

impl ContextSwitch {
    #[must_use]
    pub fn new(regions: Vec<ContextSwitchRegion>) -> Self {
        let mut cs = Self { regions, running_time: 0 };
        cs.update_running_time();
        cs
    }

    fn update_running_time(&mut self) {
        self.running_time =
            self.regions.iter().filter_map(|r| r.end.closed().map(|end| end - r.start)).sum();
    }
}

/// Everything recorded for a single thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadData {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_fiber: bool,
    /// Top-level zones.
    #[serde(default)]
    pub timeline: ZoneLevel,
    /// Top-level ghost zones.
    #[serde(default)]
    pub ghost_zones: Vec<GhostZone>,
    #[serde(default)]
    pub samples: Vec<SampleData>,
    #[serde(default)]
    pub kernel_sample_count: u64,
    /// Message timestamps.
    #[serde(default)]
    pub messages: Vec<i64>,
}

impl ThreadData {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        ThreadId(self.id)
    }
}

// =============================================================================
// TRACE
// =============================================================================

/// Immutable trace snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub first_time: i64,
    pub last_time: i64,
    /// Worst-case delivery delay of events; widens the zone clip margin.
    #[serde(default)]
    pub delay: i64,
    /// Timer resolution; widens the zone clip end.
    #[serde(default)]
    pub resolution: i64,
    /// Arena for zones referenced by indirect levels.
    #[serde(default)]
    pub zones: Vec<ZoneEvent>,
    #[serde(default)]
    pub zone_children: Vec<ZoneLevel>,
    #[serde(default)]
    pub ghost_children: Vec<Vec<GhostZone>>,
    /// Ghost zones are reconstructed after capture; false until that is done.
    #[serde(default)]
    pub ghost_zones_ready: bool,
    pub threads: Vec<ThreadData>,
    #[serde(default)]
    pub context_switches: HashMap<u64, ContextSwitch>,
}

impl Trace {
    /// Load and validate a JSON replay document.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a valid replay
    /// document, or violates the ordering the folding passes rely on.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let trace = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            "Loaded {}: {} threads, {} arena zones, {} child levels",
            path.display(),
            trace.threads.len(),
            trace.zones.len(),
            trace.zone_children.len()
        );
        Ok(trace)
    }

    /// Parse and validate a replay document from any reader.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or an invalid trace.
    pub fn from_reader(reader: impl Read) -> Result<Self, TraceError> {
        let mut trace: Trace = serde_json::from_reader(reader)?;
        trace.finalize()?;
        Ok(trace)
    }

    /// Compute derived fields and validate.
    ///
    /// # Errors
    /// Returns the first validation failure.
    pub fn finalize(&mut self) -> Result<(), TraceError> {
        for cs in self.context_switches.values_mut() {
            cs.update_running_time();
        }
        self.validate()
    }

    // -------------------------------------------------------------------------
    // Collaborator queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn last_time(&self) -> i64 {
        self.last_time
    }

    #[must_use]
    pub fn delay(&self) -> i64 {
        self.delay
    }

    #[must_use]
    pub fn resolution(&self) -> i64 {
        self.resolution
    }

    /// Effective end of a zone; still-running zones end at the last known time.
    #[must_use]
    pub fn zone_end(&self, zone: &ZoneEvent) -> i64 {
        zone.end.or_last(self.last_time)
    }

    #[must_use]
    pub fn region_end(&self, region: &ContextSwitchRegion) -> i64 {
        region.end.or_last(self.last_time)
    }

    #[must_use]
    pub fn zone_children(&self, handle: ChildHandle) -> &ZoneLevel {
        &self.zone_children[handle.index()]
    }

    #[must_use]
    pub fn ghost_children(&self, handle: ChildHandle) -> &[GhostZone] {
        &self.ghost_children[handle.index()]
    }

    #[must_use]
    pub fn context_switches(&self, thread: u64) -> Option<&ContextSwitch> {
        self.context_switches.get(&thread)
    }

    /// Total zones in `level` including all descendants. Only meaningful on a
    /// validated trace; a cyclic child tree never terminates.
    #[must_use]
    pub fn zone_count(&self, level: &ZoneLevel) -> u64 {
        let mut count = 0;
        let mut pending = vec![level];
        while let Some(level) = pending.pop() {
            count += level.len() as u64;
            for i in 0..level.len() {
                if let Some(child) = level.get(i, &self.zones).child {
                    pending.push(self.zone_children(child));
                }
            }
        }
        count
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Check the invariants the folding passes assume without verifying:
    /// every sequence sorted ascending, every handle in range and no child
    /// level reachable from itself.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), TraceError> {
        if self.first_time > self.last_time {
            return Err(TraceError::InvertedRange { first: self.first_time, last: self.last_time });
        }

        for (level, zones) in self.zone_children.iter().enumerate() {
            self.check_level(zones, &format!("zone level {level}"))?;
        }
        for (level, ghosts) in self.ghost_children.iter().enumerate() {
            self.check_ghosts(ghosts, &format!("ghost level {level}"))?;
        }
        self.check_zone_children(&self.zones, "zone arena")?;

        for thread in &self.threads {
            let id = thread.id;
            self.check_level(&thread.timeline, &format!("thread {id} timeline"))?;
            self.check_ghosts(&thread.ghost_zones, &format!("thread {id} ghost zones"))?;
            check_sorted(thread.samples.iter().map(|s| s.time), || {
                format!("thread {id} samples")
            })?;
            check_sorted(thread.messages.iter().copied(), || format!("thread {id} messages"))?;
        }

        for (&id, cs) in &self.context_switches {
            if !self.threads.iter().any(|t| t.id == id) {
                return Err(TraceError::UnknownThread(ThreadId(id)));
            }
            check_sorted(cs.regions.iter().map(|r| r.start), || {
                format!("thread {id} context switches")
            })?;
        }

        check_acyclic("zone", self.zone_children.len(), |level| {
            let level = &self.zone_children[level];
            (0..level.len()).filter_map(|i| level.get(i, &self.zones).child).collect()
        })?;
        check_acyclic("ghost", self.ghost_children.len(), |level| {
            self.ghost_children[level].iter().filter_map(|g| g.child).collect()
        })?;

        debug!("Trace validated: {} threads", self.threads.len());
        Ok(())
    }

    fn check_level(&self, level: &ZoneLevel, what: &str) -> Result<(), TraceError> {
        match level {
            ZoneLevel::Direct(zones) => self.check_zone_children(zones, what)?,
            ZoneLevel::Indirect(ids) => {
                if let Some(bad) = ids.iter().find(|id| id.index() >= self.zones.len()) {
                    return Err(TraceError::DanglingZone {
                        what: what.to_string(),
                        zone: bad.0,
                        len: self.zones.len(),
                    });
                }
            }
        }
        check_sorted((0..level.len()).map(|i| level.get(i, &self.zones).start), || what.to_string())
    }

    fn check_zone_children(&self, zones: &[ZoneEvent], what: &str) -> Result<(), TraceError> {
        let len = self.zone_children.len();
        match zones.iter().filter_map(|z| z.child).find(|h| h.index() >= len) {
            Some(handle) => {
                Err(TraceError::DanglingChild { what: what.to_string(), handle: handle.0, len })
            }
            None => Ok(()),
        }
    }

    fn check_ghosts(&self, ghosts: &[GhostZone], what: &str) -> Result<(), TraceError> {
        let len = self.ghost_children.len();
        if let Some(handle) = ghosts.iter().filter_map(|g| g.child).find(|h| h.index() >= len) {
            return Err(TraceError::DanglingChild { what: what.to_string(), handle: handle.0, len });
        }
        check_sorted(ghosts.iter().map(|g| g.start), || what.to_string())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Depth-first walk over `len` child levels; a level reached while it is
/// still on the walk stack closes a cycle. Levels shared by several parents
/// are fine. Handles must already be in range.
fn check_acyclic(
    what: &'static str,
    len: usize,
    children: impl Fn(usize) -> Vec<ChildHandle>,
) -> Result<(), TraceError> {
    let mut marks = vec![Visit::New; len];
    for root in 0..len {
        if marks[root] != Visit::New {
            continue;
        }
        marks[root] = Visit::Active;
        let mut stack = vec![(root, children(root), 0usize)];
        while let Some((level, next, pos)) = stack.last_mut() {
            let child = next.get(*pos).copied();
            *pos += 1;
            match child {
                None => {
                    marks[*level] = Visit::Done;
                    stack.pop();
                }
                Some(handle) => match marks[handle.index()] {
                    Visit::Active => {
                        return Err(TraceError::CyclicChildren { what, handle: handle.0 });
                    }
                    Visit::New => {
                        marks[handle.index()] = Visit::Active;
                        stack.push((handle.index(), children(handle.index()), 0));
                    }
                    Visit::Done => {}
                },
            }
        }
    }
    Ok(())
}

fn check_sorted(
    times: impl Iterator<Item = i64>,
    what: impl FnOnce() -> String,
) -> Result<(), TraceError> {
    let mut prev = i64::MIN;
    for (index, t) in times.enumerate() {
        if t < prev {
            return Err(TraceError::Unsorted { what: what(), index });
        }
        prev = t;
    }
    Ok(())
}
