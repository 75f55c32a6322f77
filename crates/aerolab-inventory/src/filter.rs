//! Filter algebra over inventory snapshots
//!
//! A [`View`] is a list of indices into a shared, immutable backing slice.
//! Every `with_*` call returns a new view and leaves the receiver untouched,
//! so chains can be built in any order and from many threads at once over the
//! same snapshot. Because each filter only ever removes indices by a predicate
//! on the resource itself, applying the same filters in a different order
//! always selects the same resources, in base order.

use crate::model::{BackendType, Instance, Volume};
use crate::state::{InstanceState, VolumeState};
use crate::tags::tags_match;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::ops::Deref;
use std::sync::Arc;

/// Materialized, immutable list of resources
#[derive(Debug)]
pub struct ResourceList<T>(Arc<[T]>);

pub type InstanceList = ResourceList<Instance>;
pub type VolumeList = ResourceList<Volume>;

impl<T> ResourceList<T> {
    /// Start a filter chain over this list without copying it
    pub fn view(&self) -> View<T> {
        View {
            selected: (0..self.0.len()).collect(),
            base: Arc::clone(&self.0),
        }
    }
}

impl<T> Clone for ResourceList<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl<T> Deref for ResourceList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for ResourceList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(Arc::from(items))
    }
}

impl<T> FromIterator<T> for ResourceList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a ResourceList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Serialize> Serialize for ResourceList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Lazy filtered view over a snapshot
#[derive(Debug)]
pub struct View<T> {
    base: Arc<[T]>,
    selected: Arc<[usize]>,
}

pub type Instances = View<Instance>;
pub type Volumes = View<Volume>;

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            selected: Arc::clone(&self.selected),
        }
    }
}

impl<T> From<Vec<T>> for View<T> {
    fn from(items: Vec<T>) -> Self {
        ResourceList::from(items).view()
    }
}

impl<T> View<T> {
    /// Keep the resources matching `predicate`
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Self {
        Self {
            base: Arc::clone(&self.base),
            selected: self
                .selected
                .iter()
                .copied()
                .filter(|&i| predicate(&self.base[i]))
                .collect(),
        }
    }

    /// Number of selected resources; does not materialize
    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.selected.iter().map(|&i| &self.base[i])
    }
}

impl<T: Clone> View<T> {
    /// Resolve the view into a concrete snapshot, in base order
    pub fn describe(&self) -> ResourceList<T> {
        self.iter().cloned().collect()
    }
}

fn owned_set<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    values.into_iter().map(|s| s.as_ref().to_string()).collect()
}

impl View<Instance> {
    /// Exact match against any of `names`
    pub fn with_cluster_name<S: AsRef<str>>(&self, names: impl IntoIterator<Item = S>) -> Self {
        let names = owned_set(names);
        self.filter(|i| names.contains(&i.cluster_name))
    }

    pub fn with_node_no(&self, numbers: impl IntoIterator<Item = u32>) -> Self {
        let numbers: BTreeSet<u32> = numbers.into_iter().collect();
        self.filter(|i| numbers.contains(&i.node_no))
    }

    pub fn with_state(&self, states: impl IntoIterator<Item = InstanceState>) -> Self {
        let states: BTreeSet<InstanceState> = states.into_iter().collect();
        self.filter(|i| states.contains(&i.state))
    }

    pub fn with_not_state(&self, states: impl IntoIterator<Item = InstanceState>) -> Self {
        let states: BTreeSet<InstanceState> = states.into_iter().collect();
        self.filter(|i| !states.contains(&i.state))
    }

    /// Excludes terminating and terminated instances
    pub fn live(&self) -> Self {
        self.filter(|i| i.state.is_live())
    }

    /// Every pair must match; an empty value only requires the key
    pub fn with_tags(&self, tags: &HashMap<String, String>) -> Self {
        self.filter(|i| tags_match(&i.tags, tags))
    }

    pub fn with_owner(&self, owner: &str) -> Self {
        self.filter(|i| i.owner == owner)
    }

    pub fn with_name(&self, name: &str) -> Self {
        self.filter(|i| i.name == name)
    }

    pub fn with_instance_id<S: AsRef<str>>(&self, ids: impl IntoIterator<Item = S>) -> Self {
        let ids = owned_set(ids);
        self.filter(|i| ids.contains(&i.instance_id))
    }

    pub fn with_backend_type(&self, types: impl IntoIterator<Item = BackendType>) -> Self {
        let types: BTreeSet<BackendType> = types.into_iter().collect();
        self.filter(|i| types.contains(&i.backend_type))
    }

    pub fn with_zone_name<S: AsRef<str>>(&self, zones: impl IntoIterator<Item = S>) -> Self {
        let zones = owned_set(zones);
        self.filter(|i| zones.contains(&i.zone_name))
    }

    pub fn with_os_name(&self, os_name: &str) -> Self {
        self.filter(|i| i.operating_system.name == os_name)
    }

    pub fn with_expired(&self, expired: bool, now: DateTime<Utc>) -> Self {
        self.filter(|i| i.is_expired(now) == expired)
    }

    /// Distinct cluster names in the view
    pub fn cluster_names(&self) -> BTreeSet<String> {
        self.iter().map(|i| i.cluster_name.clone()).collect()
    }

    /// Distinct node numbers in the view
    pub fn node_numbers(&self) -> BTreeSet<u32> {
        self.iter().map(|i| i.node_no).collect()
    }
}

impl View<Volume> {
    pub fn with_name<S: AsRef<str>>(&self, names: impl IntoIterator<Item = S>) -> Self {
        let names = owned_set(names);
        self.filter(|v| names.contains(&v.name))
    }

    pub fn with_owner(&self, owner: &str) -> Self {
        self.filter(|v| v.owner == owner)
    }

    pub fn with_state(&self, states: impl IntoIterator<Item = VolumeState>) -> Self {
        let states: BTreeSet<VolumeState> = states.into_iter().collect();
        self.filter(|v| states.contains(&v.state))
    }

    pub fn with_not_state(&self, states: impl IntoIterator<Item = VolumeState>) -> Self {
        let states: BTreeSet<VolumeState> = states.into_iter().collect();
        self.filter(|v| !states.contains(&v.state))
    }

    /// Excludes deleting and deleted volumes
    pub fn live(&self) -> Self {
        self.filter(|v| v.state.is_live())
    }

    pub fn with_tags(&self, tags: &HashMap<String, String>) -> Self {
        self.filter(|v| tags_match(&v.tags, tags))
    }

    pub fn with_delete_on_termination(&self, delete_on_termination: bool) -> Self {
        self.filter(|v| v.delete_on_termination == delete_on_termination)
    }

    pub fn with_backend_type(&self, types: impl IntoIterator<Item = BackendType>) -> Self {
        let types: BTreeSet<BackendType> = types.into_iter().collect();
        self.filter(|v| types.contains(&v.backend_type))
    }

    pub fn with_zone_name<S: AsRef<str>>(&self, zones: impl IntoIterator<Item = S>) -> Self {
        let zones = owned_set(zones);
        self.filter(|v| zones.contains(&v.zone_name))
    }

    pub fn with_attached_to(&self, instance_id: &str) -> Self {
        self.filter(|v| v.attached_to.iter().any(|id| id == instance_id))
    }

    pub fn with_expired(&self, expired: bool, now: DateTime<Utc>) -> Self {
        self.filter(|v| v.is_expired(now) == expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identify;

    fn fixture() -> InstanceList {
        let mut instances = Vec::new();
        for (cluster, owner, backend) in [
            ("mydc", "alice", BackendType::Docker),
            ("mydc2", "bob", BackendType::Aws),
            ("agi", "alice", BackendType::Gcp),
        ] {
            for node_no in 1..=4 {
                let state = match node_no {
                    1 | 2 => InstanceState::Running,
                    3 => InstanceState::Stopped,
                    _ => InstanceState::Terminated,
                };
                let mut instance = Instance::new(cluster, node_no, backend)
                    .with_state(state)
                    .with_owner(owner)
                    .with_tag("aerolab.type", if cluster == "agi" { "agi" } else { "server" });
                if node_no % 2 == 0 {
                    instance = instance.with_tag("rack", node_no.to_string());
                }
                instances.push(instance);
            }
        }
        instances.into()
    }

    fn ids(list: &InstanceList) -> BTreeSet<String> {
        list.iter().map(|i| i.identity()).collect()
    }

    type Filter = Box<dyn Fn(&Instances) -> Instances>;

    fn named(name: &'static str, f: impl Fn(&Instances) -> Instances + 'static) -> (&'static str, Filter) {
        (name, Box::new(f))
    }

    fn filters() -> Vec<(&'static str, Filter)> {
        let rack = HashMap::from([("rack".to_string(), String::new())]);
        let server = HashMap::from([("aerolab.type".to_string(), "server".to_string())]);
        vec![
            named("cluster", |v| v.with_cluster_name(["mydc", "agi"])),
            named("node", |v| v.with_node_no([2, 3])),
            named("state", |v| v.with_state([InstanceState::Running])),
            named("not_state", |v| v.with_not_state([InstanceState::Terminated])),
            named("rack_tag", move |v| v.with_tags(&rack)),
            named("server_tag", move |v| v.with_tags(&server)),
            named("owner", |v| v.with_owner("alice")),
            named("name", |v| v.with_name("mydc-2")),
            named("backend", |v| v.with_backend_type([BackendType::Docker])),
        ]
    }

    #[test]
    fn test_filter_chains_commute() {
        let list = fixture();
        let base = list.view();
        let filters = filters();
        for (name_a, a) in &filters {
            for (name_b, b) in &filters {
                let ab = b(&a(&base)).describe();
                let ba = a(&b(&base)).describe();
                assert_eq!(ids(&ab), ids(&ba), "{name_a} then {name_b}");
                // same base order either way
                assert_eq!(
                    ab.iter().map(|i| i.identity()).collect::<Vec<_>>(),
                    ba.iter().map(|i| i.identity()).collect::<Vec<_>>()
                );
            }
        }
    }

    #[test]
    fn test_filter_chains_associate() {
        let list = fixture();
        let base = list.view();
        let filters = filters();
        for (_, a) in &filters {
            for (_, b) in &filters {
                for (_, c) in &filters {
                    let left = c(&b(&a(&base)));
                    let bc = |v: &Instances| c(&b(v));
                    let right = bc(&a(&base));
                    assert_eq!(ids(&left.describe()), ids(&right.describe()));
                }
            }
        }
    }

    #[test]
    fn test_filtering_does_not_touch_receiver() {
        let list = fixture();
        let base = list.view();
        let narrowed = base.with_cluster_name(["mydc"]).with_node_no([1]);
        assert_eq!(narrowed.count(), 1);
        assert_eq!(base.count(), 12);
        assert_eq!(list.len(), 12);
    }

    #[test]
    fn test_cluster_name_or_semantics() {
        let list = fixture();
        let view = list.view().with_cluster_name(["mydc", "mydc2"]);
        assert_eq!(view.count(), 8);
        assert_eq!(
            view.cluster_names(),
            BTreeSet::from(["mydc".to_string(), "mydc2".to_string()])
        );
    }

    #[test]
    fn test_tags_and_semantics() {
        let list = fixture();
        let tags = HashMap::from([
            ("aerolab.type".to_string(), "server".to_string()),
            ("rack".to_string(), "2".to_string()),
        ]);
        let view = list.view().with_tags(&tags);
        assert_eq!(ids(&view.describe()), BTreeSet::from(["mydc:2".into(), "mydc2:2".into()]));
    }

    #[test]
    fn test_stopped_cluster_gated_by_running_is_empty() {
        let list: InstanceList = (1..=3)
            .map(|n| Instance::new("mydc", n, BackendType::Docker).with_state(InstanceState::Stopped))
            .collect();
        let running = list.view().with_state([InstanceState::Running]);
        assert!(running.is_empty());
        assert!(running.describe().is_empty());
    }

    #[test]
    fn test_live_excludes_terminal_states() {
        let list = fixture();
        let live = list.view().live();
        assert_eq!(live.count(), 9);
        assert!(live.iter().all(|i| i.state != InstanceState::Terminated));
    }

    #[test]
    fn test_count_matches_describe() {
        let list = fixture();
        let view = list.view().with_owner("alice").with_not_state([InstanceState::Terminated]);
        assert_eq!(view.count(), view.describe().len());
        assert_eq!(view.node_numbers(), BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_concurrent_readers_share_snapshot() {
        let list = fixture();
        let base = list.view();
        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["mydc", "mydc2", "agi"]
                .into_iter()
                .map(|cluster| {
                    let view = base.clone();
                    scope.spawn(move || view.with_cluster_name([cluster]).live().count())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(counts, vec![3, 3, 3]);
    }

    #[test]
    fn test_volume_filters() {
        let volumes: VolumeList = vec![
            Volume::new("agi-data", BackendType::Aws)
                .with_state(VolumeState::Available)
                .with_tag("aerolab7agiav", "7.1.0"),
            Volume::new("root-1", BackendType::Aws)
                .with_state(VolumeState::InUse)
                .attached("i-1"),
            Volume::new("old", BackendType::Gcp).with_state(VolumeState::Deleted),
        ]
        .into_iter()
        .map(|mut v| {
            v.delete_on_termination = v.name.starts_with("root");
            v
        })
        .collect();

        let view = volumes.view();
        assert_eq!(view.live().count(), 2);
        assert_eq!(view.with_delete_on_termination(false).live().count(), 1);
        assert_eq!(view.with_attached_to("i-1").count(), 1);
        let agi = HashMap::from([("aerolab7agiav".to_string(), String::new())]);
        let agi_volumes = view.with_tags(&agi).with_delete_on_termination(false).describe();
        assert_eq!(agi_volumes.len(), 1);
        assert_eq!(agi_volumes[0].name, "agi-data");
        assert_eq!(view.with_name(["old"]).with_state([VolumeState::Deleted]).count(), 1);
    }
}
