// dbc-diff is a tool for comparing CAN database files
// Copyright (C) 2025  Peoples Grocers LLC
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// To purchase a license under different terms contact admin@peoplesgrocers.com
// To request changes, report bugs, or give user feedback contact
// marxism@peoplesgrocers.com
//

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::{Catalog, Message, Signal};
use crate::error::DiffError;
use crate::property::{
    compare_properties, present_properties, Property, PropertyDelta, MESSAGE_PROPERTIES,
    SIGNAL_PROPERTIES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Added => "added",
            Action::Removed => "removed",
            Action::Changed => "changed",
            Action::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of two maps split into only-new, both and only-old, each sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<'a, K> {
    pub added: Vec<&'a K>,
    pub common: Vec<&'a K>,
    pub removed: Vec<&'a K>,
}

pub fn reconcile<'a, K: Ord, V, W>(
    old: &'a BTreeMap<K, V>,
    new: &'a BTreeMap<K, W>,
) -> Reconciled<'a, K> {
    let added = new.keys().filter(|key| !old.contains_key(*key)).collect();
    let common = old.keys().filter(|key| new.contains_key(*key)).collect();
    let removed = old.keys().filter(|key| !new.contains_key(*key)).collect();
    Reconciled {
        added,
        common,
        removed,
    }
}

/// Change record for one message or signal.
///
/// Serializes as `{"action": <a>, <a>: [deltas]}` with a trailing
/// `"signals"` map on message records.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChange {
    pub action: Action,
    pub properties: Vec<PropertyDelta>,
    pub signals: Option<BTreeMap<String, EntityChange>>,
}

impl EntityChange {
    pub fn new(action: Action, properties: Vec<PropertyDelta>) -> Self {
        Self {
            action,
            properties,
            signals: None,
        }
    }

    pub fn with_signals(mut self, signals: BTreeMap<String, EntityChange>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Record listing every present attribute of a whole added or removed
    /// entity, with the opposite side set to null.
    pub fn inventory<T>(action: Action, entity: &T, schema: &[Property<T>]) -> Result<Self, DiffError> {
        let present = present_properties(entity, schema);
        let properties = match action {
            Action::Added => present
                .into_iter()
                .map(|(name, value)| PropertyDelta {
                    name,
                    old: None,
                    new: Some(value),
                })
                .collect(),
            Action::Removed => present
                .into_iter()
                .map(|(name, value)| PropertyDelta {
                    name,
                    old: Some(value),
                    new: None,
                })
                .collect(),
            Action::Changed | Action::Unchanged => return Err(DiffError::UnexpectedAction(action)),
        };
        Ok(Self::new(action, properties))
    }
}

impl Serialize for EntityChange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.signals.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("action", &self.action)?;
        map.serialize_entry(self.action.as_str(), &self.properties)?;
        if let Some(signals) = &self.signals {
            map.serialize_entry("signals", signals)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Present only when the old side was supplied.
    pub old_version: Option<String>,
    /// Present only when the new side was supplied.
    pub new_version: Option<String>,
    pub same_version: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDiff {
    pub messages: BTreeMap<String, EntityChange>,
    pub versions: VersionInfo,
}

impl CatalogDiff {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Compares two catalogs. `None` on one side models a whole file being
/// added or removed.
pub fn diff_catalogs(old: Option<&Catalog>, new: Option<&Catalog>) -> Result<CatalogDiff, DiffError> {
    let empty = Catalog::default();
    let old_catalog = old.unwrap_or(&empty);
    let new_catalog = new.unwrap_or(&empty);

    let mut messages = BTreeMap::new();
    let keys = reconcile(&old_catalog.messages, &new_catalog.messages);

    for name in keys.common {
        if let Some(change) = diff_messages(&old_catalog.messages[name], &new_catalog.messages[name])? {
            messages.insert(name.clone(), change);
        }
    }
    for name in keys.removed {
        let change = message_inventory(Action::Removed, &old_catalog.messages[name])?;
        messages.insert(name.clone(), change);
    }
    for name in keys.added {
        let change = message_inventory(Action::Added, &new_catalog.messages[name])?;
        messages.insert(name.clone(), change);
    }

    let versions = VersionInfo {
        old_version: old.map(|catalog| catalog.version_label().to_string()),
        new_version: new.map(|catalog| catalog.version_label().to_string()),
        same_version: old_catalog.version_label() == new_catalog.version_label(),
    };

    Ok(CatalogDiff { messages, versions })
}

/// `None` when neither the message properties nor any of its signals differ.
fn diff_messages(old: &Message, new: &Message) -> Result<Option<EntityChange>, DiffError> {
    let properties = compare_properties(old, new, MESSAGE_PROPERTIES);
    let signals = diff_signals(&old.signals, &new.signals)?;

    if properties.is_empty() && signals.is_empty() {
        return Ok(None);
    }
    Ok(Some(EntityChange::new(Action::Changed, properties).with_signals(signals)))
}

fn diff_signals(
    old: &BTreeMap<String, Signal>,
    new: &BTreeMap<String, Signal>,
) -> Result<BTreeMap<String, EntityChange>, DiffError> {
    let mut signals = BTreeMap::new();
    let keys = reconcile(old, new);

    for name in keys.common {
        let properties = compare_properties(&old[name], &new[name], SIGNAL_PROPERTIES);
        if !properties.is_empty() {
            signals.insert(name.clone(), EntityChange::new(Action::Changed, properties));
        }
    }
    for name in keys.removed {
        signals.insert(
            name.clone(),
            EntityChange::inventory(Action::Removed, &old[name], SIGNAL_PROPERTIES)?,
        );
    }
    for name in keys.added {
        signals.insert(
            name.clone(),
            EntityChange::inventory(Action::Added, &new[name], SIGNAL_PROPERTIES)?,
        );
    }
    Ok(signals)
}

fn message_inventory(action: Action, message: &Message) -> Result<EntityChange, DiffError> {
    let signals = message
        .signals
        .iter()
        .map(|(name, signal)| {
            EntityChange::inventory(action, signal, SIGNAL_PROPERTIES).map(|change| (name.clone(), change))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(EntityChange::inventory(action, message, MESSAGE_PROPERTIES)?.with_signals(signals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Number;
    use crate::property::Normalized;
    use proptest::prelude::*;
    use serde_json::json;

    fn signal(start: u64, length: u64) -> Signal {
        Signal {
            start,
            length,
            minimum: Some(Number::Int(0)),
            maximum: Some(Number::Int(255)),
            ..Signal::default()
        }
    }

    fn message(frame_id: u32, signals: &[(&str, Signal)]) -> Message {
        Message {
            frame_id,
            length: 8,
            senders: vec!["ECU".to_string()],
            signals: signals
                .iter()
                .map(|(name, signal)| (name.to_string(), signal.clone()))
                .collect(),
            ..Message::default()
        }
    }

    fn catalog(version: Option<&str>, messages: Vec<(&str, Message)>) -> Catalog {
        Catalog {
            messages: messages
                .into_iter()
                .map(|(name, message)| (name.to_string(), message))
                .collect(),
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn test_reconcile_partitions_keys() {
        let old: BTreeMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let new: BTreeMap<&str, i32> = [("b", 2), ("d", 4), ("c", 9)].into_iter().collect();

        let keys = reconcile(&old, &new);
        assert_eq!(keys.added, vec![&"d"]);
        assert_eq!(keys.common, vec![&"b", &"c"]);
        assert_eq!(keys.removed, vec![&"a"]);
    }

    #[test]
    fn test_reconcile_with_empty_side() {
        let old: BTreeMap<String, ()> = BTreeMap::new();
        let new: BTreeMap<String, ()> = [("x".to_string(), ())].into_iter().collect();

        let keys = reconcile(&old, &new);
        assert_eq!(keys.added.len(), 1);
        assert!(keys.common.is_empty());
        assert!(keys.removed.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reconcile_is_exact_partition(
            old in proptest::collection::btree_map("[a-e]{1,2}", any::<u8>(), 0..12),
            new in proptest::collection::btree_map("[a-e]{1,2}", any::<u8>(), 0..12),
        ) {
            let keys = reconcile(&old, &new);

            let mut seen: Vec<&String> = keys.added.iter()
                .chain(keys.common.iter())
                .chain(keys.removed.iter())
                .copied()
                .collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);

            let union: std::collections::BTreeSet<&String> = old.keys().chain(new.keys()).collect();
            prop_assert_eq!(seen.into_iter().collect::<std::collections::BTreeSet<_>>(), union);

            prop_assert!(keys.added.iter().all(|k| new.contains_key(*k) && !old.contains_key(*k)));
            prop_assert!(keys.removed.iter().all(|k| old.contains_key(*k) && !new.contains_key(*k)));
            prop_assert!(keys.added.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_diff_of_same_catalog_is_empty() -> Result<(), DiffError> {
        let x = catalog(
            Some("3.1"),
            vec![("M1", message(0x100, &[("S1", signal(0, 8))]))],
        );

        let diff = diff_catalogs(Some(&x), Some(&x))?;
        assert!(diff.is_empty());
        assert!(diff.versions.same_version);
        assert_eq!(diff.versions.old_version.as_deref(), Some("3.1"));
        assert_eq!(diff.versions.new_version.as_deref(), Some("3.1"));
        Ok(())
    }

    #[test]
    fn test_removed_side_lists_full_inventory() -> Result<(), DiffError> {
        let x = catalog(
            None,
            vec![
                ("M1", message(0x100, &[("S1", signal(0, 8)), ("S2", signal(8, 4))])),
                ("M2", message(0x200, &[])),
            ],
        );

        let diff = diff_catalogs(Some(&x), None)?;
        assert_eq!(diff.messages.len(), 2);
        for (name, change) in &diff.messages {
            assert_eq!(change.action, Action::Removed);
            let expected = present_properties(&x.messages[name], MESSAGE_PROPERTIES).len();
            assert_eq!(change.properties.len(), expected);
            assert!(change.properties.iter().all(|d| d.old.is_some() && d.new.is_none()));

            let signals = change.signals.as_ref().expect("message records carry signals");
            assert_eq!(signals.len(), x.messages[name].signals.len());
            for (signal_name, signal_change) in signals {
                assert_eq!(signal_change.action, Action::Removed);
                let expected =
                    present_properties(&x.messages[name].signals[signal_name], SIGNAL_PROPERTIES).len();
                assert_eq!(signal_change.properties.len(), expected);
            }
        }

        assert_eq!(diff.versions.old_version.as_deref(), Some("unknown"));
        assert_eq!(diff.versions.new_version, None);
        assert!(diff.versions.same_version);
        Ok(())
    }

    #[test]
    fn test_added_side_mirrors_removed() -> Result<(), DiffError> {
        let x = catalog(
            Some("2"),
            vec![
                ("M1", message(0x100, &[("S1", signal(0, 8)), ("S2", signal(8, 4))])),
                ("M2", message(0x200, &[])),
            ],
        );

        let diff = diff_catalogs(None, Some(&x))?;
        assert_eq!(diff.messages.len(), 2);
        for (name, change) in &diff.messages {
            assert_eq!(change.action, Action::Added);
            let expected = present_properties(&x.messages[name], MESSAGE_PROPERTIES).len();
            assert_eq!(change.properties.len(), expected);
            assert!(change.properties.iter().all(|d| d.old.is_none() && d.new.is_some()));

            let signals = change.signals.as_ref().expect("message records carry signals");
            assert_eq!(signals.len(), x.messages[name].signals.len());
            for (signal_name, signal_change) in signals {
                assert_eq!(signal_change.action, Action::Added);
                let expected =
                    present_properties(&x.messages[name].signals[signal_name], SIGNAL_PROPERTIES).len();
                assert_eq!(signal_change.properties.len(), expected);
                assert!(signal_change
                    .properties
                    .iter()
                    .all(|d| d.old.is_none() && d.new.is_some()));
            }
        }

        assert_eq!(diff.versions.old_version, None);
        assert_eq!(diff.versions.new_version.as_deref(), Some("2"));
        assert!(!diff.versions.same_version);
        Ok(())
    }

    #[test]
    fn test_changed_message_with_added_signal_and_added_message() -> Result<(), DiffError> {
        let old = catalog(
            Some("1"),
            vec![("M1", message(0x100, &[("S1", signal(0, 8))]))],
        );
        let modified = Signal {
            unit: Some("rpm".to_string()),
            ..signal(0, 12)
        };
        let new = catalog(
            Some("1"),
            vec![
                ("M1", message(0x100, &[("S1", modified), ("S2", signal(16, 8))])),
                ("M2", message(0x200, &[("S3", signal(0, 1))])),
            ],
        );

        let diff = diff_catalogs(Some(&old), Some(&new))?;
        assert_eq!(diff.messages.len(), 2);

        let m1 = &diff.messages["M1"];
        assert_eq!(m1.action, Action::Changed);
        assert!(m1.properties.is_empty());
        let signals = m1.signals.as_ref().expect("signals");
        assert_eq!(signals.len(), 2);

        let s1 = &signals["S1"];
        assert_eq!(s1.action, Action::Changed);
        let names: Vec<&str> = s1.properties.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["length", "unit"]);
        assert_eq!(s1.properties[0].old, Some(Normalized::Number(Number::Int(8))));
        assert_eq!(s1.properties[1].old, None);

        assert_eq!(signals["S2"].action, Action::Added);
        assert!(!signals["S2"].properties.is_empty());

        let m2 = &diff.messages["M2"];
        assert_eq!(m2.action, Action::Added);
        assert_eq!(m2.signals.as_ref().map(|s| s["S3"].action), Some(Action::Added));
        assert!(m2
            .properties
            .iter()
            .any(|d| d.name == "frame_id" && d.new == Some(Normalized::Text("0x200".to_string()))));
        Ok(())
    }

    #[test]
    fn test_message_only_property_change_keeps_empty_signal_map() -> Result<(), DiffError> {
        let old = catalog(None, vec![("M1", message(0x100, &[("S1", signal(0, 8))]))]);
        let mut new = old.clone();
        if let Some(m) = new.messages.get_mut("M1") {
            m.cycle_time = Some(100);
        }

        let diff = diff_catalogs(Some(&old), Some(&new))?;
        assert_eq!(
            serde_json::to_value(&diff.messages["M1"]).expect("serializable"),
            json!({
                "action": "changed",
                "changed": [{"name": "cycle_time", "old": null, "new": 100}],
                "signals": {}
            })
        );
        Ok(())
    }

    #[test]
    fn test_inventory_rejects_changed_action() {
        let result = EntityChange::inventory(Action::Changed, &Signal::default(), SIGNAL_PROPERTIES);
        assert!(matches!(result, Err(DiffError::UnexpectedAction(Action::Changed))));
    }

    #[test]
    fn test_signal_record_has_no_signals_key() {
        let change = EntityChange::new(Action::Removed, Vec::new());
        assert_eq!(
            serde_json::to_value(&change).expect("serializable"),
            json!({"action": "removed", "removed": []})
        );
    }
}
