use super::{
    AccessError, ConverterRegistry, PropertyError, PropertyNode, PropertyPath, PropertyResult,
    PropertyRule, PropertyValue, RuleTable, StoredValue,
};
use crate::error::ErrorPolicy;
use crate::notification::{Notifier, SuppressedError};
use crate::storage::Store;

/// One collected property value and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub section: String,
    pub key: String,
    pub value: StoredValue,
}

/// Reads and writes the rule-declared properties of a control tree.
///
/// Scalar paths are stored under `<root>.<control>` keyed by the path;
/// collection paths under `<root>.<control>.[]<path>` keyed by each
/// element's reference name or index.
#[derive(Debug, Clone, Copy)]
pub struct PropertyWalker<'a> {
    rules: &'a RuleTable,
    converters: &'a ConverterRegistry,
    policy: ErrorPolicy,
}

impl<'a> PropertyWalker<'a> {
    pub fn new(rules: &'a RuleTable, converters: &'a ConverterRegistry, policy: ErrorPolicy) -> Self {
        Self {
            rules,
            converters,
            policy,
        }
    }

    pub fn collect(
        &self,
        root: &dyn PropertyNode,
        root_name: &str,
        notifier: &Notifier,
    ) -> PropertyResult<Vec<PropertyEntry>> {
        let mut entries = Vec::new();
        self.collect_descendants(root, root_name, notifier, &mut entries)?;
        tracing::debug!(window = root_name, count = entries.len(), "collected control properties");
        Ok(entries)
    }

    /// Writes every stored value found for the tree; returns how many were applied.
    pub fn apply(
        &self,
        root: &mut dyn PropertyNode,
        root_name: &str,
        store: &Store,
        notifier: &Notifier,
    ) -> PropertyResult<usize> {
        let applied = self.apply_descendants(root, root_name, store, notifier)?;
        tracing::debug!(window = root_name, applied, "applied control properties");
        Ok(applied)
    }

    fn collect_descendants(
        &self,
        node: &dyn PropertyNode,
        root_name: &str,
        notifier: &Notifier,
        out: &mut Vec<PropertyEntry>,
    ) -> PropertyResult<()> {
        for child in node.children() {
            self.collect_control(child, root_name, notifier, out)?;
            self.collect_descendants(child, root_name, notifier, out)?;
        }
        Ok(())
    }

    fn collect_control(
        &self,
        control: &dyn PropertyNode,
        root_name: &str,
        notifier: &Notifier,
        out: &mut Vec<PropertyEntry>,
    ) -> PropertyResult<()> {
        let Some(name) = control.identity().reference_name() else {
            return Ok(());
        };
        let section = format!("{root_name}.{name}");
        for rule in self.rules.rules_for(control.type_tag()) {
            if let Err(err) = self.collect_rule(control, &section, rule, out) {
                self.suppress_or_raise(err, root_name, &name, notifier)?;
            }
        }
        Ok(())
    }

    fn collect_rule(
        &self,
        control: &dyn PropertyNode,
        section: &str,
        rule: &PropertyRule,
        out: &mut Vec<PropertyEntry>,
    ) -> PropertyResult<()> {
        let path = &rule.path;
        let target = self.view(control, path)?;
        let segments = path.segments();

        if !path.is_collection() {
            let value = read_leaf(target, segments, path)?;
            if let Some(value) = self.stored(&value)? {
                out.push(PropertyEntry {
                    section: section.to_string(),
                    key: path.to_string(),
                    value,
                });
            }
            return Ok(());
        }

        let items = target
            .items(&segments[0])
            .ok_or_else(|| unresolved(target.type_tag(), path, &segments[0]))?;
        let section = format!("{section}.{path}");
        // Stage the whole collection so a failing element drops the rule, not half of it.
        let mut staged = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let value = read_leaf(item, &segments[1..], path)?;
            if let Some(value) = self.stored(&value)? {
                staged.push(PropertyEntry {
                    section: section.clone(),
                    key: item.identity().reference_name_or_index(index),
                    value,
                });
            }
        }
        out.extend(staged);
        Ok(())
    }

    fn apply_descendants(
        &self,
        node: &mut dyn PropertyNode,
        root_name: &str,
        store: &Store,
        notifier: &Notifier,
    ) -> PropertyResult<usize> {
        let mut applied = 0;
        for child in node.children_mut() {
            applied += self.apply_control(&mut *child, root_name, store, notifier)?;
            applied += self.apply_descendants(child, root_name, store, notifier)?;
        }
        Ok(applied)
    }

    fn apply_control(
        &self,
        control: &mut dyn PropertyNode,
        root_name: &str,
        store: &Store,
        notifier: &Notifier,
    ) -> PropertyResult<usize> {
        let Some(name) = control.identity().reference_name() else {
            return Ok(0);
        };
        let type_tag = control.type_tag().to_string();
        let section = format!("{root_name}.{name}");
        let mut applied = 0;
        for rule in self.rules.rules_for(&type_tag) {
            match self.apply_rule(&mut *control, &section, rule, store) {
                Ok(count) => applied += count,
                Err(err) => self.suppress_or_raise(err, root_name, &name, notifier)?,
            }
        }
        Ok(applied)
    }

    fn apply_rule(
        &self,
        control: &mut dyn PropertyNode,
        section: &str,
        rule: &PropertyRule,
        store: &Store,
    ) -> PropertyResult<usize> {
        let path = &rule.path;
        let segments = path.segments();

        if !path.is_collection() {
            let Some(raw) = store.get(section, &path.to_string()) else {
                return Ok(0);
            };
            let target = self.view_mut(control, path)?;
            return self.apply_leaf(target, segments, path, raw);
        }

        let section = format!("{section}.{path}");
        if !store.contains_section(&section) {
            return Ok(0);
        }
        let target = self.view_mut(control, path)?;
        let type_tag = target.type_tag().to_string();
        let items = target
            .items_mut(&segments[0])
            .ok_or_else(|| unresolved(&type_tag, path, &segments[0]))?;

        let mut applied = 0;
        for (index, item) in items.into_iter().enumerate() {
            let key = item.identity().reference_name_or_index(index);
            if let Some(raw) = store.get(&section, &key) {
                applied += self.apply_leaf(item, &segments[1..], path, raw)?;
            }
        }
        Ok(applied)
    }

    fn apply_leaf(
        &self,
        node: &mut dyn PropertyNode,
        segments: &[String],
        path: &PropertyPath,
        raw: &str,
    ) -> PropertyResult<usize> {
        let current = read_leaf(&*node, segments, path)?;
        if !self.converters.is_eligible(current.kind()) {
            tracing::debug!(%path, kind = %current.kind(), "skipping ineligible property kind");
            return Ok(0);
        }
        let stored = StoredValue::decode(raw)?;
        let value = self.converters.from_stored(&stored, current.kind())?;
        write_leaf(node, segments, path, value)?;
        Ok(1)
    }

    fn stored(&self, value: &PropertyValue) -> PropertyResult<Option<StoredValue>> {
        if !self.converters.is_eligible(value.kind()) {
            tracing::debug!(kind = %value.kind(), "skipping ineligible property kind");
            return Ok(None);
        }
        Ok(Some(self.converters.to_stored(value)?))
    }

    fn view<'n>(
        &self,
        control: &'n dyn PropertyNode,
        path: &PropertyPath,
    ) -> PropertyResult<&'n dyn PropertyNode> {
        match self.rules.cast_for(control.type_tag(), path) {
            Some(cast) => control
                .node(&cast.view_property)
                .ok_or_else(|| unresolved(control.type_tag(), path, &cast.view_property)),
            None => Ok(control),
        }
    }

    fn view_mut<'n>(
        &self,
        control: &'n mut dyn PropertyNode,
        path: &PropertyPath,
    ) -> PropertyResult<&'n mut dyn PropertyNode> {
        let type_tag = control.type_tag().to_string();
        match self.rules.cast_for(&type_tag, path) {
            Some(cast) => control
                .node_mut(&cast.view_property)
                .ok_or_else(|| unresolved(&type_tag, path, &cast.view_property)),
            None => Ok(control),
        }
    }

    fn suppress_or_raise(
        &self,
        error: PropertyError,
        window: &str,
        control: &str,
        notifier: &Notifier,
    ) -> PropertyResult<()> {
        match self.policy {
            ErrorPolicy::Strict => Err(error),
            ErrorPolicy::Resilient => {
                notifier.raise(SuppressedError {
                    window: window.to_string(),
                    control: Some(control.to_string()),
                    error,
                });
                Ok(())
            }
        }
    }
}

const SELF_VALUE: &str = "<value>";

fn read_leaf(
    node: &dyn PropertyNode,
    segments: &[String],
    path: &PropertyPath,
) -> PropertyResult<PropertyValue> {
    match segments {
        [] => node
            .self_value()
            .ok_or_else(|| unresolved(node.type_tag(), path, SELF_VALUE)),
        [property] => node
            .value(property)
            .ok_or_else(|| unresolved(node.type_tag(), path, property)),
        [head, rest @ ..] => {
            let next = node
                .node(head)
                .ok_or_else(|| unresolved(node.type_tag(), path, head))?;
            read_leaf(next, rest, path)
        }
    }
}

fn write_leaf(
    node: &mut dyn PropertyNode,
    segments: &[String],
    path: &PropertyPath,
    value: PropertyValue,
) -> PropertyResult<()> {
    let type_tag = node.type_tag().to_string();
    match segments {
        [] => node
            .set_self_value(value)
            .map_err(|err| access_error(&type_tag, path, SELF_VALUE, err)),
        [property] => node
            .set_value(property, value)
            .map_err(|err| access_error(&type_tag, path, property, err)),
        [head, rest @ ..] => {
            let next = node
                .node_mut(head)
                .ok_or_else(|| unresolved(&type_tag, path, head))?;
            write_leaf(next, rest, path, value)
        }
    }
}

fn unresolved(type_tag: &str, path: &PropertyPath, segment: &str) -> PropertyError {
    PropertyError::PathResolution {
        type_tag: type_tag.to_string(),
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

fn access_error(type_tag: &str, path: &PropertyPath, property: &str, err: AccessError) -> PropertyError {
    match err {
        AccessError::UnknownProperty => unresolved(type_tag, path, property),
        AccessError::Rejected(reason) => PropertyError::Rejected {
            type_tag: type_tag.to_string(),
            property: property.to_string(),
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::properties::{ApplicationKind, ElementIdentity, ValueKind};
    use crate::testing::FakeControl;

    fn column(identity: ElementIdentity, width: f64) -> FakeControl {
        FakeControl::new("GridColumn")
            .with_identity(identity)
            .with_value("Width", PropertyValue::F64(width))
    }

    fn grid_root(widths: [f64; 3]) -> FakeControl {
        let columns = vec![
            column(ElementIdentity::named("A"), widths[0]),
            column(
                ElementIdentity {
                    tag: Some("Name=B".to_string()),
                    ..ElementIdentity::default()
                },
                widths[1],
            ),
            column(ElementIdentity::default(), widths[2]),
        ];
        FakeControl::new("Window").with_child(
            FakeControl::new("Grid")
                .with_identity(ElementIdentity::named("layout"))
                .with_items("ColumnDefinitions", columns)
                .with_items("RowDefinitions", Vec::new()),
        )
    }

    fn xaml_rules() -> RuleTable {
        RuleTable::preset(ApplicationKind::Xaml)
    }

    fn into_store(entries: &[PropertyEntry]) -> Store {
        let mut store = Store::new();
        for entry in entries {
            store.set(&entry.section, &entry.key, &entry.value);
        }
        store
    }

    #[test]
    fn collection_elements_are_keyed_by_reference_name_or_index() {
        let rules = xaml_rules();
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let root = grid_root([120.0, 80.5, 200.0]);

        let entries = walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect should succeed");

        let section = "Main.layout.[]ColumnDefinitions.Width";
        assert_eq!(
            entries,
            vec![
                PropertyEntry {
                    section: section.to_string(),
                    key: "A".to_string(),
                    value: StoredValue::new(ValueKind::F64, "120"),
                },
                PropertyEntry {
                    section: section.to_string(),
                    key: "B".to_string(),
                    value: StoredValue::new(ValueKind::F64, "80.5"),
                },
                PropertyEntry {
                    section: section.to_string(),
                    key: "2".to_string(),
                    value: StoredValue::new(ValueKind::F64, "200"),
                },
            ]
        );
    }

    #[test]
    fn apply_restores_collected_collection_values() {
        let rules = xaml_rules();
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let original = grid_root([120.0, 80.5, 200.0]);
        let store = into_store(
            &walker
                .collect(&original, "Main", &Notifier::new())
                .expect("collect"),
        );

        let mut restored = grid_root([1.0, 1.0, 1.0]);
        let applied = walker
            .apply(&mut restored, "Main", &store, &Notifier::new())
            .expect("apply should succeed");

        assert_eq!(applied, 3);
        assert_eq!(restored, original);
    }

    #[test]
    fn scalar_rule_uses_control_section_and_path_key() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let root = FakeControl::new("Form").with_child(
            FakeControl::new("Panel").with_child(
                FakeControl::new("SplitContainer")
                    .with_identity(ElementIdentity::named("split"))
                    .with_value("SplitterDistance", PropertyValue::I32(240)),
            ),
        );

        let entries = walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect nested control");
        assert_eq!(
            entries,
            vec![PropertyEntry {
                section: "Main.split".to_string(),
                key: "SplitterDistance".to_string(),
                value: StoredValue::new(ValueKind::I32, "240"),
            }]
        );
    }

    #[test]
    fn unnamed_controls_and_unmatched_types_are_ignored() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let root = FakeControl::new("Form")
            .with_child(
                FakeControl::new("SplitContainer")
                    .with_value("SplitterDistance", PropertyValue::I32(10)),
            )
            .with_child(
                FakeControl::new("Button")
                    .with_identity(ElementIdentity::named("ok"))
                    .with_value("Width", PropertyValue::I32(75)),
            );

        let entries = walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect");
        assert!(entries.is_empty());
    }

    #[test]
    fn cast_views_list_through_its_view_property() {
        let rules = xaml_rules();
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let view = FakeControl::new("GridView").with_items(
            "Columns",
            vec![column(ElementIdentity::named("name"), 150.0)],
        );
        let root = FakeControl::new("Window").with_child(
            FakeControl::new("ListView")
                .with_identity(ElementIdentity::named("files"))
                .with_node("View", view),
        );

        let entries = walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect through cast");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, "Main.files.[]Columns.Width");
        assert_eq!(entries[0].key, "name");
    }

    #[test]
    fn ineligible_kinds_are_skipped_unless_a_converter_is_registered() {
        let mut rules = RuleTable::new();
        rules
            .add_rule_line("CheckBox|IsChecked")
            .expect("valid rule");
        let root = FakeControl::new("Window").with_child(
            FakeControl::new("CheckBox")
                .with_identity(ElementIdentity::named("wrap"))
                .with_value("IsChecked", PropertyValue::Bool(true)),
        );

        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        assert!(walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect")
            .is_empty());

        let mut converters = ConverterRegistry::new();
        converters.register(ValueKind::Bool, Box::new(crate::properties::DefaultConverter));
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let entries = walker
            .collect(&root, "Main", &Notifier::new())
            .expect("collect");
        assert_eq!(entries[0].value, StoredValue::new(ValueKind::Bool, "true"));
    }

    #[test]
    fn resilient_policy_reports_and_continues() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Resilient);
        let root = FakeControl::new("Form")
            .with_child(FakeControl::new("SplitContainer").with_identity(ElementIdentity::named("broken")))
            .with_child(
                FakeControl::new("SplitContainer")
                    .with_identity(ElementIdentity::named("good"))
                    .with_value("SplitterDistance", PropertyValue::I32(40)),
            );

        let reported = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::new();
        let sink = Rc::clone(&reported);
        notifier.subscribe(move |err: &SuppressedError| {
            sink.borrow_mut().push(err.control.clone());
        });

        let entries = walker.collect(&root, "Main", &notifier).expect("resilient");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, "Main.good");
        assert_eq!(*reported.borrow(), vec![Some("broken".to_string())]);
    }

    #[test]
    fn strict_policy_raises_path_resolution_errors() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let root = FakeControl::new("Form")
            .with_child(FakeControl::new("ListView").with_identity(ElementIdentity::named("list")));

        let err = walker
            .collect(&root, "Main", &Notifier::new())
            .expect_err("missing collection should fail");
        assert!(matches!(
            err,
            PropertyError::PathResolution { ref segment, .. } if segment == "Columns"
        ));
    }

    #[test]
    fn apply_converts_stored_kind_and_reports_bad_values() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let mut store = Store::new();
        store.set("Main.split", "SplitterDistance", "300|i64");
        store.set("Main.other", "SplitterDistance", "wide|i32");

        let mut root = FakeControl::new("Form")
            .with_child(
                FakeControl::new("SplitContainer")
                    .with_identity(ElementIdentity::named("split"))
                    .with_value("SplitterDistance", PropertyValue::I32(10)),
            )
            .with_child(
                FakeControl::new("SplitContainer")
                    .with_identity(ElementIdentity::named("other"))
                    .with_value("SplitterDistance", PropertyValue::I32(10)),
            );

        let strict = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        assert!(matches!(
            strict.apply(&mut root, "Main", &store, &Notifier::new()),
            Err(PropertyError::Conversion(_))
        ));

        let resilient = PropertyWalker::new(&rules, &converters, ErrorPolicy::Resilient);
        let applied = resilient
            .apply(&mut root, "Main", &store, &Notifier::new())
            .expect("resilient apply");
        assert_eq!(applied, 1);
        assert_eq!(
            root.children[0].values.get("SplitterDistance"),
            Some(&PropertyValue::I32(300))
        );
    }

    #[test]
    fn rejected_writes_surface_as_rejected_errors() {
        let rules = RuleTable::preset(ApplicationKind::Forms);
        let converters = ConverterRegistry::new();
        let walker = PropertyWalker::new(&rules, &converters, ErrorPolicy::Strict);
        let mut store = Store::new();
        store.set("Main.split", "SplitterDistance", "30|i32");
        let mut root = FakeControl::new("Form").with_child(
            FakeControl::new("SplitContainer")
                .with_identity(ElementIdentity::named("split"))
                .with_value("SplitterDistance", PropertyValue::I32(10))
                .rejecting("SplitterDistance"),
        );

        let err = walker
            .apply(&mut root, "Main", &store, &Notifier::new())
            .expect_err("read-only property");
        assert!(matches!(err, PropertyError::Rejected { .. }));
    }
}
