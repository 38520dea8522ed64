//! Dispatch layout
//!
//! Flat view of a consolidated struct for code generation: the method slots
//! of the virtual table, the static method slots and the attribute slots of
//! an instance record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbols::structure::Struct;

/// One method entry of a dispatch table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSlot {
    pub slot: usize,
    pub method: String,
    /// Struct whose body is dispatched to
    pub owner: String,
}

impl DispatchSlot {
    pub fn new(slot: usize, method: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            slot,
            method: method.into(),
            owner: owner.into(),
        }
    }

    /// Assembly label of the method body
    pub fn label(&self) -> String {
        format!("{}_{}", self.owner, self.method)
    }
}

/// One attribute of an instance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSlot {
    pub slot: usize,
    pub name: String,
    pub ty: String,
    pub owner: String,
}

/// Method and attribute slots of a struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTable {
    pub struct_name: String,
    pub parent: Option<String>,
    /// Label of the constructor body
    pub constructor: Option<String>,
    pub methods: Vec<DispatchSlot>,
    pub static_methods: Vec<DispatchSlot>,
    pub attributes: Vec<AttributeSlot>,
}

impl DispatchTable {
    /// Build a table from unordered entries; `methods` pairs each slot with
    /// its static flag
    pub fn new(
        struct_name: impl Into<String>,
        parent: Option<String>,
        has_constructor: bool,
        methods: Vec<(DispatchSlot, bool)>,
        mut attributes: Vec<AttributeSlot>,
    ) -> Self {
        let struct_name = struct_name.into();
        let (mut static_methods, mut instance): (Vec<_>, Vec<_>) =
            methods.into_iter().partition(|(_, is_static)| *is_static);
        static_methods.sort_by(|(a, _), (b, _)| a.slot.cmp(&b.slot).then_with(|| a.method.cmp(&b.method)));
        instance.sort_by(|(a, _), (b, _)| a.slot.cmp(&b.slot).then_with(|| a.method.cmp(&b.method)));
        attributes.sort_by(|a, b| a.slot.cmp(&b.slot).then_with(|| a.name.cmp(&b.name)));

        Self {
            constructor: has_constructor.then(|| format!("{}_ctor", struct_name)),
            struct_name,
            parent,
            methods: instance.into_iter().map(|(slot, _)| slot).collect(),
            static_methods: static_methods.into_iter().map(|(slot, _)| slot).collect(),
            attributes,
        }
    }

    pub fn from_struct(entry: &Struct) -> Self {
        let methods = entry
            .methods_by_slot()
            .into_iter()
            .map(|m| {
                let owner = m.owner().unwrap_or(entry.name());
                (DispatchSlot::new(m.position(), m.name(), owner), m.is_static())
            })
            .collect();
        let attributes = entry
            .attributes_by_slot()
            .into_iter()
            .map(|v| AttributeSlot {
                slot: v.position(),
                name: v.name().to_string(),
                ty: v.ty().to_string(),
                owner: v.owner().to_string(),
            })
            .collect();
        Self::new(
            entry.name(),
            entry.parent().map(str::to_string),
            entry.constructor().is_some(),
            methods,
            attributes,
        )
    }

    /// Label of the virtual table
    pub fn vtable_label(&self) -> String {
        format!("VT_{}", self.struct_name)
    }

    /// Instance record size in words: the vtable pointer plus one word per
    /// attribute
    pub fn record_size(&self) -> usize {
        1 + self.attributes.len()
    }
}

impl fmt::Display for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => writeln!(f, "{} : {} ({} words)", self.struct_name, parent, self.record_size())?,
            None => writeln!(f, "{} ({} words)", self.struct_name, self.record_size())?,
        }
        if let Some(ctor) = &self.constructor {
            writeln!(f, "  ctor      {}", ctor)?;
        }
        writeln!(f, "  {}:", self.vtable_label())?;
        for slot in &self.methods {
            writeln!(f, "    [{}] {} -> {}", slot.slot, slot.method, slot.label())?;
        }
        for slot in &self.static_methods {
            writeln!(f, "  st [{}] {} -> {}", slot.slot, slot.method, slot.label())?;
        }
        for attr in &self.attributes {
            writeln!(f, "  +{} {}: {} ({})", attr.slot, attr.name, attr.ty, attr.owner)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::builtins::builtin_structs;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_orders_and_partitions() {
        let table = DispatchTable::new(
            "B",
            Some("A".to_string()),
            true,
            vec![
                (DispatchSlot::new(2, "h", "B"), false),
                (DispatchSlot::new(1, "make", "A"), true),
                (DispatchSlot::new(0, "f", "A"), false),
            ],
            vec![],
        );
        assert_eq!(table.methods, vec![DispatchSlot::new(0, "f", "A"), DispatchSlot::new(2, "h", "B")]);
        assert_eq!(table.static_methods[0].label(), "A_make");
        assert_eq!(table.constructor.as_deref(), Some("B_ctor"));
        assert_eq!(table.record_size(), 1);
    }

    #[test]
    fn test_builtin_string_layout() {
        let structs = builtin_structs();
        let table = DispatchTable::from_struct(&structs["Str"]);
        let labels: Vec<String> = table.methods.iter().map(DispatchSlot::label).collect();
        assert_eq!(labels, vec!["Str_length".to_string(), "Str_concat".to_string()]);
        assert_eq!(table.constructor, None);
        assert_eq!(table.vtable_label(), "VT_Str");
        assert!(table.to_string().starts_with("Str : Object (1 words)"));
    }
}
