// crates/opc2aml-rs-caex/src/attribute.rs

//! The attribute tree attached to CAEX objects.
//!
//! Attributes nest: a structure value is an untagged parent with field-named
//! children, an array is an untagged parent with children `"0"`…`"n-1"`. Each
//! attribute carries a payload role telling whether it describes a concrete
//! instance value or mirrors a type definition; the role is an in-memory tag
//! and is re-derived from context when a document is read back.

/// Whether an attribute payload belongs to an instance or to a type mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRole {
    /// A concrete value of an instance object.
    Instance,
    /// Part of a type-definition mirror (library entries and `Definition`
    /// subtrees).
    Definition,
}

/// One node of an attribute tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// The XML Schema datatype tag (`xs:int`, ...); untagged parents carry
    /// none.
    pub data_type: Option<String>,
    pub value: Option<String>,
    pub role: PayloadRole,
    /// Path to an attribute-type library entry for derived payloads.
    pub ref_attribute_type: Option<String>,
    pub children: Vec<Attribute>,
}

impl Attribute {
    /// An empty, untagged attribute; the parent form for composites.
    pub fn new(role: PayloadRole, name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: None,
            value: None,
            role,
            ref_attribute_type: None,
            children: Vec::new(),
        }
    }

    /// A scalar attribute with a datatype tag.
    pub fn scalar(
        role: PayloadRole,
        name: impl Into<String>,
        data_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Attribute {
            name: name.into(),
            data_type: Some(data_type.into()),
            value: Some(value.into()),
            role,
            ref_attribute_type: None,
            children: Vec::new(),
        }
    }

    /// A value without a datatype tag (degraded payloads, legacy forms).
    pub fn untyped(role: PayloadRole, name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: None,
            value: Some(value.into()),
            role,
            ref_attribute_type: None,
            children: Vec::new(),
        }
    }

    /// A datatype tag with no value, used by type-mirror entries.
    pub fn tag_only(role: PayloadRole, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: Some(data_type.into()),
            value: None,
            role,
            ref_attribute_type: None,
            children: Vec::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.children.iter().find(|a| a.name == name)
    }

    /// Total node count of this subtree, itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Attribute::subtree_len).sum::<usize>()
    }
}
