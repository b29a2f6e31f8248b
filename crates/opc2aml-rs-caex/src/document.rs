// crates/opc2aml-rs-caex/src/document.rs

//! The CAEX document arena.
//!
//! Objects live in one flat vector and are addressed by copyable handles; the
//! owning structure is a single explicit edge set (parent plus ordered
//! children). Internal links are non-owning records that name an anchor object
//! and two external-interface identifier strings, so removing or re-reading
//! objects never chases back-pointers.

use crate::attribute::Attribute;
use log::warn;
use std::collections::BTreeMap;

/// An index into a [`CaexDocument`] arena.
///
/// Handles are only minted by the document that owns the object; using a
/// handle with a different document is a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Handle(usize);

/// The CAEX element kinds the arena distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaexKind {
    InstanceHierarchy,
    InternalElement,
    InterfaceClassLib,
    InterfaceClass,
    RoleClassLib,
    RoleClass,
    SystemUnitClassLib,
    SystemUnitClass,
    AttributeTypeLib,
    AttributeType,
    ExternalInterface,
}

impl CaexKind {
    pub fn is_library(self) -> bool {
        matches!(
            self,
            CaexKind::InterfaceClassLib
                | CaexKind::RoleClassLib
                | CaexKind::SystemUnitClassLib
                | CaexKind::AttributeTypeLib
        )
    }

    /// The kinds whose XML form may hold `InternalLink` children.
    pub fn can_anchor_links(self) -> bool {
        matches!(self, CaexKind::InternalElement | CaexKind::SystemUnitClass)
    }
}

/// One CAEX object: an instance hierarchy, a tree element, a library, a
/// library entry, or an external interface.
#[derive(Debug, Clone)]
pub struct CaexObject {
    pub kind: CaexKind,
    pub name: String,
    /// The output identifier; pure containers (libraries, hierarchies) carry
    /// none.
    pub id: Option<String>,
    /// Class derivation (library entries) or interface class (external
    /// interfaces).
    pub ref_base_class_path: Option<String>,
    /// The system-unit class a tree element instantiates.
    pub ref_base_system_unit_path: Option<String>,
    /// The role class required by a tree element.
    pub role_requirement: Option<String>,
    pub attributes: Vec<Attribute>,
    parent: Option<Handle>,
    children: Vec<Handle>,
}

impl CaexObject {
    fn new(kind: CaexKind, name: String, parent: Option<Handle>) -> Self {
        CaexObject {
            kind,
            name,
            id: None,
            ref_base_class_path: None,
            ref_base_system_unit_path: None,
            role_requirement: None,
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }
}

/// A connection between two external interfaces, stored at its anchor object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLink {
    pub anchor: Handle,
    pub name: String,
    pub ref_partner_side_a: String,
    pub ref_partner_side_b: String,
}

/// Provenance attributes for the `SourceDocumentInformation` header element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocumentInfo {
    pub origin_name: String,
    pub origin_id: String,
    pub origin_version: String,
    pub last_writing_date_time: String,
}

/// An in-memory CAEX file.
#[derive(Debug, Clone, Default)]
pub struct CaexDocument {
    file_name: String,
    source_info: Option<SourceDocumentInfo>,
    objects: Vec<CaexObject>,
    roots: Vec<Handle>,
    links: Vec<InternalLink>,
    id_index: BTreeMap<String, Handle>,
}

impl CaexDocument {
    pub fn new(file_name: impl Into<String>) -> Self {
        CaexDocument {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn source_info(&self) -> Option<&SourceDocumentInfo> {
        self.source_info.as_ref()
    }

    pub fn set_source_info(&mut self, info: SourceDocumentInfo) {
        self.source_info = Some(info);
    }

    /// Adds a top-level object (an instance hierarchy or a library).
    pub fn add_root(&mut self, kind: CaexKind, name: impl Into<String>) -> Handle {
        let handle = Handle(self.objects.len());
        self.objects.push(CaexObject::new(kind, name.into(), None));
        self.roots.push(handle);
        handle
    }

    /// Adds an object under `parent`, appended after its existing children.
    pub fn add_child(&mut self, parent: Handle, kind: CaexKind, name: impl Into<String>) -> Handle {
        let handle = Handle(self.objects.len());
        self.objects
            .push(CaexObject::new(kind, name.into(), Some(parent)));
        self.objects[parent.0].children.push(handle);
        handle
    }

    pub fn object(&self, handle: Handle) -> &CaexObject {
        &self.objects[handle.0]
    }

    pub fn object_mut(&mut self, handle: Handle) -> &mut CaexObject {
        &mut self.objects[handle.0]
    }

    /// Sets the output identifier and indexes it. The index keeps the first
    /// writer of an id; collisions are the integrity guard's business, not a
    /// reason to fail here.
    pub fn set_id(&mut self, handle: Handle, id: impl Into<String>) {
        let id = id.into();
        self.id_index.entry(id.clone()).or_insert(handle);
        self.objects[handle.0].id = Some(id);
    }

    /// Exact-match lookup on the id index.
    pub fn find_by_id(&self, id: &str) -> Option<Handle> {
        self.id_index.get(id).copied()
    }

    pub fn parent_of(&self, handle: Handle) -> Option<Handle> {
        self.objects[handle.0].parent
    }

    pub fn children_of(&self, handle: Handle) -> &[Handle] {
        &self.objects[handle.0].children
    }

    pub fn roots(&self) -> &[Handle] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Depth-first pre-order walk over the whole document.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            document: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// The chain from `handle` up to its root, starting at `handle`.
    pub fn ancestors(&self, handle: Handle) -> Vec<Handle> {
        let mut chain = vec![handle];
        let mut current = handle;
        while let Some(parent) = self.parent_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The nearest object that owns both `a` and `b` (either may be the
    /// ancestor itself); `None` when they live in disjoint trees.
    pub fn common_ancestor(&self, a: Handle, b: Handle) -> Option<Handle> {
        let chain_a = self.ancestors(a);
        let mut current = b;
        loop {
            if chain_a.contains(&current) {
                return Some(current);
            }
            current = self.parent_of(current)?;
        }
    }

    /// Records a link between two external-interface ids at `anchor`.
    pub fn add_link(
        &mut self,
        anchor: Handle,
        name: impl Into<String>,
        side_a: impl Into<String>,
        side_b: impl Into<String>,
    ) {
        if !self.objects[anchor.0].kind.can_anchor_links() {
            warn!(
                "Link anchored at a {:?} object; the writer will keep it but CAEX tools may reject it",
                self.objects[anchor.0].kind
            );
        }
        self.links.push(InternalLink {
            anchor,
            name: name.into(),
            ref_partner_side_a: side_a.into(),
            ref_partner_side_b: side_b.into(),
        });
    }

    pub fn links(&self) -> &[InternalLink] {
        &self.links
    }

    pub fn links_at(&self, anchor: Handle) -> impl Iterator<Item = &InternalLink> {
        self.links.iter().filter(move |l| l.anchor == anchor)
    }

    /// Returns the external interface named `name` under `parent`, creating
    /// it with the given id and class path when absent. Interfaces are keyed
    /// by name, so repeated edges of one reference type share one interface.
    pub fn find_or_add_interface(
        &mut self,
        parent: Handle,
        name: &str,
        id: &str,
        class_path: Option<&str>,
    ) -> Handle {
        if let Some(existing) = self.find_interface(parent, name) {
            return existing;
        }
        let handle = self.add_child(parent, CaexKind::ExternalInterface, name);
        self.set_id(handle, id);
        self.object_mut(handle).ref_base_class_path = class_path.map(str::to_string);
        handle
    }

    pub fn find_interface(&self, parent: Handle, name: &str) -> Option<Handle> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.object(c).kind == CaexKind::ExternalInterface && self.object(c).name == name)
    }

    /// Finds a top-level library of the given kind by name.
    pub fn find_library(&self, kind: CaexKind, name: &str) -> Option<Handle> {
        self.roots
            .iter()
            .copied()
            .find(|&r| self.object(r).kind == kind && self.object(r).name == name)
    }

    pub fn find_or_add_library(&mut self, kind: CaexKind, name: &str) -> Handle {
        match self.find_library(kind, name) {
            Some(handle) => handle,
            None => self.add_root(kind, name),
        }
    }

    /// Finds a direct child of `parent` by name, any kind but interfaces.
    pub fn find_entry(&self, parent: Handle, name: &str) -> Option<Handle> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.object(c).kind != CaexKind::ExternalInterface && self.object(c).name == name)
    }
}

/// Iterator state for [`CaexDocument::walk`].
pub struct Walk<'a> {
    document: &'a CaexDocument,
    stack: Vec<Handle>,
}

impl Iterator for Walk<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let next = self.stack.pop()?;
        for &child in self.document.children_of(next).iter().rev() {
            self.stack.push(child);
        }
        Some(next)
    }
}
