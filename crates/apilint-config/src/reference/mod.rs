//! `$ref` dereferencing
//!
//! Turns a root document into one logical document with every reference node
//! replaced by the value it points to, while recording where each logical
//! node physically lives. References that cannot be followed are collected
//! and the node is dropped; resolution itself never fails on content.
//!
//! Siblings are resolved concurrently. Loads go through a shared
//! [`DocumentCache`], while the stack used for cycle detection is owned by
//! each branch, so two siblings reaching the same target never look like a
//! cycle.

mod cache;
mod map;
pub mod pointer;

pub use cache::DocumentCache;
pub use map::{Location, Provenance, ReferenceMap, UnresolvedReference};

use crate::source::{RawDocument, Source, SourceId};
use futures::future::{BoxFuture, FutureExt, join_all};
use pointer::RefTarget;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output of a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    /// The dereferenced logical document
    pub document: Value,
    pub reference_map: ReferenceMap,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Resolves `$ref` nodes across documents
pub struct ReferenceResolver {
    cache: Arc<DocumentCache>,
    base_dir: PathBuf,
}

/// Where the traversal currently is
#[derive(Clone)]
struct Cursor {
    document: Arc<RawDocument>,
    /// Pointer inside `document`
    physical: String,
    /// Pointer inside the logical output
    logical: String,
    /// `$ref` node that pulled the current subtree in
    from: Option<Location>,
    /// True when this node is the direct target of a `$ref`
    in_chain: bool,
    /// Active `(source, pointer)` pairs on this path
    stack: Vec<(SourceId, String)>,
}

impl Cursor {
    fn child(&self, token: &str) -> Self {
        Self {
            document: self.document.clone(),
            physical: pointer::join(&self.physical, token),
            logical: pointer::join(&self.logical, token),
            from: self.from.clone(),
            in_chain: false,
            stack: self.stack.clone(),
        }
    }

    fn location(&self) -> Location {
        Location::new(self.document.source_id(), self.physical.clone())
    }
}

/// Resolution result for one subtree
#[derive(Default)]
struct Branch {
    value: Option<Value>,
    map: ReferenceMap,
    unresolved: Vec<UnresolvedReference>,
}

impl ReferenceResolver {
    /// Resolver whose in-memory sources resolve relative refs against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: Arc::new(DocumentCache::new()),
            base_dir: base_dir.into(),
        }
    }

    /// Share a cache with other resolvers of the same run
    pub fn with_cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Dereference every `$ref` reachable from `root`
    pub async fn resolve(&self, root: Arc<RawDocument>) -> ResolvedDocument {
        self.cache.insert(root.clone());

        let cursor = Cursor {
            document: root.clone(),
            physical: String::new(),
            logical: String::new(),
            from: None,
            in_chain: false,
            stack: Vec::new(),
        };
        let branch = self.resolve_node(cursor, root.root.clone()).await;

        tracing::debug!(
            "Resolved {} with {} nodes and {} unresolved references",
            root.source_id(),
            branch.map.len(),
            branch.unresolved.len()
        );

        ResolvedDocument {
            document: branch.value.unwrap_or(Value::Null),
            reference_map: branch.map,
            unresolved: branch.unresolved,
        }
    }

    fn resolve_node(&self, cursor: Cursor, node: Value) -> BoxFuture<'_, Branch> {
        async move {
            if let Some(raw) = pointer::ref_string(&node) {
                let raw = raw.to_string();
                return self.resolve_ref(cursor, raw).await;
            }

            let mut branch = Branch::default();
            let value = match node {
                Value::Object(map) => {
                    let children = join_all(map.into_iter().map(|(key, child)| {
                        let child_cursor = cursor.child(&key);
                        async move { (key, self.resolve_node(child_cursor, child).await) }
                    }))
                    .await;

                    let mut resolved = Map::new();
                    for (key, child) in children {
                        branch.map.extend(child.map);
                        branch.unresolved.extend(child.unresolved);
                        if let Some(value) = child.value {
                            resolved.insert(key, value);
                        }
                    }
                    Value::Object(resolved)
                }
                Value::Array(items) => {
                    let children = join_all(items.into_iter().enumerate().map(|(index, item)| {
                        let child_cursor = cursor.child(&index.to_string());
                        self.resolve_node(child_cursor, item)
                    }))
                    .await;

                    let mut resolved = Vec::new();
                    for (index, mut child) in children.into_iter().enumerate() {
                        let Some(value) = child.value else {
                            branch.unresolved.append(&mut child.unresolved);
                            continue;
                        };
                        // Dropped items shift later siblings down
                        let kept = resolved.len();
                        if kept != index {
                            let from = pointer::join(&cursor.logical, &index.to_string());
                            let to = pointer::join(&cursor.logical, &kept.to_string());
                            child.map.rebase(&from, &to);
                            for reference in &mut child.unresolved {
                                reference.rebase(&from, &to);
                            }
                        }
                        branch.map.extend(child.map);
                        branch.unresolved.append(&mut child.unresolved);
                        resolved.push(value);
                    }
                    Value::Array(resolved)
                }
                scalar => scalar,
            };

            branch.map.insert(
                cursor.logical.clone(),
                Provenance {
                    location: cursor.location(),
                    from: cursor.from.clone(),
                },
            );
            branch.value = Some(value);
            branch
        }
        .boxed()
    }

    async fn resolve_ref(&self, cursor: Cursor, raw: String) -> Branch {
        let ref_location = cursor.location();
        // A chain keeps the origin of its first hop
        let origin = if cursor.in_chain {
            cursor.from.clone()
        } else {
            Some(ref_location.clone())
        };

        let unresolved = |target_source: Option<SourceId>, reason: String| {
            tracing::debug!("Unresolved $ref '{}' at {}: {}", raw, ref_location.pointer, reason);
            Branch {
                value: None,
                map: ReferenceMap::new(),
                unresolved: vec![UnresolvedReference {
                    pointer: cursor.logical.clone(),
                    location: ref_location.clone(),
                    from: origin.clone(),
                    target: raw.clone(),
                    target_source,
                    reason,
                }],
            }
        };

        let target = match RefTarget::parse(&raw) {
            Ok(target) => target,
            Err(reason) => return unresolved(None, reason),
        };
        if target.is_remote() {
            return unresolved(None, format!("Remote references are not supported: '{raw}'"));
        }

        let source = match &target.path {
            Some(path) => {
                let base = cursor.document.source.base_dir(&self.base_dir);
                Source::path(resolve_relative(&base, path))
            }
            None => (*cursor.document.source).clone(),
        };
        let source_id = source.id();

        let key = (source_id.clone(), target.pointer.clone());
        if cursor.stack.contains(&key) {
            return unresolved(
                Some(source_id),
                format!("Circular $ref '{raw}' detected"),
            );
        }

        let document = match &target.path {
            Some(_) => match self.cache.load(&source).await {
                Ok(document) => document,
                Err(reason) => return unresolved(Some(source_id), reason),
            },
            None => cursor.document.clone(),
        };

        let Some(value) = document.root.pointer(&target.pointer).cloned() else {
            return unresolved(
                Some(source_id.clone()),
                format!(
                    "Can't find {} in {}",
                    pointer::display(&target.pointer),
                    source_id
                ),
            );
        };

        let mut stack = cursor.stack.clone();
        stack.push(key);
        let target_cursor = Cursor {
            document,
            physical: target.pointer,
            logical: cursor.logical.clone(),
            from: origin,
            in_chain: true,
            stack,
        };
        self.resolve_node(target_cursor, value).await
    }
}

/// Resolve a `$ref` file path against the referencing document's directory
fn resolve_relative(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
