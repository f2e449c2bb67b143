//! Project and tree-node rows.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::id::Id;

/// Top-level container every other entity belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Repository-assigned id.
    pub id: Id<Project>,
    /// Display name.
    pub name: String,
}

impl Project {
    /// Create a project row with a placeholder id (assigned on insert).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(0),
            name: name.into(),
        }
    }
}

impl Entity for Project {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

/// A node of a self-referential forest.
///
/// The same row type backs two independent collections: the frame tree
/// and the sprite tree. `parent_id == None` marks a root. Forests are
/// acyclic; sibling order is the monotonic `order` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Repository-assigned id.
    pub id: Id<TreeNode>,
    /// Owning project.
    pub project_id: Id<Project>,
    /// Parent node, `None` for roots.
    pub parent_id: Option<Id<TreeNode>>,
    /// Display name.
    pub name: String,
    /// Sibling order.
    pub order: i32,
}

impl TreeNode {
    /// Create a root node with a placeholder id.
    pub fn root(project_id: Id<Project>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: Id::new(0),
            project_id,
            parent_id: None,
            name: name.into(),
            order,
        }
    }

    /// Create a child node with a placeholder id.
    pub fn child(
        project_id: Id<Project>,
        parent_id: Id<TreeNode>,
        name: impl Into<String>,
        order: i32,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::root(project_id, name, order)
        }
    }
}

impl Entity for TreeNode {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
