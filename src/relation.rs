//! Parent-to-children traversal over pointer-valued foreign fields.
//!
//! A [`Children`] value is a call-scoped context: it borrows the parent and
//! carries the foreign field name and target type explicitly. Nothing about
//! a traversal is shared process-wide, so concurrent traversals over
//! different parents cannot observe each other's context.

use crate::client::Client;
use crate::error::Error;
use crate::model::{ModelType, Record, Referenceable};
use crate::query::Query;

/// Traversal context for the children of one parent record: the records of
/// `target` whose `foreign_field` holds the parent's pointer.
#[derive(Debug)]
pub struct Children<'a> {
    parent: &'a Record,
    target: &'static ModelType,
    foreign_field: String,
}

impl Record {
    /// Children of this record, assuming the conventional foreign field
    /// name: the parent's type name, lowercased.
    pub fn children(&self, target: &'static ModelType) -> Children<'_> {
        self.children_as(target, self.model().name.to_lowercase())
    }

    /// Children of this record through an explicit foreign field on the
    /// child type.
    pub fn children_as(
        &self,
        target: &'static ModelType,
        foreign_field: impl Into<String>,
    ) -> Children<'_> {
        Children {
            parent: self,
            target,
            foreign_field: foreign_field.into(),
        }
    }
}

impl<'a> Children<'a> {
    /// The lazy query selecting this parent's children. Further
    /// constraints can be chained before materializing.
    pub fn query(&self) -> Query {
        Query::new(self.target).where_eq(&self.foreign_field, self.parent.to_pointer())
    }

    /// Fetch all children.
    pub fn all(&self, client: &Client) -> Result<Vec<Record>, Error> {
        self.query().all(client)
    }

    /// Attach a child: write the parent's pointer onto the child's foreign
    /// field and save the child.
    pub fn add(&self, client: &Client, child: &mut Record) -> Result<bool, Error> {
        child.set_reference(&self.foreign_field, self.parent);
        child.save(client)
    }
}
