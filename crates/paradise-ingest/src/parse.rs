//! Row parsing: untyped source rows into entity and relation records.

use paradise_core::{
    EntityAttributes, EntityRecord, ExternalId, NodeKind, ParadiseError, RelationRecord,
};

use crate::source::Cell;

/// Columns of every `nodes.*` table.
pub const ENTITY_COLUMNS: usize = 18;

/// Position of `node_id` among the entity columns; every other column is an
/// attribute, in [`EntityAttributes::PROPERTY_NAMES`] order.
const NODE_ID_COLUMN: usize = 4;

/// Columns of the edges table.
pub const EDGE_COLUMNS: usize = 4;

fn parse_error(reason: impl Into<String>) -> ParadiseError {
    ParadiseError::Parse {
        reason: reason.into(),
    }
}

fn id_cell(cell: &Cell, column: &str) -> Result<ExternalId, ParadiseError> {
    cell.as_i64()
        .map(ExternalId)
        .ok_or_else(|| parse_error(format!("{column} is not an integer: {cell:?}")))
}

/// Parse one entity row read from the table of `kind`.
pub fn parse_entity(row: &[Cell], kind: NodeKind) -> Result<EntityRecord, ParadiseError> {
    if row.len() != ENTITY_COLUMNS {
        return Err(parse_error(format!(
            "expected {ENTITY_COLUMNS} columns, found {}",
            row.len()
        )));
    }

    let id = id_cell(&row[NODE_ID_COLUMN], "node_id")?;
    let mut attributes = EntityAttributes::default();
    let values = row
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != NODE_ID_COLUMN)
        .map(|(_, cell)| cell);
    for (slot, cell) in values.enumerate() {
        if let Some(target) = attributes.slot_mut(slot) {
            *target = cell.as_text();
        }
    }

    Ok(EntityRecord {
        handle: None,
        id,
        kind,
        attributes,
    })
}

fn is_tag(cell: &Cell) -> bool {
    matches!(cell, Cell::Text(s) if s.trim().parse::<i64>().is_err())
}

/// Parse one edges row.
///
/// The relation tag is the only text column and may sit third or fourth:
/// `id, node1, node2, rel_type` and `id, node1, rel_type, node2` are both
/// read.
pub fn parse_relation(row: &[Cell]) -> Result<RelationRecord, ParadiseError> {
    if row.len() != EDGE_COLUMNS {
        return Err(parse_error(format!(
            "expected {EDGE_COLUMNS} columns, found {}",
            row.len()
        )));
    }

    let (node2, tag) = if is_tag(&row[3]) {
        (&row[2], &row[3])
    } else if is_tag(&row[2]) {
        (&row[3], &row[2])
    } else {
        return Err(parse_error("no relation type column"));
    };

    let rel_type = tag
        .as_text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| parse_error("relation type is empty"))?;

    Ok(RelationRecord {
        edge_id: id_cell(&row[0], "id")?.0,
        node1: id_cell(&row[1], "node1")?,
        node2: id_cell(node2, "node2")?,
        rel_type,
    })
}
