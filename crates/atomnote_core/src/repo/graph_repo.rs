//! Graph entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Wrap raw atom and cell rows as typed entities.
//! - Own every SQL statement that touches the `atoms`/`atom_list_cells` arena.
//!
//! # Invariants
//! - `create_atom` with an explicit id never overwrites an existing atom.
//! - `remove_atom` refuses atoms that still own a list or sit in one.
//! - `remove_cell` refuses cells that are still linked into a chain.
//! - Reverse lookups (`rest_of`, `notes_of`, `first_of`) are index scans,
//!   never chain walks.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::atom::{generate_id, Atom, AtomId, AtomValidationError, CellId};
use crate::model::cell::AtomListCell;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const ATOM_SELECT_SQL: &str = "SELECT
    id,
    value,
    alias,
    created,
    priority,
    sharability,
    weight,
    shortcut,
    notes
FROM atoms";

const CELL_SELECT_SQL: &str = "SELECT id, first, rest FROM atom_list_cells";

/// Result type used by graph entity and list operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors from the graph entity layer and the list layer built on it.
#[derive(Debug)]
pub enum GraphError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Atom property validation failed.
    Validation(AtomValidationError),
    /// An atom with the requested id already exists.
    DuplicateId(AtomId),
    /// Atom still owns a child list and cannot be removed.
    NotEmpty(AtomId),
    /// Atom is still the `first` of at least one list cell.
    AtomReferenced(AtomId),
    /// Atom does not exist.
    AtomNotFound(AtomId),
    /// Cell does not exist.
    CellNotFound(CellId),
    /// Cell is still linked from a predecessor, an owner or to a successor.
    CellStillLinked(CellId),
    /// Chain revisits a cell or otherwise breaks the list invariant.
    CorruptList { owner: AtomId, cell: CellId },
    /// List position is outside the valid range for the operation.
    IndexOutOfRange { position: usize, len: usize },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid entity.
    InvalidData(String),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "atom already exists: {id}"),
            Self::NotEmpty(id) => write!(f, "atom still owns notes: {id}"),
            Self::AtomReferenced(id) => write!(f, "atom is still listed as a note: {id}"),
            Self::AtomNotFound(id) => write!(f, "atom not found: {id}"),
            Self::CellNotFound(id) => write!(f, "list cell not found: {id}"),
            Self::CellStillLinked(id) => write!(f, "list cell is still linked: {id}"),
            Self::CorruptList { owner, cell } => {
                write!(f, "corrupt note list of atom {owner} at cell {cell}")
            }
            Self::IndexOutOfRange { position, len } => {
                write!(f, "list position {position} out of range for length {len}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "graph repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "graph repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "graph repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid graph data: {message}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for GraphError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<AtomValidationError> for GraphError {
    fn from(value: AtomValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Property defaults stamped on newly created atoms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtomDefaults {
    pub weight: Option<f32>,
    pub sharability: Option<f32>,
}

/// Repository interface over the atom graph store.
pub trait GraphRepository {
    /// Loads one atom by id.
    fn get_atom(&self, id: &str) -> GraphResult<Option<Atom>>;
    /// Creates one atom, with a fresh id when `id` is `None`.
    fn create_atom(&self, id: Option<&str>, defaults: &AtomDefaults) -> GraphResult<Atom>;
    /// Persists scalar properties. Never touches `created` or `notes`.
    fn update_atom(&self, atom: &Atom) -> GraphResult<()>;
    /// Removes one childless, unreferenced atom.
    fn remove_atom(&self, id: &str) -> GraphResult<()>;
    /// Lists every atom ordered by creation time.
    fn list_atoms(&self) -> GraphResult<Vec<Atom>>;
    /// Lists atoms that appear in no list (no incoming `first`).
    fn list_unreferenced_atoms(&self) -> GraphResult<Vec<Atom>>;
    /// Replaces the owner's head cell pointer.
    fn set_notes(&self, atom_id: &str, head: Option<&str>) -> GraphResult<()>;
    /// Loads one cell by id.
    fn get_cell(&self, id: &str) -> GraphResult<Option<AtomListCell>>;
    /// Creates one cell holding `first`, with no successor.
    fn create_cell(&self, first: &str) -> GraphResult<AtomListCell>;
    /// Replaces the atom held by a cell.
    fn set_first(&self, cell_id: &str, first: &str) -> GraphResult<()>;
    /// Replaces the successor pointer of a cell.
    fn set_rest(&self, cell_id: &str, rest: Option<&str>) -> GraphResult<()>;
    /// Finds the cell whose `rest` points at `cell_id`.
    fn rest_of(&self, cell_id: &str) -> GraphResult<Option<AtomListCell>>;
    /// Finds the atom whose `notes` points at `cell_id`.
    fn notes_of(&self, cell_id: &str) -> GraphResult<Option<Atom>>;
    /// Lists every cell holding `atom_id`.
    fn first_of(&self, atom_id: &str) -> GraphResult<Vec<AtomListCell>>;
    /// Removes one fully unlinked cell.
    fn remove_cell(&self, cell_id: &str) -> GraphResult<()>;
}

/// SQLite-backed graph repository.
pub struct SqliteGraphRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraphRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> GraphResult<Self> {
        ensure_graph_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn require_cell(&self, id: &str) -> GraphResult<AtomListCell> {
        self.get_cell(id)?
            .ok_or_else(|| GraphError::CellNotFound(id.to_string()))
    }
}

impl GraphRepository for SqliteGraphRepository<'_> {
    fn get_atom(&self, id: &str) -> GraphResult<Option<Atom>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{ATOM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_atom_row(row)?));
        }
        Ok(None)
    }

    fn create_atom(&self, id: Option<&str>, defaults: &AtomDefaults) -> GraphResult<Atom> {
        let id = match id {
            Some(requested) => {
                if self.get_atom(requested)?.is_some() {
                    return Err(GraphError::DuplicateId(requested.to_string()));
                }
                requested.to_string()
            }
            None => generate_id(),
        };

        let mut atom = Atom::new(id, now_epoch_ms());
        atom.weight = defaults.weight;
        atom.sharability = defaults.sharability;
        atom.validate()?;

        self.conn.execute(
            "INSERT INTO atoms (id, created, sharability, weight)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                atom.id.as_str(),
                atom.created,
                atom.sharability.map(f64::from),
                atom.weight.map(f64::from),
            ],
        )?;
        debug!("event=atom_create module=repo status=ok atom_id={}", atom.id);
        Ok(atom)
    }

    fn update_atom(&self, atom: &Atom) -> GraphResult<()> {
        atom.validate()?;

        let changed = self.conn.execute(
            "UPDATE atoms
             SET
                value = ?2,
                alias = ?3,
                priority = ?4,
                sharability = ?5,
                weight = ?6,
                shortcut = ?7
             WHERE id = ?1;",
            params![
                atom.id.as_str(),
                atom.value.as_deref(),
                atom.alias.as_deref(),
                atom.priority.map(f64::from),
                atom.sharability.map(f64::from),
                atom.weight.map(f64::from),
                atom.shortcut.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(GraphError::AtomNotFound(atom.id.clone()));
        }
        Ok(())
    }

    fn remove_atom(&self, id: &str) -> GraphResult<()> {
        let atom = self
            .get_atom(id)?
            .ok_or_else(|| GraphError::AtomNotFound(id.to_string()))?;
        if atom.has_notes() {
            return Err(GraphError::NotEmpty(atom.id));
        }
        if !self.first_of(id)?.is_empty() {
            return Err(GraphError::AtomReferenced(atom.id));
        }

        self.conn
            .execute("DELETE FROM atom_search WHERE atom_id = ?1;", [id])?;
        self.conn.execute("DELETE FROM atoms WHERE id = ?1;", [id])?;
        debug!("event=atom_remove module=repo status=ok atom_id={id}");
        Ok(())
    }

    fn list_atoms(&self) -> GraphResult<Vec<Atom>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ATOM_SELECT_SQL} ORDER BY created ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut atoms = Vec::new();
        while let Some(row) = rows.next()? {
            atoms.push(parse_atom_row(row)?);
        }
        Ok(atoms)
    }

    fn list_unreferenced_atoms(&self) -> GraphResult<Vec<Atom>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATOM_SELECT_SQL}
             WHERE NOT EXISTS (
                SELECT 1 FROM atom_list_cells c WHERE c.first = atoms.id
             )
             ORDER BY created ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut atoms = Vec::new();
        while let Some(row) = rows.next()? {
            atoms.push(parse_atom_row(row)?);
        }
        Ok(atoms)
    }

    fn set_notes(&self, atom_id: &str, head: Option<&str>) -> GraphResult<()> {
        let changed = self.conn.execute(
            "UPDATE atoms SET notes = ?2 WHERE id = ?1;",
            params![atom_id, head],
        )?;
        if changed == 0 {
            return Err(GraphError::AtomNotFound(atom_id.to_string()));
        }
        Ok(())
    }

    fn get_cell(&self, id: &str) -> GraphResult<Option<AtomListCell>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CELL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_cell_row(row)?));
        }
        Ok(None)
    }

    fn create_cell(&self, first: &str) -> GraphResult<AtomListCell> {
        if self.get_atom(first)?.is_none() {
            return Err(GraphError::AtomNotFound(first.to_string()));
        }

        let cell = AtomListCell {
            id: generate_id(),
            first: first.to_string(),
            rest: None,
        };
        self.conn.execute(
            "INSERT INTO atom_list_cells (id, first, rest) VALUES (?1, ?2, NULL);",
            params![cell.id.as_str(), cell.first.as_str()],
        )?;
        Ok(cell)
    }

    fn set_first(&self, cell_id: &str, first: &str) -> GraphResult<()> {
        if self.get_atom(first)?.is_none() {
            return Err(GraphError::AtomNotFound(first.to_string()));
        }
        let changed = self.conn.execute(
            "UPDATE atom_list_cells SET first = ?2 WHERE id = ?1;",
            params![cell_id, first],
        )?;
        if changed == 0 {
            return Err(GraphError::CellNotFound(cell_id.to_string()));
        }
        Ok(())
    }

    fn set_rest(&self, cell_id: &str, rest: Option<&str>) -> GraphResult<()> {
        let changed = self.conn.execute(
            "UPDATE atom_list_cells SET rest = ?2 WHERE id = ?1;",
            params![cell_id, rest],
        )?;
        if changed == 0 {
            return Err(GraphError::CellNotFound(cell_id.to_string()));
        }
        Ok(())
    }

    fn rest_of(&self, cell_id: &str) -> GraphResult<Option<AtomListCell>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CELL_SELECT_SQL} WHERE rest = ?1;"))?;
        let mut rows = stmt.query([cell_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_cell_row(row)?));
        }
        Ok(None)
    }

    fn notes_of(&self, cell_id: &str) -> GraphResult<Option<Atom>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{ATOM_SELECT_SQL} WHERE notes = ?1;"))?;
        let mut rows = stmt.query([cell_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_atom_row(row)?));
        }
        Ok(None)
    }

    fn first_of(&self, atom_id: &str) -> GraphResult<Vec<AtomListCell>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CELL_SELECT_SQL} WHERE first = ?1 ORDER BY id ASC;"))?;
        let mut rows = stmt.query([atom_id])?;
        let mut cells = Vec::new();
        while let Some(row) = rows.next()? {
            cells.push(parse_cell_row(row)?);
        }
        Ok(cells)
    }

    fn remove_cell(&self, cell_id: &str) -> GraphResult<()> {
        let cell = self.require_cell(cell_id)?;
        if cell.rest.is_some()
            || self.rest_of(cell_id)?.is_some()
            || self.notes_of(cell_id)?.is_some()
        {
            return Err(GraphError::CellStillLinked(cell.id));
        }
        self.conn
            .execute("DELETE FROM atom_list_cells WHERE id = ?1;", [cell_id])?;
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn parse_atom_row(row: &Row<'_>) -> GraphResult<Atom> {
    let atom = Atom {
        id: row.get("id")?,
        value: row.get("value")?,
        alias: row.get("alias")?,
        created: row.get("created")?,
        priority: read_float(row, "priority")?,
        sharability: read_float(row, "sharability")?,
        weight: read_float(row, "weight")?,
        shortcut: row.get("shortcut")?,
        notes: row.get("notes")?,
    };
    atom.validate().map_err(|err| {
        GraphError::InvalidData(format!("atom `{}` failed validation: {err}", atom.id))
    })?;
    Ok(atom)
}

fn parse_cell_row(row: &Row<'_>) -> GraphResult<AtomListCell> {
    Ok(AtomListCell {
        id: row.get("id")?,
        first: row.get("first")?,
        rest: row.get("rest")?,
    })
}

fn read_float(row: &Row<'_>, column: &str) -> GraphResult<Option<f32>> {
    Ok(row.get::<_, Option<f64>>(column)?.map(|value| value as f32))
}

fn ensure_graph_connection_ready(conn: &Connection) -> GraphResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(GraphError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED: &[(&str, &[&str])] = &[
        (
            "atoms",
            &[
                "id",
                "value",
                "alias",
                "created",
                "priority",
                "sharability",
                "weight",
                "shortcut",
                "notes",
            ],
        ),
        ("atom_list_cells", &["id", "first", "rest"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(GraphError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(GraphError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> GraphResult<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> GraphResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
