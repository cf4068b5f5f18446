//! SQLite implementation of [`DurableStore`]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sheetvault_core::{
    AnchorKind, ChartData, ChartExtraction, ChartKind, ImageExtraction, MergeRange, TableRegion,
};

use crate::error::{StoreError, StoreResult};
use crate::records::{
    CellRecord, ChartId, ChartRecord, FileId, FileListing, FileRecord, ImageBlob, ImageId,
    ImageRecord, SheetId, SheetRecord,
};
use crate::schema;
use crate::store::DurableStore;
use crate::writer::{SheetBatch, UploadBatch};

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Child tables removed before their sheets on delete
const SHEET_CHILD_TABLES: [&str; 5] = ["cells", "merged_cells", "images", "charts", "table_regions"];

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }
}

// Statement helpers shared by the single-operation writes and `write_upload`.
// They take a `&Connection` so a `Transaction` can be passed in.

fn insert_file(conn: &Connection, name: &str, bytes: &[u8], sheet_count: u32) -> StoreResult<FileId> {
    let created_at = Utc::now().naive_utc().format(CREATED_AT_FORMAT).to_string();
    conn.execute(
        "INSERT INTO files (file_name, file_data, file_size, sheet_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, bytes, bytes.len() as i64, sheet_count, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_sheet(
    conn: &Connection,
    file_id: FileId,
    name: &str,
    index: u32,
    row_count: u32,
    column_count: u32,
) -> StoreResult<SheetId> {
    conn.execute(
        "INSERT INTO sheets (file_id, sheet_name, sheet_index, row_count, column_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![file_id, name, index, row_count, column_count],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_cells(conn: &Connection, sheet_id: SheetId, cells: &[CellRecord]) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO cells (sheet_id, row_index, column_index, cell_value) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for cell in cells {
        stmt.execute(params![sheet_id, cell.row_index, cell.column_index, cell.value])?;
    }
    Ok(())
}

fn insert_merged_cells(conn: &Connection, sheet_id: SheetId, ranges: &[MergeRange]) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO merged_cells (sheet_id, start_row, start_col, end_row, end_col)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for r in ranges {
        stmt.execute(params![sheet_id, r.start_row, r.start_col, r.end_row, r.end_col])?;
    }
    Ok(())
}

fn insert_image(conn: &Connection, sheet_id: SheetId, image: &ImageExtraction) -> StoreResult<ImageId> {
    conn.execute(
        "INSERT INTO images (sheet_id, image_data, image_format, anchor_row, anchor_col, width, height, anchor_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sheet_id,
            image.data,
            image.format,
            image.anchor_row,
            image.anchor_col,
            image.width,
            image.height,
            image.anchor_type.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_chart(conn: &Connection, sheet_id: SheetId, chart: &ChartExtraction) -> StoreResult<ChartId> {
    let data = if chart.data.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&chart.data)?)
    };
    conn.execute(
        "INSERT INTO charts (sheet_id, chart_type, chart_title, chart_data, anchor_row, anchor_col, width, height)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sheet_id,
            chart.kind.as_str(),
            chart.title,
            data,
            chart.anchor_row,
            chart.anchor_col,
            chart.width,
            chart.height,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_table_regions(conn: &Connection, sheet_id: SheetId, regions: &[TableRegion]) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO table_regions
           (sheet_id, region_index, start_row, start_col, end_row, end_col, header_rows, table_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for r in regions {
        stmt.execute(params![
            sheet_id,
            r.region_index,
            r.start_row,
            r.start_col,
            r.end_row,
            r.end_col,
            r.header_rows,
            r.table_name,
        ])?;
    }
    Ok(())
}

fn insert_sheet_batch(conn: &Connection, file_id: FileId, sheet: &SheetBatch) -> StoreResult<SheetId> {
    let sheet_id = insert_sheet(
        conn,
        file_id,
        &sheet.name,
        sheet.index,
        sheet.row_count,
        sheet.column_count,
    )?;
    insert_cells(conn, sheet_id, &sheet.cells)?;
    insert_merged_cells(conn, sheet_id, &sheet.merged_cells)?;
    for image in &sheet.images {
        insert_image(conn, sheet_id, image)?;
    }
    for chart in &sheet.charts {
        insert_chart(conn, sheet_id, chart)?;
    }
    insert_table_regions(conn, sheet_id, &sheet.table_regions)?;
    Ok(sheet_id)
}

fn file_from_row(r: &Row<'_>) -> rusqlite::Result<(FileRecord, String)> {
    let size: i64 = r.get(2)?;
    Ok((
        FileRecord {
            id: r.get(0)?,
            file_name: r.get(1)?,
            file_size: size.max(0) as u64,
            sheet_count: r.get(3)?,
            created_at: NaiveDateTime::default(),
        },
        r.get(4)?,
    ))
}

fn with_created_at((mut file, created_at): (FileRecord, String)) -> StoreResult<FileRecord> {
    file.created_at = NaiveDateTime::parse_from_str(&created_at, CREATED_AT_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("file {} created_at '{created_at}': {e}", file.id)))?;
    Ok(file)
}

fn sheet_from_row(r: &Row<'_>) -> rusqlite::Result<SheetRecord> {
    Ok(SheetRecord {
        id: r.get(0)?,
        file_id: r.get(1)?,
        sheet_name: r.get(2)?,
        sheet_index: r.get(3)?,
        row_count: r.get(4)?,
        column_count: r.get(5)?,
    })
}

const SHEET_COLUMNS: &str = "id, file_id, sheet_name, sheet_index, row_count, column_count";
const FILE_COLUMNS: &str = "id, file_name, file_size, sheet_count, created_at";

impl DurableStore for SqliteStore {
    fn put_file(&self, name: &str, bytes: &[u8], sheet_count: u32) -> StoreResult<FileId> {
        let conn = self.conn()?;
        insert_file(&conn, name, bytes, sheet_count)
    }

    fn put_sheet(
        &self,
        file_id: FileId,
        name: &str,
        index: u32,
        row_count: u32,
        column_count: u32,
    ) -> StoreResult<SheetId> {
        let conn = self.conn()?;
        insert_sheet(&conn, file_id, name, index, row_count, column_count)
    }

    fn put_cells_bulk(&self, sheet_id: SheetId, cells: &[CellRecord]) -> StoreResult<()> {
        if cells.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_cells(&tx, sheet_id, cells)?;
        tx.commit()?;
        Ok(())
    }

    fn put_merged_cells_bulk(&self, sheet_id: SheetId, ranges: &[MergeRange]) -> StoreResult<()> {
        if ranges.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_merged_cells(&tx, sheet_id, ranges)?;
        tx.commit()?;
        Ok(())
    }

    fn put_image(&self, sheet_id: SheetId, image: &ImageExtraction) -> StoreResult<ImageId> {
        let conn = self.conn()?;
        insert_image(&conn, sheet_id, image)
    }

    fn put_chart(&self, sheet_id: SheetId, chart: &ChartExtraction) -> StoreResult<ChartId> {
        let conn = self.conn()?;
        insert_chart(&conn, sheet_id, chart)
    }

    fn put_table_regions_bulk(&self, sheet_id: SheetId, regions: &[TableRegion]) -> StoreResult<()> {
        if regions.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_table_regions(&tx, sheet_id, regions)?;
        tx.commit()?;
        Ok(())
    }

    fn get_cells_in_row_range(
        &self,
        sheet_id: SheetId,
        start_row: u32,
        end_row: u32,
    ) -> StoreResult<Vec<CellRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT row_index, column_index, cell_value
            FROM cells
            WHERE sheet_id = ?1 AND row_index >= ?2 AND row_index < ?3
            ORDER BY row_index, column_index
            "#,
        )?;
        let rows = stmt.query_map(params![sheet_id, start_row, end_row], |r| {
            Ok(CellRecord {
                row_index: r.get(0)?,
                column_index: r.get(1)?,
                value: r.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for item in rows {
            out.push(item?);
        }
        Ok(out)
    }

    fn get_max_row_index(&self, sheet_id: SheetId) -> StoreResult<u32> {
        let conn = self.conn()?;
        let max: Option<u32> = conn.query_row(
            "SELECT MAX(row_index) FROM cells WHERE sheet_id = ?1",
            params![sheet_id],
            |r| r.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    fn get_merged_cells(&self, sheet_id: SheetId) -> StoreResult<Vec<MergeRange>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT start_row, start_col, end_row, end_col FROM merged_cells WHERE sheet_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![sheet_id], |r| {
            Ok((
                r.get::<_, u32>(0)?,
                r.get::<_, u32>(1)?,
                r.get::<_, u32>(2)?,
                r.get::<_, u32>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for item in rows {
            let (start_row, start_col, end_row, end_col) = item?;
            let range = MergeRange::new(start_row, start_col, end_row, end_col).ok_or_else(|| {
                StoreError::Corrupt(format!("inverted merge range on sheet {sheet_id}"))
            })?;
            out.push(range);
        }
        Ok(out)
    }

    fn get_images(&self, sheet_id: SheetId) -> StoreResult<Vec<ImageRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT id, sheet_id, image_format, anchor_row, anchor_col, width, height, anchor_type
            FROM images WHERE sheet_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![sheet_id], |r| {
            let anchor_type: String = r.get(7)?;
            Ok(ImageRecord {
                id: r.get(0)?,
                sheet_id: r.get(1)?,
                image_format: r.get(2)?,
                anchor_row: r.get(3)?,
                anchor_col: r.get(4)?,
                width: r.get(5)?,
                height: r.get(6)?,
                anchor_type: AnchorKind::from_local_name(&anchor_type).unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for item in rows {
            out.push(item?);
        }
        Ok(out)
    }

    fn get_charts(&self, sheet_id: SheetId) -> StoreResult<Vec<ChartRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT id, sheet_id, chart_type, chart_title, chart_data, anchor_row, anchor_col, width, height
            FROM charts WHERE sheet_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![sheet_id], |r| {
            let chart_type: String = r.get(2)?;
            let data: Option<String> = r.get(4)?;
            Ok((
                ChartRecord {
                    id: r.get(0)?,
                    sheet_id: r.get(1)?,
                    chart_type: ChartKind::from_tag(&chart_type),
                    chart_title: r.get(3)?,
                    chart_data: None,
                    anchor_row: r.get(5)?,
                    anchor_col: r.get(6)?,
                    width: r.get(7)?,
                    height: r.get(8)?,
                },
                data,
            ))
        })?;

        let mut out = Vec::new();
        for item in rows {
            let (mut chart, data) = item?;
            chart.chart_data = data
                .map(|json| serde_json::from_str::<ChartData>(&json))
                .transpose()?;
            out.push(chart);
        }
        Ok(out)
    }

    fn get_table_regions(&self, sheet_id: SheetId) -> StoreResult<Vec<TableRegion>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT region_index, start_row, start_col, end_row, end_col, header_rows, table_name
            FROM table_regions WHERE sheet_id = ?1 ORDER BY region_index
            "#,
        )?;
        let rows = stmt.query_map(params![sheet_id], |r| {
            Ok(TableRegion {
                region_index: r.get(0)?,
                start_row: r.get(1)?,
                start_col: r.get(2)?,
                end_row: r.get(3)?,
                end_col: r.get(4)?,
                header_rows: r.get(5)?,
                table_name: r.get(6)?,
            })
        })?;

        let mut out = Vec::new();
        for item in rows {
            out.push(item?);
        }
        Ok(out)
    }

    fn delete_file(&self, file_id: FileId) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists = tx
            .query_row("SELECT 1 FROM files WHERE id = ?1", params![file_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Ok(false);
        }

        for table in SHEET_CHILD_TABLES {
            tx.execute(
                &format!("DELETE FROM {table} WHERE sheet_id IN (SELECT id FROM sheets WHERE file_id = ?1)"),
                params![file_id],
            )?;
        }
        tx.execute("DELETE FROM sheets WHERE file_id = ?1", params![file_id])?;
        tx.execute("DELETE FROM files WHERE id = ?1", params![file_id])?;
        tx.commit()?;

        log::info!("deleted file {file_id}");
        Ok(true)
    }

    fn get_file(&self, file_id: FileId) -> StoreResult<Option<FileRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
                params![file_id],
                file_from_row,
            )
            .optional()?;
        row.map(with_created_at).transpose()
    }

    fn get_file_bytes(&self, file_id: FileId) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let bytes = conn
            .query_row(
                "SELECT file_data FROM files WHERE id = ?1",
                params![file_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(bytes)
    }

    fn list_files(&self, skip: u32, limit: u32) -> StoreResult<FileListing> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FILE_COLUMNS} FROM files ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit, skip], file_from_row)?;

        let mut files = Vec::new();
        for item in rows {
            files.push(with_created_at(item?)?);
        }
        Ok(FileListing {
            total: total.max(0) as u64,
            files,
        })
    }

    fn list_sheets(&self, file_id: FileId) -> StoreResult<Vec<SheetRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SHEET_COLUMNS} FROM sheets WHERE file_id = ?1 ORDER BY sheet_index"
        ))?;
        let rows = stmt.query_map(params![file_id], sheet_from_row)?;

        let mut out = Vec::new();
        for item in rows {
            out.push(item?);
        }
        Ok(out)
    }

    fn get_sheet(&self, sheet_id: SheetId) -> StoreResult<Option<SheetRecord>> {
        let conn = self.conn()?;
        let sheet = conn
            .query_row(
                &format!("SELECT {SHEET_COLUMNS} FROM sheets WHERE id = ?1"),
                params![sheet_id],
                sheet_from_row,
            )
            .optional()?;
        Ok(sheet)
    }

    fn get_image(&self, image_id: ImageId) -> StoreResult<Option<ImageBlob>> {
        let conn = self.conn()?;
        let image = conn
            .query_row(
                "SELECT id, image_format, image_data FROM images WHERE id = ?1",
                params![image_id],
                |r| {
                    Ok(ImageBlob {
                        id: r.get(0)?,
                        image_format: r.get(1)?,
                        data: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(image)
    }

    /// Writes the file, every sheet and all their dependents in one
    /// transaction. A failure leaves nothing behind.
    fn write_upload(&self, upload: &UploadBatch) -> StoreResult<FileId> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let file_id = insert_file(&tx, &upload.file_name, &upload.bytes, upload.sheets.len() as u32)?;
        for sheet in &upload.sheets {
            insert_sheet_batch(&tx, file_id, sheet)?;
        }
        tx.commit()?;
        Ok(file_id)
    }
}
