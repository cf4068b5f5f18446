use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS files (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          file_name TEXT NOT NULL,
          file_data BLOB NOT NULL,
          file_size INTEGER NOT NULL,
          sheet_count INTEGER NOT NULL DEFAULT 0,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sheets (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          file_id INTEGER NOT NULL REFERENCES files(id),
          sheet_name TEXT NOT NULL,
          sheet_index INTEGER NOT NULL,
          row_count INTEGER NOT NULL DEFAULT 0,
          column_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_sheets_file ON sheets(file_id, sheet_index);

        -- Sparse: a missing (sheet, row, column) is an empty cell
        CREATE TABLE IF NOT EXISTS cells (
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          row_index INTEGER NOT NULL CHECK (row_index >= 0),
          column_index INTEGER NOT NULL CHECK (column_index >= 0),
          cell_value TEXT NOT NULL,
          PRIMARY KEY (sheet_id, row_index, column_index)
        );

        CREATE INDEX IF NOT EXISTS idx_cells_sheet_row ON cells(sheet_id, row_index);

        CREATE TABLE IF NOT EXISTS merged_cells (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          start_row INTEGER NOT NULL,
          start_col INTEGER NOT NULL,
          end_row INTEGER NOT NULL,
          end_col INTEGER NOT NULL,
          CHECK (start_row <= end_row AND start_col <= end_col)
        );

        CREATE INDEX IF NOT EXISTS idx_merged_cells_sheet ON merged_cells(sheet_id);

        CREATE TABLE IF NOT EXISTS images (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          image_data BLOB NOT NULL,
          image_format TEXT NOT NULL,
          anchor_row INTEGER NOT NULL,
          anchor_col INTEGER NOT NULL,
          width INTEGER,
          height INTEGER,
          anchor_type TEXT NOT NULL DEFAULT 'oneCellAnchor'
        );

        CREATE INDEX IF NOT EXISTS idx_images_sheet ON images(sheet_id);

        CREATE TABLE IF NOT EXISTS charts (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          chart_type TEXT NOT NULL,
          chart_title TEXT,
          chart_data TEXT,  -- series metadata as JSON
          anchor_row INTEGER NOT NULL,
          anchor_col INTEGER NOT NULL,
          width INTEGER,
          height INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_charts_sheet ON charts(sheet_id);

        CREATE TABLE IF NOT EXISTS table_regions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sheet_id INTEGER NOT NULL REFERENCES sheets(id),
          region_index INTEGER NOT NULL,
          start_row INTEGER NOT NULL,
          start_col INTEGER NOT NULL,
          end_row INTEGER NOT NULL,
          end_col INTEGER NOT NULL,
          header_rows INTEGER NOT NULL DEFAULT 1,
          table_name TEXT,
          UNIQUE (sheet_id, region_index)
        );
        "#,
    )?;

    Ok(())
}
