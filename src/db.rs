use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("courseadmin.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    create_schema(&conn)?;
    Ok(conn)
}

pub fn create_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS packages(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            price REAL NOT NULL,
            thumbnail_url TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS course_videos(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            video_embed TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_course_videos_course ON course_videos(course_id)",
        [],
    )?;
    // Workspaces from before the embed-player rollout only carry video_url.
    ensure_course_videos_video_embed(conn)?;

    // Legacy workspaces created the link table with capitalized foreign-key
    // columns (Package_id/Course_id). IF NOT EXISTS leaves those untouched;
    // store::Store probes the actual spelling at runtime.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS package_courses(
            package_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            FOREIGN KEY(package_id) REFERENCES packages(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            referral_code TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    ensure_students_referral_code(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS purchases(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            package_id TEXT NOT NULL,
            amount REAL NOT NULL,
            affiliate_id TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(package_id) REFERENCES packages(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchases_student ON purchases(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_purchases_package ON purchases(package_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS withdrawals(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            amount REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_withdrawals_student ON withdrawals(student_id)",
        [],
    )?;

    Ok(())
}

fn ensure_course_videos_video_embed(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "course_videos", "video_embed")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE course_videos ADD COLUMN video_embed TEXT", [])?;
    Ok(())
}

fn ensure_students_referral_code(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "referral_code")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN referral_code TEXT", [])?;
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
