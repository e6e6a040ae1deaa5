//! Relationship maintenance for the package/course/video graph: explicit
//! link and unlink of package↔course associations, validated video creation,
//! cascading course deletion, and the orphan audit.
//!
//! Mutating operations fail only from their authoritative step. Cascade
//! cleanup of dependent rows is best-effort: the workspace store may enforce
//! its own cascade, so "already gone" and "could not delete" both log a
//! warning and move on. Read-only diagnostics never fail outward.

use std::collections::HashSet;

use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::store::{self, Record, Store};

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    /// A referenced entity does not exist at the time of a dependent write.
    #[error("{0}")]
    InvalidReference(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The store refused the authoritative delete because other records
    /// still point at the row.
    #[error("cannot delete {0}: it is still referenced by other records")]
    StillReferenced(&'static str),
    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

#[derive(Debug)]
pub struct LinkOutcome {
    pub link: Record,
    /// False when the pair was already linked and the call was a no-op.
    pub created: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncOutcome {
    pub linked: usize,
    pub unlinked: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDependencies {
    pub videos: i64,
    pub packages: i64,
    pub package_names: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAudit {
    pub total_videos: i64,
    pub valid_videos: i64,
    pub orphaned_videos: Vec<Record>,
}

/// Associates a course with a package. Both ids must resolve. Linking an
/// already-linked pair is a no-op so a course appears in a package at most
/// once regardless of what the UI's diffing sends.
pub fn link_course(
    store: &Store,
    package_id: &str,
    course_id: &str,
) -> Result<LinkOutcome, RelationError> {
    if store.fetch_by_id("packages", package_id)?.is_none() {
        return Err(RelationError::InvalidReference(format!(
            "package {package_id} does not exist"
        )));
    }
    if store.fetch_by_id("courses", course_id)?.is_none() {
        return Err(RelationError::InvalidReference(format!(
            "course {course_id} does not exist"
        )));
    }

    let cols = store.link_columns()?;
    let existing = store.count_matching(
        "package_courses",
        &[(cols.package_id, package_id), (cols.course_id, course_id)],
    )?;
    if existing > 0 {
        return Ok(LinkOutcome {
            link: link_record(package_id, course_id),
            created: false,
        });
    }

    let sql = format!(
        "INSERT INTO package_courses({}, {}) VALUES(?, ?)",
        cols.package_id, cols.course_id
    );
    store.conn().execute(&sql, [package_id, course_id])?;
    Ok(LinkOutcome {
        link: link_record(package_id, course_id),
        created: true,
    })
}

/// Removes the association. Unlinking a pair that was never linked succeeds
/// and removes nothing.
pub fn unlink_course(
    store: &Store,
    package_id: &str,
    course_id: &str,
) -> Result<usize, RelationError> {
    let cols = store.link_columns()?;
    let removed = store.delete_by_filter(
        "package_courses",
        &[(cols.package_id, package_id), (cols.course_id, course_id)],
    )?;
    Ok(removed)
}

/// Replaces a package's linked course set with `selected`: unlinks what fell
/// out of the selection, links what is new, leaves the rest alone. The diff
/// is applied inside one transaction, so a failure partway through leaves
/// the previous link set intact.
pub fn set_package_courses(
    store: &Store,
    package_id: &str,
    selected: &[String],
) -> Result<ResyncOutcome, RelationError> {
    if store.fetch_by_id("packages", package_id)?.is_none() {
        return Err(RelationError::NotFound("package"));
    }

    let selected: HashSet<&str> = selected.iter().map(|s| s.as_str()).collect();
    let current: HashSet<String> = linked_course_ids(store, package_id)?.into_iter().collect();

    let to_unlink: Vec<&str> = current
        .iter()
        .map(|s| s.as_str())
        .filter(|id| !selected.contains(id))
        .collect();
    let to_link: Vec<&str> = selected
        .iter()
        .copied()
        .filter(|id| !current.contains(*id))
        .collect();

    // Validate the additions up front so nothing mutates on a bad selection.
    for &course_id in &to_link {
        if store.fetch_by_id("courses", course_id)?.is_none() {
            return Err(RelationError::InvalidReference(format!(
                "course {course_id} does not exist"
            )));
        }
    }

    let cols = store.link_columns()?;
    let tx = store.conn().unchecked_transaction()?;
    let unlink_sql = format!(
        "DELETE FROM package_courses WHERE {} = ? AND {} = ?",
        cols.package_id, cols.course_id
    );
    for &course_id in &to_unlink {
        tx.execute(&unlink_sql, [package_id, course_id])?;
    }
    let link_sql = format!(
        "INSERT INTO package_courses({}, {}) VALUES(?, ?)",
        cols.package_id, cols.course_id
    );
    for &course_id in &to_link {
        tx.execute(&link_sql, [package_id, course_id])?;
    }
    tx.commit()?;

    Ok(ResyncOutcome {
        linked: to_link.len(),
        unlinked: to_unlink.len(),
    })
}

/// Creates a video under an existing course. The validated `course_id`
/// parameter always wins over whatever the payload carried, so stale form
/// state cannot re-parent a video.
pub fn create_video_for_course(
    store: &Store,
    course_id: &str,
    mut video: Record,
) -> Result<Record, RelationError> {
    if store.fetch_by_id("courses", course_id)?.is_none() {
        return Err(RelationError::InvalidReference(format!(
            "course {course_id} does not exist"
        )));
    }
    video.insert(
        "course_id".to_string(),
        Value::String(course_id.to_string()),
    );
    Ok(store.insert("course_videos", &video)?)
}

/// Deletes a course and everything hanging off it. Steps, in order:
/// verify the course exists; best-effort delete of its videos; best-effort
/// delete of its package links; delete the course row. Only the last step
/// can fail the operation.
pub fn delete_course(store: &Store, course_id: &str) -> Result<(), RelationError> {
    if store.fetch_by_id("courses", course_id)?.is_none() {
        return Err(RelationError::NotFound("course"));
    }

    let cols = store.link_columns()?;
    let tx = store.conn().unchecked_transaction()?;

    if let Err(e) = tx.execute(
        "DELETE FROM course_videos WHERE course_id = ?",
        [course_id],
    ) {
        warn!("deleting videos for course {course_id} failed, continuing: {e}");
    }

    let link_sql = format!("DELETE FROM package_courses WHERE {} = ?", cols.course_id);
    if let Err(e) = tx.execute(&link_sql, [course_id]) {
        warn!("removing package links for course {course_id} failed, continuing: {e}");
    }

    match tx.execute("DELETE FROM courses WHERE id = ?", [course_id]) {
        Ok(0) => Err(RelationError::NotFound("course")),
        Ok(_) => {
            tx.commit()?;
            Ok(())
        }
        Err(e) if is_foreign_key_violation(&e) => Err(RelationError::StillReferenced("course")),
        Err(e) => Err(e.into()),
    }
}

/// Package deletion mirrors course deletion: link cleanup is best-effort,
/// the row delete is authoritative. Purchases referencing the package block
/// it with StillReferenced.
pub fn delete_package(store: &Store, package_id: &str) -> Result<(), RelationError> {
    if store.fetch_by_id("packages", package_id)?.is_none() {
        return Err(RelationError::NotFound("package"));
    }

    let cols = store.link_columns()?;
    let tx = store.conn().unchecked_transaction()?;

    let link_sql = format!("DELETE FROM package_courses WHERE {} = ?", cols.package_id);
    if let Err(e) = tx.execute(&link_sql, [package_id]) {
        warn!("removing course links for package {package_id} failed, continuing: {e}");
    }

    match tx.execute("DELETE FROM packages WHERE id = ?", [package_id]) {
        Ok(0) => Err(RelationError::NotFound("package")),
        Ok(_) => {
            tx.commit()?;
            Ok(())
        }
        Err(e) if is_foreign_key_violation(&e) => Err(RelationError::StillReferenced("package")),
        Err(e) => Err(e.into()),
    }
}

/// Counts what a course delete would take with it, for the confirmation
/// prompt. Degrades to zeros instead of failing so the prompt can always
/// render.
pub fn check_course_dependencies(store: &Store, course_id: &str) -> CourseDependencies {
    match dependencies_inner(store, course_id) {
        Ok(deps) => deps,
        Err(e) => {
            warn!("dependency check for course {course_id} failed: {e}");
            CourseDependencies::default()
        }
    }
}

fn dependencies_inner(store: &Store, course_id: &str) -> rusqlite::Result<CourseDependencies> {
    let videos = store.count_matching("course_videos", &[("course_id", course_id)])?;
    let cols = store.link_columns()?;
    let sql = format!(
        "SELECT p.title FROM package_courses pc
         JOIN packages p ON p.id = pc.{}
         WHERE pc.{} = ?
         ORDER BY p.title",
        cols.package_id, cols.course_id
    );
    let mut stmt = store.conn().prepare(&sql)?;
    let package_names = stmt
        .query_map([course_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CourseDependencies {
        videos,
        packages: package_names.len() as i64,
        package_names,
    })
}

/// Walks every video and classifies it by whether its course still exists.
/// Reporting only; orphan repair is a manual administrative action.
pub fn audit_video_relationships(store: &Store) -> VideoAudit {
    match audit_inner(store) {
        Ok(audit) => audit,
        Err(e) => {
            warn!("video relationship audit failed: {e}");
            VideoAudit::default()
        }
    }
}

fn audit_inner(store: &Store) -> rusqlite::Result<VideoAudit> {
    let mut stmt = store.conn().prepare(
        "SELECT v.id, v.title, v.course_id, v.created_at, c.id
         FROM course_videos v
         LEFT JOIN courses c ON c.id = v.course_id
         ORDER BY v.created_at DESC",
    )?;
    let mut audit = VideoAudit::default();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        audit.total_videos += 1;
        let resolved: Option<String> = row.get(4)?;
        if resolved.is_some() {
            audit.valid_videos += 1;
        } else {
            let mut orphan = Record::new();
            orphan.insert("id".to_string(), Value::String(row.get(0)?));
            orphan.insert("title".to_string(), Value::String(row.get(1)?));
            orphan.insert("course_id".to_string(), Value::String(row.get(2)?));
            orphan.insert("created_at".to_string(), Value::String(row.get(3)?));
            audit.orphaned_videos.push(orphan);
        }
    }
    Ok(audit)
}

pub fn courses_for_package(store: &Store, package_id: &str) -> Result<Vec<Record>, RelationError> {
    let cols = store.link_columns()?;
    let sql = format!(
        "SELECT c.* FROM package_courses pc
         JOIN courses c ON c.id = pc.{}
         WHERE pc.{} = ?
         ORDER BY c.created_at DESC",
        cols.course_id, cols.package_id
    );
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt
        .query_map([package_id], store::row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn packages_for_course(store: &Store, course_id: &str) -> Result<Vec<Record>, RelationError> {
    let cols = store.link_columns()?;
    let sql = format!(
        "SELECT p.* FROM package_courses pc
         JOIN packages p ON p.id = pc.{}
         WHERE pc.{} = ?
         ORDER BY p.created_at DESC",
        cols.package_id, cols.course_id
    );
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt
        .query_map([course_id], store::row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn linked_course_ids(store: &Store, package_id: &str) -> Result<Vec<String>, RelationError> {
    let cols = store.link_columns()?;
    let sql = format!(
        "SELECT {} FROM package_courses WHERE {} = ?",
        cols.course_id, cols.package_id
    );
    let mut stmt = store.conn().prepare(&sql)?;
    let ids = stmt
        .query_map([package_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn link_record(package_id: &str, course_id: &str) -> Record {
    let mut record = Record::new();
    record.insert(
        "package_id".to_string(),
        Value::String(package_id.to_string()),
    );
    record.insert(
        "course_id".to_string(),
        Value::String(course_id.to_string()),
    );
    record
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use rusqlite::Connection;
    use serde_json::json;

    fn test_store() -> Store {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::create_schema(&conn).expect("create schema");
        Store::new(conn)
    }

    fn legacy_store() -> Store {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute(
            "CREATE TABLE package_courses(Package_id TEXT NOT NULL, Course_id TEXT NOT NULL)",
            [],
        )
        .expect("legacy link table");
        db::create_schema(&conn).expect("create schema");
        Store::new(conn)
    }

    fn insert(store: &Store, table: &str, fields: serde_json::Value) -> String {
        let record = store
            .insert(table, fields.as_object().expect("object literal"))
            .expect("insert");
        record
            .get("id")
            .and_then(|v| v.as_str())
            .expect("id")
            .to_string()
    }

    fn make_course(store: &Store, title: &str) -> String {
        insert(store, "courses", json!({ "title": title }))
    }

    fn make_package(store: &Store, title: &str) -> String {
        insert(store, "packages", json!({ "title": title, "price": 49.0 }))
    }

    fn link_count(store: &Store, package_id: &str, course_id: &str) -> i64 {
        let cols = store.link_columns().unwrap();
        store
            .count_matching(
                "package_courses",
                &[(cols.package_id, package_id), (cols.course_id, course_id)],
            )
            .unwrap()
    }

    #[test]
    fn linking_twice_is_a_noop() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");
        let course_id = make_course(&store, "Intro");

        let first = link_course(&store, &package_id, &course_id).expect("first link");
        assert!(first.created);
        let second = link_course(&store, &package_id, &course_id).expect("second link");
        assert!(!second.created);
        assert_eq!(link_count(&store, &package_id, &course_id), 1);
    }

    #[test]
    fn link_rejects_unresolved_ids() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");

        let err = link_course(&store, &package_id, "nope").unwrap_err();
        assert!(matches!(err, RelationError::InvalidReference(_)));
        let err = link_course(&store, "nope", "nope").unwrap_err();
        assert!(matches!(err, RelationError::InvalidReference(_)));
    }

    #[test]
    fn unlinking_a_never_linked_pair_succeeds() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");
        let course_id = make_course(&store, "Intro");

        let removed = unlink_course(&store, &package_id, &course_id).expect("unlink");
        assert_eq!(removed, 0);
    }

    #[test]
    fn resync_applies_only_the_diff() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");
        let a = make_course(&store, "A");
        let b = make_course(&store, "B");
        let c = make_course(&store, "C");
        link_course(&store, &package_id, &a).unwrap();
        link_course(&store, &package_id, &b).unwrap();

        let outcome =
            set_package_courses(&store, &package_id, &[b.clone(), c.clone()]).expect("resync");
        assert_eq!(outcome.linked, 1);
        assert_eq!(outcome.unlinked, 1);
        assert_eq!(link_count(&store, &package_id, &a), 0);
        assert_eq!(link_count(&store, &package_id, &b), 1);
        assert_eq!(link_count(&store, &package_id, &c), 1);

        let outcome = set_package_courses(&store, &package_id, &[b, c]).expect("same set again");
        assert_eq!(outcome.linked, 0);
        assert_eq!(outcome.unlinked, 0);
    }

    #[test]
    fn resync_rejects_unknown_courses_without_mutating() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");
        let a = make_course(&store, "A");
        link_course(&store, &package_id, &a).unwrap();

        let err = set_package_courses(&store, &package_id, &["ghost".to_string()]).unwrap_err();
        assert!(matches!(err, RelationError::InvalidReference(_)));
        assert_eq!(link_count(&store, &package_id, &a), 1);
    }

    #[test]
    fn video_create_requires_an_existing_course() {
        let store = test_store();
        let err = create_video_for_course(
            &store,
            "ghost",
            json!({ "title": "Lesson 1" }).as_object().unwrap().clone(),
        )
        .unwrap_err();
        assert!(matches!(err, RelationError::InvalidReference(_)));
        let total: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM course_videos", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn video_create_overrides_payload_course_id() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        let video = create_video_for_course(
            &store,
            &course_id,
            json!({ "title": "Lesson 1", "course_id": "stale-form-value" })
                .as_object()
                .unwrap()
                .clone(),
        )
        .expect("create video");
        assert_eq!(
            video.get("course_id").and_then(|v| v.as_str()),
            Some(course_id.as_str())
        );
    }

    #[test]
    fn delete_course_removes_videos_links_and_row() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        let p1 = make_package(&store, "Bundle 1");
        let p2 = make_package(&store, "Bundle 2");
        link_course(&store, &p1, &course_id).unwrap();
        link_course(&store, &p2, &course_id).unwrap();
        for n in 0..3 {
            create_video_for_course(
                &store,
                &course_id,
                json!({ "title": format!("Lesson {n}") })
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        }

        delete_course(&store, &course_id).expect("delete");

        assert!(store.fetch_by_id("courses", &course_id).unwrap().is_none());
        assert_eq!(
            store
                .count_matching("course_videos", &[("course_id", course_id.as_str())])
                .unwrap(),
            0
        );
        let cols = store.link_columns().unwrap();
        assert_eq!(
            store
                .count_matching("package_courses", &[(cols.course_id, course_id.as_str())])
                .unwrap(),
            0
        );
    }

    #[test]
    fn delete_course_on_missing_id_is_not_found() {
        let store = test_store();
        let err = delete_course(&store, "ghost").unwrap_err();
        assert!(matches!(err, RelationError::NotFound("course")));
    }

    #[test]
    fn delete_course_maps_foreign_key_refusal_to_still_referenced() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        // A dependent table the cascade does not know about, standing in for
        // whatever else a workspace may have pointed at courses.
        store
            .conn()
            .execute(
                "CREATE TABLE enrollments(
                    id TEXT PRIMARY KEY,
                    course_id TEXT NOT NULL REFERENCES courses(id)
                )",
                [],
            )
            .unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO enrollments(id, course_id) VALUES('e1', ?)",
                [course_id.as_str()],
            )
            .unwrap();
        store
            .conn()
            .execute("PRAGMA foreign_keys = ON", [])
            .unwrap();

        let err = delete_course(&store, &course_id).unwrap_err();
        assert!(matches!(err, RelationError::StillReferenced("course")));
        assert!(store.fetch_by_id("courses", &course_id).unwrap().is_some());
    }

    #[test]
    fn delete_package_cascades_links_and_blocks_on_purchases() {
        let store = test_store();
        let package_id = make_package(&store, "Bundle");
        let course_id = make_course(&store, "Intro");
        link_course(&store, &package_id, &course_id).unwrap();

        let student_id = insert(
            &store,
            "students",
            json!({ "name": "Ada", "email": "ada@example.com" }),
        );
        insert(
            &store,
            "purchases",
            json!({ "student_id": student_id, "package_id": package_id, "amount": 49.0 }),
        );
        store
            .conn()
            .execute("PRAGMA foreign_keys = ON", [])
            .unwrap();

        let err = delete_package(&store, &package_id).unwrap_err();
        assert!(matches!(err, RelationError::StillReferenced("package")));

        store
            .conn()
            .execute("DELETE FROM purchases", [])
            .unwrap();
        delete_package(&store, &package_id).expect("delete after purchases removed");
        assert!(store.fetch_by_id("packages", &package_id).unwrap().is_none());
        let cols = store.link_columns().unwrap();
        assert_eq!(
            store
                .count_matching("package_courses", &[(cols.package_id, package_id.as_str())])
                .unwrap(),
            0
        );
    }

    #[test]
    fn dependencies_count_videos_and_name_packages() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        let p1 = make_package(&store, "Starter");
        let p2 = make_package(&store, "Complete");
        link_course(&store, &p1, &course_id).unwrap();
        link_course(&store, &p2, &course_id).unwrap();
        create_video_for_course(
            &store,
            &course_id,
            json!({ "title": "Lesson 1" }).as_object().unwrap().clone(),
        )
        .unwrap();

        let deps = check_course_dependencies(&store, &course_id);
        assert_eq!(deps.videos, 1);
        assert_eq!(deps.packages, 2);
        assert_eq!(deps.package_names, vec!["Complete", "Starter"]);
    }

    #[test]
    fn dependencies_degrade_to_empty_on_store_failure() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        store
            .conn()
            .execute("DROP TABLE package_courses", [])
            .unwrap();

        let deps = check_course_dependencies(&store, &course_id);
        assert_eq!(deps.videos, 0);
        assert_eq!(deps.packages, 0);
        assert!(deps.package_names.is_empty());
    }

    #[test]
    fn audit_reports_exactly_the_orphans() {
        let store = test_store();
        let course_id = make_course(&store, "Intro");
        for n in 0..3 {
            create_video_for_course(
                &store,
                &course_id,
                json!({ "title": format!("Lesson {n}") })
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        }
        // Orphans as legacy workspaces produce them: rows written before
        // foreign keys were enforced, pointing at courses long gone.
        store
            .conn()
            .execute("PRAGMA foreign_keys = OFF", [])
            .unwrap();
        for n in 0..2 {
            store
                .conn()
                .execute(
                    "INSERT INTO course_videos(id, course_id, title, created_at)
                     VALUES(?, ?, ?, ?)",
                    [
                        format!("orphan-{n}").as_str(),
                        "deleted-course",
                        "Stray lesson",
                        "2023-01-01T00:00:00Z",
                    ],
                )
                .unwrap();
        }
        store
            .conn()
            .execute("PRAGMA foreign_keys = ON", [])
            .unwrap();

        let audit = audit_video_relationships(&store);
        assert_eq!(audit.total_videos, 5);
        assert_eq!(audit.valid_videos, 3);
        assert_eq!(audit.orphaned_videos.len(), 2);
        let mut orphan_ids: Vec<&str> = audit
            .orphaned_videos
            .iter()
            .filter_map(|v| v.get("id").and_then(|id| id.as_str()))
            .collect();
        orphan_ids.sort_unstable();
        assert_eq!(orphan_ids, vec!["orphan-0", "orphan-1"]);
    }

    #[test]
    fn legacy_capitalized_link_table_works_end_to_end() {
        let store = legacy_store();
        let package_id = make_package(&store, "Bundle");
        let course_id = make_course(&store, "Intro");

        link_course(&store, &package_id, &course_id).expect("link");
        assert_eq!(link_count(&store, &package_id, &course_id), 1);

        let deps = check_course_dependencies(&store, &course_id);
        assert_eq!(deps.packages, 1);
        assert_eq!(deps.package_names, vec!["Bundle"]);

        let linked = courses_for_package(&store, &package_id).expect("courses for package");
        assert_eq!(linked.len(), 1);

        delete_course(&store, &course_id).expect("cascade delete");
        assert_eq!(link_count(&store, &package_id, &course_id), 0);
    }
}
