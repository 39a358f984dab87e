use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{AlertRecord, NewAlert};

/// Insert an alert history row, returning its id.
pub fn insert_alert(conn: &Connection, alert: &NewAlert) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO alert_history (user_id, message, timestamp) VALUES (?1, ?2, ?3)",
        params![alert.user_id, alert.message, alert.timestamp],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All alerts sent to a user, newest first.
pub fn list_alerts_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<AlertRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, timestamp
         FROM alert_history
         WHERE user_id = ?1
         ORDER BY timestamp DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(AlertRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            message: row.get(2)?,
            timestamp: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn make_alert(user_id: i64, timestamp: &str) -> NewAlert {
        NewAlert {
            user_id,
            message: "Bp: Hypertensive Crisis (190/120 mmHg) Pulse: Normal".into(),
            timestamp: timestamp.into(),
        }
    }

    #[test]
    fn insert_then_list() {
        let conn = open_memory_database().unwrap();
        let id = insert_alert(&conn, &make_alert(3, "2024-03-15T08:00:00Z")).unwrap();

        let alerts = list_alerts_for_user(&conn, 3).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, id);
        assert!(alerts[0].message.contains("Hypertensive Crisis"));
    }

    #[test]
    fn list_is_newest_first_and_owner_scoped() {
        let conn = open_memory_database().unwrap();
        insert_alert(&conn, &make_alert(3, "2024-03-15T08:00:00Z")).unwrap();
        insert_alert(&conn, &make_alert(3, "2024-03-16T08:00:00Z")).unwrap();
        insert_alert(&conn, &make_alert(4, "2024-03-17T08:00:00Z")).unwrap();

        let alerts = list_alerts_for_user(&conn, 3).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].timestamp, "2024-03-16T08:00:00Z");
    }
}
