use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, Row};

use crate::{
    error::Result,
    storage::models::{DatabaseStats, EvaluationRecord, RefundRecord},
};

pub struct Database {
    conn: Connection,
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    row.get::<_, String>(idx)?
        .parse::<DateTime<Utc>>()
        .map_err(|e| conversion_error(idx, e))
}

fn json_at<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS evaluations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                evaluated_at TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT,
                reason TEXT NOT NULL,
                delivered_on TEXT NOT NULL,
                eligible INTEGER NOT NULL,
                decision TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS refund_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                event TEXT NOT NULL,
                steps INTEGER NOT NULL,
                plan TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_evaluations_category ON evaluations(category)",
            [],
        )?;

        Ok(())
    }

    pub fn record_evaluation(&self, record: &EvaluationRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO evaluations
             (evaluated_at, category, subcategory, reason, delivered_on, eligible, decision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.evaluated_at.to_rfc3339(),
                record.category,
                record.subcategory,
                record.reason,
                record.delivered_on.format("%Y-%m-%d").to_string(),
                record.eligible,
                serde_json::to_string(&record.decision)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn record_refund_plan(&self, record: &RefundRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO refund_plans (created_at, payment_method, event, steps, plan)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.created_at.to_rfc3339(),
                record.payment_method,
                record.event,
                record.plan.steps.len() as i64,
                serde_json::to_string(&record.plan)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent evaluations first.
    pub fn recent_evaluations(&self, limit: Option<usize>) -> Result<Vec<EvaluationRecord>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, evaluated_at, category, subcategory, reason, delivered_on, eligible, decision
             FROM evaluations
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let records = stmt
            .query_map([limit], |row| {
                let delivered: String = row.get(5)?;
                Ok(EvaluationRecord {
                    id: row.get(0)?,
                    evaluated_at: timestamp_at(row, 1)?,
                    category: row.get(2)?,
                    subcategory: row.get(3)?,
                    reason: row.get(4)?,
                    delivered_on: NaiveDate::parse_from_str(&delivered, "%Y-%m-%d")
                        .map_err(|e| conversion_error(5, e))?,
                    eligible: row.get(6)?,
                    decision: json_at(row, 7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn recent_refund_plans(&self, limit: Option<usize>) -> Result<Vec<RefundRecord>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, payment_method, event, plan
             FROM refund_plans
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let records = stmt
            .query_map([limit], |row| {
                Ok(RefundRecord {
                    id: row.get(0)?,
                    created_at: timestamp_at(row, 1)?,
                    payment_method: row.get(2)?,
                    event: row.get(3)?,
                    plan: json_at(row, 4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            total_evaluations: count("SELECT COUNT(*) FROM evaluations")?,
            eligible: count("SELECT COUNT(*) FROM evaluations WHERE eligible = 1")?,
            ineligible: count("SELECT COUNT(*) FROM evaluations WHERE eligible = 0")?,
            refund_plans: count("SELECT COUNT(*) FROM refund_plans")?,
            split_refunds: count("SELECT COUNT(*) FROM refund_plans WHERE steps > 1")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Condition, PaymentMethod, PolicyCatalog, ReturnReason, RuleOrigin};
    use crate::returns::{Decision, IneligibleReason, OrderItem, Payment, RefundEvent, RefundPlan};

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("returns.db")).unwrap();
        (dir, db)
    }

    fn delivered() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_evaluation_round_trip() {
        let (_dir, db) = open();
        let item = OrderItem::new(Category::Electronics, ReturnReason::ChangeOfMind, delivered());
        let decision = Decision::Ineligible {
            reason: ReturnReason::ChangeOfMind,
            reasons: vec![IneligibleReason::WindowExpired { days_elapsed: 9, window_days: 7 }],
        };

        let id = db.record_evaluation(&EvaluationRecord::new(&item, &decision)).unwrap();
        let records = db.recent_evaluations(Some(10)).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].category, "electronics");
        assert_eq!(records[0].delivered_on, delivered());
        assert!(!records[0].eligible);
        assert_eq!(records[0].decision, decision);
    }

    #[test]
    fn test_eligible_decision_round_trip() {
        let (_dir, db) = open();
        let catalog = PolicyCatalog::builtin().unwrap();
        let rules = catalog
            .lookup_for(Category::Fashion, Some("swimwear"), ReturnReason::SizeDoesNotFit)
            .unwrap()
            .unwrap();
        let item = OrderItem::new(Category::Fashion, ReturnReason::SizeDoesNotFit, delivered())
            .with_subcategory("Swimwear");
        let decision = Decision::Eligible {
            reason: ReturnReason::SizeDoesNotFit,
            window_closes_on: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            rules,
        };

        db.record_evaluation(&EvaluationRecord::new(&item, &decision)).unwrap();
        let records = db.recent_evaluations(None).unwrap();

        assert!(records[0].eligible);
        assert_eq!(records[0].subcategory.as_deref(), Some("Swimwear"));
        assert_eq!(records[0].decision, decision);
        match &records[0].decision {
            Decision::Eligible { rules, .. } => {
                let strip = rules.get(Condition::HygienicStripIntact).unwrap();
                assert_eq!(strip.origin, RuleOrigin::CategoryOverride);
            }
            other => panic!("expected eligible, got {:?}", other),
        }
        assert_eq!(db.get_stats().unwrap().eligible, 1);
    }

    #[test]
    fn test_recent_evaluations_newest_first() {
        let (_dir, db) = open();
        for reason in [ReturnReason::Defective, ReturnReason::Damaged, ReturnReason::Expired] {
            let item = OrderItem::new(Category::Pets, reason, delivered());
            let decision = Decision::Ineligible { reason, reasons: vec![] };
            db.record_evaluation(&EvaluationRecord::new(&item, &decision)).unwrap();
        }

        let records = db.recent_evaluations(Some(2)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason, "Expired");
        assert_eq!(db.recent_evaluations(None).unwrap().len(), 3);
    }

    #[test]
    fn test_stats() {
        let (_dir, db) = open();
        let item = OrderItem::new(Category::Sports, ReturnReason::Damaged, delivered());
        let ineligible = Decision::Ineligible { reason: ReturnReason::Damaged, reasons: vec![] };
        db.record_evaluation(&EvaluationRecord::new(&item, &ineligible)).unwrap();

        let plan = RefundPlan {
            event: RefundEvent::ReturnAccepted,
            payment: Payment::new(PaymentMethod::CreditCard),
            steps: vec![],
        };
        db.record_refund_plan(&RefundRecord::new(&plan)).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_evaluations, 1);
        assert_eq!(stats.eligible, 0);
        assert_eq!(stats.ineligible, 1);
        assert_eq!(stats.refund_plans, 1);
        assert_eq!(stats.split_refunds, 0);

        let plans = db.recent_refund_plans(None).unwrap();
        assert_eq!(plans[0].plan, plan);
        assert_eq!(plans[0].payment_method, "credit card");
    }
}
