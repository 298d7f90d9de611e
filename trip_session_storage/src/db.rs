use std::path::Path;

use chrono::{DateTime, Utc};
use const_format::concatcp;
use geo_types::Point;
use sqlx::{query, query_as, sqlite::SqliteConnectOptions, Executor, Pool, Row, Sqlite, SqlitePool};
use trip_session_engine::{error::EngineError, providers::TripRepository};
use trip_session_lib::{track_sample::TrackSample, trip::Trip};

use crate::{constants::*, StorageError};

/// SQLite-backed trip store. Implements the engine's repository contract
/// and serves the read side (trip lists, per-trip samples) for consumers.
#[derive(Clone)]
pub struct TripDatabase {
    pool: Pool<Sqlite>,
}

impl TripDatabase {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to connect: {err}")))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    async fn init(&self) -> Result<(), StorageError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", TRIPS_TABLE_NAME, "(",
                TRIP_ID,         " INTEGER PRIMARY KEY AUTOINCREMENT,",
                START_TIME,      " TIMESTAMP NOT NULL,",
                END_TIME,        " TIMESTAMP,",
                DISTANCE_METERS, " REAL NOT NULL DEFAULT 0,",
                TOTAL_PAUSED_MS, " INTEGER NOT NULL DEFAULT 0);

            CREATE TABLE IF NOT EXISTS ", TRACK_POINTS_TABLE_NAME, "(",
                POINT_ID,  " INTEGER PRIMARY KEY AUTOINCREMENT,",
                TRIP_ID,   " INTEGER NOT NULL,",
                TIMESTAMP, " TIMESTAMP NOT NULL,",
                LATITUDE,  " REAL NOT NULL,",
                LONGITUDE, " REAL NOT NULL,",
                SPEED_MPS, " REAL NOT NULL,
                FOREIGN KEY(", TRIP_ID, ") REFERENCES ", TRIPS_TABLE_NAME, "(", TRIP_ID, ") ON DELETE CASCADE
            )"))
            .await
            .map_err(|err| StorageError::Database(format!("Failed to create tables: {err}")))?;

        Ok(())
    }

    pub async fn insert_trip(&self, start_time: DateTime<Utc>) -> Result<Trip, StorageError> {
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", TRIPS_TABLE_NAME, "(", TRIP_ID, ", ", START_TIME, ")
            VALUES (NULL, ?1) RETURNING ", TRIP_ID))
            .bind(start_time)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to insert trip: {err}")))
            .map(|row| row.0)?;

        Ok(Trip::new(id, start_time))
    }

    pub async fn finish_trip(
        &self,
        trip_id: i64,
        end_time: DateTime<Utc>,
        distance_meters: f64,
        total_paused_ms: i64,
    ) -> Result<(), StorageError> {
        query(concatcp!("
            UPDATE ", TRIPS_TABLE_NAME, "
            SET ", END_TIME, " = ?1, ", DISTANCE_METERS, " = ?2, ", TOTAL_PAUSED_MS, " = ?3
            WHERE ", TRIP_ID, " = ?4"))
            .bind(end_time)
            .bind(distance_meters)
            .bind(total_paused_ms)
            .bind(trip_id)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to finish trip: {err}")))
            .map(|_| ())
    }

    pub async fn insert_track_point(&self, sample: &TrackSample) -> Result<(), StorageError> {
        query(concatcp!("
            INSERT INTO ", TRACK_POINTS_TABLE_NAME,
            "(", POINT_ID, ", ", TRIP_ID, ", ", TIMESTAMP, ", ", LATITUDE, ", ", LONGITUDE, ", ", SPEED_MPS, ")
            VALUES (NULL, ?1, ?2, ?3, ?4, ?5)"))
            .bind(sample.trip_id)
            .bind(sample.timestamp)
            .bind(sample.position.y())
            .bind(sample.position.x())
            .bind(sample.speed_mps)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to insert track point: {err}")))
            .map(|_| ())
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Trip, StorageError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1"))
            .bind(trip_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to get trip: {err}")))
    }

    pub async fn get_trips(&self) -> Result<Vec<Trip>, StorageError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " ORDER BY ", START_TIME, " DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to get trips: {err}")))
    }

    pub async fn get_trip_track_points(&self, trip_id: i64) -> Result<Vec<TrackSample>, StorageError> {
        let rows = query(concatcp!("
            SELECT ", TRIP_ID, ", ", TIMESTAMP, ", ", LATITUDE, ", ", LONGITUDE, ", ", SPEED_MPS, "
            FROM ", TRACK_POINTS_TABLE_NAME, "
            WHERE ", TRIP_ID, " = ?1 ORDER BY ", TIMESTAMP, " ASC"))
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| StorageError::Database(format!("Failed to get track points: {err}")))?;

        Ok(rows
            .iter()
            .map(|row| {
                let lat: f64 = row.get(2);
                let lng: f64 = row.get(3);
                TrackSample::new(row.get(0), row.get(1), Point::new(lng, lat), row.get(4))
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl TripRepository for TripDatabase {
    async fn create_trip(&self, start_time: DateTime<Utc>) -> Result<i64, EngineError> {
        let trip = self
            .insert_trip(start_time)
            .await
            .map_err(|err| EngineError::Persistence(err.to_string()))?;
        tracing::debug!("Created trip {}", trip.trip_id);
        Ok(trip.trip_id)
    }

    async fn append_sample(&self, sample: &TrackSample) -> Result<(), EngineError> {
        self.insert_track_point(sample)
            .await
            .map_err(|err| EngineError::Persistence(err.to_string()))
    }

    async fn finalize_trip(
        &self,
        trip_id: i64,
        end_time: DateTime<Utc>,
        distance_meters: f64,
        total_paused_ms: i64,
    ) -> Result<(), EngineError> {
        self.finish_trip(trip_id, end_time, distance_meters, total_paused_ms)
            .await
            .map_err(|err| EngineError::Persistence(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn test_db(name: &str) -> TripDatabase {
        let path = std::env::temp_dir().join(format!("trip_session_{}_{}.db", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        TripDatabase::connect(&path).await.unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn trip_round_trip() {
        let db = test_db("trip_round_trip").await;

        let trip = db.insert_trip(at(1_000)).await.unwrap();
        assert!(!trip.is_finished());

        db.finish_trip(trip.trip_id, at(2_000), 1234.5, 5_000).await.unwrap();

        let stored = db.get_trip(trip.trip_id).await.unwrap();
        assert_eq!(stored.end_time, Some(at(2_000)));
        assert_eq!(stored.distance_meters, 1234.5);
        assert_eq!(stored.total_paused_ms, 5_000);
    }

    #[tokio::test]
    async fn trips_are_listed_newest_first() {
        let db = test_db("trips_listed").await;

        db.insert_trip(at(1_000)).await.unwrap();
        db.insert_trip(at(3_000)).await.unwrap();
        db.insert_trip(at(2_000)).await.unwrap();

        let trips = db.get_trips().await.unwrap();
        assert_eq!(trips.len(), 3);
        assert_eq!(trips[0].start_time, at(3_000));
        assert_eq!(trips[2].start_time, at(1_000));
    }

    #[tokio::test]
    async fn track_points_keep_position_and_order() {
        let db = test_db("track_points").await;
        let trip = db.insert_trip(at(0)).await.unwrap();

        let first = TrackSample::new(trip.trip_id, at(10), Point::new(12.5, 55.6), 3.0);
        let second = TrackSample::new(trip.trip_id, at(20), Point::new(12.6, 55.7), 4.0);
        db.insert_track_point(&second).await.unwrap();
        db.insert_track_point(&first).await.unwrap();

        let points = db.get_trip_track_points(trip.trip_id).await.unwrap();
        assert_eq!(points, vec![first, second]);
    }

    #[tokio::test]
    async fn repository_contract_maps_errors() {
        let db = test_db("repository_contract").await;

        let trip_id = TripRepository::create_trip(&db, at(0)).await.unwrap();
        let sample = TrackSample::new(trip_id, at(5), Point::new(10.0, 56.0), 1.0);
        TripRepository::append_sample(&db, &sample).await.unwrap();
        TripRepository::finalize_trip(&db, trip_id, at(10), 42.0, 0).await.unwrap();

        let trip = db.get_trip(trip_id).await.unwrap();
        assert!(trip.is_finished());
        assert_eq!(db.get_trip_track_points(trip_id).await.unwrap().len(), 1);
    }
}
