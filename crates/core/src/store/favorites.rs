//! Favorite restaurant bookmarks.
//!
//! Shares the durable store with the order queue but has no replay
//! behavior; records live until the caller removes them.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A bookmarked restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub restaurant_id: String,
}

impl StoreDb {
    /// Insert or update a favorite.
    pub async fn upsert_favorite(&self, favorite: &Favorite) -> Result<(), Error> {
        let favorite = favorite.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO favorites (id, restaurant_id) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET restaurant_id = excluded.restaurant_id",
                    params![favorite.id, favorite.restaurant_id],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Favorites for one restaurant, via the restaurant index.
    pub async fn favorites_for_restaurant(&self, restaurant_id: &str) -> Result<Vec<Favorite>, Error> {
        let restaurant_id = restaurant_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Favorite>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, restaurant_id FROM favorites WHERE restaurant_id = ?1 ORDER BY id ASC",
                )?;
                let favorites = stmt
                    .query_map(params![restaurant_id], |row| {
                        Ok(Favorite { id: row.get(0)?, restaurant_id: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(favorites)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a favorite by id. Returns false if it wasn't there.
    pub async fn remove_favorite(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_query() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.upsert_favorite(&Favorite { id: "f1".to_string(), restaurant_id: "r9".to_string() })
            .await
            .unwrap();
        db.upsert_favorite(&Favorite { id: "f2".to_string(), restaurant_id: "r9".to_string() })
            .await
            .unwrap();
        db.upsert_favorite(&Favorite { id: "f3".to_string(), restaurant_id: "r1".to_string() })
            .await
            .unwrap();

        let favorites = db.favorites_for_restaurant("r9").await.unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].id, "f1");
    }

    #[tokio::test]
    async fn test_remove() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.upsert_favorite(&Favorite { id: "f1".to_string(), restaurant_id: "r9".to_string() })
            .await
            .unwrap();

        assert!(db.remove_favorite("f1").await.unwrap());
        assert!(!db.remove_favorite("f1").await.unwrap());
        assert!(db.favorites_for_restaurant("r9").await.unwrap().is_empty());
    }
}
